use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest system-health snapshot. A single record that is merged on update,
/// never appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub network_in: f64,
    pub network_out: f64,
    pub processes_count: u32,
    pub battery_level: f64,
    pub battery_charging: bool,
    pub temperature: f64,
    pub uptime_secs: u64,
    pub last_updated: DateTime<Utc>,
}

impl SystemHealth {
    /// Initial placeholder written at first run, before any sample arrives.
    pub fn zeroed(now: DateTime<Utc>) -> Self {
        Self {
            cpu_usage: 0.0,
            memory_usage: 0.0,
            disk_usage: 0.0,
            network_in: 0.0,
            network_out: 0.0,
            processes_count: 0,
            battery_level: 100.0,
            battery_charging: false,
            temperature: 0.0,
            uptime_secs: 0,
            last_updated: now,
        }
    }

    pub fn apply(&mut self, patch: SystemHealthPatch) {
        if let Some(cpu_usage) = patch.cpu_usage {
            self.cpu_usage = cpu_usage;
        }
        if let Some(memory_usage) = patch.memory_usage {
            self.memory_usage = memory_usage;
        }
        if let Some(disk_usage) = patch.disk_usage {
            self.disk_usage = disk_usage;
        }
        if let Some(network_in) = patch.network_in {
            self.network_in = network_in;
        }
        if let Some(network_out) = patch.network_out {
            self.network_out = network_out;
        }
        if let Some(processes_count) = patch.processes_count {
            self.processes_count = processes_count;
        }
        if let Some(battery_level) = patch.battery_level {
            self.battery_level = battery_level;
        }
        if let Some(battery_charging) = patch.battery_charging {
            self.battery_charging = battery_charging;
        }
        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }
        if let Some(uptime_secs) = patch.uptime_secs {
            self.uptime_secs = uptime_secs;
        }
    }
}

/// Partial health update; merged field-by-field into the stored snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemHealthPatch {
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
    pub disk_usage: Option<f64>,
    pub network_in: Option<f64>,
    pub network_out: Option<f64>,
    pub processes_count: Option<u32>,
    pub battery_level: Option<f64>,
    pub battery_charging: Option<bool>,
    pub temperature: Option<f64>,
    pub uptime_secs: Option<u64>,
}

/// Result of a health read. A `Placeholder` carries synthesized display
/// values; only `Real` reflects consented stored data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "snapshot", rename_all = "snake_case")]
pub enum HealthReading {
    Real(SystemHealth),
    Placeholder(SystemHealth),
}

impl HealthReading {
    pub fn snapshot(&self) -> &SystemHealth {
        match self {
            HealthReading::Real(snapshot) | HealthReading::Placeholder(snapshot) => snapshot,
        }
    }

    pub fn into_snapshot(self) -> SystemHealth {
        match self {
            HealthReading::Real(snapshot) | HealthReading::Placeholder(snapshot) => snapshot,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, HealthReading::Placeholder(_))
    }
}
