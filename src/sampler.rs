//! Live system sampling for health snapshots.
//!
//! The sampler is a collaborator of the store, not part of it: callers pass
//! its output to `Store::update_system_health`, where the usual consent gate
//! applies. The store never invokes the sampler on its own.

use sysinfo::{Components, Disks, Networks, ProcessesToUpdate, System};

use crate::models::SystemHealthPatch;

pub struct HealthSampler {
    system: System,
}

impl HealthSampler {
    pub fn new() -> Self {
        let mut system = System::new_all();
        // Initial refresh to establish a baseline for CPU deltas.
        system.refresh_cpu_usage();
        Self { system }
    }

    /// Take one sample of the host. CPU figures need two refreshes to show a
    /// delta, so the first sample after construction may read low.
    pub fn sample(&mut self) -> SystemHealthPatch {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.system.refresh_processes(ProcessesToUpdate::All);

        let memory_usage = if self.system.total_memory() > 0 {
            self.system.used_memory() as f64 / self.system.total_memory() as f64 * 100.0
        } else {
            0.0
        };

        let disks = Disks::new_with_refreshed_list();
        let (disk_total, disk_available) = disks.iter().fold((0u64, 0u64), |(total, avail), disk| {
            (
                total + disk.total_space(),
                avail + disk.available_space(),
            )
        });
        let disk_usage = if disk_total > 0 {
            (disk_total - disk_available) as f64 / disk_total as f64 * 100.0
        } else {
            0.0
        };

        let networks = Networks::new_with_refreshed_list();
        let (network_in, network_out) =
            networks
                .iter()
                .fold((0.0f64, 0.0f64), |(received, sent), (_, data)| {
                    (
                        received + data.total_received() as f64,
                        sent + data.total_transmitted() as f64,
                    )
                });

        // Hottest component, when the platform exposes any.
        let temperature = Components::new_with_refreshed_list()
            .iter()
            .map(|component| f64::from(component.temperature()))
            .fold(None, |hottest: Option<f64>, reading| {
                Some(hottest.map_or(reading, |current| current.max(reading)))
            });

        SystemHealthPatch {
            cpu_usage: Some(f64::from(self.system.global_cpu_usage())),
            memory_usage: Some(memory_usage),
            disk_usage: Some(disk_usage),
            network_in: Some(network_in),
            network_out: Some(network_out),
            processes_count: Some(self.system.processes().len() as u32),
            // sysinfo exposes no battery source; those fields stay unset.
            battery_level: None,
            battery_charging: None,
            temperature,
            uptime_secs: Some(System::uptime()),
        }
    }
}

impl Default for HealthSampler {
    fn default() -> Self {
        Self::new()
    }
}
