use std::path::PathBuf;

use anyhow::Result;
use log::info;
use worktrace::{ConsentCategory, HealthSampler, Store};

fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("worktrace.db"));

    let store = Store::open(&path)?;
    info!("store opened at {}", path.display());

    if store.has_consent(ConsentCategory::SystemHealth) {
        let mut sampler = HealthSampler::new();
        if store.update_system_health(sampler.sample()) {
            info!("recorded a system health sample");
        }
    } else {
        println!("system health consent not granted; showing placeholder values");
    }

    println!("user:    {}", store.user_id().unwrap_or_default());
    println!("device:  {}", store.device_id().unwrap_or_default());
    println!("session: {}", store.session_id().unwrap_or_default());

    let stats = store.statistics();
    println!(
        "activities: {} ({} productive seconds, avg score {:.2}, {} sessions)",
        stats.activities, stats.productive_time_secs, stats.avg_score, stats.sessions
    );

    for usage in store.app_usage_stats(5) {
        println!("  {:<24} {:>4}x {:>8}s", usage.app, usage.count, usage.duration_secs);
    }

    let health = store.system_health();
    let snapshot = health.snapshot();
    println!(
        "health{}: cpu {:.1}%, mem {:.1}%, disk {:.1}%, {} processes",
        if health.is_placeholder() { " (sample)" } else { "" },
        snapshot.cpu_usage,
        snapshot.memory_usage,
        snapshot.disk_usage,
        snapshot.processes_count
    );

    let usage = store.storage_usage();
    println!(
        "storage: {:.2} KB used ({:.2}% of {} MB)",
        usage.used_kb,
        usage.percent_used,
        usage.budget_bytes / (1024 * 1024)
    );

    Ok(())
}
