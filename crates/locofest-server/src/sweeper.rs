use std::time::Duration;

use chrono::Utc;
use locofest_api::AppState;
use locofest_api::sweeps::{self, SweepReport};
use tracing::{info, warn};

/// Background task standing in for the platform timer: fires both sweeps on
/// a fixed interval, the first time right after startup.
pub async fn run_sweep_loop(state: AppState, interval_hours: u64) {
    let period = Duration::from_secs(interval_hours.saturating_mul(3600));
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        let sweep_state = state.clone();
        let result = tokio::task::spawn_blocking(move || run_sweeps(&sweep_state)).await;
        if let Err(e) = result {
            warn!("Sweep task panicked: {}", e);
        }
    }
}

fn run_sweeps(state: &AppState) {
    let now = Utc::now();

    match sweeps::purge_unverified_users(&state.db, now) {
        Ok(report) => log_report("unverified users", report),
        Err(e) => warn!("Unverified user sweep error: {:#}", e),
    }

    match sweeps::purge_stale_events(&state.db, &state.retention, now) {
        Ok(report) => log_report("events", report),
        Err(e) => warn!("Event sweep error: {:#}", e),
    }
}

fn log_report(what: &str, report: SweepReport) {
    if report.deleted > 0 || report.failed > 0 {
        info!(
            "Sweep {}: deleted {} of {} ({} failed)",
            what, report.deleted, report.examined, report.failed
        );
    }
}
