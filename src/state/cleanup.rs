use crate::state::{now_secs, AppState, JobState};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info};

/// Drops completed and failed jobs that finished more than `ttl_secs` before `now`.
/// Running jobs are never evicted.
pub fn evict_finished_jobs(jobs: &mut HashMap<String, JobState>, ttl_secs: u64, now: u64) -> usize {
    let before = jobs.len();
    jobs.retain(|_, job| match job.finished_at {
        Some(finished) if job.is_finished() => now.saturating_sub(finished) <= ttl_secs,
        _ => true,
    });
    before - jobs.len()
}

/// Applies `server.job_ttl_seconds` to the job registry.
pub async fn sweep_jobs(state: &AppState) -> usize {
    let ttl = state.config.server.job_ttl_seconds;
    let evicted = evict_finished_jobs(&mut *state.jobs.write().await, ttl, now_secs());
    if evicted > 0 {
        info!(evicted = evicted, ttl_secs = ttl, "Expired translation jobs removed");
    }
    evicted
}

/// Sweeps the job registry on a fixed interval for the life of the process.
pub fn start_job_cleanup(state: AppState, every: Duration) {
    tokio::spawn(async move {
        let mut timer = interval(every);
        loop {
            timer.tick().await;
            let evicted = sweep_jobs(&state).await;
            debug!(evicted = evicted, "Job cleanup tick");
        }
    });
}
