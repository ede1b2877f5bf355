//! Periodic status checks for the job in `Processing`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::JobApi;
use crate::models::JobId;
use crate::state::JobStateMachine;

/// Fixed period between status checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(3000);

struct ActivePoll {
    job_id: JobId,
    handle: JoinHandle<()>,
}

/// Drives `get_status` ticks while the machine is processing one job.
///
/// At most one polling task exists at a time. Each tick awaits its fetch
/// before the next tick is scheduled, so fetches for a job never overlap.
pub struct PollScheduler {
    client: Arc<dyn JobApi>,
    machine: Arc<Mutex<JobStateMachine>>,
    period: Duration,
    active: Option<ActivePoll>,
}

impl PollScheduler {
    pub fn new(client: Arc<dyn JobApi>, machine: Arc<Mutex<JobStateMachine>>) -> Self {
        Self::with_period(client, machine, POLL_INTERVAL)
    }

    /// A zero `period` falls back to [`POLL_INTERVAL`].
    pub fn with_period(
        client: Arc<dyn JobApi>,
        machine: Arc<Mutex<JobStateMachine>>,
        period: Duration,
    ) -> Self {
        let period = if period.is_zero() {
            warn!("Zero poll period requested, using {:?}", POLL_INTERVAL);
            POLL_INTERVAL
        } else {
            period
        };
        Self {
            client,
            machine,
            period,
            active: None,
        }
    }

    /// Starts polling `job_id`, replacing any earlier loop.
    pub fn start(&mut self, job_id: JobId) {
        self.stop();

        info!("Polling job {} every {:?}", job_id, self.period);
        let handle = tokio::spawn(poll_loop(
            self.client.clone(),
            self.machine.clone(),
            job_id.clone(),
            self.period,
        ));
        self.active = Some(ActivePoll { job_id, handle });
    }

    /// Tears down the polling loop, if any.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            if !active.handle.is_finished() {
                debug!("Stopping poll loop for job {}", active.job_id);
            }
            active.handle.abort();
        }
    }

    /// Job currently being polled, if its loop is still alive.
    pub fn polling(&self) -> Option<&JobId> {
        self.active
            .as_ref()
            .filter(|active| !active.handle.is_finished())
            .map(|active| &active.job_id)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    client: Arc<dyn JobApi>,
    machine: Arc<Mutex<JobStateMachine>>,
    job_id: JobId,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let current = machine.lock().processing_job_id() == Some(&job_id);
        if !current {
            break;
        }

        debug!("Checking status of job {}", job_id);
        let result = client.get_status(&job_id).await;

        let still_processing = {
            let mut state = machine.lock();
            match result {
                Ok(response) => state.apply_status(&job_id, response),
                Err(e) => state.apply_poll_error(&job_id, &e),
            };
            state.processing_job_id() == Some(&job_id)
        };
        if !still_processing {
            break;
        }
    }

    debug!("Poll loop for job {} finished", job_id);
}
