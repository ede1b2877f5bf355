//! Owner of the job lifecycle, shared by the view layer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::client::JobApi;
use crate::error::{SubmissionError, ValidationError};
use crate::models::{BoundsPolicy, JobForm, JobId, JobProgress, JobRequest};
use crate::presenter::{present, ClipDescriptor};
use crate::scheduler::{PollScheduler, POLL_INTERVAL};
use crate::state::{JobState, JobStateMachine, Outcome};

/// What happened to a submit call.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The backend accepted the job and polling has started.
    Started(JobId),
    /// A job was already in flight, or the controller was reset meanwhile.
    Ignored,
    Failed(SubmissionError),
}

/// Read-only view of the controller for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub state: JobState,
    pub progress: Option<JobProgress>,
    /// Presentation of the completed job's clips; empty otherwise.
    pub rendered: Vec<ClipDescriptor>,
}

pub struct JobController {
    client: Arc<dyn JobApi>,
    machine: Arc<Mutex<JobStateMachine>>,
    scheduler: Mutex<PollScheduler>,
    bounds_policy: BoundsPolicy,
}

impl JobController {
    pub fn new(client: Arc<dyn JobApi>, bounds_policy: BoundsPolicy) -> Self {
        Self::with_poll_interval(client, bounds_policy, POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        client: Arc<dyn JobApi>,
        bounds_policy: BoundsPolicy,
        poll_interval: Duration,
    ) -> Self {
        let machine = Arc::new(Mutex::new(JobStateMachine::new()));
        let scheduler = PollScheduler::with_period(client.clone(), machine.clone(), poll_interval);
        Self {
            client,
            machine,
            scheduler: Mutex::new(scheduler),
            bounds_policy,
        }
    }

    pub fn bounds_policy(&self) -> BoundsPolicy {
        self.bounds_policy
    }

    /// Submits a new job, discarding the previous one.
    pub async fn submit(&self, request: JobRequest) -> SubmitOutcome {
        self.run_submission(&request, request.validate()).await
    }

    /// Submits raw form input, applying the configured bounds policy.
    pub async fn submit_form(&self, form: JobForm) -> SubmitOutcome {
        let video_url = form.video_url.clone();
        match form.into_request(self.bounds_policy) {
            Ok(request) => self.submit(request).await,
            Err(e) => {
                let placeholder = JobRequest::new(video_url, 0, 0);
                self.run_submission(&placeholder, Err(e)).await
            }
        }
    }

    async fn run_submission(
        &self,
        request: &JobRequest,
        checked: Result<(), ValidationError>,
    ) -> SubmitOutcome {
        let ticket = self.machine.lock().begin_submit(request);
        let Some(ticket) = ticket else {
            return SubmitOutcome::Ignored;
        };
        // The previous job is gone; so is its poll loop.
        self.scheduler.lock().stop();

        let created = match checked {
            Ok(()) => self.client.create_job(request).await,
            Err(e) => Err(SubmissionError::from(e)),
        };

        match created {
            Ok(job_id) => {
                let outcome = self
                    .machine
                    .lock()
                    .submission_succeeded(ticket, job_id.clone());
                if outcome != Outcome::Transitioned {
                    // Reset while the request was in flight.
                    return SubmitOutcome::Ignored;
                }
                self.scheduler.lock().start(job_id.clone());
                SubmitOutcome::Started(job_id)
            }
            Err(e) => {
                self.machine.lock().submission_failed(ticket, &e);
                SubmitOutcome::Failed(e)
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let machine = self.machine.lock();
        let state = machine.state().clone();
        let rendered = match &state {
            JobState::Completed { clips, .. } => present(clips),
            _ => Vec::new(),
        };
        Snapshot {
            state,
            progress: machine.progress().cloned(),
            rendered,
        }
    }

    /// Job whose status is being polled right now.
    pub fn polling(&self) -> Option<JobId> {
        self.scheduler.lock().polling().cloned()
    }

    /// Abandons the current job and returns to `Idle`.
    pub fn reset(&self) {
        self.scheduler.lock().stop();
        self.machine.lock().reset();
    }

    /// Stops polling. Called when the view goes away.
    pub fn shutdown(&self) {
        info!("Shutting down job controller");
        self.scheduler.lock().stop();
    }
}
