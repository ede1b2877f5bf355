//! Lifecycle of the single job the client is tracking.
//!
//! ```text
//!   Idle ──submit──▶ Submitting ──created──▶ Processing(id) ──completed──▶ Completed(id, clips)
//!    ▲                   │                     │    ▲  │
//!    │                   └──error──▶ Failed    │    └──┘ processing / other stage / poll error
//!    │                                         └──failed──▶ Failed(id)
//!    └───────────── reset
//! ```
//!
//! Completed and Failed are terminal until the next submit, which discards
//! the previous job and its clips.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{PollError, SubmissionError};
use crate::models::{ClipReference, JobId, JobProgress, JobRequest, JobStatus, StatusResponse};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Submitting,
    Processing {
        job_id: JobId,
    },
    Completed {
        job_id: JobId,
        clips: Vec<ClipReference>,
    },
    Failed {
        job_id: Option<JobId>,
        reason: Option<String>,
    },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed { .. } | JobState::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Submitting => "submitting",
            JobState::Processing { .. } => "processing",
            JobState::Completed { .. } => "completed",
            JobState::Failed { .. } => "failed",
        }
    }
}

/// Identifies one submission attempt.
///
/// A create-job result is only applied if its ticket is still the current one,
/// so a reset (or a newer submission) wins over a late response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitTicket(u64);

/// Effect of feeding an event into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Transitioned,
    Unchanged,
    /// The event was for a job (or submission) that is no longer current.
    Discarded,
}

#[derive(Debug)]
pub struct JobStateMachine {
    state: JobState,
    progress: Option<JobProgress>,
    submissions: u64,
}

impl Default for JobStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStateMachine {
    pub fn new() -> Self {
        Self {
            state: JobState::Idle,
            progress: None,
            submissions: 0,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn progress(&self) -> Option<&JobProgress> {
        self.progress.as_ref()
    }

    /// Id of the job being polled, if any.
    pub fn processing_job_id(&self) -> Option<&JobId> {
        match &self.state {
            JobState::Processing { job_id } => Some(job_id),
            _ => None,
        }
    }

    /// True while a submission or a job is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, JobState::Submitting | JobState::Processing { .. })
    }

    /// Enters `Submitting`, dropping any previous job and clips.
    ///
    /// Returns `None` without touching the state when a job is already in
    /// flight.
    pub fn begin_submit(&mut self, request: &JobRequest) -> Option<SubmitTicket> {
        if self.is_busy() {
            debug!(
                "Ignoring submission for {} while {}",
                request.video_url,
                self.state.name()
            );
            return None;
        }

        self.submissions += 1;
        self.progress = None;
        self.state = JobState::Submitting;
        info!("Submitting clip job for {}", request.video_url);
        Some(SubmitTicket(self.submissions))
    }

    fn is_current(&self, ticket: SubmitTicket) -> bool {
        self.state == JobState::Submitting && ticket.0 == self.submissions
    }

    pub fn submission_succeeded(&mut self, ticket: SubmitTicket, job_id: JobId) -> Outcome {
        if !self.is_current(ticket) {
            debug!("Discarding stale job id {}", job_id);
            return Outcome::Discarded;
        }

        info!("Job {} accepted, processing", job_id);
        self.state = JobState::Processing { job_id };
        Outcome::Transitioned
    }

    pub fn submission_failed(&mut self, ticket: SubmitTicket, err: &SubmissionError) -> Outcome {
        if !self.is_current(ticket) {
            debug!("Discarding stale submission error: {}", err);
            return Outcome::Discarded;
        }

        error!("Failed to submit job: {}", err);
        self.state = JobState::Failed {
            job_id: None,
            reason: Some(err.to_string()),
        };
        Outcome::Transitioned
    }

    /// Applies a status response for `job_id`.
    pub fn apply_status(&mut self, job_id: &JobId, response: StatusResponse) -> Outcome {
        if self.processing_job_id() != Some(job_id) {
            debug!(
                "Discarding status {:?} for job {} (state is {})",
                response.status.as_str(),
                job_id,
                self.state.name()
            );
            return Outcome::Discarded;
        }

        match response.status {
            JobStatus::Completed => {
                let clips = response.clips.unwrap_or_default();
                info!("Job {} completed with {} clips", job_id, clips.len());
                self.progress = None;
                self.state = JobState::Completed {
                    job_id: job_id.clone(),
                    clips,
                };
                Outcome::Transitioned
            }
            JobStatus::Failed => {
                warn!(
                    "Job {} failed: {}",
                    job_id,
                    response.error.as_deref().unwrap_or("no reason given")
                );
                self.progress = None;
                self.state = JobState::Failed {
                    job_id: Some(job_id.clone()),
                    reason: response.error,
                };
                Outcome::Transitioned
            }
            status => {
                // Still running; remember the stage for display.
                let progress = JobProgress {
                    stage: String::from(status),
                    percent: response.progress,
                };
                if self.progress.as_ref() != Some(&progress) {
                    debug!(
                        "Job {} at stage {} ({:?}%)",
                        job_id, progress.stage, progress.percent
                    );
                }
                self.progress = Some(progress);
                Outcome::Unchanged
            }
        }
    }

    /// Records a failed status check. Never leaves `Processing`.
    pub fn apply_poll_error(&mut self, job_id: &JobId, err: &PollError) -> Outcome {
        if self.processing_job_id() != Some(job_id) {
            debug!("Discarding poll error for job {}: {}", job_id, err);
            return Outcome::Discarded;
        }

        warn!("Status check for job {} failed, will retry: {}", job_id, err);
        Outcome::Unchanged
    }

    pub fn reset(&mut self) {
        self.progress = None;
        self.state = JobState::Idle;
    }
}
