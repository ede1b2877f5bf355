//! Client for an asynchronous clip-generation backend.
//!
//! A job is submitted with [`JobController::submit`], polled every
//! [`POLL_INTERVAL`] by a [`PollScheduler`] while it is processing, and its
//! clips are rendered by [`presenter::present`] once it completes.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod presenter;
pub mod routes;
pub mod scheduler;
pub mod state;

pub use client::{HttpJobClient, JobApi};
pub use config::Config;
pub use controller::{JobController, Snapshot, SubmitOutcome};
pub use error::{ConfigError, PollError, SubmissionError, ValidationError};
pub use models::{BoundsPolicy, JobForm, JobId, JobRequest, JobStatus, StatusResponse};
pub use scheduler::{PollScheduler, POLL_INTERVAL};
pub use state::{JobState, JobStateMachine};
