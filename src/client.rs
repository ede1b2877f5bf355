//! HTTP client for the clip backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{PollError, SubmissionError};
use crate::models::{CreateJobResponse, JobId, JobRequest, StatusResponse};

/// The two calls the job lifecycle needs from the backend.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// `POST /generate-clips`. Not retried.
    async fn create_job(&self, request: &JobRequest) -> Result<JobId, SubmissionError>;

    /// `GET /jobs/{job_id}`.
    async fn get_status(&self, job_id: &JobId) -> Result<StatusResponse, PollError>;
}

/// reqwest-backed [`JobApi`].
pub struct HttpJobClient {
    http: Client,
    base_url: Url,
}

impl HttpJobClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(config.backend_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn error_body(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}

#[async_trait]
impl JobApi for HttpJobClient {
    async fn create_job(&self, request: &JobRequest) -> Result<JobId, SubmissionError> {
        let url = self.endpoint(&["generate-clips"]);
        debug!("Submitting clip job for {} to {}", request.video_url, url);

        let response = self.http.post(url).json(request).send().await?;

        if !response.status().is_success() {
            let (status, body) = error_body(response).await;
            return Err(SubmissionError::Status { status, body });
        }

        let created: CreateJobResponse = response
            .json()
            .await
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;
        Ok(created.job_id)
    }

    async fn get_status(&self, job_id: &JobId) -> Result<StatusResponse, PollError> {
        let url = self.endpoint(&["jobs", job_id.as_str()]);

        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            let (status, body) = error_body(response).await;
            return Err(PollError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| PollError::InvalidResponse(e.to_string()))
    }
}
