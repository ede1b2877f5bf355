use std::fmt;
use std::num::IntErrorKind;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::ValidationError;

pub const CLIP_DURATION_BOUNDS: RangeInclusive<i64> = 10..=300;
pub const CLIP_COUNT_BOUNDS: RangeInclusive<i64> = 1..=10;

pub const DEFAULT_CLIP_DURATION: i64 = 40;
pub const DEFAULT_CLIP_COUNT: i64 = 5;

/// Opaque locator for one generated clip.
pub type ClipReference = String;

/// Backend-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /generate-clips`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub video_url: String,
    pub clip_duration: i64,
    pub clip_count: i64,
}

impl JobRequest {
    pub fn new(video_url: impl Into<String>, clip_duration: i64, clip_count: i64) -> Self {
        Self {
            video_url: video_url.into(),
            clip_duration,
            clip_count,
        }
    }

    /// Checks that the video URL is a non-empty http(s) link.
    ///
    /// Numeric bounds are not checked here; they were settled by the
    /// [`BoundsPolicy`] when the request was built from user input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let raw = self.video_url.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }

        let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme {other:?}"),
            }),
        }
    }
}

/// Raw form input, exactly as typed by the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobForm {
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub clip_duration: String,
    #[serde(default)]
    pub clip_count: String,
}

impl JobForm {
    /// Builds a [`JobRequest`], coercing unparseable numbers to 0 and then
    /// applying `policy` to out-of-range values.
    pub fn into_request(self, policy: BoundsPolicy) -> Result<JobRequest, ValidationError> {
        let clip_duration = policy.apply(
            "clip_duration",
            coerce_int_field("clip_duration", &self.clip_duration),
            CLIP_DURATION_BOUNDS,
        )?;
        let clip_count = policy.apply(
            "clip_count",
            coerce_int_field("clip_count", &self.clip_count),
            CLIP_COUNT_BOUNDS,
        )?;

        Ok(JobRequest {
            video_url: self.video_url.trim().to_string(),
            clip_duration,
            clip_count,
        })
    }
}

/// Parses one numeric form field.
///
/// Reads an optional sign and the leading decimal digits, ignoring whatever
/// follows (`"40.5"` is 40, `"12abc"` is 12). Values too large for `i64`
/// saturate so out-of-range handling still sees the right side of the bounds.
pub fn parse_int_field(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    let not_a_number = || ValidationError::NotANumber {
        field,
        raw: raw.to_string(),
    };

    let trimmed = raw.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['+', '-']));
    let digit_len = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digit_len == 0 {
        return Err(not_a_number());
    }

    match trimmed[..sign_len + digit_len].parse::<i64>() {
        Ok(value) => Ok(value),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(not_a_number()),
        },
    }
}

/// Like [`parse_int_field`], but malformed input becomes 0 instead of an error.
pub fn coerce_int_field(field: &'static str, raw: &str) -> i64 {
    match parse_int_field(field, raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("{}; treating it as 0", e);
            0
        }
    }
}

/// What to do with a numeric input that falls outside its bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Snap to the nearest bound.
    #[default]
    Clamp,
    /// Block the submission.
    Reject,
    /// Send the value unchanged and let the backend decide.
    PassThrough,
}

impl BoundsPolicy {
    pub fn apply(
        self,
        field: &'static str,
        value: i64,
        bounds: RangeInclusive<i64>,
    ) -> Result<i64, ValidationError> {
        if bounds.contains(&value) {
            return Ok(value);
        }

        let (min, max) = (*bounds.start(), *bounds.end());
        match self {
            BoundsPolicy::Clamp => {
                let clamped = value.clamp(min, max);
                warn!("{} {} is outside {}..={}, clamped to {}", field, value, min, max, clamped);
                Ok(clamped)
            }
            BoundsPolicy::Reject => Err(ValidationError::OutOfBounds {
                field,
                value,
                min,
                max,
            }),
            BoundsPolicy::PassThrough => Ok(value),
        }
    }
}

impl FromStr for BoundsPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(BoundsPolicy::Clamp),
            "reject" => Ok(BoundsPolicy::Reject),
            "passthrough" | "pass-through" | "pass_through" => Ok(BoundsPolicy::PassThrough),
            other => Err(format!(
                "unknown bounds policy {other:?} (expected clamp, reject or passthrough)"
            )),
        }
    }
}

/// Response of `POST /generate-clips`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: JobId,
}

/// Status value reported by the backend.
///
/// Anything other than the three lifecycle values is an intermediate stage
/// label (e.g. `downloading`, `cutting_clips`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Other(stage) => stage,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Other(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(stage) => stage,
            known => known.as_str().to_string(),
        }
    }
}

/// Response of `GET /jobs/{job_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub clips: Option<Vec<ClipReference>>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn processing() -> Self {
        Self::with_status(JobStatus::Processing)
    }

    pub fn completed(clips: Vec<ClipReference>) -> Self {
        Self {
            clips: Some(clips),
            ..Self::with_status(JobStatus::Completed)
        }
    }

    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            clips: None,
            progress: None,
            error: None,
        }
    }
}

/// Last stage the backend reported for a job still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobProgress {
    pub stage: String,
    pub percent: Option<u8>,
}
