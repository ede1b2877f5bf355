use std::fmt::Write;
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    response::{Html, Json, Redirect},
    routing::{get, post},
    Router,
};
use url::Url;

use crate::controller::{JobController, Snapshot, SubmitOutcome};
use crate::models::{
    JobForm, CLIP_COUNT_BOUNDS, CLIP_DURATION_BOUNDS, DEFAULT_CLIP_COUNT, DEFAULT_CLIP_DURATION,
};
use crate::state::JobState;

/// Shared state of the local console.
#[derive(Clone)]
pub struct ConsoleState {
    pub controller: Arc<JobController>,
    /// Used to resolve server-relative clip links.
    pub backend_url: Url,
}

pub fn create_routes(state: ConsoleState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/submit", post(submit))
        .route("/api/state", get(job_state))
        .route("/health", get(health))
        .with_state(state)
}

async fn index(State(console): State<ConsoleState>) -> Html<String> {
    Html(render_page(&console.controller.snapshot(), &console.backend_url))
}

// Plain form post; the page is re-rendered from the controller afterwards.
async fn submit(State(console): State<ConsoleState>, Form(form): Form<JobForm>) -> Redirect {
    match console.controller.submit_form(form).await {
        SubmitOutcome::Started(job_id) => tracing::info!("Console started job {}", job_id),
        SubmitOutcome::Ignored => tracing::info!("Console submission ignored, a job is in flight"),
        SubmitOutcome::Failed(_) => {}
    }
    Redirect::to("/")
}

async fn job_state(State(console): State<ConsoleState>) -> Json<Snapshot> {
    Json(console.controller.snapshot())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render_page(snapshot: &Snapshot, backend_url: &Url) -> String {
    let busy = matches!(snapshot.state, JobState::Submitting | JobState::Processing { .. });
    let mut html = String::new();

    html.push_str(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>ClipCraft</title>
    <link href="https://cdn.jsdelivr.net/npm/tailwindcss@3.2.7/dist/tailwind.min.css" rel="stylesheet">
"#,
    );
    if busy {
        // Re-render while the job runs; the poll loop keeps the state fresh.
        html.push_str(r#"    <meta http-equiv="refresh" content="3">"#);
        html.push('\n');
    }
    html.push_str(
        r#"  </head>
  <body class="p-4">
    <h1 class="text-2xl font-bold mb-4">ClipCraft</h1>
    <p class="mb-4">Generate clips from a video URL</p>
"#,
    );

    let _ = write!(
        html,
        r#"    <form action="/submit" method="post" class="space-y-4">
      <div>
        <label class="block font-medium" for="video_url">Video URL</label>
        <input type="url" id="video_url" name="video_url" class="border rounded w-full p-1" placeholder="https://www.youtube.com/watch?v=..." required />
      </div>
      <div>
        <label class="block font-medium" for="clip_duration">Clip Duration (seconds)</label>
        <input type="number" id="clip_duration" name="clip_duration" value="{duration}" min="{dmin}" max="{dmax}" class="border rounded p-1" required />
      </div>
      <div>
        <label class="block font-medium" for="clip_count">Number of Clips</label>
        <input type="number" id="clip_count" name="clip_count" value="{count}" min="{cmin}" max="{cmax}" class="border rounded p-1" required />
      </div>
      <button type="submit" class="bg-blue-500 text-white px-4 py-2 rounded"{disabled}>{label}</button>
    </form>
"#,
        duration = DEFAULT_CLIP_DURATION,
        dmin = CLIP_DURATION_BOUNDS.start(),
        dmax = CLIP_DURATION_BOUNDS.end(),
        count = DEFAULT_CLIP_COUNT,
        cmin = CLIP_COUNT_BOUNDS.start(),
        cmax = CLIP_COUNT_BOUNDS.end(),
        disabled = if busy { " disabled" } else { "" },
        label = if snapshot.state == JobState::Submitting {
            "Submitting..."
        } else {
            "Generate Clips"
        },
    );

    html.push_str(r#"    <hr class="my-4"/>
"#);
    render_status(&mut html, snapshot);
    render_clips(&mut html, snapshot, backend_url);
    html.push_str("  </body>\n</html>\n");
    html
}

fn render_status(html: &mut String, snapshot: &Snapshot) {
    match &snapshot.state {
        JobState::Idle => {}
        JobState::Submitting => {
            html.push_str(r#"    <div class="status"><p>Submitting job...</p></div>
"#);
        }
        JobState::Processing { job_id } => {
            let stage = match &snapshot.progress {
                Some(progress) => match progress.percent {
                    Some(percent) => format!(" ({}, {}%)", escape(&progress.stage), percent),
                    None => format!(" ({})", escape(&progress.stage)),
                },
                None => String::new(),
            };
            let _ = write!(
                html,
                r#"    <div class="status processing"><p>Processing your video{stage}... This may take a few minutes.</p><p><small>Job ID: {id}</small></p></div>
"#,
                id = escape(job_id.as_str()),
            );
        }
        JobState::Completed { job_id, .. } => {
            let _ = write!(
                html,
                r#"    <div class="status"><p>Clips generated successfully!</p><p><small>Job ID: {id}</small></p></div>
"#,
                id = escape(job_id.as_str()),
            );
        }
        JobState::Failed { job_id, reason } => {
            let _ = write!(
                html,
                r#"    <div class="status error" role="alert"><p>Job failed: {reason}. Please try again.</p>"#,
                reason = escape(reason.as_deref().unwrap_or("unknown error")),
            );
            if let Some(job_id) = job_id {
                let _ = write!(html, "<p><small>Job ID: {}</small></p>", escape(job_id.as_str()));
            }
            html.push_str("</div>\n");
        }
    }
}

fn render_clips(html: &mut String, snapshot: &Snapshot, backend_url: &Url) {
    if snapshot.rendered.is_empty() {
        return;
    }

    html.push_str("    <div class=\"clips-grid\">\n");
    for clip in &snapshot.rendered {
        let Some(href) = clip.href(backend_url) else {
            tracing::warn!("Skipping clip {} with unusable link {:?}", clip.index, clip.source);
            let _ = write!(
                html,
                "      <div class=\"clip-card\"><h3>Clip {}</h3><p>Clip link unavailable.</p></div>\n",
                clip.index
            );
            continue;
        };
        let href = escape(&href);
        let _ = write!(
            html,
            r#"      <div class="clip-card">
        <video controls><source src="{href}" />Your browser does not support the video tag.</video>
        <h3>Clip {index}</h3>
        <a href="{href}" download="{filename}" class="download-btn">Download</a>
      </div>
"#,
            index = clip.index,
            filename = escape(&clip.filename),
        );
    }
    html.push_str("    </div>\n");
}
