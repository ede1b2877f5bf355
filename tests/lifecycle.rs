//! End-to-end job lifecycle against a mock clip backend.

use std::sync::Arc;
use std::time::Duration;

use clipcraft_client::presenter::present;
use clipcraft_client::{
    BoundsPolicy, HttpJobClient, JobController, JobForm, JobId, JobRequest, JobState,
    SubmissionError, SubmitOutcome,
};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_INTERVAL: Duration = Duration::from_millis(50);

fn controller_for(server: &MockServer, policy: BoundsPolicy) -> JobController {
    let client = HttpJobClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5))
        .unwrap();
    JobController::with_poll_interval(Arc::new(client), policy, TEST_INTERVAL)
}

async fn wait_until_settled(controller: &JobController) -> JobState {
    for _ in 0..100 {
        let state = controller.snapshot().state;
        if state.is_terminal() {
            return state;
        }
        tokio::time::sleep(TEST_INTERVAL).await;
    }
    panic!("job never left processing: {:?}", controller.snapshot().state);
}

#[tokio::test]
async fn test_submit_poll_and_render() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-clips"))
        .and(body_json(serde_json::json!({
            "video_url": "https://youtube.com/watch?v=abc",
            "clip_duration": 40,
            "clip_count": 5
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"job_id": "j1", "status": "processing"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/j1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "processing"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "completed",
            "clips": ["https://cdn/1.mp4", "https://cdn/2.mp4"]
        })))
        .mount(&server)
        .await;

    let controller = controller_for(&server, BoundsPolicy::Clamp);
    let outcome = controller
        .submit(JobRequest::new("https://youtube.com/watch?v=abc", 40, 5))
        .await;
    assert!(matches!(outcome, SubmitOutcome::Started(_)));
    assert_eq!(
        controller.snapshot().state,
        JobState::Processing {
            job_id: JobId::from("j1")
        }
    );

    let clips = vec!["https://cdn/1.mp4".to_string(), "https://cdn/2.mp4".to_string()];
    assert_eq!(
        wait_until_settled(&controller).await,
        JobState::Completed {
            job_id: JobId::from("j1"),
            clips: clips.clone()
        }
    );

    let rendered = present(&clips);
    assert_eq!(rendered.len(), 2);
    assert_eq!((rendered[0].index, rendered[0].filename.as_str()), (1, "clip-1.mp4"));
    assert_eq!((rendered[1].index, rendered[1].filename.as_str()), (2, "clip-2.mp4"));
    assert_eq!(controller.snapshot().rendered, rendered);

    // Polling stopped once the job completed.
    tokio::time::sleep(TEST_INTERVAL * 4).await;
    let polls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/jobs/j1")
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn test_poll_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-clips"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"job_id": "j7"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/j7"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/j7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "failed",
            "error": "download failed"
        })))
        .mount(&server)
        .await;

    let controller = controller_for(&server, BoundsPolicy::Clamp);
    controller
        .submit(JobRequest::new("https://youtube.com/watch?v=abc", 40, 5))
        .await;

    assert_eq!(
        wait_until_settled(&controller).await,
        JobState::Failed {
            job_id: Some(JobId::from("j7")),
            reason: Some("download failed".to_string())
        }
    );
}

#[tokio::test]
async fn test_rejected_submission_can_be_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-clips"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Clip count must be between 1 and 10"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/generate-clips"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"job_id": "j2"})))
        .mount(&server)
        .await;

    let controller = controller_for(&server, BoundsPolicy::PassThrough);
    let form = JobForm {
        video_url: "https://youtube.com/watch?v=abc".to_string(),
        clip_duration: "40".to_string(),
        clip_count: "oops".to_string(),
    };

    let outcome = controller.submit_form(form).await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(SubmissionError::Status { status: 400, .. })
    ));
    assert!(matches!(
        controller.snapshot().state,
        JobState::Failed { job_id: None, .. }
    ));

    let sent: serde_json::Value =
        serde_json::from_slice(&server.received_requests().await.unwrap()[0].body).unwrap();
    assert_eq!(sent["clip_count"], 0);

    let outcome = controller
        .submit(JobRequest::new("https://youtube.com/watch?v=abc", 40, 5))
        .await;
    assert!(matches!(outcome, SubmitOutcome::Started(ref id) if id.as_str() == "j2"));
    controller.shutdown();
}
