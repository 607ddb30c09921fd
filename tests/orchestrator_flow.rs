//! End-to-end job flows against a scripted engine, without touching the network.

mod common;

use common::{orchestrator, quick_policy, staged_files, ScriptedEngine, Step};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use vidloader::{Attempt, ErrorCategory, JobFailure, MediaKind, TimeoutPolicy};

const FFMPEG_MISSING: &str =
    "ERROR: Postprocessing: ffprobe and ffmpeg not found. Please install or provide the path using --ffmpeg-location";

#[tokio::test]
async fn audio_falls_back_to_raw_container_when_transcoder_missing() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![
        Step::Fail(FFMPEG_MISSING),
        Step::Succeed { native_ext: "webm" },
    ]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let delivered = orch
        .submit("https://video.example/a", "audio")
        .await
        .expect("fallback should succeed");

    assert_eq!(delivered.media_kind(), MediaKind::Audio);
    assert_eq!(delivered.extension(), Some("webm"));
    assert_eq!(
        delivered.suggested_filename(),
        format!("audio_{}.webm", delivered.job_id())
    );

    let calls = engine.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].options.post_processing.is_some());
    assert!(calls[1].options.post_processing.is_none());
    assert_eq!(calls[0].options.job_id, calls[1].options.job_id);
    assert_eq!(calls[0].options.format_selector, calls[1].options.format_selector);
    assert!(calls.iter().all(|c| c.url == "https://video.example/a"));

    drop(delivered);
    assert!(staged_files(temp.path()).is_empty());
}

#[tokio::test]
async fn primary_audio_success_delivers_transcoded_file() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![Step::Succeed { native_ext: "webm" }]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let delivered = orch.submit("https://video.example/a", "audio").await.unwrap();

    assert_eq!(delivered.extension(), Some("mp3"));
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn failed_fallback_surfaces_as_fallback_failed() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![
        Step::Fail(FFMPEG_MISSING),
        Step::Fail("ERROR: Video unavailable"),
    ]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let failure = orch
        .submit("https://video.example/a", "audio")
        .await
        .unwrap_err();

    assert_eq!(failure.category, ErrorCategory::FallbackFailed);
    assert!(failure.message.contains("unavailable"));
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test]
async fn fallback_never_recurses() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![
        Step::Fail(FFMPEG_MISSING),
        Step::Fail(FFMPEG_MISSING),
        Step::Succeed { native_ext: "webm" },
    ]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let failure = orch
        .submit("https://video.example/a", "audio")
        .await
        .unwrap_err();

    assert_eq!(failure.category, ErrorCategory::FallbackFailed);
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test]
async fn video_missing_transcoder_is_terminal() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![Step::Fail(FFMPEG_MISSING)]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let failure = orch
        .submit("https://video.example/a", "video")
        .await
        .unwrap_err();

    assert_eq!(failure.category, ErrorCategory::MissingTranscoder);
    assert_eq!(failure.category.http_status(), 500);
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn content_state_failures_are_not_retried() {
    let cases = [
        ("ERROR: Sign in to confirm your age", ErrorCategory::LoginRequired, 400),
        ("ERROR: The uploader made this video geo-restricted", ErrorCategory::GeoRestricted, 400),
        ("ERROR: Video unavailable", ErrorCategory::Unavailable, 404),
        ("ERROR: Unsupported URL", ErrorCategory::Unknown, 500),
    ];

    for (message, category, status) in cases {
        let temp = TempDir::new().expect("temp dir");
        let engine = ScriptedEngine::new(vec![Step::Fail(message)]);
        let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

        let failure = orch
            .submit("https://video.example/a", "audio")
            .await
            .unwrap_err();

        assert_eq!(failure.category, category, "message: {}", message);
        assert_eq!(failure.category.http_status(), status);
        assert_eq!(failure.message, message);
        assert_eq!(engine.call_count(), 1);
    }
}

#[tokio::test]
async fn invalid_requests_never_reach_the_engine() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    for (url, format) in [("", "audio"), ("   ", "video"), ("https://video.example/a", "gif")] {
        let failure: JobFailure = orch.submit(url, format).await.unwrap_err();
        assert_eq!(failure.category, ErrorCategory::InvalidRequest);
        assert_eq!(failure.category.http_status(), 400);
    }

    assert_eq!(engine.call_count(), 0);
}

#[tokio::test]
async fn success_without_output_is_unknown() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![Step::SucceedWithoutOutput]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let failure = orch
        .submit("https://video.example/a", "video")
        .await
        .unwrap_err();

    assert_eq!(failure.category, ErrorCategory::Unknown);
    assert_eq!(failure.message, "File not found after download");
}

#[tokio::test]
async fn partial_files_removed_after_terminal_failure() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![Step::FailAfterPartial(
        "ERROR: This video is geo-restricted",
    )]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let failure = orch
        .submit("https://video.example/a", "video")
        .await
        .unwrap_err();

    assert_eq!(failure.category, ErrorCategory::GeoRestricted);
    assert!(staged_files(temp.path()).is_empty());
}

#[tokio::test]
async fn primary_leftovers_swept_after_fallback_success() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![
        Step::FailAfterPartial(FFMPEG_MISSING),
        Step::Succeed { native_ext: "m4a" },
    ]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let delivered = orch.submit("https://video.example/a", "audio").await.unwrap();

    assert_eq!(delivered.extension(), Some("m4a"));
    assert_eq!(
        staged_files(temp.path()),
        vec![format!("{}.m4a", delivered.job_id())]
    );
}

#[tokio::test]
async fn streamed_delivery_removes_staged_file() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![Step::Succeed { native_ext: "mp4" }]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let delivered = orch.submit("https://video.example/a", "video").await.unwrap();
    assert_eq!(
        delivered.suggested_filename(),
        format!("video_{}.mp4", delivered.job_id())
    );

    let mut stream = delivered.into_stream().await.unwrap();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }

    assert_eq!(body, b"media bytes");
    assert!(staged_files(temp.path()).is_empty());
}

#[tokio::test]
async fn fallback_attempt_uses_fallback_deadline() {
    let spec = vidloader::build_job("https://www.youtube.com/watch?v=abc", "audio").unwrap();
    let defaults = TimeoutPolicy::default();
    assert_eq!(defaults.timeout_for(&spec).as_secs(), 600);
    assert_eq!(defaults.timeout_for(&spec.to_fallback()).as_secs(), 180);
    assert_eq!(spec.to_fallback().attempt(), Attempt::Fallback);

    // Only the fallback deadline is short enough to cut the second attempt off
    let policy = TimeoutPolicy {
        audio_fallback: Duration::from_millis(100),
        ..quick_policy()
    };
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![
        Step::Fail(FFMPEG_MISSING),
        Step::Work(Duration::from_secs(2)),
    ]);
    let orch = orchestrator(temp.path(), engine.clone(), policy);

    let started = Instant::now();
    let failure = orch.run(spec).await.unwrap_err();

    assert_eq!(failure.category, ErrorCategory::FallbackFailed);
    assert!(failure.message.contains("timeout"), "message: {}", failure.message);
    assert!(failure.message.contains("100ms"), "message: {}", failure.message);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test]
async fn cleanup_of_already_deleted_output_is_silent() {
    let temp = TempDir::new().expect("temp dir");
    let engine = ScriptedEngine::new(vec![Step::Succeed { native_ext: "mp4" }]);
    let orch = orchestrator(temp.path(), engine.clone(), quick_policy());

    let delivered = orch.submit("https://video.example/a", "video").await.unwrap();
    std::fs::remove_file(delivered.path()).unwrap();

    // Dropping the handle tries to delete again; nothing reaches the caller
    drop(delivered);
    assert!(staged_files(temp.path()).is_empty());

    let removed = vidloader::delivery::purge_output_dir(temp.path()).await.unwrap();
    assert_eq!(removed, 0);
}
