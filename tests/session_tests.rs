//! Session Tests
//!
//! Drive the session state machine the way a UI shell would.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use quieter::dsp::DenoiseTuning;
use quieter::engine::{decode_bytes, generate_test_tone, wav, write_wav};
use quieter::{Config, Session, SessionState};

fn tone_wav(seconds: f32, num_channels: usize) -> Vec<u8> {
    let tone = generate_test_tone(330.0, seconds, 44100, num_channels).unwrap();
    wav::encode(&tone).unwrap()
}

async fn ready_session(seconds: f32) -> Session {
    let session = Session::default();
    session
        .load_bytes(tone_wav(seconds, 2), Some("wav"))
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn test_full_pipeline() {
    let session = ready_session(1.0).await;
    assert_eq!(session.state().unwrap(), SessionState::Ready);

    session.select_region(0.1, 0.4).unwrap();
    session.set_intensity(75.0).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session
        .render(move |p| sink.lock().unwrap().push(p))
        .await
        .unwrap();

    let seen = seen.lock().unwrap().clone();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&100));

    let processed = session.processed_wav().unwrap().unwrap();
    assert_eq!(processed.len(), 44 + 44100 * 2 * 2);

    // The live buffer is exactly what the encoded bytes decode to
    let live = session.buffer().unwrap().unwrap();
    assert_eq!(*live, decode_bytes(processed.to_vec(), Some("wav")).unwrap());

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.state, SessionState::Ready);
    assert_eq!(snapshot.progress, 100);
    assert_eq!(snapshot.intensity, 75.0);
    assert!(snapshot.processed);
}

#[tokio::test]
async fn test_second_render_is_refused() {
    let session = ready_session(3.0).await;
    session.select_region(0.0, 1.0).unwrap();

    let background = session.clone();
    let first = tokio::spawn(async move { background.render(|_| {}).await });

    while session.state().unwrap() != SessionState::Rendering {
        tokio::task::yield_now().await;
    }

    let err = session.render(|_| {}).await.unwrap_err();
    assert_eq!(err.error_code(), "RENDER_IN_PROGRESS");
    assert_eq!(session.state().unwrap(), SessionState::Rendering);

    first.await.unwrap().unwrap();
    assert_eq!(session.state().unwrap(), SessionState::Ready);
}

#[tokio::test]
async fn test_load_during_render_drops_old_result() {
    let session = ready_session(30.0).await;
    session.select_region(0.0, 1.0).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let background = session.clone();
    let old = tokio::spawn(async move {
        background
            .render(move |p| sink.lock().unwrap().push(p))
            .await
    });

    while session.state().unwrap() != SessionState::Rendering {
        tokio::task::yield_now().await;
    }
    session.load_bytes(tone_wav(0.2, 1), Some("wav")).await.unwrap();

    let err = old.await.unwrap().unwrap_err();
    assert_eq!(err.error_code(), "INVALID_STATE");

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.state, SessionState::Ready);
    assert_eq!(snapshot.progress, 0);
    assert!(!snapshot.processed);
    assert!(snapshot.region.is_none());
    assert!((snapshot.duration - 0.2).abs() < 1e-3);
    assert!(!seen.lock().unwrap().contains(&100));
}

#[tokio::test]
async fn test_failed_render_keeps_playable_buffer() {
    let config = Config {
        tuning: DenoiseTuning {
            gain_per_step: f32::MAX,
            ..Default::default()
        },
        ..Default::default()
    };
    let session = Session::new(config);
    session.load_bytes(tone_wav(0.5, 2), Some("wav")).await.unwrap();
    session.select_region(0.1, 0.2).unwrap();
    session.set_intensity(100.0).unwrap();
    let before = session.buffer().unwrap().unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let err = session
        .render(move |p| sink.lock().unwrap().push(p))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "RENDER_FAILED");
    assert_eq!(session.state().unwrap(), SessionState::Ready);
    assert!(Arc::ptr_eq(&before, &session.buffer().unwrap().unwrap()));
    assert!(session.processed_wav().unwrap().is_none());
    assert_eq!(
        session.last_error().unwrap().as_deref(),
        Some("Failed to process audio")
    );
    assert!(session.progress().unwrap() < 100);
    assert!(!seen.lock().unwrap().contains(&100));

    session.play().unwrap();
    assert_eq!(session.state().unwrap(), SessionState::Playing);
}

#[tokio::test]
async fn test_playback_refused_while_rendering() {
    let session = ready_session(2.0).await;
    session.select_region(0.0, 0.5).unwrap();

    let background = session.clone();
    let job = tokio::spawn(async move { background.render(|_| {}).await });

    while session.state().unwrap() != SessionState::Rendering {
        tokio::task::yield_now().await;
    }
    assert_eq!(session.play().unwrap_err().error_code(), "INVALID_STATE");

    job.await.unwrap().unwrap();
    session.play().unwrap();
    assert_eq!(session.state().unwrap(), SessionState::Playing);
}

#[tokio::test]
async fn test_no_region_leaves_buffer() {
    let session = ready_session(0.5).await;
    let before = session.buffer().unwrap().unwrap();

    let err = session.render(|_| {}).await.unwrap_err();

    assert_eq!(err.error_code(), "NO_REGION_SELECTED");
    assert_eq!(*session.buffer().unwrap().unwrap(), *before);
    assert!(session.processed_wav().unwrap().is_none());
}

#[tokio::test]
async fn test_new_load_clears_region_and_output() {
    let session = ready_session(0.5).await;
    session.select_region(0.1, 0.2).unwrap();
    session.render(|_| {}).await.unwrap();
    let first_fingerprint = session.fingerprint().unwrap();

    session.load_bytes(tone_wav(0.3, 1), Some("wav")).await.unwrap();

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.state, SessionState::Ready);
    assert!(snapshot.region.is_none());
    assert!(!snapshot.processed);
    assert_eq!(snapshot.progress, 0);
    assert_ne!(snapshot.fingerprint, first_fingerprint);
    assert_eq!(session.buffer().unwrap().unwrap().num_channels(), 1);
}

#[tokio::test]
async fn test_region_survives_render() {
    let session = ready_session(0.5).await;
    let region = session.select_region(0.2, 0.3).unwrap();

    session.render(|_| {}).await.unwrap();

    assert_eq!(session.region().unwrap(), Some(region));
}

#[tokio::test]
async fn test_decode_failure_then_recover() {
    let session = Session::default();
    let err = session.load_bytes(vec![0u8; 512], None).await.unwrap_err();

    assert_eq!(err.friendly_message(), "unable to load audio");
    assert_eq!(session.state().unwrap(), SessionState::Error);
    assert!(session.render(|_| {}).await.is_err());

    session.load_bytes(tone_wav(0.2, 2), Some("wav")).await.unwrap();
    assert_eq!(session.state().unwrap(), SessionState::Ready);
}

#[tokio::test]
async fn test_load_file_from_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("room.wav");
    write_wav(&generate_test_tone(100.0, 0.4, 16000, 1).unwrap(), &path).unwrap();

    let session = Session::new(Config::default());
    session.load_file(&path).await.unwrap();

    assert!((session.duration().unwrap() - 0.4).abs() < 1e-3);

    let missing = session.load_file(&dir.path().join("missing.wav")).await;
    assert_eq!(missing.unwrap_err().error_code(), "DECODE_FAILED");
    assert_eq!(session.state().unwrap(), SessionState::Error);
}

#[tokio::test]
async fn test_config_intensity_default() {
    let config = Config::from_json_str(r#"{"default_intensity": 20}"#).unwrap();
    let session = Session::new(config);
    assert_eq!(session.intensity().unwrap(), 20.0);
    assert_eq!(session.parameters().unwrap().highpass_hz, 60.0);
}
