//! End-to-end tests for the adaptive delivery loop: ingest produces the
//! rendition ladder, the network class picks a starting tier, and telemetry
//! steers the tier for the next playback attempt.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reelkit_core::ReelkitConfig;
use reelkit_core::encoding::{
    CleanupOutcome, QualityLevel, SimulationEncoder, TranscodeJob, TranscodingOrchestrator,
};
use reelkit_core::playback::{
    ConnectivityReading, PlayerStatus, QualityDecisionEngine, classify, recommended_quality,
};

async fn write_source(dir: &Path, name: &str, bytes: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    tokio::fs::write(&path, vec![0u8; bytes]).await.unwrap();
    path
}

#[tokio::test]
async fn upload_to_renditions_end_to_end() {
    let temp_dir = tempfile::tempdir().unwrap();
    // 50 MB source clip
    let source = write_source(temp_dir.path(), "upload.mp4", 50 * 1024 * 1024).await;

    let orchestrator = TranscodingOrchestrator::new(
        Arc::new(SimulationEncoder::new()),
        ReelkitConfig::default(),
    );

    let job = TranscodeJob::new(&source, temp_dir.path(), "upload")
        .delete_original(true)
        .with_thumbnail(true);
    let outcome = orchestrator.transcode(&job, None).await.unwrap();

    // Exactly three renditions, each strictly smaller than the source
    for level in QualityLevel::ENCODE_ORDER {
        let rendition = outcome.renditions.get(level);
        assert!(rendition.path.exists());
        assert!(rendition.size_bytes < 50 * 1024 * 1024);
    }

    // Original path is reported unmodified, and the file itself is gone
    assert_eq!(outcome.original_path, source);
    assert_eq!(outcome.cleanup, CleanupOutcome::Deleted);
    assert!(!source.exists());

    assert!(outcome.reduction_percent() > 0.0);
    assert!(outcome.thumbnail_path.is_some());
}

#[tokio::test]
async fn network_hint_seeds_engine_and_manual_override_resets_session() {
    // A 3g reading seeds the session at medium quality
    let class = classify(ConnectivityReading::Cellular(Some(
        reelkit_core::playback::CellularGeneration::Cell3g,
    )));
    let initial = recommended_quality(class);
    assert_eq!(initial, QualityLevel::Medium);

    let engine = QualityDecisionEngine::new(initial, ReelkitConfig::default().playback);
    engine.begin_session();

    engine.on_status(PlayerStatus {
        is_buffering: true,
        is_loaded: true,
    });
    engine.on_status(PlayerStatus {
        is_buffering: false,
        is_loaded: true,
    });
    assert_eq!(engine.telemetry().stats.buffering_count, 1);

    // Explicit user choice bypasses telemetry and wipes the session
    engine.manual_override(QualityLevel::Low);
    assert_eq!(engine.current_quality(), QualityLevel::Low);

    let verdict = engine.telemetry();
    assert_eq!(verdict.stats.buffering_count, 0);
    assert!(verdict.stats.playback_duration < Duration::from_secs(1));
    assert!(!verdict.should_reduce);
    assert!(!verdict.should_increase);
}
