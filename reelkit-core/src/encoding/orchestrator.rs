//! Transcoding orchestration for one uploaded video
//!
//! Drives the encoder across all presets in a fixed order (high, medium, low),
//! measures size reduction, and manages the original-file lifecycle. A job is
//! all-or-nothing: any preset failure fails the job, partial outputs are
//! removed best-effort, and the original is never deleted on failure.
//!
//! Also provides the batch migration mode for legacy videos lacking
//! renditions, with per-item failure isolation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use uuid::Uuid;

use super::encoder::{EncodeError, EncodedRendition, Encoder, ProgressFn};
use super::presets::{QualityLevel, all_presets};
use super::store::{RenditionUrls, StoreError, VideoStore};
use crate::config::ReelkitConfig;

/// Errors that can fail a transcode job
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Source file not found: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Encoding {level} rendition failed: {source}")]
    PresetFailed {
        level: QualityLevel,
        #[source]
        source: EncodeError,
    },

    #[error("Transcoding service is shutting down")]
    ShuttingDown,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Unique identifier for transcode jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One transcode job for a single source video
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub id: JobId,
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub base_filename: String,
    /// Remove the source file after full success
    pub delete_original: bool,
    /// Extract a still thumbnail alongside the renditions
    pub thumbnail: bool,
}

impl TranscodeJob {
    pub fn new(
        source_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        base_filename: impl Into<String>,
    ) -> Self {
        Self {
            id: JobId::new(),
            source_path: source_path.into(),
            output_dir: output_dir.into(),
            base_filename: base_filename.into(),
            delete_original: false,
            thumbnail: false,
        }
    }

    pub fn delete_original(mut self, delete: bool) -> Self {
        self.delete_original = delete;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: bool) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    /// Rendition output path for one tier: `<dir>/<base>_<tier>.mp4`
    pub fn rendition_path(&self, level: QualityLevel) -> PathBuf {
        self.output_dir
            .join(format!("{}{}.mp4", self.base_filename, level.suffix()))
    }

    /// Thumbnail output path: `<dir>/<base>_thumb.jpg`
    pub fn thumbnail_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_thumb.jpg", self.base_filename))
    }
}

/// Outcome of the secondary original-file cleanup step.
///
/// Decoupled from job success: a failed delete is logged, not fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Deletion was not requested
    Retained,
    /// Source file removed after full success
    Deleted,
    /// Deletion was requested but failed
    Failed { reason: String },
}

/// All three renditions of a completed job
#[derive(Debug, Clone)]
pub struct RenditionSet {
    pub high: EncodedRendition,
    pub medium: EncodedRendition,
    pub low: EncodedRendition,
}

impl RenditionSet {
    pub fn get(&self, level: QualityLevel) -> &EncodedRendition {
        match level {
            QualityLevel::High => &self.high,
            QualityLevel::Medium => &self.medium,
            QualityLevel::Low => &self.low,
        }
    }

    /// Total compressed bytes across all tiers
    pub fn compressed_bytes(&self) -> u64 {
        self.high.size_bytes + self.medium.size_bytes + self.low.size_bytes
    }

    /// Public URLs for the renditions under `prefix`
    pub fn urls(&self, prefix: &str) -> RenditionUrls {
        let url_for = |rendition: &EncodedRendition| {
            let filename = rendition
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{prefix}/{filename}")
        };

        RenditionUrls {
            high: url_for(&self.high),
            medium: url_for(&self.medium),
            low: url_for(&self.low),
        }
    }
}

/// Result of a successful transcode job
#[derive(Debug, Clone)]
pub struct TranscodeOutcome {
    pub job_id: JobId,
    pub renditions: RenditionSet,
    /// Source path, unmodified; the file itself may have been removed
    /// depending on `cleanup`
    pub original_path: PathBuf,
    pub original_size: u64,
    pub thumbnail_path: Option<PathBuf>,
    pub cleanup: CleanupOutcome,
    pub processing_time: Duration,
}

impl TranscodeOutcome {
    /// Size reduction as a fraction of the original: `1 - compressed/original`.
    /// Clamped at zero for degenerate inputs.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        let ratio = self.renditions.compressed_bytes() as f64 / self.original_size as f64;
        ((1.0 - ratio) * 100.0).max(0.0)
    }
}

/// Per-preset progress notification: quality level plus percent complete
pub type JobProgressFn = Arc<dyn Fn(QualityLevel, f64) + Send + Sync>;

/// Summary of one batch migration run
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Records transcoded and persisted
    pub migrated: Vec<String>,
    /// Records skipped because the source file is missing on disk
    pub skipped: Vec<(String, String)>,
    /// Records whose transcode or persist step failed
    pub failed: Vec<(String, String)>,
}

impl MigrationReport {
    pub fn total_processed(&self) -> usize {
        self.migrated.len() + self.skipped.len() + self.failed.len()
    }
}

/// Drives the encoder across all presets for one video and exposes the
/// batch-migration mode for legacy content.
///
/// Presets within a job encode sequentially; distinct jobs may run
/// concurrently, bounded by a fixed-size permit pool.
pub struct TranscodingOrchestrator {
    encoder: Arc<dyn Encoder>,
    config: ReelkitConfig,
    job_limiter: Arc<Semaphore>,
}

impl TranscodingOrchestrator {
    pub fn new(encoder: Arc<dyn Encoder>, config: ReelkitConfig) -> Self {
        let job_limiter = Arc::new(Semaphore::new(config.transcoding.max_concurrent_jobs));

        Self {
            encoder,
            config,
            job_limiter,
        }
    }

    /// Transcode one source video into all three renditions.
    ///
    /// Either produces exactly three renditions (and deletes the original
    /// when requested), or fails with no persisted renditions and the
    /// original retained.
    ///
    /// # Errors
    /// - `TranscodeError::SourceMissing` - Source file does not exist
    /// - `TranscodeError::PresetFailed` - A rendition encode failed; the
    ///   error names the failing preset
    pub async fn transcode(
        &self,
        job: &TranscodeJob,
        progress: Option<JobProgressFn>,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let _permit = self
            .job_limiter
            .acquire()
            .await
            .map_err(|_| TranscodeError::ShuttingDown)?;

        let started_at = std::time::Instant::now();

        if !tokio::fs::try_exists(&job.source_path).await.unwrap_or(false) {
            return Err(TranscodeError::SourceMissing {
                path: job.source_path.clone(),
            });
        }

        tokio::fs::create_dir_all(&job.output_dir).await?;
        let original_size = tokio::fs::metadata(&job.source_path).await?.len();

        tracing::info!(
            "Starting transcode job {} for {} ({} bytes)",
            job.id,
            job.source_path.display(),
            original_size
        );

        let mut completed: Vec<EncodedRendition> = Vec::with_capacity(3);
        let mut compressed_total: u64 = 0;

        for preset in all_presets() {
            let output = job.rendition_path(preset.level);
            let per_preset_progress: Option<ProgressFn> = progress.as_ref().map(|callback| {
                let callback = Arc::clone(callback);
                let level = preset.level;
                Arc::new(move |percent: f64| callback(level, percent)) as ProgressFn
            });

            match self
                .encoder
                .encode_rendition(&job.source_path, &output, preset, per_preset_progress)
                .await
            {
                Ok(rendition) => {
                    compressed_total += rendition.size_bytes;
                    tracing::info!(
                        "Job {}: {} rendition done ({} bytes, {:.1}% of original so far)",
                        job.id,
                        preset.level,
                        rendition.size_bytes,
                        compressed_total as f64 / original_size.max(1) as f64 * 100.0
                    );
                    completed.push(rendition);
                }
                Err(source) => {
                    tracing::error!(
                        "Job {}: {} rendition failed, aborting job: {}",
                        job.id,
                        preset.level,
                        source
                    );
                    // The failing preset may have left a truncated file too
                    let _ = tokio::fs::remove_file(&output).await;
                    self.cleanup_partial(&completed).await;
                    return Err(TranscodeError::PresetFailed {
                        level: preset.level,
                        source,
                    });
                }
            }
        }

        // Encode order is high, medium, low
        let mut iter = completed.into_iter();
        let renditions = RenditionSet {
            high: iter.next().expect("three renditions on success"),
            medium: iter.next().expect("three renditions on success"),
            low: iter.next().expect("three renditions on success"),
        };

        // Thumbnail failure never affects rendition success
        let thumbnail_path = if job.thumbnail {
            let thumb = job.thumbnail_path();
            match self
                .encoder
                .extract_thumbnail(&job.source_path, &thumb, self.config.transcoding.thumbnail_offset)
                .await
            {
                Ok(size) => {
                    tracing::debug!("Job {}: thumbnail extracted ({} bytes)", job.id, size);
                    Some(thumb)
                }
                Err(e) => {
                    tracing::warn!("Job {}: thumbnail extraction failed: {}", job.id, e);
                    None
                }
            }
        } else {
            None
        };

        let cleanup = if job.delete_original {
            match tokio::fs::remove_file(&job.source_path).await {
                Ok(()) => CleanupOutcome::Deleted,
                Err(e) => {
                    tracing::warn!(
                        "Job {}: failed to delete original {}: {}",
                        job.id,
                        job.source_path.display(),
                        e
                    );
                    CleanupOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        } else {
            CleanupOutcome::Retained
        };

        let outcome = TranscodeOutcome {
            job_id: job.id,
            renditions,
            original_path: job.source_path.clone(),
            original_size,
            thumbnail_path,
            cleanup,
            processing_time: started_at.elapsed(),
        };

        tracing::info!(
            "Job {} completed: {} -> {} bytes ({:.1}% reduction) in {:.2}s",
            job.id,
            original_size,
            outcome.renditions.compressed_bytes(),
            outcome.reduction_percent(),
            outcome.processing_time.as_secs_f64()
        );

        Ok(outcome)
    }

    /// Remove renditions written before a mid-job failure. Best effort only.
    async fn cleanup_partial(&self, completed: &[EncodedRendition]) {
        for rendition in completed {
            if let Err(e) = tokio::fs::remove_file(&rendition.path).await {
                tracing::warn!(
                    "Failed to remove partial {} rendition {}: {}",
                    rendition.level,
                    rendition.path.display(),
                    e
                );
            }
        }
    }

    /// Batch migration for legacy videos lacking renditions.
    ///
    /// Selects all records with a source URL and no high rendition URL,
    /// transcodes each, and persists the rendition URLs. One video's
    /// failure never aborts the batch; originals are retained.
    ///
    /// # Errors
    /// - `StoreError` - Only when the initial selection query fails;
    ///   per-item errors land in the report instead
    pub async fn migrate_existing(
        &self,
        store: &dyn VideoStore,
        media_root: &Path,
    ) -> Result<MigrationReport, StoreError> {
        let pending = store.videos_missing_renditions().await?;
        tracing::info!("Migration: {} videos without renditions", pending.len());

        let mut report = MigrationReport::default();

        for record in pending {
            let Some(filename) = record.source_filename() else {
                tracing::warn!("Migration: video {} has no usable source URL", record.id);
                report
                    .skipped
                    .push((record.id.clone(), "unusable source URL".to_string()));
                continue;
            };

            let source_path = media_root.join(filename);
            if !tokio::fs::try_exists(&source_path).await.unwrap_or(false) {
                tracing::warn!(
                    "Migration: source file missing for video {}: {}",
                    record.id,
                    source_path.display()
                );
                report.skipped.push((
                    record.id.clone(),
                    format!("source file missing: {}", source_path.display()),
                ));
                continue;
            }

            let base = Path::new(filename)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| filename.to_string());

            let job = TranscodeJob::new(&source_path, media_root, base);

            match self.transcode(&job, None).await {
                Ok(outcome) => {
                    let urls = outcome.renditions.urls(self.config.storage.url_prefix);
                    match store.update_renditions(&record.id, &urls).await {
                        Ok(()) => {
                            tracing::info!("Migration: video {} migrated", record.id);
                            report.migrated.push(record.id.clone());
                        }
                        Err(e) => {
                            tracing::error!(
                                "Migration: failed to persist renditions for video {}: {}",
                                record.id,
                                e
                            );
                            report.failed.push((record.id.clone(), e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Migration: transcode failed for video {}: {}", record.id, e);
                    report.failed.push((record.id.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            "Migration finished: {} migrated, {} skipped, {} failed",
            report.migrated.len(),
            report.skipped.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Check whether the underlying encoding engine is usable
    pub fn encoder_available(&self) -> bool {
        self.encoder.is_available()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::tempdir;
    use tokio_test::assert_ok;

    use super::*;
    use crate::encoding::encoder::SimulationEncoder;
    use crate::encoding::store::{JsonVideoStore, VideoRecord};

    fn orchestrator_with(encoder: SimulationEncoder) -> TranscodingOrchestrator {
        TranscodingOrchestrator::new(Arc::new(encoder), ReelkitConfig::default())
    }

    async fn write_source(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, vec![0u8; bytes]).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_full_success_produces_three_renditions_and_deletes_original() {
        let temp_dir = tempdir().unwrap();
        let source = write_source(temp_dir.path(), "clip.mp4", 50 * 1024).await;

        let orchestrator = orchestrator_with(SimulationEncoder::new());
        let job = TranscodeJob::new(&source, temp_dir.path(), "clip").delete_original(true);

        let outcome = orchestrator.transcode(&job, None).await.unwrap();

        assert_eq!(outcome.original_size, 50 * 1024);
        assert_eq!(outcome.original_path, source);
        assert_eq!(outcome.cleanup, CleanupOutcome::Deleted);
        assert!(!source.exists());

        for level in QualityLevel::ENCODE_ORDER {
            let rendition = outcome.renditions.get(level);
            assert_eq!(rendition.level, level);
            assert!(rendition.path.exists());
            assert!(rendition.size_bytes < outcome.original_size);
        }
        assert_eq!(
            outcome.renditions.high.path,
            temp_dir.path().join("clip_high.mp4")
        );
        assert_eq!(
            outcome.renditions.medium.path,
            temp_dir.path().join("clip_medium.mp4")
        );
        assert_eq!(
            outcome.renditions.low.path,
            temp_dir.path().join("clip_low.mp4")
        );

        assert!(outcome.reduction_percent() >= 0.0);
    }

    #[tokio::test]
    async fn test_preset_failure_aborts_job_and_cleans_partial_outputs() {
        let temp_dir = tempdir().unwrap();
        let source = write_source(temp_dir.path(), "clip.mp4", 50 * 1024).await;

        // High succeeds, medium fails: the high rendition must be removed
        let orchestrator =
            orchestrator_with(SimulationEncoder::new().failing_on(QualityLevel::Medium));
        let job = TranscodeJob::new(&source, temp_dir.path(), "clip").delete_original(true);

        let err = orchestrator.transcode(&job, None).await.unwrap_err();
        match err {
            TranscodeError::PresetFailed { level, .. } => {
                assert_eq!(level, QualityLevel::Medium);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(source.exists(), "original must survive a failed job");
        assert!(!temp_dir.path().join("clip_high.mp4").exists());
        assert!(!temp_dir.path().join("clip_medium.mp4").exists());
        assert!(!temp_dir.path().join("clip_low.mp4").exists());
    }

    #[tokio::test]
    async fn test_original_retained_when_deletion_not_requested() {
        let temp_dir = tempdir().unwrap();
        let source = write_source(temp_dir.path(), "clip.mp4", 10 * 1024).await;

        let orchestrator = orchestrator_with(SimulationEncoder::new());
        let job = TranscodeJob::new(&source, temp_dir.path(), "clip");

        let outcome = orchestrator.transcode(&job, None).await.unwrap();
        assert_eq!(outcome.cleanup, CleanupOutcome::Retained);
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_failed_original_deletion_does_not_fail_job() {
        let temp_dir = tempdir().unwrap();

        // A directory at the source path: readable like a file for metadata,
        // but unlink refuses it, so only the cleanup step can fail
        let source = temp_dir.path().join("clip.mp4");
        tokio::fs::create_dir(&source).await.unwrap();

        let out_dir = temp_dir.path().join("renditions");
        let orchestrator = orchestrator_with(SimulationEncoder::new());
        let job = TranscodeJob::new(&source, &out_dir, "clip").delete_original(true);

        let outcome = orchestrator.transcode(&job, None).await.unwrap();

        assert!(matches!(outcome.cleanup, CleanupOutcome::Failed { .. }));
        assert!(source.exists(), "source survives the failed deletion");
        for level in QualityLevel::ENCODE_ORDER {
            assert!(outcome.renditions.get(level).path.exists());
        }
    }

    #[tokio::test]
    async fn test_missing_source_fails_before_encoding() {
        let temp_dir = tempdir().unwrap();
        let orchestrator = orchestrator_with(SimulationEncoder::new());
        let job = TranscodeJob::new(temp_dir.path().join("absent.mp4"), temp_dir.path(), "absent");

        let err = orchestrator.transcode(&job, None).await.unwrap_err();
        assert!(matches!(err, TranscodeError::SourceMissing { .. }));
    }

    #[tokio::test]
    async fn test_thumbnail_failure_does_not_fail_job() {
        let temp_dir = tempdir().unwrap();
        let source = write_source(temp_dir.path(), "clip.mp4", 10 * 1024).await;

        let orchestrator = orchestrator_with(SimulationEncoder::new().failing_thumbnail());
        let job = TranscodeJob::new(&source, temp_dir.path(), "clip").with_thumbnail(true);

        let outcome = orchestrator.transcode(&job, None).await.unwrap();
        assert!(outcome.thumbnail_path.is_none());
        assert!(outcome.renditions.high.path.exists());
    }

    #[tokio::test]
    async fn test_thumbnail_extracted_on_request() {
        let temp_dir = tempdir().unwrap();
        let source = write_source(temp_dir.path(), "clip.mp4", 10 * 1024).await;

        let orchestrator = orchestrator_with(SimulationEncoder::new());
        let job = TranscodeJob::new(&source, temp_dir.path(), "clip").with_thumbnail(true);

        let outcome = orchestrator.transcode(&job, None).await.unwrap();
        let thumb = outcome.thumbnail_path.unwrap();
        assert_eq!(thumb, temp_dir.path().join("clip_thumb.jpg"));
        assert!(thumb.exists());
    }

    #[tokio::test]
    async fn test_progress_reported_per_preset() {
        let temp_dir = tempdir().unwrap();
        let source = write_source(temp_dir.path(), "clip.mp4", 10 * 1024).await;

        let seen: Arc<Mutex<Vec<(QualityLevel, f64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: JobProgressFn = Arc::new(move |level, percent| {
            sink.lock().unwrap().push((level, percent));
        });

        let orchestrator = orchestrator_with(SimulationEncoder::new());
        let job = TranscodeJob::new(&source, temp_dir.path(), "clip");
        orchestrator.transcode(&job, Some(progress)).await.unwrap();

        let seen = seen.lock().unwrap();
        for level in QualityLevel::ENCODE_ORDER {
            assert!(seen.contains(&(level, 100.0)), "{level} never completed");
        }
    }

    #[tokio::test]
    async fn test_migration_isolates_missing_source() {
        let temp_dir = tempdir().unwrap();
        let media_root = temp_dir.path().join("uploads");
        tokio::fs::create_dir_all(&media_root).await.unwrap();

        write_source(&media_root, "v1.mp4", 8 * 1024).await;
        write_source(&media_root, "v3.mp4", 8 * 1024).await;
        // v2 has a record but no file on disk

        let record = |id: &str| VideoRecord {
            id: id.to_string(),
            source_url: Some(format!("/uploads/videos/{id}.mp4")),
            video_url_high: None,
            video_url_medium: None,
            video_url_low: None,
        };
        let store = JsonVideoStore::create(
            temp_dir.path().join("videos.json"),
            vec![record("v1"), record("v2"), record("v3")],
        )
        .await
        .unwrap();

        let orchestrator = orchestrator_with(SimulationEncoder::new());
        let report = orchestrator
            .migrate_existing(&store, &media_root)
            .await
            .unwrap();

        assert_eq!(report.migrated, vec!["v1".to_string(), "v3".to_string()]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "v2");
        assert!(report.failed.is_empty());
        assert_eq!(report.total_processed(), 3);

        // Exactly N-1 records updated, with the URL convention applied
        let records = store.records();
        let v1 = records.iter().find(|r| r.id == "v1").unwrap();
        assert_eq!(
            v1.video_url_high.as_deref(),
            Some("/uploads/videos/v1_high.mp4")
        );
        assert_eq!(
            v1.video_url_low.as_deref(),
            Some("/uploads/videos/v1_low.mp4")
        );
        let v2 = records.iter().find(|r| r.id == "v2").unwrap();
        assert!(v2.video_url_high.is_none());

        // Migration never deletes legacy originals
        assert!(media_root.join("v1.mp4").exists());
        assert!(media_root.join("v3.mp4").exists());
    }

    #[tokio::test]
    async fn test_migration_isolates_transcode_failure() {
        let temp_dir = tempdir().unwrap();
        let media_root = temp_dir.path().join("uploads");
        tokio::fs::create_dir_all(&media_root).await.unwrap();
        write_source(&media_root, "v1.mp4", 8 * 1024).await;
        write_source(&media_root, "v2.mp4", 8 * 1024).await;

        let record = |id: &str| VideoRecord {
            id: id.to_string(),
            source_url: Some(format!("/uploads/videos/{id}.mp4")),
            video_url_high: None,
            video_url_medium: None,
            video_url_low: None,
        };
        let store = JsonVideoStore::create(
            temp_dir.path().join("videos.json"),
            vec![record("v1"), record("v2")],
        )
        .await
        .unwrap();

        // Every transcode fails on the low preset; the batch still visits
        // every record
        let orchestrator =
            orchestrator_with(SimulationEncoder::new().failing_on(QualityLevel::Low));
        let report = orchestrator
            .migrate_existing(&store, &media_root)
            .await
            .unwrap();

        assert!(report.migrated.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(store.videos_missing_renditions().await.unwrap().len() == 2);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_share_the_orchestrator() {
        let temp_dir = tempdir().unwrap();
        let orchestrator = Arc::new(orchestrator_with(SimulationEncoder::new()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let source = write_source(temp_dir.path(), &format!("clip{i}.mp4"), 4 * 1024).await;
            let orchestrator = Arc::clone(&orchestrator);
            let output_dir = temp_dir.path().to_path_buf();
            handles.push(tokio::spawn(async move {
                let job = TranscodeJob::new(source, output_dir, format!("clip{i}"));
                orchestrator.transcode(&job, None).await
            }));
        }

        for handle in handles {
            tokio_test::assert_ok!(handle.await.unwrap());
        }
    }
}
