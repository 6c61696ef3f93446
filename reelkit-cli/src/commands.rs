//! CLI command implementations

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Subcommand;
use reelkit_core::ReelkitConfig;
use reelkit_core::encoding::{
    Encoder, FfmpegEncoder, JobProgressFn, JsonVideoStore, TranscodeJob, TranscodingOrchestrator,
    all_presets,
};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Transcode one video into the full rendition ladder
    Transcode {
        /// Source video file
        input: PathBuf,
        /// Output directory (defaults to the configured uploads directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Base filename for renditions (defaults to the input file stem)
        #[arg(long)]
        base: Option<String>,
        /// Delete the source file after full success
        #[arg(long)]
        delete_original: bool,
        /// Skip thumbnail extraction
        #[arg(long)]
        no_thumbnail: bool,
    },
    /// Extract a single thumbnail frame from a video
    Thumbnail {
        /// Source video file
        input: PathBuf,
        /// Output image path (defaults to `<input>_thumb.jpg`)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Timestamp offset in seconds
        #[arg(long, default_value = "1")]
        offset: u64,
    },
    /// Transcode all legacy videos lacking renditions
    Migrate {
        /// JSON video store file
        store: PathBuf,
        /// Directory holding the source video files
        #[arg(long)]
        media_root: Option<PathBuf>,
    },
    /// Print the quality preset table
    Presets,
}

/// Handle the CLI command
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let config = ReelkitConfig::from_env();
    let encoder = Arc::new(FfmpegEncoder::new(None, config.transcoding.clone()));

    match command {
        Commands::Transcode {
            input,
            output,
            base,
            delete_original,
            no_thumbnail,
        } => {
            transcode(
                config,
                encoder,
                input,
                output,
                base,
                delete_original,
                !no_thumbnail,
            )
            .await
        }
        Commands::Thumbnail {
            input,
            output,
            offset,
        } => thumbnail(encoder, input, output, offset).await,
        Commands::Migrate { store, media_root } => {
            migrate(config, encoder, store, media_root).await
        }
        Commands::Presets => {
            print_presets();
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn transcode(
    config: ReelkitConfig,
    encoder: Arc<FfmpegEncoder>,
    input: PathBuf,
    output: Option<PathBuf>,
    base: Option<String>,
    delete_original: bool,
    thumbnail: bool,
) -> anyhow::Result<()> {
    let output_dir = output.unwrap_or_else(|| config.storage.output_dir.clone());
    let base = match base {
        Some(base) => base,
        None => input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .context("input path has no file stem")?,
    };

    let orchestrator = TranscodingOrchestrator::new(encoder, config);
    if !orchestrator.encoder_available() {
        anyhow::bail!("ffmpeg not found in PATH; install it or set a custom binary path");
    }

    let job = TranscodeJob::new(&input, &output_dir, base)
        .delete_original(delete_original)
        .with_thumbnail(thumbnail);

    let progress: JobProgressFn = Arc::new(|level, percent| {
        tracing::info!("{level} rendition: {percent:.0}%");
    });

    let outcome = orchestrator.transcode(&job, Some(progress)).await?;

    println!("Transcode complete:");
    for preset in all_presets() {
        let rendition = outcome.renditions.get(preset.level);
        println!(
            "  {:>6}: {} ({} bytes)",
            preset.level.to_string(),
            rendition.path.display(),
            rendition.size_bytes
        );
    }
    if let Some(thumb) = &outcome.thumbnail_path {
        println!("  thumb : {}", thumb.display());
    }
    println!(
        "  original {} bytes -> {} bytes ({:.1}% reduction)",
        outcome.original_size,
        outcome.renditions.compressed_bytes(),
        outcome.reduction_percent()
    );

    Ok(())
}

async fn thumbnail(
    encoder: Arc<FfmpegEncoder>,
    input: PathBuf,
    output: Option<PathBuf>,
    offset: u64,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "thumbnail".to_string());
        input.with_file_name(format!("{stem}_thumb.jpg"))
    });

    let size = encoder
        .extract_thumbnail(&input, &output, Duration::from_secs(offset))
        .await?;

    println!("Thumbnail written: {} ({} bytes)", output.display(), size);
    Ok(())
}

async fn migrate(
    config: ReelkitConfig,
    encoder: Arc<FfmpegEncoder>,
    store_path: PathBuf,
    media_root: Option<PathBuf>,
) -> anyhow::Result<()> {
    let media_root = media_root.unwrap_or_else(|| config.storage.output_dir.clone());
    let store = JsonVideoStore::load(store_path)
        .await
        .context("failed to load video store")?;

    let orchestrator = TranscodingOrchestrator::new(encoder, config);
    if !orchestrator.encoder_available() {
        anyhow::bail!("ffmpeg not found in PATH; install it or set a custom binary path");
    }

    let report = orchestrator.migrate_existing(&store, &media_root).await?;

    println!(
        "Migration finished: {} migrated, {} skipped, {} failed",
        report.migrated.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for (id, reason) in &report.skipped {
        println!("  skipped {id}: {reason}");
    }
    for (id, reason) in &report.failed {
        println!("  failed  {id}: {reason}");
    }

    Ok(())
}

fn print_presets() {
    println!(
        "{:<8} {:<12} {:<10} {:<10} {:<4}",
        "tier", "resolution", "video", "audio", "crf"
    );
    for preset in all_presets() {
        println!(
            "{:<8} {:<12} {:<10} {:<10} {:<4}",
            preset.level.to_string(),
            preset.resolution(),
            format!("{}k", preset.video_bitrate_kbps),
            format!("{}k", preset.audio_bitrate_kbps),
            preset.crf
        );
    }
}
