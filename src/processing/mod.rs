//! Batch orchestration
//!
//! Turns each discovered source into one encode: discs go through main
//! title selection and a concat manifest, loose files are used as-is. The
//! input is probed, HDR signalling is classified and turned into encoder
//! parameters, then ffmpeg runs under a progress monitor.

use crate::{
    analysis::MediaInfo,
    bdmv::{
        build_concat_manifest, derive_title_label, write_concat_manifest, DiscLayout,
        DiscThresholds, TitleDescriptor, TitleSelector,
    },
    config::Config,
    encoding::{select_tracks, EncodingOptions},
    hdr::{synthesize, EncoderFamily, EncoderParameterSet},
    utils::{
        discover_sources,
        filesystem::{ensure_dir, largest_file_with_extension},
        format_file_size, Error, FfmpegWrapper, MediaInput, ProgressMonitor, Result, Source,
    },
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const FALLBACK_TITLE: &str = "output";
const OUTPUT_EXTENSION: &str = "mkv";

/// A source resolved to something ffmpeg can open.
#[derive(Debug)]
pub struct PreparedSource {
    pub input: MediaInput,
    pub title: String,
    /// Selected playlist, for disc sources with a main title
    pub descriptor: Option<TitleDescriptor>,
    /// Temporary manifest to remove once the source is done
    pub manifest: Option<PathBuf>,
}

impl PreparedSource {
    pub fn cleanup(&self) {
        if let Some(manifest) = &self.manifest {
            match std::fs::remove_file(manifest) {
                Ok(()) => debug!("Removed concat manifest {}", manifest.display()),
                Err(e) => warn!("Failed to remove {}: {}", manifest.display(), e),
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub encoded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Output file name stem; falls back to "output" when `label` is blank.
pub fn output_title(label: &str) -> String {
    let title = label.trim();
    if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title.to_string()
    }
}

pub fn output_path(output_dir: &Path, title: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", output_title(title), OUTPUT_EXTENSION))
}

pub struct BatchProcessor<'a> {
    ffmpeg: &'a FfmpegWrapper,
    config: &'a Config,
    temp_dir: PathBuf,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(ffmpeg: &'a FfmpegWrapper, config: &'a Config) -> Self {
        Self {
            ffmpeg,
            config,
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, temp_dir: P) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Encodes every source under `input` into `output_dir`. Fails only
    /// when every source failed.
    pub async fn run(&self, input: &Path, output_dir: &Path) -> Result<BatchSummary> {
        let sources = discover_sources(input)?;
        info!("Found {} source(s) to process", sources.len());
        ensure_dir(output_dir)?;

        let mut summary = BatchSummary::default();
        for (index, source) in sources.iter().enumerate() {
            info!(
                "Processing source {}/{}: {}",
                index + 1,
                sources.len(),
                source.name()
            );

            match self.process_source(source, output_dir).await {
                Ok(output) => {
                    info!("Encoded {}", output.display());
                    summary.encoded.push(output);
                }
                Err(e) => {
                    error!("Failed to process {}: {}", source.path().display(), e);
                    summary.failed.push((source.path().to_path_buf(), e.to_string()));
                }
            }
        }

        info!(
            "Batch finished: {} encoded, {} failed",
            summary.encoded.len(),
            summary.failed.len()
        );
        for (path, reason) in &summary.failed {
            info!("  - {}: {}", path.display(), reason);
        }

        if summary.encoded.is_empty() && !summary.failed.is_empty() {
            return Err(Error::encoding("All sources failed to process"));
        }
        Ok(summary)
    }

    /// Resolves a source to an encoder input. Disc sources get their main
    /// title as a concat manifest, or their largest segment when no
    /// playlist qualifies.
    pub fn prepare(&self, source: &Source) -> Result<PreparedSource> {
        match source {
            Source::File(path) => Ok(PreparedSource {
                input: MediaInput::File(path.clone()),
                title: output_title(&source.name()),
                descriptor: None,
                manifest: None,
            }),
            Source::Disc(root) => {
                let layout = DiscLayout::new(root);
                let thresholds = DiscThresholds::from(&self.config.disc);
                let extension = thresholds.segment_extension.clone();
                let selector = TitleSelector::new(layout.clone(), thresholds);

                if let Some(descriptor) = selector.find_main_title()? {
                    let manifest = write_concat_manifest(&descriptor.items, &self.temp_dir)?;
                    debug!("Concat manifest written to {}", manifest.display());
                    return Ok(PreparedSource {
                        input: MediaInput::Concat(manifest.clone()),
                        title: output_title(&descriptor.title),
                        descriptor: Some(descriptor),
                        manifest: Some(manifest),
                    });
                }

                let segment = largest_file_with_extension(&layout.stream_dir, &extension)?
                    .ok_or_else(|| {
                        Error::analysis(format!(
                            "No playable title or .{} segment in {}",
                            extension,
                            root.display()
                        ))
                    })?;
                info!("No main title found, using largest segment {}", segment.display());
                Ok(PreparedSource {
                    input: MediaInput::File(segment),
                    title: output_title(&derive_title_label(root)),
                    descriptor: None,
                    manifest: None,
                })
            }
        }
    }

    async fn inspect(&self, prepared: &PreparedSource) -> Result<(MediaInfo, EncoderParameterSet)> {
        info!("Analyzing {}", prepared.input.path().display());
        let probe = self.ffmpeg.probe(&prepared.input).await?;
        let mut media = MediaInfo::from_probe(prepared.input.path(), &probe)?;

        if let Some(descriptor) = &prepared.descriptor {
            media.duration = descriptor.duration;
        }
        info!("HDR format: {}", media.hdr.summary());

        let family = EncoderFamily::from_encoder_name(&self.config.encoding.video_codec);
        let hdr_params = if self.config.encoding.preserve_hdr {
            synthesize(&media.hdr, family)
        } else {
            EncoderParameterSet::default()
        };
        if !hdr_params.is_empty() {
            debug!("HDR parameters: {}", hdr_params);
        }

        Ok((media, hdr_params))
    }

    async fn process_source(&self, source: &Source, output_dir: &Path) -> Result<PathBuf> {
        let prepared = self.prepare(source)?;
        let (media, hdr_params) = self.inspect(&prepared).await?;

        let tracks = select_tracks(&media, &self.config.encoding.preferred_languages);
        debug!(
            "Selected audio {:?}, subtitles {:?}",
            tracks.audio, tracks.subtitles
        );

        let output = output_path(output_dir, &prepared.title);
        let options = EncodingOptions::new(prepared.input.clone(), &output)
            .with_title(prepared.title.clone())
            .with_tracks(tracks)
            .with_hdr_params(hdr_params);
        let args = options.to_args(&self.config.encoding);

        info!("Starting encode of {} to {}", source.name(), output.display());
        info!("FFmpeg command: {} {}", self.ffmpeg.ffmpeg_path(), args.join(" "));

        let child = self.ffmpeg.start_encoding(&args)?;
        let mut monitor = ProgressMonitor::new(
            media.duration,
            &prepared.title,
            Duration::from_millis(self.config.progress.update_interval_ms),
        );
        let outcome = monitor.monitor_encoding(child).await?;

        if !outcome.status.success() {
            for line in &outcome.stderr_tail {
                error!("ffmpeg: {}", line);
            }
            return Err(Error::ffmpeg(format!(
                "ffmpeg exited with {}",
                outcome.status
            )));
        }

        if !output.exists() {
            return Err(Error::encoding(format!(
                "Expected output file {} was not created",
                output.display()
            )));
        }

        if let Ok(metadata) = std::fs::metadata(&output) {
            info!("Output size: {}", format_file_size(metadata.len()));
        }
        prepared.cleanup();
        Ok(output)
    }

    /// Prints what would be encoded for each source, without encoding.
    pub async fn analyze(&self, input: &Path) -> Result<()> {
        let sources = discover_sources(input)?;
        info!("Found {} source(s) to process", sources.len());

        for source in &sources {
            println!();
            println!("Source: {}", source.path().display());
            println!("{:-<60}", "");

            let prepared = match self.prepare(source) {
                Ok(prepared) => prepared,
                Err(e) => {
                    println!("  error: {}", e);
                    continue;
                }
            };

            println!("Title:    {}", prepared.title);
            if let Some(descriptor) = &prepared.descriptor {
                println!("Playlist: {}", descriptor.playlist);
                println!("Duration: {:.2}s", descriptor.duration);
                println!("Size:     {}", format_file_size(descriptor.size));
                println!("Manifest:");
                for line in build_concat_manifest(&descriptor.items).lines() {
                    println!("  {}", line);
                }
            } else {
                println!("Input:    {}", prepared.input.path().display());
            }

            match self.inspect(&prepared).await {
                Ok((media, hdr_params)) => {
                    println!("HDR:      {}", media.hdr.summary());
                    if !hdr_params.is_empty() {
                        println!("Params:   {}", hdr_params);
                    }
                }
                Err(e) => println!("  probe failed: {}", e),
            }

            prepared.cleanup();
        }

        Ok(())
    }
}
