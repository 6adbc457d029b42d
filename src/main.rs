use clap::Parser;

use bdmv_autoencoder::{
    cli::{handle_commands, CliArgs},
    config::Config,
    processing::BatchProcessor,
    utils::{
        filesystem::ensure_dir,
        logging::{startup_subscriber, LOG_FILE_NAME},
        setup_logging, Error, FfmpegWrapper, Result,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    args.validate()?;

    if handle_commands(&args).await? {
        return Ok(());
    }

    let config = tracing::subscriber::with_default(
        startup_subscriber(args.get_log_level("info"), args.should_use_color()),
        || Config::load_with_fallback(args.config.as_deref()),
    )?;

    let log_file = match (&args.output, args.should_encode() && config.logging.write_log_file) {
        (Some(output), true) => {
            ensure_dir(output)?;
            Some(output.join(LOG_FILE_NAME))
        }
        _ => None,
    };

    setup_logging(
        args.get_log_level(&config.logging.level),
        config.logging.show_timestamps,
        config.logging.colored_output && args.should_use_color(),
        log_file.as_deref(),
    )?;

    let ffmpeg = FfmpegWrapper::from_config(&config.tools);
    ffmpeg
        .check_availability()
        .await
        .map_err(|e| Error::ffmpeg(format!("FFmpeg tools not available: {}", e)))?;

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| Error::validation("An input path is required"))?;
    let processor = BatchProcessor::new(&ffmpeg, &config);

    if args.analyze {
        return processor.analyze(input).await;
    }

    let output = args
        .output
        .as_deref()
        .ok_or_else(|| Error::validation("An output directory is required"))?;
    processor.run(input, output).await.map(|_| ())
}
