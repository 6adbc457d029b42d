use crate::{
    cli::CliArgs,
    config::{loader::CONFIG_FILE_NAME, Config},
    utils::{Error, Result},
};
use std::path::{Path, PathBuf};

/// Runs informational commands. Returns true when one ran and the
/// process should exit.
pub async fn handle_commands(args: &CliArgs) -> Result<bool> {
    if args.init_config {
        let path = args
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        init_config(&path)?;
        return Ok(true);
    }

    if args.validate_config {
        validate_config(args.config.as_deref())?;
        return Ok(true);
    }

    Ok(false)
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::validation(format!(
            "Refusing to overwrite existing config: {}",
            path.display()
        )));
    }

    Config::default().save(path)?;
    println!("✓ Default configuration written to {}", path.display());
    Ok(())
}

fn validate_config(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_with_fallback(config_path)?;

    match config_path {
        Some(path) => println!("✓ Configuration file is valid: {}", path.display()),
        None => println!("✓ Configuration is valid (using discovered/default config)"),
    }
    println!();

    println!("Configuration Summary:");
    println!("{:-<40}", "");
    println!("Video codec:        {}", config.encoding.video_codec);
    println!("Preset / CRF:       {} / {}", config.encoding.video_preset, config.encoding.video_crf);
    println!("Languages:          {}", config.encoding.preferred_languages.join(", "));
    println!("Preserve HDR:       {}", config.encoding.preserve_hdr);
    println!("Force 10-bit:       {}", config.encoding.force_10bit);
    println!("Min play-item:      {}s", config.disc.min_item_seconds);
    println!("Min feature length: {}s", config.disc.min_feature_seconds);
    println!("{:-<40}", "");

    Ok(())
}
