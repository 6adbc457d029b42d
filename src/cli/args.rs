use crate::utils::{Error, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(name = "bdmv-encoder")]
#[command(about = "Finds the main title of ripped Blu-ray discs and encodes it with HDR metadata intact")]
#[command(long_about = "
Scans INPUT for ripped Blu-ray discs (directories containing BDMV/) and loose
.mkv/.mp4 files. For each disc the longest feature-length MPLS playlist is
joined into one input; HDR10, HDR10+, HLG and Dolby Vision signalling is
detected and carried into the encoder parameters. Results are written to
OUTPUT/<title>.mkv.

EXAMPLES:
  # Encode every disc and loose file under ~/Rips
  bdmv-encoder ~/Rips ~/Encoded

  # Show what would be encoded without running ffmpeg
  bdmv-encoder ~/Rips/Movie.2001 --analyze

  # Write a default config.yaml to edit
  bdmv-encoder --init-config
")]
pub struct CliArgs {
    /// Disc root, directory of discs/videos, or single video file
    #[arg(value_name = "INPUT", required_unless_present_any = ["init_config", "validate_config"])]
    pub input: Option<PathBuf>,

    /// Directory receiving the encoded files
    #[arg(
        value_name = "OUTPUT",
        required_unless_present_any = ["init_config", "validate_config", "analyze"]
    )]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Write a default configuration file and exit
    #[arg(long)]
    pub init_config: bool,

    /// Validate configuration file and exit
    #[arg(long)]
    pub validate_config: bool,

    /// Print the selected title, concat manifest and HDR parameters without encoding
    #[arg(long)]
    pub analyze: bool,
}

impl CliArgs {
    pub fn get_log_level<'a>(&self, config_level: &'a str) -> &'a str {
        if self.debug {
            "debug"
        } else {
            config_level
        }
    }

    pub fn should_use_color(&self) -> bool {
        !self.no_color
    }

    pub fn is_info_command(&self) -> bool {
        self.init_config || self.validate_config
    }

    pub fn should_encode(&self) -> bool {
        !self.is_info_command() && !self.analyze
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_info_command() {
            return Ok(());
        }

        let input = self
            .input
            .as_ref()
            .ok_or_else(|| Error::validation("An input path is required"))?;
        if !input.exists() {
            return Err(Error::validation(format!(
                "Input path does not exist: {}",
                input.display()
            )));
        }

        if self.should_encode() {
            match &self.output {
                Some(output) if output.is_file() => {
                    return Err(Error::validation(format!(
                        "Output must be a directory: {}",
                        output.display()
                    )))
                }
                Some(_) => {}
                None => return Err(Error::validation("An output directory is required")),
            }
        }

        Ok(())
    }
}
