//! Command line arguments

use clap::Parser;
use picshrink::{OptionsUpdate, OutputFormat, ProcessingOptions, ResizeOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "picshrink")]
#[command(about = "Compress and convert images, one by one or into a zip", long_about = None)]
pub struct Cli {
    /// Images to process
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format: jpeg, png, webp, gif, bmp, tiff or avif [default: webp]
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Output quality (1-100) [default: 85]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Maximum output width; enables resizing
    #[arg(long)]
    pub width: Option<u32>,

    /// Maximum output height; enables resizing
    #[arg(long)]
    pub height: Option<u32>,

    /// Directory results are written to
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Write a single zip archive instead of individual files
    #[arg(long)]
    pub zip: bool,
}

impl Cli {
    /// Flags that override the environment defaults
    pub fn options_update(&self) -> OptionsUpdate {
        let resize = (self.width.is_some() || self.height.is_some()).then_some(ResizeOptions {
            enabled: true,
            width: self.width,
            height: self.height,
        });

        OptionsUpdate {
            format: self.format,
            quality: self.quality,
            resize,
        }
    }

    pub fn options(&self, defaults: ProcessingOptions) -> ProcessingOptions {
        let mut options = defaults;
        options.merge(self.options_update());
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_pass_through() {
        let cli = Cli::parse_from(["picshrink", "a.jpg"]);
        assert_eq!(cli.options(ProcessingOptions::default()), ProcessingOptions::default());
        assert_eq!(cli.out_dir, PathBuf::from("."));
        assert!(!cli.zip);
    }

    #[test]
    fn test_flags_override() {
        let cli = Cli::parse_from([
            "picshrink", "--format", "jpg", "-q", "40", "--width", "800", "--zip", "a.png", "b.png",
        ]);
        let options = cli.options(ProcessingOptions::default());

        assert_eq!(cli.files.len(), 2);
        assert_eq!(options.format, OutputFormat::Jpeg);
        assert_eq!(options.quality, 40);
        assert_eq!(options.resize.max_dimension(), Some(800));
        assert!(cli.zip);
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        assert!(Cli::try_parse_from(["picshrink", "-q", "0", "a.jpg"]).is_err());
        assert!(Cli::try_parse_from(["picshrink", "--format", "heic", "a.jpg"]).is_err());
    }
}
