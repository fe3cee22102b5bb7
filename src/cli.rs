use crate::config::{CliOverrides, Settings};
use crate::error::{BinSplitError, Result};
use crate::extractor::ShortReadPolicy;
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "binsplit")]
#[command(version = env!("CARGO_PKG_VERSION"), disable_version_flag = true)]
#[command(about = "Binary file process tools")]
#[command(
    long_about = "Splits a combined flash image into named partition files. The layout \
                  comes from an XML manifest of <bin name=\"..\"> entries, each holding a \
                  hexadecimal <offset> and <length>."
)]
#[command(after_help = "EXAMPLES:\n  \
    binsplit -i flash.bin -o out/ -c layout.xml\n  \
    binsplit -i flash.bin -o out/ -c layout.xml -l 20 --output-format plain\n  \
    binsplit -i flash.bin -o out/ -c layout.xml --dry-run\n  \
    binsplit --generate-settings --settings binsplit.toml")]
pub struct Cli {
    /// Binary file path
    #[arg(
        short,
        long,
        value_name = "PATH",
        required_unless_present_any = ["show_version", "generate_settings"]
    )]
    pub input: Option<PathBuf>,

    /// Output file path
    #[arg(
        short,
        long,
        value_name = "PATH",
        required_unless_present_any = ["show_version", "generate_settings"]
    )]
    pub output: Option<PathBuf>,

    /// Config file path
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Path to the XML manifest",
        required_unless_present_any = ["show_version", "generate_settings"]
    )]
    pub config: Option<PathBuf>,

    /// Show the current version
    #[arg(short = 'v', long = "version")]
    pub show_version: bool,

    /// Log level: 10-debug, 20-info, 30-warning, 40-error, 50-critical
    #[arg(short, long, value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(0..=50))]
    pub log: Option<u8>,

    /// Settings file path
    #[arg(short, long, value_name = "PATH", help = "Path to TOML settings file")]
    pub settings: Option<PathBuf>,

    /// Output format for logs and the final report
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Keep fragments that run past the end of the input, truncated
    #[arg(long, help = "Write truncated fragments instead of failing on short reads")]
    pub allow_short_read: bool,

    /// Skip the offset + length <= input size check
    #[arg(long)]
    pub no_bounds_check: bool,

    /// Dry run (show what would be written without writing)
    #[arg(long)]
    pub dry_run: bool,

    /// Generate sample settings file
    #[arg(long, help = "Write a sample settings file (to --settings or binsplit.toml)")]
    pub generate_settings: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

/// The three paths a run works on, made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: PathBuf,
}

impl Cli {
    pub fn load_settings(&self) -> Result<Settings> {
        let mut settings = Settings::load_with_defaults(self.settings.as_ref())?;

        settings.merge_with_cli_args(&self.create_cli_overrides());
        settings.validate()?;

        Ok(settings)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let short_read = self.allow_short_read.then_some(ShortReadPolicy::Truncate);
        let bounds_check = self.no_bounds_check.then_some(false);

        CliOverrides::new()
            .with_log_level(self.log)
            .with_format(self.output_format.map(OutputMode::from))
            .with_short_read(short_read)
            .with_bounds_check(bounds_check)
    }

    pub fn resolve_paths(&self) -> Result<ResolvedPaths> {
        Ok(ResolvedPaths {
            input: absolute_path("--input", self.input.as_deref())?,
            output: absolute_path("--output", self.output.as_deref())?,
            config: absolute_path("--config", self.config.as_deref())?,
        })
    }

    pub fn settings_output_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::config::DEFAULT_SETTINGS_PATHS[0]))
    }
}

fn absolute_path(flag: &str, path: Option<&Path>) -> Result<PathBuf> {
    let path = path.ok_or_else(|| BinSplitError::Settings {
        message: format!("{} is required", flag),
    })?;

    if path.as_os_str().is_empty() {
        return Err(BinSplitError::Settings {
            message: format!("{} must not be empty", flag),
        });
    }

    Ok(std::path::absolute(path)?)
}
