pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod manifest;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat, ResolvedPaths};
pub use config::{CliOverrides, ExtractConfig, LoggingConfig, Settings};
pub use error::{BinSplitError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    binary_unit, ExtractedFragment, ExtractionReport, FragmentExtractor, OutputManager,
    ShortReadPolicy,
};
pub use manifest::{FragmentDescriptor, ManifestParser};
pub use ui::{CaptureLog, Log, LogLevel, NullLog, OutputFormatter, OutputMode};

use std::path::Path;

/// Main library interface: one manifest parse followed by one extraction.
pub struct BinSplit {
    settings: Settings,
    output_formatter: OutputFormatter,
}

impl BinSplit {
    pub fn new(settings: Settings) -> Self {
        let output_formatter =
            OutputFormatter::new(settings.logging.format, settings.logging.level);

        Self {
            settings,
            output_formatter,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let settings = cli_args.load_settings()?;
        let binsplit = Self::new(settings);

        if cli_args.settings.is_none() {
            if let Some(path) = Settings::discovered_path() {
                binsplit
                    .output_formatter
                    .debug(&format!("using settings from {}", path.display()));
            }
        }

        Ok(binsplit)
    }

    /// Parse the manifest and write every fragment.
    pub fn run(&self, paths: &ResolvedPaths) -> Result<ExtractionReport> {
        self.log_paths(paths);
        let fragments = manifest::parse(&paths.config, &self.output_formatter);
        self.extractor()
            .extract(&paths.input, &paths.output, &fragments)
    }

    /// Parse the manifest and validate it against the input without writing.
    pub fn plan(&self, paths: &ResolvedPaths) -> Result<ExtractionReport> {
        self.log_paths(paths);
        let fragments = manifest::parse(&paths.config, &self.output_formatter);
        self.extractor().plan(&paths.input, &paths.output, &fragments)
    }

    fn extractor(&self) -> FragmentExtractor<'_> {
        FragmentExtractor::new(&self.output_formatter)
            .with_short_read_policy(self.settings.extract.short_read)
            .with_bounds_check(self.settings.extract.bounds_check)
    }

    fn log_paths(&self, paths: &ResolvedPaths) {
        let log = &self.output_formatter;
        log.info(&format!("Binary Inputs path = {}", paths.input.display()));
        log.info(&format!("Binary Output Path = {}", paths.output.display()));
        log.info(&format!("Binary Config Path = {}", paths.config.display()));
    }

    /// Generate sample settings file
    pub fn generate_sample_settings<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Settings::default().save_to_file(output_path)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &BinSplitError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Split `input` per the manifest at `config` with default settings.
///
/// Manifest problems degrade to an empty run, reported through `log`.
pub fn split_image(
    input: &Path,
    output: &Path,
    config: &Path,
    log: &dyn Log,
) -> Result<ExtractionReport> {
    let fragments = manifest::parse(config, log);
    FragmentExtractor::new(log).extract(input, output, &fragments)
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"<root>
  <bin name="boot.bin">
    <offset>0x0</offset>
    <length>0x1000</length>
  </bin>
  <bin name="app.bin">
    <offset>0x1000</offset>
    <length>0x1F000</length>
  </bin>
</root>"#;

    fn fixture(dir: &Path) -> (ResolvedPaths, Vec<u8>) {
        let data: Vec<u8> = (0..0x20000u32).map(|i| (i % 253) as u8).collect();
        let input = dir.join("flash.bin");
        let config = dir.join("layout.xml");
        fs::write(&input, &data).unwrap();
        fs::write(&config, MANIFEST).unwrap();

        let paths = ResolvedPaths {
            input,
            output: dir.join("out"),
            config,
        };
        (paths, data)
    }

    fn quiet_settings() -> Settings {
        let mut settings = Settings::default();
        settings.logging.level = LogLevel::Critical.as_u8();
        settings
    }

    #[test]
    fn test_end_to_end_split() {
        let temp_dir = TempDir::new().unwrap();
        let (paths, data) = fixture(temp_dir.path());

        let report = BinSplit::new(quiet_settings()).run(&paths).unwrap();

        assert_eq!(report.fragments.len(), 2);
        let boot = fs::read(paths.output.join("boot.bin")).unwrap();
        let app = fs::read(paths.output.join("app.bin")).unwrap();
        assert_eq!(boot.len(), 4096);
        assert_eq!(app.len(), 126976);
        assert_eq!(boot, &data[..0x1000]);
        assert_eq!(app, &data[0x1000..]);
    }

    #[test]
    fn test_plan_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let (paths, _) = fixture(temp_dir.path());

        let report = BinSplit::new(quiet_settings()).plan(&paths).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.total_bytes(), 0x20000);
        assert!(!paths.output.exists());
    }

    #[test]
    fn test_split_image_with_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let (paths, _) = fixture(temp_dir.path());
        let log = CaptureLog::default();

        let report = split_image(
            &paths.input,
            &paths.output,
            &temp_dir.path().join("missing.xml"),
            &log,
        )
        .unwrap();

        assert!(report.fragments.is_empty());
        assert!(!paths.output.exists());
        assert!(log.contains(LogLevel::Warning, "does not exist"));
    }

    #[test]
    fn test_sample_settings_generation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("binsplit.toml");

        BinSplit::generate_sample_settings(&path).unwrap();

        let loaded = Settings::load_from_file(&path).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_version_info() {
        assert_eq!(version_info(), "0.1.2");
    }
}
