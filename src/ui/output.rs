use crate::error::{BinSplitError, UserFriendlyError};
use crate::extractor::{binary_unit, ExtractionReport};
use crate::ui::log::{Log, LogLevel};
use console::{style, Emoji, Term};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const LOGGER_NAME: &str = "binsplit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "+ ");
static CROSS: Emoji = Emoji("❌ ", "x ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static SCISSORS: Emoji = Emoji("✂️  ", "> ");

/// Console logger and report printer.
///
/// Human mode styles records with `console`, plain mode follows the classic
/// `time - name - LEVEL - message` layout and JSON mode prints one object per
/// line on stderr, leaving stdout to the report. Error and critical records
/// always go to stderr.
pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    threshold: u8,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, threshold: u8) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported(),
            _ => false,
        };

        Self {
            mode,
            use_colors,
            threshold,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn print_user_friendly_error(&self, error: &BinSplitError) {
        self.write(LogLevel::Error, &error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "type": "suggestion",
                            "message": suggestion
                        })
                    );
                }
                OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
            }
        }
    }

    pub fn print_extraction_report(&self, report: &ExtractionReport) {
        match self.mode {
            OutputMode::Human => self.print_human_report(report),
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => self.print_plain_report(report),
        }
    }

    pub fn print_separator(&self) {
        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => println!("{}", "-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    fn print_human_record(&self, level: LogLevel, message: &str) {
        if !self.use_colors {
            let line = format!("{} - {}", level, message);
            match level {
                LogLevel::Error | LogLevel::Critical => eprintln!("{}", line),
                _ => println!("{}", line),
            }
            return;
        }

        match level {
            LogLevel::Debug => println!("  {}", style(message).dim()),
            LogLevel::Info => println!("{}{}", INFO, style(message).cyan()),
            LogLevel::Warning => println!("{}{}", WARNING, style(message).yellow().bold()),
            LogLevel::Error => eprintln!("{}{}", CROSS, style(message).red().bold()),
            LogLevel::Critical => eprintln!("{}{}", CROSS, style(message).red().bold().reverse()),
        }
    }

    fn print_plain_record(&self, level: LogLevel, message: &str) {
        let line = format!(
            "{} - {} - {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            LOGGER_NAME,
            level,
            message
        );

        match level {
            LogLevel::Error | LogLevel::Critical => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    fn print_json_record(&self, level: LogLevel, message: &str) {
        let record = serde_json::json!({
            "type": "log",
            "logger": LOGGER_NAME,
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        // stdout carries only the report in this mode
        eprintln!("{}", record);
    }

    fn print_human_report(&self, report: &ExtractionReport) {
        println!();
        self.print_separator();

        let headline = if report.dry_run {
            "Dry run completed, nothing was written"
        } else {
            "Binary split completed"
        };
        let emoji = if report.dry_run { SCISSORS } else { CHECKMARK };

        if self.use_colors {
            println!("{}{}", emoji, style(headline).green().bold());
        } else {
            println!("{}", headline);
        }

        println!();
        let value = |text: String| {
            if self.use_colors {
                style(text).cyan().bold().to_string()
            } else {
                text
            }
        };

        println!(
            "  Input:       {} ({})",
            report.input.display(),
            binary_unit(report.input_size)
        );
        println!("  Output:      {}", report.output_directory.display());
        println!("  Fragments:   {}", value(report.fragments.len().to_string()));
        println!("  Bytes:       {}", value(binary_unit(report.total_bytes())));
        println!("  Time taken:  {}", value(format_duration(report.duration)));

        if report.truncated_count() > 0 {
            println!("  Truncated:   {}", report.truncated_count());
        }

        if report.dry_run && !report.fragments.is_empty() {
            println!();
            for fragment in &report.fragments {
                println!(
                    "  {:<24} {:#010x} +{:#010x}  {}",
                    fragment.name,
                    fragment.offset,
                    fragment.length,
                    fragment.path.display()
                );
            }
        }

        self.print_separator();
    }

    fn print_plain_report(&self, report: &ExtractionReport) {
        if report.dry_run {
            println!("DRY RUN: nothing was written");
            for fragment in &report.fragments {
                println!(
                    "PLAN: {} offset={:#x} length={:#x} path={}",
                    fragment.name,
                    fragment.offset,
                    fragment.length,
                    fragment.path.display()
                );
            }
        } else {
            println!("COMPLETED: Binary split");
        }
        println!("Fragments: {}", report.fragments.len());
        println!("Size: {} bytes", report.total_bytes());
        println!("Duration: {:?}", report.duration);

        if report.truncated_count() > 0 {
            println!("Truncated: {}", report.truncated_count());
        }
    }
}

impl Log for OutputFormatter {
    fn threshold(&self) -> u8 {
        self.threshold
    }

    fn write(&self, level: LogLevel, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_record(level, message),
            OutputMode::Json => self.print_json_record(level, message),
            OutputMode::Plain => self.print_plain_record(level, message),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
