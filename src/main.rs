use binsplit::{BinSplit, BinSplitError, Cli, OutputFormatter, OutputMode, UserFriendlyError};
use clap::Parser;
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle special commands first
    if cli.show_version {
        println!("binsplit {}", binsplit::version_info());
        return 0;
    }

    if cli.generate_settings {
        return handle_generate_settings(&cli);
    }

    let binsplit = match BinSplit::from_cli(&cli) {
        Ok(binsplit) => binsplit,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let paths = match cli.resolve_paths() {
        Ok(paths) => paths,
        Err(e) => {
            binsplit.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    let outcome = if cli.dry_run {
        binsplit.plan(&paths)
    } else {
        binsplit.run(&paths)
    };

    match outcome {
        Ok(report) => {
            binsplit.output_formatter().print_extraction_report(&report);
            0
        }
        Err(e) => {
            binsplit.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

/// Map error types to process exit codes.
fn exit_code_for(error: &BinSplitError) -> i32 {
    match error {
        BinSplitError::InputMissing { .. } => 3,
        BinSplitError::InputUnreadable { .. } => 4,
        BinSplitError::ShortRead { .. } | BinSplitError::OutOfBounds { .. } => 5,
        BinSplitError::OutputWrite { .. } => 6,
        _ => 1,
    }
}

fn handle_generate_settings(cli: &Cli) -> i32 {
    let settings_path = cli.settings_output_path();

    match BinSplit::generate_sample_settings(&settings_path) {
        Ok(()) => {
            println!("Generated sample settings file: {}", settings_path.display());
            println!("\nTo use these settings:");
            println!(
                "  binsplit -i <image> -o <dir> -c <manifest.xml> --settings {}",
                settings_path.display()
            );
            0
        }
        Err(e) => {
            eprintln!("Failed to generate settings file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &BinSplitError) {
    // Settings failed to load, so fall back to a default formatter
    let formatter = OutputFormatter::new(OutputMode::Human, 0);
    formatter.print_user_friendly_error(error);
}
