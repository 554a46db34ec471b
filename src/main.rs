//! herakles-process-census
//!
//! Command-line front end: resolves configuration, sets up tracing and the
//! rayon pool, then dispatches to a subcommand. `scan` runs when no
//! subcommand is given.

mod commands;

use clap::Parser;
use tracing::{debug, error, info, Level};

use commands::{command_check, command_config, command_scan, command_tree};
use herakles_process_census::cli::{Args, Commands, OutputFormat};
use herakles_process_census::config::{
    resolve_config, show_config, validate_effective_config, Config,
};

/// Initializes tracing logging subsystem with configured log level.
/// Logs go to stderr so that snapshot output on stdout stays parseable.
fn setup_logging(config: &Config) {
    let level = config.log_level.as_deref().unwrap_or("info");
    let log_level = match level.to_ascii_lowercase().as_str() {
        "off" => None,
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => Some(Level::INFO),
    };

    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    debug!("Logging initialized with level: {}", level);
}

/// Sizes the global rayon pool used by the census fan-out.
fn setup_parallelism(config: &Config) {
    if let Some(threads) = config.parallelism {
        if threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .unwrap_or_else(|e| error!("Failed to set rayon thread pool: {}", e));
            debug!("Rayon thread pool configured with {} threads", threads);
        }
    }
}

/// Main application entry point.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(&args)?;

    // Early exits for show/check modes
    if args.check_config {
        if let Err(e) = validate_effective_config(&config) {
            eprintln!("❌ Configuration invalid: {}", e);
            std::process::exit(1);
        }
        println!("✅ Configuration is valid");
        return Ok(());
    }

    if args.show_config {
        return show_config(&config, args.config_format);
    }

    // Config generation does not depend on the effective config
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), *format, *commented);
    }

    setup_logging(&config);

    // `check` reports invalid config itself
    if let Some(Commands::Check) = &args.command {
        return command_check(&config);
    }

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }

    setup_parallelism(&config);
    info!(
        "Starting herakles-process-census on {}",
        config.proc_root().display()
    );

    match args.command {
        Some(Commands::Scan {
            format,
            output,
            with_tree,
        }) => command_scan(&config, format, output, with_tree),
        Some(Commands::Tree { no_orphans, state }) => command_tree(&config, no_orphans, state),
        None => command_scan(&config, OutputFormat::Json, None, false),
        Some(Commands::Check) | Some(Commands::Config { .. }) => {
            unreachable!("handled above")
        }
    }
}
