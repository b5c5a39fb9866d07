use buildmedic::cli::commands::{CliArgs, Commands};
use buildmedic::cli::handlers::{handle_analyze, handle_config, handle_fix};
use buildmedic::config::MedicConfig;
use buildmedic::util::{init_logging, parse_level, LoggingConfig};
use buildmedic::VERSION;

use clap::Parser;
use tracing::{debug, error, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match MedicConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(LoggingConfig::default());
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(logging_from_args(&args, &config));

    debug!("buildmedic v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Analyze(analyze_args) => {
            handle_analyze(analyze_args, config, true, args.quiet).await
        }
        Commands::Classify(classify_args) => {
            handle_analyze(classify_args, config, false, args.quiet).await
        }
        Commands::Fix(fix_args) => handle_fix(fix_args, config, args.quiet).await,
        Commands::Config(config_args) => handle_config(config_args, &config),
    };

    std::process::exit(exit_code);
}

/// Command-line flags take precedence over the configured level.
fn logging_from_args(args: &CliArgs, config: &MedicConfig) -> LoggingConfig {
    let mut logging = config.logging();
    if let Some(level_str) = &args.log_level {
        logging.level = parse_level(level_str);
    } else if args.verbose {
        logging.level = Level::DEBUG;
    } else if args.quiet {
        logging.level = Level::ERROR;
    }
    logging
}
