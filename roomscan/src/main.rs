use clap::Parser;
use env_logger::{Builder, Env};
use log::{error, info, Level};
use std::io::Write;

use roomscan::color_utils::{colors, init_color_config, symbols};
use roomscan::config::{AnalyzeCommand, AnalyzeConfig, CheckCommand, CheckConfig, GlobalArgs};
use roomscan::processing::{run_processing, AnalyzeProcessor, CheckProcessor};

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Check whether images are usable indoor room photos
    Check(CheckCommand),

    /// Estimate room state, size, features and lighting
    Analyze(AnalyzeCommand),

    /// Show version information
    Version,
}

#[derive(Parser)]
#[command(name = "roomscan")]
#[command(about = "Heuristic indoor room photo analysis")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn get_log_level_from_verbosity(
    verbosity: &clap_verbosity_flag::Verbosity<clap_verbosity_flag::ErrorLevel>,
) -> log::LevelFilter {
    // -q is silent in clap-verbosity-flag terms but still shows errors here
    if verbosity.is_silent() {
        return log::LevelFilter::Error;
    }
    // Default is one step louder than ErrorLevel: warnings show without -v
    match verbosity.log_level_filter() {
        log::LevelFilter::Off => log::LevelFilter::Off,
        log::LevelFilter::Error => log::LevelFilter::Warn,
        log::LevelFilter::Warn => log::LevelFilter::Info,
        log::LevelFilter::Info => log::LevelFilter::Debug,
        log::LevelFilter::Debug | log::LevelFilter::Trace => log::LevelFilter::Trace,
    }
}

fn init_logging(global: &GlobalArgs) {
    // RUST_LOG wins only when no -v/-q was given
    let use_env = !global.verbosity.is_present() && std::env::var_os("RUST_LOG").is_some();

    let mut logger = if use_env {
        Builder::from_env(Env::default())
    } else {
        let mut b = Builder::new();
        b.filter_level(get_log_level_from_verbosity(&global.verbosity));
        b
    };

    logger
        .format(|buf, record| {
            let level_str = match record.level() {
                Level::Error => colors::error_level("ERROR"),
                Level::Warn => colors::warning_level("WARN"),
                Level::Info => colors::info_level("INFO"),
                Level::Debug => colors::debug_level("DEBUG"),
                Level::Trace => colors::trace_level("TRACE"),
            };
            writeln!(buf, "[{}] {}", level_str, record.args())
        })
        .init();
}

fn describe_sources(sources: &[String]) -> String {
    if sources.len() == 1 {
        sources[0].clone()
    } else {
        format!("{} inputs", sources.len())
    }
}

fn outputs_summary(global: &GlobalArgs, extra: &[(&'static str, bool)]) -> String {
    let mut outputs: Vec<&str> = extra
        .iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| *name)
        .collect();
    if global.metadata {
        outputs.push("metadata");
    }
    if outputs.is_empty() {
        "report only".to_string()
    } else {
        outputs.join(", ")
    }
}

fn main() {
    let cli = Cli::parse();
    init_color_config(cli.global.no_color);
    init_logging(&cli.global);

    let outcome = match &cli.command {
        Some(Commands::Check(cmd)) => {
            info!(
                "{}Quality check: {} | outputs: {}",
                symbols::check_start(),
                describe_sources(&cmd.sources),
                outputs_summary(&cli.global, &[])
            );
            CheckConfig::from_args(cli.global.clone(), cmd.clone())
                .and_then(run_processing::<CheckProcessor>)
        }
        Some(Commands::Analyze(cmd)) => {
            info!(
                "{}Room analysis: {} | outputs: {}",
                symbols::analyze_start(),
                describe_sources(&cmd.sources),
                outputs_summary(
                    &cli.global,
                    &[
                        ("layout-zones", cmd.layout_zones),
                        ("edge-maps", cmd.debug_dump_images),
                    ]
                )
            );
            AnalyzeConfig::from_args(cli.global.clone(), cmd.clone())
                .and_then(run_processing::<AnalyzeProcessor>)
        }
        Some(Commands::Version) => {
            println!("roomscan v{}", env!("CARGO_PKG_VERSION"));
            println!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
            Ok(0)
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().map(|_| 0).map_err(Into::into)
        }
    };

    if let Err(e) = outcome {
        error!("{}{e:#}", symbols::operation_failed());
        std::process::exit(1);
    }
}
