mod cli;
mod commands;
mod config;
mod inference;
mod logging;
mod report;

use clap::Parser;
use color_eyre::eyre::Result;

use cli::{Cli, Commands};
use commands::predict::PredictArgs;
use commands::train::TrainArgs;
use config::{ensure_dirs, LogLevel, UserConfig};
use logging::LogMode;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = ensure_dirs();

    let cli = Cli::parse();
    let config = UserConfig::load();
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);

    match cli.command {
        Commands::Train {
            data_dir,
            model_path,
            estimators,
            seed,
        } => {
            let _guard = logging::init(config.log_level, LogMode::Both, log_level_override);
            commands::train::run(
                &config,
                TrainArgs {
                    data_dir,
                    model_path,
                    estimators,
                    seed,
                },
            )
        }
        Commands::Predict {
            voltage,
            current,
            temperature,
            cycle,
            json,
            no_report,
        } => {
            let _guard = logging::init(config.log_level, LogMode::File, log_level_override);
            commands::predict::run(
                &config,
                PredictArgs {
                    voltage,
                    current,
                    temperature,
                    cycle,
                    json,
                    no_report,
                },
            )
        }
        Commands::Pipe { pretty } => {
            let _guard = logging::init(config.log_level, LogMode::File, log_level_override);
            commands::pipe::run(&config, pretty)
        }
        Commands::Report { path } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::report::run(&config, path)
        }
        Commands::Config { path, reset, edit } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::config::run(path, reset, edit)
        }
        Commands::Logs { lines, follow } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::logs::run(lines, follow)
        }
    }
}
