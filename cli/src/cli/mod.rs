use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest raw logs, train the RUL model and save the artifact
    Train {
        /// Directory of raw `*.csv` battery logs
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Where to write the model artifact
        #[arg(short, long)]
        model_path: Option<PathBuf>,

        /// Number of trees in the forest
        #[arg(short, long)]
        estimators: Option<usize>,

        /// Seed for the train/test split and bootstrap sampling
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Assess a single reading
    #[command(alias = "p")]
    Predict {
        /// Measured voltage (V)
        #[arg(short = 'v', long, allow_hyphen_values = true)]
        voltage: String,

        /// Measured current (A), negative while discharging
        #[arg(short = 'i', long, allow_hyphen_values = true)]
        current: String,

        /// Measured temperature (°C)
        #[arg(short = 't', long, allow_hyphen_values = true)]
        temperature: String,

        /// Charge/discharge cycle number
        #[arg(short = 'c', long, allow_hyphen_values = true)]
        cycle: String,

        /// Print the result as JSON instead of the dashboard
        #[arg(long)]
        json: bool,

        /// Skip writing the report file
        #[arg(long)]
        no_report: bool,
    },

    /// Assess readings from stdin, one JSON object per line
    #[command(alias = "raw")]
    Pipe {
        /// Pretty-print each response over several lines
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show the last rendered report
    Report {
        /// Print the report file path
        #[arg(long)]
        path: bool,
    },

    /// Show or edit configuration
    Config {
        /// Print config file path
        #[arg(long)]
        path: bool,

        /// Reset config to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(short, long)]
        edit: bool,
    },

    /// View logs
    Logs {
        /// Number of lines to show
        #[arg(short, long, default_value_t = 50)]
        lines: usize,

        /// Follow log output
        #[arg(short, long)]
        follow: bool,
    },
}

/// Battery remaining-useful-life prediction and health reports
#[derive(Debug, Parser)]
#[command(name = "cellwise", version, verbatim_doc_comment)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}
