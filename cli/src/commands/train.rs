use std::path::PathBuf;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use cellwise_model::{FeatureAggregator, RulModel};
use color_eyre::eyre::Result;
use tracing::info;

use crate::config::UserConfig;

pub struct TrainArgs {
    pub data_dir: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub estimators: Option<usize>,
    pub seed: Option<u64>,
}

pub fn run(config: &UserConfig, args: TrainArgs) -> Result<()> {
    let data_dir = args.data_dir.unwrap_or_else(|| config.data.raw_dir.clone());
    let model_path = args.model_path.unwrap_or_else(|| config.paths.model.clone());

    let mut options = config.training.clone();
    if let Some(estimators) = args.estimators {
        options.n_estimators = estimators;
    }
    if let Some(seed) = args.seed {
        options.seed = seed;
    }

    let started = Instant::now();
    info!(data_dir = %data_dir.display(), "Loading training data");

    let set = FeatureAggregator::new(config.data.ingest.clone()).load_or_synthesize(&data_dir);
    let model = RulModel::train(&set, &options)?;
    model.persist(&model_path)?;

    let size = std::fs::metadata(&model_path).map(|m| m.len()).unwrap_or(0);
    let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);
    let meta = model.metadata();

    println!("Model trained");
    println!("{}", "=".repeat(40));
    println!("Data source:  {}", meta.source);
    println!("Train rows:   {}", meta.train_rows);
    println!("Test rows:    {}", meta.test_rows);
    println!("Trees:        {}", meta.params.n_estimators);
    println!("R2 score:     {:.4}", meta.evaluation.r2);
    println!("RMSE:         {:.2} cycles", meta.evaluation.rmse);
    println!(
        "Saved to:     {} ({})",
        model_path.display(),
        ByteSize::b(size)
    );
    println!("Elapsed:      {}", humantime::format_duration(elapsed));

    Ok(())
}
