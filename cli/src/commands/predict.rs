use cellwise_protocol::{InferenceResponse, RawReading, ReportData};
use color_eyre::eyre::Result;
use tracing::{info, warn};

use crate::config::UserConfig;
use crate::inference::{assess, ModelSlot};
use crate::report::{ReportRenderer, TextReportRenderer};

pub struct PredictArgs {
    pub voltage: String,
    pub current: String,
    pub temperature: String,
    pub cycle: String,
    pub json: bool,
    pub no_report: bool,
}

impl PredictArgs {
    fn raw_reading(&self) -> RawReading {
        RawReading {
            voltage: Some(self.voltage.as_str().into()),
            current: Some(self.current.as_str().into()),
            temperature: Some(self.temperature.as_str().into()),
            cycle: Some(self.cycle.as_str().into()),
        }
    }
}

pub fn run(config: &UserConfig, args: PredictArgs) -> Result<()> {
    let slot = ModelSlot::global();

    let outcome = slot
        .init(&config.paths.model)
        .and_then(|_| assess(slot, &args.raw_reading()));

    let data = match outcome {
        Ok(data) => data,
        Err(e) if args.json => {
            warn!(error = %e, "Prediction failed");
            println!("{}", e.into_response().to_json(true)?);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        let response = InferenceResponse::Ok(data.to_flat_map()?);
        println!("{}", response.to_json(true)?);
    } else {
        print_dashboard(&data);
    }

    if args.no_report {
        return Ok(());
    }

    let renderer = TextReportRenderer::new(&config.paths.report);
    let path = renderer.render(&data)?;
    info!(path = %path.display(), "Report written");
    if !args.json {
        println!();
        println!("Report saved to {}", path.display());
    }

    Ok(())
}

fn print_dashboard(data: &ReportData) {
    let inputs = &data.inputs;
    let results = &data.results;

    println!("Battery Health");
    println!("{}", "=".repeat(40));
    println!("Condition:    {}", results.condition);
    println!("Health score: {}%", results.health_score);
    println!("RUL:          {} cycles", results.rul);
    println!("Repair cost:  ${}", results.cost);
    println!();
    println!("{}", results.recommendation);
    println!();
    println!(
        "Inputs: {} V, {} A, {} C, cycle {}",
        inputs.voltage, inputs.current, inputs.temperature, inputs.cycle
    );
}
