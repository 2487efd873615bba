use crate::dataset::CycleFeatureRow;

/// Per-cycle aggregate of one run before labelling.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleAggregate {
    pub cycle: u32,
    pub voltage_mean: f64,
    pub current_mean: f64,
    pub temperature_mean: f64,
    pub time_max: Option<f64>,
}

/// Label every cycle of a single run with `max cycle in the run - cycle`.
///
/// Must be called once per run: labelling concatenated runs would measure
/// every row against the longest run.
pub fn label_run(run: Vec<CycleAggregate>) -> Vec<CycleFeatureRow> {
    let Some(max_cycle) = run.iter().map(|c| c.cycle).max() else {
        return Vec::new();
    };

    run.into_iter()
        .map(|c| CycleFeatureRow {
            cycle: c.cycle,
            voltage_mean: c.voltage_mean,
            current_mean: c.current_mean,
            temperature_mean: c.temperature_mean,
            time_max: c.time_max,
            rul: max_cycle - c.cycle,
        })
        .collect()
}
