use color_eyre::eyre::Result;

use crate::config::UserConfig;
use crate::report::read_report;

pub fn run(config: &UserConfig, path: bool) -> Result<()> {
    let report_path = &config.paths.report;

    if path {
        println!("{}", report_path.display());
        return Ok(());
    }

    print!("{}", read_report(report_path)?);
    Ok(())
}
