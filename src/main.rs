use std::io;

use automotive_profit_report::{chart, run, ReportConfig, Result};
use log::warn;

fn main() -> Result<()> {
    env_logger::init();

    let config = ReportConfig::default();
    let backend = chart::default_backend();
    let summary = run(&config, backend.as_ref(), &mut io::stdout().lock())?;
    if !summary.is_complete() {
        warn!("run finished with skipped exports");
    }

    Ok(())
}
