use anyhow::Result;

mod config;
mod error;
mod logging;
mod models;
mod services;

fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::Config::new()?;
    tracing::info!(
        "Building {} report from {}",
        config.year,
        config.input_path.display()
    );

    let summary = services::report::run(&config)?;

    tracing::info!("Quarterly chart: {}", summary.quarterly_chart.display());
    tracing::info!("Monthly chart: {}", summary.monthly_chart.display());

    Ok(())
}
