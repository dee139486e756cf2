use anyhow::{anyhow, Context};
use clap::Parser;
use load_suite::cli::LoadSuiteCli;
use load_suite::config::SuiteConfig;
use load_suite_report::{results_table, ReportWriter};
use load_suite_runner::prelude::{
    engine_path, CommandEngine, RunExecutor, Session, SessionConfig, SuiteProgress,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = LoadSuiteCli::parse();
    let config = SuiteConfig::resolve(&cli)?;

    let engine_path = engine_path(cli.engine.clone())?;
    log::info!("Using engine at {}", engine_path.display());
    let engine = CommandEngine::new(engine_path).with_extra_args(cli.engine_args.clone());

    let mut session_config = SessionConfig::new(&config.output_dir, &config.report_dir);
    if let Some(label) = &cli.label {
        session_config = session_config.with_label(label);
    }
    let mut session = Session::new(session_config);
    log::info!(
        "Running {} scenarios, journal at {}",
        config.scenarios.len(),
        session.config().journal_path().display()
    );

    let progress = if cli.no_progress {
        SuiteProgress::hidden()
    } else {
        SuiteProgress::new(config.scenarios.len())
    };
    RunExecutor::new(engine, config.evidence)
        .run_suite(&config.scenarios, &mut session, &progress)
        .with_context(|| {
            format!(
                "Failed to create output directory {}",
                config.output_dir.display()
            )
        })?;

    println!("\nSummary of scenarios");
    println!("{}", results_table(session.results()));

    let summary = session.summarize();
    println!(
        "{} passed, {} failed, {:.1}% success rate, {} requests in {:.2}s",
        summary.passed,
        summary.failed,
        summary.success_rate_pct,
        summary.total_requests,
        summary.total_duration_seconds
    );

    let report_written = match ReportWriter::new(&session.config().report_dir)
        .write(session.results(), &session.config().label)
    {
        Ok(artifacts) => {
            println!("HTML report: {}", artifacts.html.path.display());
            println!("CSV results: {}", artifacts.csv.path.display());
            true
        }
        Err(e) => {
            log::error!("Failed to write report: {e}");
            false
        }
    };

    if !summary.all_passed() {
        return Err(anyhow!(
            "{} out of {} scenarios failed",
            summary.failed,
            summary.total
        ));
    }
    if !report_written {
        return Err(anyhow!(
            "The report could not be written, results are kept in {}",
            session.config().journal_path().display()
        ));
    }

    Ok(())
}
