use anyhow::Result;
use popdecile::{PipelineConfig, run_batch};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RunArgs) -> Result<()> {
    let mut config = PipelineConfig::from_json_file(&args.config)?;
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    tracing::info!(config = %args.config.display(), output = %config.output.display(), "[run] starting batch");
    let report = run_batch(&config)?;

    eprintln!(
        "[run] {} countries classified, {} excluded, {} summary rows -> {}",
        report.processed().count(),
        report.excluded.len(),
        report.summaries.len(),
        config.output.display(),
    );
    for exclusion in &report.excluded {
        eprintln!("[run]   {} excluded ({}): {}", exclusion.iso3, exclusion.error, exclusion.reason);
    }

    Ok(())
}
