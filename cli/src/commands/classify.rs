use std::path::PathBuf;

use anyhow::{Context, Result};
use popdecile::classify_groups_csv;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ClassifyGroupsArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from("./classified.csv"));

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let (classified, failures) = classify_groups_csv(&bytes)
        .with_context(|| format!("classify {}", args.input.display()))?;
    std::fs::write(&out_path, classified)
        .with_context(|| format!("write {}", out_path.display()))?;

    for failure in &failures {
        eprintln!("[classify-groups] {} left unclassified: {}", failure.key, failure.error);
    }
    eprintln!("[classify-groups] wrote {} ({} group(s) failed)", out_path.display(), failures.len());

    Ok(())
}
