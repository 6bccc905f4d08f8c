use std::path::PathBuf;

/// Population-density decile pipeline
#[derive(clap::Parser, Debug)]
#[command(name = "popdecile", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the full batch described by a JSON config
    Run(RunArgs),

    /// Label scenario rows with 11 density buckets per country/scenario/strategy/confidence
    ClassifyGroups(ClassifyGroupsArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Pipeline config file (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Worker threads, overriding the config
    #[arg(short, long)]
    pub threads: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ClassifyGroupsArgs {
    /// Input CSV with GID_0, scenario, strategy, confidence, GID_id, population_km2
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output CSV, defaults to "./classified.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_threads() {
        let cli = Cli::parse_from(["popdecile", "-vv", "run", "run.json", "--threads", "8"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("run.json"));
                assert_eq!(args.threads, Some(8));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_classify_groups() {
        let cli = Cli::parse_from(["popdecile", "classify-groups", "in.csv", "-o", "out.csv"]);
        match cli.command {
            Commands::ClassifyGroups(args) => assert_eq!(args.output, Some(PathBuf::from("out.csv"))),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
