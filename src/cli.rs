use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::engine::DuplicateSystemPolicy;
use crate::engine::agreement::{DEFAULT_PERMUTATIONS, DEFAULT_SEED};

#[derive(Parser, Debug)]
#[command(
    name = "stqe-eval",
    version,
    about = "Meta-evaluation of speech translation quality-estimation metrics against human scores"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Evaluate(EvaluateArgs),
    Tsv(TsvArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Newline-delimited JSON records with human scores.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Score files, one JSON number per line aligned with --input.
    #[arg(short, long = "metric", num_args = 1.., required = true)]
    pub metrics: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = SystemStatistic::Spa)]
    pub system_statistic: SystemStatistic,

    #[arg(long, default_value_t = DEFAULT_PERMUTATIONS, value_parser = parse_permutations)]
    pub permutations: usize,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = DuplicateSystems::Reject)]
    pub duplicate_systems: DuplicateSystems,

    /// Only evaluate these language pairs (e.g. `ende`).
    #[arg(long = "lang")]
    pub languages: Vec<String>,

    #[arg(long)]
    pub report_json: Option<PathBuf>,
}

fn parse_permutations(raw: &str) -> Result<usize, String> {
    let count = raw
        .parse::<usize>()
        .map_err(|err| format!("invalid permutation count `{raw}`: {err}"))?;
    if count == 0 {
        return Err("permutation count must be at least 1".to_string());
    }
    Ok(count)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SystemStatistic {
    Spa,
    PairwiseAccuracy,
}

impl SystemStatistic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spa => "spa",
            Self::PairwiseAccuracy => "pairwise-accuracy",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DuplicateSystems {
    Reject,
    KeepLast,
}

impl From<DuplicateSystems> for DuplicateSystemPolicy {
    fn from(value: DuplicateSystems) -> Self {
        match value {
            DuplicateSystems::Reject => Self::Reject,
            DuplicateSystems::KeepLast => Self::KeepLast,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TsvArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long, default_value = "iwslt26.dev")]
    pub split: String,
}
