use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{EvaluateArgs, SystemStatistic};
use crate::engine::agreement::{PairwiseAccuracy, SoftPairwiseAccuracy};
use crate::engine::{
    Cell, EvalOptions, MetricSummary, SystemAgreement, evaluate, join_metric_scores, summarize,
};
use crate::input::{read_records, read_score_stream};
use crate::model::{EvaluationReport, InputFingerprint, MetricFingerprint};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

mod report;

use self::report::{summary_entries, write_text_report};

const REPORT_VERSION: u32 = 1;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let mut records = read_records(&args.input)?;
    info!(
        path = %args.input.display(),
        records = records.len(),
        "loaded input records"
    );

    let streams = args
        .metrics
        .iter()
        .map(|path| read_score_stream(path))
        .collect::<Result<Vec<_>>>()?;
    for (path, stream) in args.metrics.iter().zip(&streams) {
        info!(
            metric = %stream.metric,
            path = %path.display(),
            lines = stream.values.len(),
            "loaded metric scores"
        );
    }

    let metrics = join_metric_scores(&mut records, &streams)
        .context("failed to attach metric scores to input records")?;

    let spa = SoftPairwiseAccuracy {
        permutations: args.permutations,
        seed: args.seed,
    };
    let agreement: &dyn SystemAgreement = match args.system_statistic {
        SystemStatistic::Spa => &spa,
        SystemStatistic::PairwiseAccuracy => &PairwiseAccuracy,
    };
    let options = EvalOptions {
        agreement,
        duplicate_systems: args.duplicate_systems.into(),
        languages: args.languages.clone(),
    };

    let tables = evaluate(&records, &metrics, &options).context("evaluation failed")?;
    let segment_level = summarize(&tables.segment_level);
    let system_level = summarize(&tables.system_level);
    warn_missing_averages("segment-level", &segment_level);
    warn_missing_averages("system-level", &system_level);

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_text_report(&mut output, &segment_level, &system_level)?;
    output.flush()?;

    if let Some(path) = &args.report_json {
        let report = EvaluationReport {
            report_version: REPORT_VERSION,
            generated_at: now_utc_string(),
            input: InputFingerprint {
                path: args.input.display().to_string(),
                sha256: sha256_file(&args.input)?,
                record_count: records.len(),
            },
            metrics: args
                .metrics
                .iter()
                .zip(&metrics)
                .map(|(path, metric)| {
                    Ok(MetricFingerprint {
                        metric: metric.clone(),
                        path: path.display().to_string(),
                        sha256: sha256_file(path)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            system_statistic: args.system_statistic.as_str().to_string(),
            segment_level: summary_entries(&segment_level),
            system_level: summary_entries(&system_level),
        };
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote evaluation report");
    }

    info!(
        metrics = metrics.len(),
        statistic = agreement.name(),
        "evaluation completed"
    );
    Ok(())
}

fn warn_missing_averages(level: &str, summaries: &[MetricSummary]) {
    for summary in summaries {
        if let Cell::Missing(reason) = summary.average {
            warn!(
                level,
                metric = %summary.metric,
                reason = reason.as_str(),
                "metric has no average"
            );
        }
    }
}
