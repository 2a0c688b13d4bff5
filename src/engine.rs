pub mod aggregate;
pub mod agreement;
pub mod correlation;
pub mod error;
pub mod grouping;
pub mod join;
pub mod segment;
pub mod system;

use tracing::{debug, info, warn};

use crate::model::Record;

pub use self::aggregate::{Cell, MetricSummary, MissingReason, ResultTable, summarize};
pub use self::error::EvalError;
pub use self::join::{MetricStream, join_metric_scores};
pub use self::system::{DuplicateSystemPolicy, SystemAgreement};

pub struct EvalOptions<'a> {
    pub agreement: &'a dyn SystemAgreement,
    pub duplicate_systems: DuplicateSystemPolicy,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTables {
    pub segment_level: ResultTable,
    pub system_level: ResultTable,
}

pub fn evaluate(
    records: &[Record],
    metrics: &[String],
    options: &EvalOptions<'_>,
) -> Result<ResultTables, EvalError> {
    let mut pairs = grouping::partition_by_lang_pair(records);

    if !options.languages.is_empty() {
        for lang in &options.languages {
            if !pairs.contains_key(lang) {
                return Err(EvalError::UnknownLanguagePair { lang: lang.clone() });
            }
        }
        pairs.retain(|lang, _| options.languages.contains(lang));
    }

    let mut tables = ResultTables::default();
    for (lang, lang_records) in &pairs {
        info!(
            lang = %lang,
            records = lang_records.len(),
            metrics = metrics.len(),
            "evaluating language pair"
        );

        for metric in metrics {
            let segment = segment_cell(lang, lang_records, metric)?;
            tables.segment_level.insert(metric, lang, segment);

            let system = system_cell(lang, lang_records, metric, options)?;
            tables.system_level.insert(metric, lang, system);
        }
    }

    Ok(tables)
}

fn segment_cell(lang: &str, records: &[&Record], metric: &str) -> Result<Cell, EvalError> {
    match segment::segment_level(lang, records, metric) {
        Ok(result) => {
            debug!(
                lang,
                metric,
                documents_used = result.documents_used,
                documents_undefined = result.documents_undefined,
                documents_singleton = result.documents_singleton,
                "segment-level correlation computed"
            );
            Ok(Cell::Value(result.mean))
        }
        Err(EvalError::EmptyMean { .. }) => {
            warn!(lang, metric, "segment-level correlation undefined for every document");
            Ok(Cell::Missing(MissingReason::NoDefinedCorrelation))
        }
        Err(err) => Err(err),
    }
}

fn system_cell(
    lang: &str,
    records: &[&Record],
    metric: &str,
    options: &EvalOptions<'_>,
) -> Result<Cell, EvalError> {
    let result = system::system_level(
        lang,
        records,
        metric,
        options.duplicate_systems,
        options.agreement,
    )?;

    if result.documents_retained == 0 {
        warn!(
            lang,
            metric,
            systems = result.systems,
            documents = result.documents_total,
            "no document covers every system"
        );
        return Ok(Cell::Missing(MissingReason::NoCompleteDocument));
    }

    match result.agreement.value() {
        Some(value) => Ok(Cell::Value(value)),
        None => {
            warn!(
                lang,
                metric,
                statistic = options.agreement.name(),
                systems = result.systems,
                "system-level agreement undefined"
            );
            Ok(Cell::Missing(MissingReason::UndefinedAgreement))
        }
    }
}
