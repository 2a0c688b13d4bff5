use super::correlation::{Correlation, kendall_tau_b, mean_defined};
use super::error::EvalError;
use super::grouping::group_by_document;
use crate::model::Record;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLevel {
    pub mean: f64,
    pub documents_used: usize,
    pub documents_undefined: usize,
    pub documents_singleton: usize,
}

pub fn segment_level(
    lang: &str,
    records: &[&Record],
    metric: &str,
) -> Result<SegmentLevel, EvalError> {
    let documents = group_by_document(records);

    let mut singletons = 0_usize;
    let mut correlations = Vec::with_capacity(documents.len());
    for document in documents.values() {
        if document.len() < 2 {
            singletons += 1;
            continue;
        }
        correlations.push(document_correlation(document, metric));
    }

    let undefined = correlations
        .iter()
        .filter(|correlation| !correlation.is_defined())
        .count();

    let mean = mean_defined(correlations.iter().copied()).ok_or_else(|| EvalError::EmptyMean {
        metric: metric.to_string(),
        lang: lang.to_string(),
    })?;

    Ok(SegmentLevel {
        mean,
        documents_used: correlations.len() - undefined,
        documents_undefined: undefined,
        documents_singleton: singletons,
    })
}

fn document_correlation(document: &[&Record], metric: &str) -> Correlation {
    let human = document
        .iter()
        .map(|record| record.score)
        .collect::<Vec<_>>();
    let Some(predicted) = document
        .iter()
        .map(|record| record.predicted(metric))
        .collect::<Option<Vec<_>>>()
    else {
        return Correlation::Undefined;
    };

    kendall_tau_b(&human, &predicted)
}
