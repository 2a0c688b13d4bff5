use std::collections::HashSet;

use serde_json::Value;

use super::error::EvalError;
use crate::model::Record;

#[derive(Debug, Clone)]
pub struct MetricStream {
    pub metric: String,
    pub values: Vec<Value>,
}

// Every stream is validated before any record is touched.
pub fn join_metric_scores(
    records: &mut [Record],
    streams: &[MetricStream],
) -> Result<Vec<String>, EvalError> {
    let mut seen = HashSet::with_capacity(streams.len());
    for stream in streams {
        if !seen.insert(stream.metric.as_str()) {
            return Err(EvalError::DuplicateMetricName {
                metric: stream.metric.clone(),
            });
        }
    }

    let validated = streams
        .iter()
        .map(|stream| validate_stream(stream, records.len()))
        .collect::<Result<Vec<_>, _>>()?;

    for (stream, scores) in streams.iter().zip(validated) {
        for (record, score) in records.iter_mut().zip(scores) {
            record.score_pred.insert(stream.metric.clone(), score);
        }
    }

    Ok(streams.iter().map(|stream| stream.metric.clone()).collect())
}

fn validate_stream(stream: &MetricStream, expected: usize) -> Result<Vec<f64>, EvalError> {
    if stream.values.len() != expected {
        return Err(EvalError::LengthMismatch {
            metric: stream.metric.clone(),
            expected,
            actual: stream.values.len(),
        });
    }

    stream
        .values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value
                .as_f64()
                .filter(|score| score.is_finite())
                .ok_or_else(|| EvalError::NonNumericScore {
                    metric: stream.metric.clone(),
                    index,
                    value: value.to_string(),
                })
        })
        .collect()
}
