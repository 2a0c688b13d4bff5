use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::engine::MetricStream;
use crate::model::Record;
use crate::util::read_lines;

pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for (line_number, line) in content_lines(path)? {
        let record: Record = serde_json::from_str(&line).with_context(|| {
            format!("failed to parse record on line {line_number} of {}", path.display())
        })?;
        records.push(record);
    }
    Ok(records)
}

pub fn read_score_stream(path: &Path) -> Result<MetricStream> {
    let metric = metric_name_from_path(path)?;

    let mut values = Vec::new();
    for (line_number, line) in content_lines(path)? {
        let value: Value = serde_json::from_str(&line).with_context(|| {
            format!("invalid JSON on line {line_number} of {}", path.display())
        })?;
        values.push(value);
    }

    Ok(MetricStream { metric, values })
}

// Lines are positional: only trailing blank lines are dropped.
fn content_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let mut lines = read_lines(path)?;
    while lines.last().is_some_and(|(_, line)| line.trim().is_empty()) {
        lines.pop();
    }
    Ok(lines)
}

pub fn metric_name_from_path(path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid UTF-8 score file name: {}", path.display()))?;

    let name = file_name.split('.').next().unwrap_or_default();
    if name.is_empty() {
        bail!("cannot derive a metric name from {}", path.display());
    }
    Ok(name.to_string())
}
