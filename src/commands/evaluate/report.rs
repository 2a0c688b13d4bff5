use std::io::Write;

use anyhow::Result;

use crate::engine::{Cell, MetricSummary};
use crate::model::{LanguageCell, MetricSummaryEntry};

const METRIC_COLUMN_WIDTH: usize = 30;

pub fn write_text_report<W: Write>(
    output: &mut W,
    segment_level: &[MetricSummary],
    system_level: &[MetricSummary],
) -> Result<()> {
    writeln!(output)?;
    writeln!(output, "SEGMENT-LEVEL")?;
    write_section(output, segment_level)?;

    writeln!(output)?;
    writeln!(output, "SYSTEM-LEVEL")?;
    write_section(output, system_level)?;
    Ok(())
}

fn write_section<W: Write>(output: &mut W, summaries: &[MetricSummary]) -> Result<()> {
    for summary in summaries {
        let languages = summary
            .languages
            .iter()
            .map(|(lang, cell)| format!("{lang}:{}", format_percent(*cell)))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            output,
            "{:>width$}: {} | {}",
            summary.metric,
            format_percent(summary.average),
            languages,
            width = METRIC_COLUMN_WIDTH
        )?;
    }
    Ok(())
}

pub fn format_percent(cell: Cell) -> String {
    let rendered = match cell {
        Cell::Value(value) => format!("{:.1}%", value * 100.0),
        Cell::Missing(_) => "n/a".to_string(),
    };
    format!("{rendered:<6}")
}

pub fn summary_entries(summaries: &[MetricSummary]) -> Vec<MetricSummaryEntry> {
    summaries
        .iter()
        .map(|summary| MetricSummaryEntry {
            metric: summary.metric.clone(),
            average: summary.average.value(),
            average_missing_reason: summary
                .average
                .missing_reason()
                .map(|reason| reason.as_str().to_string()),
            languages: summary
                .languages
                .iter()
                .map(|(lang, cell)| LanguageCell {
                    lang: lang.clone(),
                    value: cell.value(),
                    missing_reason: cell.missing_reason().map(|reason| reason.as_str().to_string()),
                })
                .collect(),
        })
        .collect()
}
