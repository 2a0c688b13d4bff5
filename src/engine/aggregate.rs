use super::correlation::{Correlation, mean_defined};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    NoDefinedCorrelation,
    NoCompleteDocument,
    UndefinedAgreement,
    NoDefinedLanguagePair,
    NoLanguagePairs,
}

impl MissingReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoDefinedCorrelation => "no document with a defined correlation",
            Self::NoCompleteDocument => "no document covers every system",
            Self::UndefinedAgreement => "system agreement is undefined",
            Self::NoDefinedLanguagePair => "no language pair has a value",
            Self::NoLanguagePairs => "metric has no language pairs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    Missing(MissingReason),
}

impl Cell {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing(_) => None,
        }
    }

    pub fn missing_reason(self) -> Option<MissingReason> {
        match self {
            Self::Value(_) => None,
            Self::Missing(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub metric: String,
    pub languages: Vec<(String, Cell)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<MetricRow>,
}

impl ResultTable {
    pub fn insert(&mut self, metric: &str, lang: &str, cell: Cell) {
        let index = match self.rows.iter().position(|row| row.metric == metric) {
            Some(index) => index,
            None => {
                self.rows.push(MetricRow {
                    metric: metric.to_string(),
                    languages: Vec::new(),
                });
                self.rows.len() - 1
            }
        };

        let languages = &mut self.rows[index].languages;
        match languages.iter_mut().find(|(existing, _)| existing == lang) {
            Some((_, existing)) => *existing = cell,
            None => languages.push((lang.to_string(), cell)),
        }
    }

    pub fn get(&self, metric: &str, lang: &str) -> Option<Cell> {
        self.rows
            .iter()
            .find(|row| row.metric == metric)?
            .languages
            .iter()
            .find(|(existing, _)| existing == lang)
            .map(|(_, cell)| *cell)
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub metric: String,
    pub languages: Vec<(String, Cell)>,
    pub average: Cell,
}

pub fn summarize(table: &ResultTable) -> Vec<MetricSummary> {
    let mut summaries = table
        .rows()
        .iter()
        .map(|row| MetricSummary {
            metric: row.metric.clone(),
            languages: row.languages.clone(),
            average: average_over_languages(&row.languages),
        })
        .collect::<Vec<_>>();
    sort_reverse_lexicographic(&mut summaries, |summary| summary.metric.as_str());
    summaries
}

pub fn average_over_languages(languages: &[(String, Cell)]) -> Cell {
    if languages.is_empty() {
        return Cell::Missing(MissingReason::NoLanguagePairs);
    }

    let values = languages.iter().map(|(_, cell)| match cell {
        Cell::Value(value) => Correlation::Defined(*value),
        Cell::Missing(_) => Correlation::Undefined,
    });
    match mean_defined(values) {
        Some(mean) => Cell::Value(mean),
        None => Cell::Missing(MissingReason::NoDefinedLanguagePair),
    }
}

pub fn sort_reverse_lexicographic<T>(items: &mut [T], key: impl Fn(&T) -> &str) {
    items.sort_by(|left, right| key(right).cmp(key(left)));
}
