use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("number of lines in {metric} ({actual}) does not match input ({expected})")]
    LengthMismatch {
        metric: String,
        expected: usize,
        actual: usize,
    },

    #[error("line {index} in {metric} with value {value} is not a number")]
    NonNumericScore {
        metric: String,
        index: usize,
        value: String,
    },

    #[error("metric name {metric} is derived from more than one score file")]
    DuplicateMetricName { metric: String },

    #[error("language pair {lang} has no documents")]
    EmptyLanguagePair { lang: String },

    #[error("no defined correlation to average for {metric} on {lang}")]
    EmptyMean { metric: String, lang: String },

    #[error("document {doc_id} in {lang} has more than one record for system {system}")]
    DuplicateSystemRecord {
        lang: String,
        doc_id: String,
        system: String,
    },

    #[error("language pair {lang} does not occur in the input")]
    UnknownLanguagePair { lang: String },
}
