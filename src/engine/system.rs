use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::correlation::Correlation;
use super::error::EvalError;
use super::grouping::group_by_document;
use crate::model::Record;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemScores {
    pub score: f64,
    pub score_pred: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKey {
    Human,
    Predicted,
}

impl SystemScores {
    pub fn get(&self, key: ScoreKey) -> f64 {
        match key {
            ScoreKey::Human => self.score,
            ScoreKey::Predicted => self.score_pred,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentBucket {
    pub doc_id: String,
    pub scores: BTreeMap<String, SystemScores>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateSystemPolicy {
    #[default]
    Reject,
    KeepLast,
}

pub trait SystemAgreement {
    fn name(&self) -> &'static str;

    fn compute_system_agreement(
        &self,
        reference: &[DocumentBucket],
        candidate: &[DocumentBucket],
        key_pair: (ScoreKey, ScoreKey),
    ) -> Correlation;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemLevel {
    pub agreement: Correlation,
    pub systems: usize,
    pub documents_total: usize,
    pub documents_retained: usize,
}

pub fn build_system_buckets(
    lang: &str,
    records: &[&Record],
    metric: &str,
    policy: DuplicateSystemPolicy,
) -> Result<Vec<DocumentBucket>, EvalError> {
    let documents = group_by_document(records);

    let mut buckets = Vec::with_capacity(documents.len());
    for (doc_id, document) in documents {
        let mut scores = BTreeMap::new();
        for record in document {
            let Some(score_pred) = record.predicted(metric) else {
                continue;
            };
            let previous = scores.insert(
                record.tgt_system.clone(),
                SystemScores {
                    score: record.score,
                    score_pred,
                },
            );
            if previous.is_some() {
                match policy {
                    DuplicateSystemPolicy::Reject => {
                        return Err(EvalError::DuplicateSystemRecord {
                            lang: lang.to_string(),
                            doc_id: doc_id.to_string(),
                            system: record.tgt_system.clone(),
                        });
                    }
                    DuplicateSystemPolicy::KeepLast => warn!(
                        lang,
                        doc_id,
                        system = %record.tgt_system,
                        "duplicate system record, keeping the later one"
                    ),
                }
            }
        }
        buckets.push(DocumentBucket {
            doc_id: doc_id.to_string(),
            scores,
        });
    }

    Ok(buckets)
}

pub fn universal_systems(
    lang: &str,
    buckets: &[DocumentBucket],
) -> Result<BTreeSet<String>, EvalError> {
    if buckets.is_empty() {
        return Err(EvalError::EmptyLanguagePair {
            lang: lang.to_string(),
        });
    }

    Ok(buckets
        .iter()
        .flat_map(|bucket| bucket.scores.keys().cloned())
        .collect())
}

pub fn retain_complete_documents(
    buckets: Vec<DocumentBucket>,
    systems: &BTreeSet<String>,
) -> Vec<DocumentBucket> {
    buckets
        .into_iter()
        .filter(|bucket| {
            bucket.scores.len() == systems.len()
                && bucket.scores.keys().all(|system| systems.contains(system))
        })
        .map(|bucket| DocumentBucket {
            scores: systems
                .iter()
                .filter_map(|system| {
                    bucket
                        .scores
                        .get(system)
                        .map(|scores| (system.clone(), *scores))
                })
                .collect(),
            doc_id: bucket.doc_id,
        })
        .collect()
}

pub fn system_level(
    lang: &str,
    records: &[&Record],
    metric: &str,
    policy: DuplicateSystemPolicy,
    agreement: &dyn SystemAgreement,
) -> Result<SystemLevel, EvalError> {
    let buckets = build_system_buckets(lang, records, metric, policy)?;
    let documents_total = buckets.len();
    let systems = universal_systems(lang, &buckets)?;
    let retained = retain_complete_documents(buckets, &systems);

    debug!(
        lang,
        metric,
        systems = systems.len(),
        documents_total,
        documents_retained = retained.len(),
        "system-level documents collated"
    );

    let value = if retained.is_empty() {
        Correlation::Undefined
    } else {
        agreement.compute_system_agreement(
            &retained,
            &retained,
            (ScoreKey::Human, ScoreKey::Predicted),
        )
    };

    Ok(SystemLevel {
        agreement: value,
        systems: systems.len(),
        documents_total,
        documents_retained: retained.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(doc_id: &str, system: &str, score: f64) -> Record {
        let mut record = Record {
            doc_id: doc_id.to_string(),
            src_lang: "en".to_string(),
            tgt_lang: "zh".to_string(),
            tgt_system: system.to_string(),
            score,
            audio_path: None,
            tgt_text: None,
            score_pred: Default::default(),
        };
        record.score_pred.insert("comet".to_string(), score / 100.0);
        record
    }

    struct DocumentCount;

    impl SystemAgreement for DocumentCount {
        fn name(&self) -> &'static str {
            "document-count"
        }

        fn compute_system_agreement(
            &self,
            reference: &[DocumentBucket],
            _candidate: &[DocumentBucket],
            _key_pair: (ScoreKey, ScoreKey),
        ) -> Correlation {
            Correlation::Defined(reference.len() as f64)
        }
    }

    fn buckets(records: &[Record]) -> Vec<DocumentBucket> {
        let refs = records.iter().collect::<Vec<_>>();
        build_system_buckets("enzh", &refs, "comet", DuplicateSystemPolicy::Reject)
            .expect("no duplicates")
    }

    #[test]
    fn documents_missing_a_system_are_dropped_whole() {
        let records = vec![
            record("d1", "A", 10.0),
            record("d1", "B", 20.0),
            record("d2", "A", 30.0),
            record("d2", "B", 40.0),
            record("d2", "C", 50.0),
            record("d3", "C", 60.0),
            record("d3", "B", 70.0),
            record("d3", "A", 80.0),
        ];
        let buckets = buckets(&records);
        let systems = universal_systems("enzh", &buckets).expect("non-empty");
        assert_eq!(
            systems.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );

        let retained = retain_complete_documents(buckets, &systems);
        assert_eq!(
            retained
                .iter()
                .map(|bucket| bucket.doc_id.as_str())
                .collect::<Vec<_>>(),
            vec!["d2", "d3"]
        );
        assert_eq!(retained[1].scores["C"].score, 60.0);
        assert_eq!(retained[1].scores["C"].score_pred, 0.6);
    }

    #[test]
    fn system_level_passes_only_complete_documents_to_the_agreement() {
        let records = vec![
            record("d1", "A", 10.0),
            record("d1", "B", 20.0),
            record("d2", "A", 30.0),
            record("d2", "B", 40.0),
            record("d2", "C", 50.0),
        ];
        let refs = records.iter().collect::<Vec<_>>();
        let result = system_level(
            "enzh",
            &refs,
            "comet",
            DuplicateSystemPolicy::Reject,
            &DocumentCount,
        )
        .expect("non-empty language pair");
        assert_eq!(result.agreement, Correlation::Defined(1.0));
        assert_eq!(result.documents_total, 2);
        assert_eq!(result.documents_retained, 1);
        assert_eq!(result.systems, 3);
    }

    #[test]
    fn no_complete_document_is_undefined() {
        let records = vec![
            record("d1", "A", 10.0),
            record("d1", "B", 20.0),
            record("d2", "B", 30.0),
            record("d2", "C", 40.0),
        ];
        let refs = records.iter().collect::<Vec<_>>();
        let result = system_level(
            "enzh",
            &refs,
            "comet",
            DuplicateSystemPolicy::Reject,
            &DocumentCount,
        )
        .expect("non-empty language pair");
        assert_eq!(result.agreement, Correlation::Undefined);
        assert_eq!(result.documents_retained, 0);
    }

    #[test]
    fn empty_language_pair_is_an_error() {
        let result = system_level(
            "enzh",
            &[],
            "comet",
            DuplicateSystemPolicy::Reject,
            &DocumentCount,
        );
        assert_eq!(
            result.unwrap_err(),
            EvalError::EmptyLanguagePair {
                lang: "enzh".to_string()
            }
        );
    }

    #[test]
    fn duplicate_system_records_follow_the_policy() {
        let records = vec![
            record("d1", "A", 10.0),
            record("d1", "A", 20.0),
            record("d1", "B", 30.0),
        ];
        let refs = records.iter().collect::<Vec<_>>();

        let err = build_system_buckets("enzh", &refs, "comet", DuplicateSystemPolicy::Reject)
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::DuplicateSystemRecord {
                lang: "enzh".to_string(),
                doc_id: "d1".to_string(),
                system: "A".to_string(),
            }
        );

        let buckets =
            build_system_buckets("enzh", &refs, "comet", DuplicateSystemPolicy::KeepLast)
                .expect("later record wins");
        assert_eq!(buckets[0].scores["A"].score, 20.0);
    }
}
