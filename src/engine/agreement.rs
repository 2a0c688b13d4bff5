use std::cmp::Ordering;

use super::correlation::Correlation;
use super::system::{DocumentBucket, ScoreKey, SystemAgreement};

const EXACT_ENUMERATION_MAX_DOCUMENTS: usize = 12;

pub const DEFAULT_PERMUTATIONS: usize = 1000;
pub const DEFAULT_SEED: u64 = 0x5EED_2026;

#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseAccuracy;

#[derive(Debug, Clone, Copy)]
pub struct SoftPairwiseAccuracy {
    pub permutations: usize,
    pub seed: u64,
}

impl Default for SoftPairwiseAccuracy {
    fn default() -> Self {
        Self {
            permutations: DEFAULT_PERMUTATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

impl SystemAgreement for PairwiseAccuracy {
    fn name(&self) -> &'static str {
        "pairwise-accuracy"
    }

    fn compute_system_agreement(
        &self,
        reference: &[DocumentBucket],
        candidate: &[DocumentBucket],
        key_pair: (ScoreKey, ScoreKey),
    ) -> Correlation {
        let systems = roster(reference);
        let (Some(human), Some(metric)) = (
            system_means(reference, &systems, key_pair.0),
            system_means(candidate, &systems, key_pair.1),
        ) else {
            return Correlation::Undefined;
        };

        let pairs = system_pairs(systems.len());
        if pairs.is_empty() {
            return Correlation::Undefined;
        }

        let agreeing = pairs
            .iter()
            .filter(|(a, b)| compare(human[*a], human[*b]) == compare(metric[*a], metric[*b]))
            .count();
        Correlation::Defined(agreeing as f64 / pairs.len() as f64)
    }
}

impl SystemAgreement for SoftPairwiseAccuracy {
    fn name(&self) -> &'static str {
        "spa"
    }

    fn compute_system_agreement(
        &self,
        reference: &[DocumentBucket],
        candidate: &[DocumentBucket],
        key_pair: (ScoreKey, ScoreKey),
    ) -> Correlation {
        let systems = roster(reference);
        let pairs = system_pairs(systems.len());
        if pairs.is_empty() || reference.is_empty() || candidate.is_empty() {
            return Correlation::Undefined;
        }

        let mut total = 0.0_f64;
        for (a, b) in &pairs {
            let (Some(human), Some(metric)) = (
                paired_differences(reference, systems[*a], systems[*b], key_pair.0),
                paired_differences(candidate, systems[*a], systems[*b], key_pair.1),
            ) else {
                return Correlation::Undefined;
            };
            let (Some(p_human), Some(p_metric)) = (
                self.permutation_p_value(&human),
                self.permutation_p_value(&metric),
            ) else {
                return Correlation::Undefined;
            };
            total += 1.0 - (p_human - p_metric).abs();
        }

        Correlation::Defined(total / pairs.len() as f64)
    }
}

impl SoftPairwiseAccuracy {
    fn permutation_p_value(&self, differences: &[f64]) -> Option<f64> {
        let n = differences.len();
        let observed = signed_mean(differences, |_| false);
        let tolerance = 1e-9
            * differences
                .iter()
                .fold(0.0_f64, |acc, value| acc.max(value.abs()));

        if n <= EXACT_ENUMERATION_MAX_DOCUMENTS {
            let total = 1_u64 << n;
            let at_least = (0..total)
                .filter(|&mask| {
                    signed_mean(differences, |index| (mask >> index) & 1 == 1)
                        >= observed - tolerance
                })
                .count();
            return Some(at_least as f64 / total as f64);
        }

        if self.permutations == 0 {
            return None;
        }

        let mut rng = XorShift::new(self.seed);
        let mut at_least = 0_usize;
        for _ in 0..self.permutations {
            let flips = (0..n).map(|_| rng.next_bool()).collect::<Vec<_>>();
            if signed_mean(differences, |index| flips[index]) >= observed - tolerance {
                at_least += 1;
            }
        }
        Some((at_least + 1) as f64 / (self.permutations + 1) as f64)
    }
}

fn signed_mean(values: &[f64], flip: impl Fn(usize) -> bool) -> f64 {
    let sum = values
        .iter()
        .enumerate()
        .map(|(index, value)| if flip(index) { -value } else { *value })
        .sum::<f64>();
    sum / values.len() as f64
}

fn roster(documents: &[DocumentBucket]) -> Vec<&str> {
    documents
        .first()
        .map(|document| document.scores.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

fn system_pairs(count: usize) -> Vec<(usize, usize)> {
    (0..count)
        .flat_map(|a| ((a + 1)..count).map(move |b| (a, b)))
        .collect()
}

fn system_means(
    documents: &[DocumentBucket],
    systems: &[&str],
    key: ScoreKey,
) -> Option<Vec<f64>> {
    if documents.is_empty() {
        return None;
    }

    systems
        .iter()
        .map(|system| {
            let total = documents
                .iter()
                .map(|document| document.scores.get(*system).map(|scores| scores.get(key)))
                .sum::<Option<f64>>()?;
            Some(total / documents.len() as f64)
        })
        .collect()
}

fn paired_differences(
    documents: &[DocumentBucket],
    first: &str,
    second: &str,
    key: ScoreKey,
) -> Option<Vec<f64>> {
    documents
        .iter()
        .map(|document| {
            let lhs = document.scores.get(first)?.get(key);
            let rhs = document.scores.get(second)?.get(key);
            Some(lhs - rhs)
        })
        .collect()
}

fn compare(left: f64, right: f64) -> Ordering {
    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}

struct XorShift {
    state: u64,
}

impl XorShift {
    fn new(seed: u64) -> Self {
        // xorshift never leaves the all-zero state
        Self {
            state: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    fn next_bool(&mut self) -> bool {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state >> 63 == 1
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::engine::system::SystemScores;

    fn document(doc_id: &str, rows: &[(&str, f64, f64)]) -> DocumentBucket {
        DocumentBucket {
            doc_id: doc_id.to_string(),
            scores: rows
                .iter()
                .map(|(system, score, score_pred)| {
                    (
                        system.to_string(),
                        SystemScores {
                            score: *score,
                            score_pred: *score_pred,
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
        }
    }

    const KEYS: (ScoreKey, ScoreKey) = (ScoreKey::Human, ScoreKey::Predicted);

    #[test]
    fn pairwise_accuracy_counts_agreeing_system_orderings() {
        let documents = vec![
            document("d1", &[("A", 90.0, 0.3), ("B", 70.0, 0.2), ("C", 50.0, 0.4)]),
            document("d2", &[("A", 80.0, 0.3), ("B", 60.0, 0.2), ("C", 40.0, 0.4)]),
        ];
        // A>B agrees, A>C and B>C are inverted by the metric.
        let value = PairwiseAccuracy.compute_system_agreement(&documents, &documents, KEYS);
        assert_eq!(value, Correlation::Defined(1.0 / 3.0));
    }

    #[test]
    fn soft_pairwise_accuracy_is_one_for_rescaled_predictions() {
        let documents = vec![
            document("d1", &[("A", 90.0, 0.9), ("B", 70.0, 0.7), ("C", 75.0, 0.75)]),
            document("d2", &[("A", 60.0, 0.6), ("B", 65.0, 0.65), ("C", 20.0, 0.2)]),
            document("d3", &[("A", 85.0, 0.85), ("B", 40.0, 0.4), ("C", 55.0, 0.55)]),
        ];
        let value = SoftPairwiseAccuracy::default().compute_system_agreement(
            &documents, &documents, KEYS,
        );
        assert_eq!(value, Correlation::Defined(1.0));
    }

    #[test]
    fn soft_pairwise_accuracy_penalizes_confident_disagreement() {
        let documents = vec![
            document("d1", &[("A", 90.0, 0.1), ("B", 10.0, 0.9)]),
            document("d2", &[("A", 95.0, 0.2), ("B", 15.0, 0.8)]),
            document("d3", &[("A", 85.0, 0.3), ("B", 5.0, 0.7)]),
        ];
        // Human p-value is 1/8 and metric p-value is 1, so the pair scores 1/8.
        let value = SoftPairwiseAccuracy::default().compute_system_agreement(
            &documents, &documents, KEYS,
        );
        assert_eq!(value, Correlation::Defined(0.125));
    }

    #[test]
    fn monte_carlo_path_is_deterministic_for_a_seed() {
        let documents = (0..20)
            .map(|index| {
                let offset = index as f64;
                document(
                    &format!("d{index}"),
                    &[("A", 50.0 + offset, 0.4), ("B", 45.0 + offset * 0.5, 0.5)],
                )
            })
            .collect::<Vec<_>>();
        let statistic = SoftPairwiseAccuracy {
            permutations: 200,
            seed: 7,
        };

        let first = statistic.compute_system_agreement(&documents, &documents, KEYS);
        let second = statistic.compute_system_agreement(&documents, &documents, KEYS);
        assert_eq!(first, second);
        let value = first.value().expect("defined");
        assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn resampling_without_permutations_is_undefined() {
        let documents = (0..20)
            .map(|index| {
                let offset = index as f64;
                document(
                    &format!("d{index}"),
                    &[("A", 80.0 + offset, 0.2), ("B", 40.0 + offset, 0.8)],
                )
            })
            .collect::<Vec<_>>();

        let none = SoftPairwiseAccuracy {
            permutations: 0,
            seed: 1,
        };
        assert_eq!(
            none.compute_system_agreement(&documents, &documents, KEYS),
            Correlation::Undefined
        );

        let value = SoftPairwiseAccuracy {
            permutations: 1000,
            seed: 1,
        }
        .compute_system_agreement(&documents, &documents, KEYS)
        .value()
        .expect("defined");
        assert!(value < 0.01, "inverted metric scored {value}");
    }

    #[test]
    fn exact_enumeration_ignores_the_permutation_count() {
        let documents = vec![
            document("d1", &[("A", 90.0, 0.1), ("B", 10.0, 0.9)]),
            document("d2", &[("A", 95.0, 0.2), ("B", 15.0, 0.8)]),
            document("d3", &[("A", 85.0, 0.3), ("B", 5.0, 0.7)]),
        ];
        let statistic = SoftPairwiseAccuracy {
            permutations: 0,
            seed: 1,
        };
        assert_eq!(
            statistic.compute_system_agreement(&documents, &documents, KEYS),
            Correlation::Defined(0.125)
        );
    }

    #[test]
    fn a_single_system_has_no_pairs_to_compare() {
        let documents = vec![document("d1", &[("A", 90.0, 0.9)])];
        assert_eq!(
            PairwiseAccuracy.compute_system_agreement(&documents, &documents, KEYS),
            Correlation::Undefined
        );
        assert_eq!(
            SoftPairwiseAccuracy::default().compute_system_agreement(&documents, &documents, KEYS),
            Correlation::Undefined
        );
    }
}
