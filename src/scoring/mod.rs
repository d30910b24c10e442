//! Score recalculation for prompts.
//!
//! This is the algorithmic core of the reputation system. Everything here is
//! a pure function of the current verification set, so recomputing twice with
//! unchanged input yields identical scores. The store layer is responsible
//! for serializing recomputes per prompt; callers must treat this module as
//! the exclusive writer of the derived score fields.

use serde::{Deserialize, Serialize};

/// Reputation points awarded to a creator for each positive verification.
/// There is no decrement path; negative verifications award nothing.
pub const REPUTATION_AWARD: i32 = 10;

/// One verification joined with its author's current reputation points
#[derive(Debug, Clone, Copy)]
pub struct Judgment {
    pub is_useful: bool,
    pub verifier_reputation: i32,
}

/// The three derived fields persisted onto a prompt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub trust_score: f64,
    pub effectiveness_score: f64,
    pub verification_count: i32,
}

impl ScoreSummary {
    /// Scores for a prompt with no verifications
    pub fn zero() -> Self {
        Self {
            trust_score: 0.0,
            effectiveness_score: 0.0,
            verification_count: 0,
        }
    }
}

/// Display-oriented tally returned alongside a verification listing.
/// `trust_score` here must match the persisted score for the same set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationTally {
    pub useful_count: usize,
    pub not_useful_count: usize,
    pub total_count: usize,
    pub trust_score: f64,
}

/// Round to two decimal places, matching the persisted score precision
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Recompute the derived scores for one prompt.
///
/// - trust score: unweighted ratio of useful verifications, scaled to 0-100.
/// - effectiveness score: the same ratio weighted by each verifier's
///   reputation. Each weight gets a +1 floor so a zero-reputation verifier
///   still contributes, which also keeps the divisor non-zero whenever the
///   set is non-empty.
pub fn recompute(judgments: &[Judgment]) -> ScoreSummary {
    let total_count = judgments.len();
    if total_count == 0 {
        return ScoreSummary::zero();
    }

    let useful_count = judgments.iter().filter(|j| j.is_useful).count();
    let trust_score = round2(useful_count as f64 / total_count as f64 * 100.0);

    let mut weighted_sum = 0.0_f64;
    let mut total_weight = 0.0_f64;
    for judgment in judgments {
        let weight = (judgment.verifier_reputation as f64) + 1.0;
        let value = if judgment.is_useful { 1.0 } else { 0.0 };
        weighted_sum += value * weight;
        total_weight += weight;
    }

    let effectiveness_score = if total_weight > 0.0 {
        round2(weighted_sum / total_weight * 100.0)
    } else {
        0.0
    };

    ScoreSummary {
        trust_score,
        effectiveness_score,
        verification_count: total_count as i32,
    }
}

/// Tally a verification set for display. Uses the same trust formula as
/// [`recompute`] so the summary never drifts from the persisted score.
pub fn tally(useful_count: usize, not_useful_count: usize) -> VerificationTally {
    let total_count = useful_count + not_useful_count;
    let trust_score = if total_count > 0 {
        round2(useful_count as f64 / total_count as f64 * 100.0)
    } else {
        0.0
    };

    VerificationTally {
        useful_count,
        not_useful_count,
        total_count,
        trust_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn useful(rep: i32) -> Judgment {
        Judgment {
            is_useful: true,
            verifier_reputation: rep,
        }
    }

    fn not_useful(rep: i32) -> Judgment {
        Judgment {
            is_useful: false,
            verifier_reputation: rep,
        }
    }

    #[test]
    fn test_empty_set_yields_zeros() {
        let scores = recompute(&[]);
        assert_eq!(scores, ScoreSummary::zero());
    }

    #[test]
    fn test_single_useful_verification_at_zero_reputation() {
        // weight = 0 + 1, value = 1
        let scores = recompute(&[useful(0)]);
        assert_eq!(scores.verification_count, 1);
        assert_eq!(scores.trust_score, 100.00);
        assert_eq!(scores.effectiveness_score, 100.00);
    }

    #[test]
    fn test_weighted_split() {
        // (1*1 + 0*10) / (1 + 10) * 100 = 9.09
        let scores = recompute(&[useful(0), not_useful(9)]);
        assert_eq!(scores.verification_count, 2);
        assert_eq!(scores.trust_score, 50.00);
        assert_eq!(scores.effectiveness_score, 9.09);
    }

    #[test]
    fn test_high_reputation_verifier_dominates() {
        let scores = recompute(&[useful(99), not_useful(0)]);
        // (100) / (101) * 100 = 99.01
        assert_eq!(scores.trust_score, 50.00);
        assert_eq!(scores.effectiveness_score, 99.01);
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let judgments: Vec<Judgment> = (0..50)
            .map(|i| Judgment {
                is_useful: i % 3 == 0,
                verifier_reputation: i * 10,
            })
            .collect();
        let scores = recompute(&judgments);
        assert!(scores.trust_score >= 0.0 && scores.trust_score <= 100.0);
        assert!(scores.effectiveness_score >= 0.0 && scores.effectiveness_score <= 100.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let judgments = vec![useful(0), not_useful(9), useful(25)];
        let first = recompute(&judgments);
        let second = recompute(&judgments);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        // 1/3 useful -> 33.333... -> 33.33
        let scores = recompute(&[useful(0), not_useful(0), not_useful(0)]);
        assert_eq!(scores.trust_score, 33.33);
    }

    #[test]
    fn test_tally_matches_recompute() {
        let judgments = vec![useful(0), not_useful(9)];
        let scores = recompute(&judgments);
        let tally = tally(1, 1);
        assert_eq!(tally.total_count, 2);
        assert_eq!(tally.useful_count, 1);
        assert_eq!(tally.not_useful_count, 1);
        assert_eq!(tally.trust_score, scores.trust_score);
    }
}
