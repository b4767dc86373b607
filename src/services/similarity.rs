use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::UserSimilarity;

/// Jaccard index of two sets: intersection size over union size.
///
/// Returns 0.0 for two empty sets, though callers guard against that case
/// (the target user's set is checked for emptiness before ranking).
pub fn jaccard_index(a: &HashSet<Uuid>, b: &HashSet<Uuid>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Scores every candidate user against the target's rated-movie set and
/// returns them ranked by descending similarity.
///
/// Equal scores break ascending by user id so the ranking is deterministic
/// regardless of map iteration order.
pub fn rank_by_overlap(
    target_movies: &HashSet<Uuid>,
    candidates: HashMap<Uuid, HashSet<Uuid>>,
) -> Vec<UserSimilarity> {
    let mut ranked: Vec<UserSimilarity> = candidates
        .into_iter()
        .map(|(user_id, rated)| UserSimilarity {
            user_id,
            score: jaccard_index(target_movies, &rated),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn set(ids: &[Uuid]) -> HashSet<Uuid> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_jaccard_identical_sets_is_one() {
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let a = set(&[m1, m2]);
        let b = set(&[m1, m2]);
        assert!((jaccard_index(&a, &b) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_jaccard_disjoint_sets_is_zero() {
        let a = set(&[Uuid::new_v4()]);
        let b = set(&[Uuid::new_v4()]);
        assert!(jaccard_index(&a, &b).abs() < EPSILON);
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let m3 = Uuid::new_v4();
        // |{m1,m2} ∩ {m1,m2,m3}| / |{m1,m2} ∪ {m1,m2,m3}| = 2/3
        let a = set(&[m1, m2]);
        let b = set(&[m1, m2, m3]);
        assert!((jaccard_index(&a, &b) - 2.0 / 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_jaccard_is_symmetric() {
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let m3 = Uuid::new_v4();
        let a = set(&[m1, m2]);
        let b = set(&[m2, m3]);
        assert!((jaccard_index(&a, &b) - jaccard_index(&b, &a)).abs() < EPSILON);
    }

    #[test]
    fn test_rank_by_overlap_orders_descending() {
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let m3 = Uuid::new_v4();
        let target = set(&[m1, m2]);

        let close = Uuid::new_v4();
        let distant = Uuid::new_v4();
        let mut candidates = HashMap::new();
        candidates.insert(close, set(&[m1, m2]));
        candidates.insert(distant, set(&[m1, m3]));

        let ranked = rank_by_overlap(&target, candidates);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].user_id, close);
        assert!((ranked[0].score - 1.0).abs() < EPSILON);
        assert_eq!(ranked[1].user_id, distant);
        assert!((ranked[1].score - 1.0 / 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_rank_by_overlap_ties_break_by_user_id() {
        let m1 = Uuid::new_v4();
        let target = set(&[m1]);

        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let mut candidates = HashMap::new();
        candidates.insert(user_a, set(&[m1]));
        candidates.insert(user_b, set(&[m1]));

        let ranked = rank_by_overlap(&target, candidates);
        let mut expected = [user_a, user_b];
        expected.sort();
        assert_eq!(ranked[0].user_id, expected[0]);
        assert_eq!(ranked[1].user_id, expected[1]);
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let movies: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let target = set(&movies[..3]);

        let mut candidates = HashMap::new();
        candidates.insert(Uuid::new_v4(), set(&movies[1..]));
        candidates.insert(Uuid::new_v4(), set(&movies[..1]));

        for entry in rank_by_overlap(&target, candidates) {
            assert!(entry.score >= 0.0 && entry.score <= 1.0);
        }
    }
}
