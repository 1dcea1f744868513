//! Genre affinity scoring
//!
//! Ranks discovery candidates by how well their tags overlap a user's
//! taste profile, instead of globally blocklisting genres. Constants
//! are load-bearing for downstream ranking; do not re-derive them.

/// Minimum affinity for a candidate to be considered relevant
///
/// 0.1 requires at least some partial genre overlap. Set to 0.0 to
/// accept any genre.
pub const MIN_GENRE_AFFINITY: f64 = 0.1;

/// Score awarded for a verbatim genre match
const EXACT_MATCH_SCORE: f64 = 1.0;
/// Score awarded for a sub-genre (substring) overlap
const PARTIAL_MATCH_SCORE: f64 = 0.5;

/// Overlap score in [0, 1] between a candidate's genres and a user's
///
/// Each candidate genre scores 1.0 when present verbatim in the user
/// set (case-folded), else 0.5 when either string contains the other
/// ("indie pop" overlaps "pop"). The sum is normalized by the number
/// of candidate genres and capped at 1. Either list empty scores 0.
pub fn genre_affinity(user_genres: &[String], candidate_genres: &[String]) -> f64 {
    if user_genres.is_empty() || candidate_genres.is_empty() {
        return 0.0;
    }

    let user_set: Vec<String> = user_genres.iter().map(|g| g.to_lowercase()).collect();

    let mut matches = 0.0;
    for candidate in candidate_genres {
        let candidate = candidate.to_lowercase();
        if user_set.iter().any(|ug| *ug == candidate) {
            matches += EXACT_MATCH_SCORE;
            continue;
        }
        if user_set
            .iter()
            .any(|ug| candidate.contains(ug.as_str()) || ug.contains(candidate.as_str()))
        {
            matches += PARTIAL_MATCH_SCORE;
        }
    }

    (matches / candidate_genres.len() as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genres(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_lists_score_zero() {
        assert_eq!(genre_affinity(&[], &genres(&["pop"])), 0.0);
        assert_eq!(genre_affinity(&genres(&["pop"]), &[]), 0.0);
        assert_eq!(genre_affinity(&[], &[]), 0.0);
    }

    #[test]
    fn test_exact_match_scores_one() {
        assert_eq!(genre_affinity(&genres(&["pop"]), &genres(&["pop"])), 1.0);
        assert_eq!(genre_affinity(&genres(&["Pop"]), &genres(&["POP"])), 1.0);
    }

    #[test]
    fn test_partial_match_scores_half() {
        let score = genre_affinity(&genres(&["indie"]), &genres(&["indie pop"]));
        assert!(score > 0.0 && score <= 1.0);
        assert_eq!(score, 0.5);

        // Symmetric: user's compound genre overlaps candidate's simple one
        let score = genre_affinity(&genres(&["indie pop"]), &genres(&["indie"]));
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_score_never_exceeds_one() {
        // Exact match on both candidate genres still normalizes to 1
        let score = genre_affinity(
            &genres(&["pop", "rock", "indie pop"]),
            &genres(&["pop", "rock"]),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        assert_eq!(
            genre_affinity(&genres(&["death metal"]), &genres(&["bossa nova"])),
            0.0
        );
    }

    #[test]
    fn test_mixed_overlap_normalizes_by_candidate_count() {
        // One exact (1.0) + one miss over two candidate genres = 0.5
        let score = genre_affinity(&genres(&["jazz"]), &genres(&["jazz", "polka"]));
        assert_eq!(score, 0.5);
        assert!(score >= MIN_GENRE_AFFINITY);
    }
}
