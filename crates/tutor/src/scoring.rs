use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnswerVerdict {
    Correct,
    /// Wrong, but within the configured edit distance of the term.
    NearMiss { distance: usize },
    Incorrect,
}

impl AnswerVerdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerVerdict::Correct)
    }
}

pub fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Case-insensitive, whitespace-trimmed exact equality.
pub fn answers_match(input: &str, term: &str) -> bool {
    normalize_answer(input) == normalize_answer(term)
}

/// Case-insensitive equality between an assembled character sequence and the term.
pub fn sequence_matches(assembled: &[char], term: &str) -> bool {
    let assembled: String = assembled.iter().collect();
    assembled.to_lowercase() == term.to_lowercase()
}

/// Levenshtein distance over chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

pub fn grade_typed(input: &str, term: &str, near_miss_distance: usize) -> AnswerVerdict {
    let input = normalize_answer(input);
    let term = normalize_answer(term);
    if input == term {
        return AnswerVerdict::Correct;
    }
    if input.is_empty() || near_miss_distance == 0 {
        return AnswerVerdict::Incorrect;
    }
    let distance = edit_distance(&input, &term);
    if distance <= near_miss_distance {
        AnswerVerdict::NearMiss { distance }
    } else {
        AnswerVerdict::Incorrect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ignores_case_and_padding() {
        assert!(answers_match("Apple", "apple"));
        assert!(answers_match("  apple ", "apple"));
        assert!(!answers_match("aplpe", "apple"));
    }

    #[test]
    fn sequences_compare_case_insensitively() {
        assert!(sequence_matches(&['A', 'p', 'p', 'l', 'e'], "apple"));
        assert!(!sequence_matches(&['a', 'p', 'l', 'p', 'e'], "apple"));
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("apple", "apple"), 0);
        assert_eq!(edit_distance("aple", "apple"), 1);
    }

    #[test]
    fn grading_flags_near_misses() {
        assert_eq!(grade_typed("APPLE", "apple", 1), AnswerVerdict::Correct);
        assert_eq!(
            grade_typed("aple", "apple", 1),
            AnswerVerdict::NearMiss { distance: 1 }
        );
        assert_eq!(grade_typed("aplpe", "apple", 1), AnswerVerdict::Incorrect);
        assert_eq!(grade_typed("aple", "apple", 0), AnswerVerdict::Incorrect);
        assert_eq!(grade_typed("   ", "a", 3), AnswerVerdict::Incorrect);
    }
}
