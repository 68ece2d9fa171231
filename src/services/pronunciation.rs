use serde::Serialize;

pub const ACCEPT_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PronunciationScore {
    pub score: f64,
    pub accepted: bool,
}

impl PronunciationScore {
    const REJECTED: Self = Self {
        score: 0.0,
        accepted: false,
    };

    fn from_score(score: f64) -> Self {
        Self {
            score,
            accepted: score > ACCEPT_THRESHOLD,
        }
    }
}

/// Lenient bag-of-words overlap between a recognized transcript and the
/// expected phrase.
///
/// A transcript word counts as a match when it contains, or is contained in,
/// any expected word. Repeated transcript words are counted per occurrence.
pub fn score_pronunciation(transcript: &str, expected: &str) -> PronunciationScore {
    let transcript = transcript.trim().to_lowercase();
    let expected = expected.trim().to_lowercase();
    if transcript.is_empty() || expected.is_empty() {
        return PronunciationScore::REJECTED;
    }

    let spoken: Vec<&str> = transcript.split_whitespace().collect();
    let target: Vec<&str> = expected.split_whitespace().collect();

    let matches = spoken
        .iter()
        .filter(|w1| target.iter().any(|w2| w2.contains(*w1) || w1.contains(w2)))
        .count();

    // matches <= spoken.len() <= denominator, so the score stays within [0, 1]
    let denominator = spoken.len().max(target.len());
    PronunciationScore::from_score(matches as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sentence_rejected() {
        let result = score_pronunciation("namaste kaise ho", "namaste aap kaise hain");
        assert!((result.score - 0.5).abs() < 1e-9);
        assert!(!result.accepted);
    }

    #[test]
    fn test_exact_word_accepted() {
        let result = score_pronunciation("dhanyavaad", "dhanyavaad");
        assert!((result.score - 1.0).abs() < 1e-9);
        assert!(result.accepted);
    }

    #[test]
    fn test_case_insensitive() {
        let result = score_pronunciation("NAMASTE", "Namaste");
        assert!(result.accepted);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert_eq!(score_pronunciation("", "namaste"), PronunciationScore::REJECTED);
        assert_eq!(score_pronunciation("namaste", "   "), PronunciationScore::REJECTED);
    }

    #[test]
    fn test_substring_match_is_lenient() {
        // "haan" vs "haa": partial transcription still counts
        let result = score_pronunciation("haa", "Haan");
        assert!(result.accepted);
    }

    #[test]
    fn test_duplicates_counted_per_occurrence() {
        // each "mera" matches, and the longer transcript sets the denominator
        let result = score_pronunciation("mera mera mera", "mera naam");
        assert!((result.score - 1.0).abs() < 1e-9);

        let result = score_pronunciation("mera mera", "mera naam rahul hai");
        assert!((result.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_punctuation_kept_in_tokens() {
        // "hain?" contains "hain", so the expected word with trailing punctuation still matches
        let result = score_pronunciation("aap kaise hain", "Aap kaise hain?");
        assert!((result.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_strict() {
        // 3 of 5 words = 0.6, which is not above the threshold
        let result = score_pronunciation("main bharat se", "main bharat se hoon ji");
        assert!((result.score - 0.6).abs() < 1e-9);
        assert!(!result.accepted);
    }
}
