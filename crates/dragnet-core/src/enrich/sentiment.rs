use std::collections::HashMap;

use crate::entity::SentimentScore;

use super::enricher::EnrichResult;

/// Scores one sentence. `compound` must land in [-1, 1]; the positive,
/// negative, and neutral components are proportions of the sentence's
/// tokens. Implementations must be deterministic.
#[async_trait::async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, sentence: &str) -> EnrichResult<SentimentScore>;
}

/// Valence per lexicon word, roughly on a [-4, 4] scale.
const LEXICON: [(&str, f64); 62] = [
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("best", 3.2),
    ("perfect", 2.7),
    ("love", 3.2),
    ("happy", 2.7),
    ("thanks", 1.9),
    ("thank", 1.9),
    ("trust", 2.3),
    ("trusted", 2.3),
    ("reliable", 2.0),
    ("secure", 1.9),
    ("safe", 1.9),
    ("legit", 1.6),
    ("legitimate", 1.6),
    ("verified", 1.7),
    ("confirmed", 1.3),
    ("clean", 1.7),
    ("success", 2.7),
    ("successful", 2.7),
    ("helpful", 1.9),
    ("friend", 2.2),
    ("easy", 1.9),
    ("profit", 2.2),
    ("free", 2.3),
    ("win", 2.8),
    ("bad", -2.5),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("horrible", -2.5),
    ("hate", -2.7),
    ("scam", -2.2),
    ("fraud", -2.6),
    ("fraudulent", -2.6),
    ("fake", -1.8),
    ("stolen", -2.2),
    ("steal", -2.2),
    ("theft", -2.0),
    ("breach", -1.9),
    ("leak", -1.6),
    ("leaked", -1.6),
    ("attack", -2.1),
    ("threat", -1.8),
    ("threaten", -1.9),
    ("suspicious", -1.4),
    ("illegal", -2.2),
    ("crime", -2.5),
    ("criminal", -2.5),
    ("danger", -2.4),
    ("dangerous", -2.4),
    ("risky", -1.4),
    ("warning", -1.4),
    ("worried", -1.9),
    ("worry", -1.9),
    ("problem", -1.7),
    ("fail", -2.3),
    ("failed", -2.3),
    ("loss", -1.8),
    ("angry", -2.3),
    ("victim", -1.9),
    ("compromised", -1.9),
];

const NEGATORS: [&str; 15] = [
    "not", "no", "never", "neither", "nor", "cannot", "can't", "won't", "don't", "didn't",
    "isn't", "wasn't", "aren't", "doesn't", "hardly",
];

/// Intensity modifiers applied to the following lexicon word. Positive
/// values amplify, negative values dampen.
const BOOSTERS: [(&str, f64); 9] = [
    ("very", 0.293),
    ("really", 0.293),
    ("extremely", 0.293),
    ("absolutely", 0.293),
    ("incredibly", 0.293),
    ("totally", 0.293),
    ("slightly", -0.293),
    ("somewhat", -0.293),
    ("barely", -0.293),
];

/// Negation discovered within this many preceding tokens flips a word's
/// valence.
const NEGATION_WINDOW: usize = 3;
const NEGATION_FACTOR: f64 = -0.74;

/// Deterministic valence-lexicon scorer. Token valences are adjusted for
/// an immediately preceding booster and for negators in the preceding
/// window, summed, and squashed into [-1, 1] via x / sqrt(x^2 + 15).
pub struct LexiconScorer {
    lexicon: HashMap<&'static str, f64>,
    boosters: HashMap<&'static str, f64>,
}

impl LexiconScorer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lexicon: LEXICON.into_iter().collect(),
            boosters: BOOSTERS.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn score_text(&self, sentence: &str) -> SentimentScore {
        let tokens = tokenize(sentence);
        if tokens.is_empty() {
            return SentimentScore::default();
        }

        let mut sum = 0.0;
        let mut positive_hits = 0usize;
        let mut negative_hits = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.lexicon.get(token.as_str()) else {
                continue;
            };

            let mut valence = base;
            if i > 0 {
                if let Some(&boost) = self.boosters.get(tokens[i - 1].as_str()) {
                    valence += if valence > 0.0 { boost } else { -boost };
                }
            }

            let negated = tokens[..i]
                .iter()
                .rev()
                .take(NEGATION_WINDOW)
                .any(|t| NEGATORS.contains(&t.as_str()));
            if negated {
                valence *= NEGATION_FACTOR;
            }

            sum += valence;
            if valence > 0.0 {
                positive_hits += 1;
            } else if valence < 0.0 {
                negative_hits += 1;
            }
        }

        let total = tokens.len() as f64;
        let compound = (sum / (sum * sum + 15.0).sqrt()).clamp(-1.0, 1.0);

        SentimentScore {
            compound,
            positive: positive_hits as f64 / total,
            negative: negative_hits as f64 / total,
            neutral: (total - positive_hits as f64 - negative_hits as f64) / total,
        }
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SentimentScorer for LexiconScorer {
    async fn score(&self, sentence: &str) -> EnrichResult<SentimentScore> {
        Ok(self.score_text(sentence))
    }
}

fn tokenize(sentence: &str) -> Vec<String> {
    sentence
        .split_whitespace()
        .map(|raw| {
            raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SentimentLabel;

    #[test]
    fn positive_words_score_positive() {
        let score = LexiconScorer::new().score_text("It went great.");

        assert_eq!(score.label(), SentimentLabel::Positive);
        assert!(score.compound > 0.05);
        assert!(score.positive > 0.0);
    }

    #[test]
    fn negative_words_score_negative() {
        let score = LexiconScorer::new().score_text("This deal is a scam and a fraud.");

        assert_eq!(score.label(), SentimentLabel::Negative);
        assert!(score.compound < -0.05);
    }

    #[test]
    fn unknown_words_score_neutral() {
        let score = LexiconScorer::new().score_text("The file was sent on Tuesday.");

        assert_eq!(score.label(), SentimentLabel::Neutral);
        assert!((score.compound).abs() < f64::EPSILON);
        assert!((score.neutral - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negation_flips_valence() {
        let scorer = LexiconScorer::new();
        let plain = scorer.score_text("The deal was good.");
        let negated = scorer.score_text("The deal was not good.");

        assert!(plain.compound > 0.05);
        assert!(negated.compound < -0.05);
    }

    #[test]
    fn boosters_amplify() {
        let scorer = LexiconScorer::new();
        let plain = scorer.score_text("good outcome");
        let boosted = scorer.score_text("very good outcome");
        let dampened = scorer.score_text("slightly good outcome");

        assert!(boosted.compound > plain.compound);
        assert!(dampened.compound < plain.compound);
        assert!(dampened.compound > 0.0);
    }

    #[test]
    fn components_are_proportions() {
        let score = LexiconScorer::new().score_text("good people fear a scam");

        assert!((score.positive + score.negative + score.neutral - 1.0).abs() < 1e-12);
        assert!(score.positive > 0.0);
        assert!(score.negative > 0.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        let score = LexiconScorer::new().score_text("");

        assert!((score.compound).abs() < f64::EPSILON);
        assert!((score.neutral).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn scoring_is_deterministic() {
        let scorer = LexiconScorer::new();
        let a = scorer.score("A great win against fraud.").await.unwrap();
        let b = scorer.score("A great win against fraud.").await.unwrap();

        assert!((a.compound - b.compound).abs() < f64::EPSILON);
        assert!((a.positive - b.positive).abs() < f64::EPSILON);
    }
}
