use super::enricher::EnrichResult;

/// Splits text into ordered sentences. Implementations must be
/// deterministic: identical input yields identical output.
#[async_trait::async_trait]
pub trait SentenceSegmenter: Send + Sync {
    async fn segment(&self, text: &str) -> EnrichResult<Vec<String>>;
}

/// Rule-based splitter: a sentence ends at `.`, `!` or `?` only when the
/// terminator is followed by whitespace or end of text, which keeps
/// decimals, dotted hostnames, and email addresses intact. Runs of
/// terminators stay attached to their sentence.
pub struct RuleSegmenter;

impl RuleSegmenter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn split(text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut sentences = Vec::new();
        let mut current = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            current.push(c);

            if matches!(c, '.' | '!' | '?') {
                while i + 1 < chars.len() && matches!(chars[i + 1], '.' | '!' | '?') {
                    i += 1;
                    current.push(chars[i]);
                }

                let at_boundary = i + 1 >= chars.len() || chars[i + 1].is_whitespace();
                if at_boundary {
                    let sentence = current.trim();
                    if !sentence.is_empty() {
                        sentences.push(sentence.to_string());
                    }
                    current.clear();
                }
            }

            i += 1;
        }

        let sentence = current.trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }

        sentences
    }
}

impl Default for RuleSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SentenceSegmenter for RuleSegmenter {
    async fn segment(&self, text: &str) -> EnrichResult<Vec<String>> {
        Ok(Self::split(text))
    }
}
