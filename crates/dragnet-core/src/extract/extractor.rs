use std::collections::{BTreeMap, HashSet};

use crate::entity::EntityType;

use super::normalizer::normalize;
use super::patterns::{PatternError, PatternSet};

/// Extraction output: ordered distinct normalized values per type. Types
/// with no accepted matches carry no key. `EntityType`'s ordering follows
/// declaration order, so iteration over the map is deterministic.
pub type ValuesByType = BTreeMap<EntityType, Vec<String>>;

/// Scans raw text with the pattern registry and normalizes every match.
pub struct EntityExtractor {
    patterns: PatternSet,
}

impl EntityExtractor {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            patterns: PatternSet::builtin()?,
        })
    }

    #[must_use]
    pub fn with_patterns(patterns: PatternSet) -> Self {
        Self { patterns }
    }

    /// Runs every matcher over the full text. Matches whose normalization
    /// fails are dropped; duplicates within a type keep first-seen order.
    #[must_use]
    pub fn extract(&self, text: &str) -> ValuesByType {
        let mut by_type = ValuesByType::new();

        for (entity_type, regex) in self.patterns.iter() {
            let mut seen = HashSet::new();
            let mut values = Vec::new();

            for found in regex.find_iter(text) {
                let Some(value) = normalize(entity_type, found.as_str()) else {
                    continue;
                };
                if seen.insert(value.clone()) {
                    values.push(value);
                }
            }

            if !values.is_empty() {
                by_type.insert(entity_type, values);
            }
        }

        by_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new().unwrap()
    }

    #[test]
    fn case_variants_collapse_to_one_email() {
        let out = extractor().extract("Contact jane@x.com or JANE@x.com for details.");

        assert_eq!(
            out.get(&EntityType::Email),
            Some(&vec!["jane@x.com".to_string()])
        );
    }

    #[test]
    fn empty_text_yields_no_keys() {
        assert!(extractor().extract("").is_empty());
        assert!(extractor().extract("nothing of interest here").is_empty());
    }

    #[test]
    fn duplicates_keep_first_seen_order() {
        let out = extractor().extract("b@x.com first, then a@x.com, then b@x.com again");

        assert_eq!(
            out.get(&EntityType::Email),
            Some(&vec!["b@x.com".to_string(), "a@x.com".to_string()])
        );
    }

    #[test]
    fn mixed_document_extracts_each_type() {
        let text = "Reach JANE@X.com or jane@x.com today. Call (555) 987-6543 soon. \
                    Card 4111-1111-1111-1111 was used at 192.168.1.1 by @shadow_fox \
                    with SSN 123-45-6789 via https://example.com/path today.";
        let out = extractor().extract(text);

        assert_eq!(
            out.get(&EntityType::Email),
            Some(&vec!["jane@x.com".to_string()])
        );
        assert_eq!(
            out.get(&EntityType::Phone),
            Some(&vec!["5559876543".to_string()])
        );
        assert_eq!(
            out.get(&EntityType::CreditCard),
            Some(&vec!["4111111111111111".to_string()])
        );
        assert_eq!(
            out.get(&EntityType::IpAddress),
            Some(&vec!["192.168.1.1".to_string()])
        );
        assert_eq!(
            out.get(&EntityType::Ssn),
            Some(&vec!["123-45-6789".to_string()])
        );
        assert_eq!(
            out.get(&EntityType::Url),
            Some(&vec!["https://example.com/path".to_string()])
        );

        let usernames = out.get(&EntityType::Username).unwrap();
        assert!(usernames.contains(&"@shadow_fox".to_string()));

        let domains = out.get(&EntityType::Domain).unwrap();
        assert!(domains.contains(&"x.com".to_string()));
        assert!(domains.contains(&"example.com".to_string()));
    }

    #[test]
    fn nine_digit_fragments_yield_no_phone() {
        let out = extractor().extract("fragment 555-123-456 only");
        assert!(!out.contains_key(&EntityType::Phone));
    }

    #[test]
    fn seventeen_digit_runs_yield_no_card() {
        let out = extractor().extract("serial 41111111111111112 logged");
        assert!(!out.contains_key(&EntityType::CreditCard));
    }
}
