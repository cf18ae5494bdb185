use regex::Regex;
use thiserror::Error;

use crate::entity::EntityType;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid pattern for {entity_type}: {source}")]
    Invalid {
        entity_type: EntityType,
        #[source]
        source: regex::Error,
    },
}

/// Closed registry of one compiled matcher per entity type.
///
/// Iteration follows the declaration order of `EntityType::ALL`, which keeps
/// extractor output deterministic.
pub struct PatternSet {
    patterns: Vec<(EntityType, Regex)>,
}

impl PatternSet {
    /// The built-in matcher table. Matches are taken non-overlapping, left
    /// to right, whole-match text only.
    pub fn builtin() -> Result<Self, PatternError> {
        const TABLE: [(EntityType, &str); 8] = [
            (
                EntityType::Email,
                r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+",
            ),
            (
                EntityType::Phone,
                r"(?:\+\d{1,2}\s)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}",
            ),
            (
                EntityType::Url,
                r"https?://(?:[-\w.]|(?:%[\da-fA-F]{2}))+[/\w.-]*(?:\?[\w=&.]+)?",
            ),
            (EntityType::CreditCard, r"\b(?:\d{4}[- ]?){3}\d{4}\b"),
            (EntityType::IpAddress, r"\b(?:\d{1,3}\.){3}\d{1,3}\b"),
            (EntityType::Username, r"@\w+"),
            (EntityType::Ssn, r"\b\d{3}-?\d{2}-?\d{4}\b"),
            (
                EntityType::Domain,
                r"\b(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}\b",
            ),
        ];

        let mut patterns = Vec::with_capacity(TABLE.len());
        for (entity_type, pattern) in TABLE {
            let regex = Regex::new(pattern)
                .map_err(|source| PatternError::Invalid { entity_type, source })?;
            patterns.push((entity_type, regex));
        }
        Ok(Self { patterns })
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityType, &Regex)> + '_ {
        self.patterns.iter().map(|(entity_type, regex)| (*entity_type, regex))
    }

    #[must_use]
    pub fn get(&self, entity_type: EntityType) -> Option<&Regex> {
        self.patterns
            .iter()
            .find(|(candidate, _)| *candidate == entity_type)
            .map(|(_, regex)| regex)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match(entity_type: EntityType, text: &str) -> Option<String> {
        let set = PatternSet::builtin().unwrap();
        set.get(entity_type)
            .and_then(|regex| regex.find(text))
            .map(|m| m.as_str().to_string())
    }

    #[test]
    fn builtin_covers_every_type() {
        let set = PatternSet::builtin().unwrap();
        assert_eq!(set.len(), EntityType::ALL.len());
        for entity_type in EntityType::ALL {
            assert!(set.get(entity_type).is_some());
        }
    }

    #[test]
    fn matchers_find_canonical_forms() {
        assert_eq!(
            first_match(EntityType::Email, "write to jane@x.com today"),
            Some("jane@x.com".into())
        );
        assert_eq!(
            first_match(EntityType::Phone, "call (555) 987-6543 now"),
            Some("(555) 987-6543".into())
        );
        assert_eq!(
            first_match(EntityType::Url, "see https://example.com/path?q=1 here"),
            Some("https://example.com/path?q=1".into())
        );
        assert_eq!(
            first_match(EntityType::CreditCard, "card 4111-1111-1111-1111 used"),
            Some("4111-1111-1111-1111".into())
        );
        assert_eq!(
            first_match(EntityType::IpAddress, "from 192.168.1.1 at night"),
            Some("192.168.1.1".into())
        );
        assert_eq!(
            first_match(EntityType::Username, "posted by @shadow_fox"),
            Some("@shadow_fox".into())
        );
        assert_eq!(
            first_match(EntityType::Ssn, "ssn 123-45-6789 on file"),
            Some("123-45-6789".into())
        );
        assert_eq!(
            first_match(EntityType::Domain, "hosted at mail.example.com"),
            Some("mail.example.com".into())
        );
    }

    #[test]
    fn ssn_matcher_skips_phone_and_card_shapes() {
        assert_eq!(first_match(EntityType::Ssn, "call 555-123-4567"), None);
        assert_eq!(first_match(EntityType::Ssn, "card 4111-1111-1111-1111"), None);
    }

    #[test]
    fn phone_matcher_skips_dashed_card_shapes() {
        assert_eq!(first_match(EntityType::Phone, "card 4111-1111-1111-1111"), None);
    }

    #[test]
    fn ip_matcher_requires_four_octets() {
        assert_eq!(first_match(EntityType::IpAddress, "version 1.2.3"), None);
        assert_eq!(
            first_match(EntityType::IpAddress, "10.0.0.254 responded"),
            Some("10.0.0.254".into())
        );
    }
}
