use crate::entity::EntityType;

/// Canonicalizes one raw match for its type. `None` drops the match.
///
/// Rules: emails and domains lower-case; phones keep digits only and need
/// at least 10; card numbers keep digits only and need 15 or 16 (length
/// heuristic only, no checksum); everything else passes through trimmed.
#[must_use]
pub fn normalize(entity_type: EntityType, raw: &str) -> Option<String> {
    match entity_type {
        EntityType::Email | EntityType::Domain => Some(raw.trim().to_lowercase()),
        EntityType::Phone => {
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            (digits.len() >= 10).then_some(digits)
        }
        EntityType::CreditCard => {
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            (15..=16).contains(&digits.len()).then_some(digits)
        }
        EntityType::Url | EntityType::IpAddress | EntityType::Username | EntityType::Ssn => {
            Some(raw.trim().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_and_domain_lower_case() {
        assert_eq!(
            normalize(EntityType::Email, "JANE@X.com"),
            Some("jane@x.com".into())
        );
        assert_eq!(
            normalize(EntityType::Domain, "Mail.Example.COM"),
            Some("mail.example.com".into())
        );
    }

    #[test]
    fn phone_keeps_digits_and_needs_ten() {
        assert_eq!(
            normalize(EntityType::Phone, "(555) 123-4567"),
            Some("5551234567".into())
        );
        assert_eq!(
            normalize(EntityType::Phone, "+1 555 123 4567"),
            Some("15551234567".into())
        );
        assert_eq!(normalize(EntityType::Phone, "555-123-456"), None);
    }

    #[test]
    fn card_length_window_is_fifteen_to_sixteen() {
        assert_eq!(
            normalize(EntityType::CreditCard, "4111-1111-1111-1111"),
            Some("4111111111111111".into())
        );
        assert_eq!(
            normalize(EntityType::CreditCard, "3782 822463 10005"),
            Some("378282246310005".into())
        );
        assert_eq!(normalize(EntityType::CreditCard, "41111111111111112"), None);
        assert_eq!(normalize(EntityType::CreditCard, "4111111111111"), None);
    }

    #[test]
    fn pass_through_types_only_trim() {
        assert_eq!(
            normalize(EntityType::Username, " @Shadow_Fox "),
            Some("@Shadow_Fox".into())
        );
        assert_eq!(
            normalize(EntityType::Ssn, "123-45-6789"),
            Some("123-45-6789".into())
        );
        assert_eq!(
            normalize(EntityType::Url, "https://Example.com/Path"),
            Some("https://Example.com/Path".into())
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            (EntityType::Email, "JANE@X.com"),
            (EntityType::Phone, "(555) 123-4567"),
            (EntityType::CreditCard, "4111 1111 1111 1111"),
            (EntityType::Domain, "Mail.Example.COM"),
            (EntityType::Username, "@shadow_fox"),
            (EntityType::Ssn, "123-45-6789"),
            (EntityType::Url, "https://example.com"),
            (EntityType::IpAddress, "10.0.0.1"),
        ];

        for (entity_type, raw) in samples {
            let once = normalize(entity_type, raw).unwrap();
            let twice = normalize(entity_type, &once).unwrap();
            assert_eq!(once, twice, "{entity_type} not idempotent");
        }
    }
}
