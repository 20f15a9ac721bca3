use serde::{Deserialize, Serialize};

use fairway_core::{DomainError, DomainResult, ValueObject};

const MAX_EMAIL_LEN: usize = 254;

/// A syntactically plausible e-mail address (the golfer's unique key).
///
/// Only the shape is checked: one `@`, a non-empty local part and a dotted
/// domain without whitespace. Deliverability is not our concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(DomainError::validation("email cannot be empty"));
        }
        if value.len() > MAX_EMAIL_LEN {
            return Err(DomainError::validation(format!(
                "email cannot exceed {MAX_EMAIL_LEN} characters"
            )));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email cannot contain whitespace"));
        }

        let (local, domain) = value
            .split_once('@')
            .ok_or_else(|| DomainError::validation("enter a valid email address"))?;
        let domain_ok = !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.');
        if local.is_empty() || !domain_ok {
            return Err(DomainError::validation("enter a valid email address"));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Email {}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_trims_plain_address() {
        let email = Email::parse("  ada@links.example ").unwrap();
        assert_eq!(email.as_str(), "ada@links.example");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in ["", "   ", "ada", "@links.example", "ada@", "ada@links", "a@b@c.d", "ada@.com", "ada@com.", "a da@x.io"] {
            match Email::parse(raw) {
                Err(DomainError::Validation(_)) => {}
                other => panic!("expected Validation for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_overlong_address() {
        let raw = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(Email::parse(&raw).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Email = serde_json::from_str("\"pro@club.example\"").unwrap();
        assert_eq!(ok.as_str(), "pro@club.example");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }

    proptest::proptest! {
        #[test]
        fn well_formed_addresses_round_trip(
            local in "[a-z0-9._+-]{1,20}",
            host in "[a-z0-9-]{1,12}",
            tld in "[a-z]{2,6}",
        ) {
            let raw = format!("{local}@{host}.{tld}");
            let email = Email::parse(&raw).unwrap();
            proptest::prop_assert_eq!(email.as_str(), raw.as_str());
        }
    }
}
