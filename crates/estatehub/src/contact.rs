use std::sync::OnceLock;

use regex::Regex;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|err| panic!("email regex: {err}"))
    })
}

/// Lowercased, trimmed form under which emails are stored and compared.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(raw: &str) -> bool {
    email_pattern().is_match(raw.trim())
}

/// Digits only, as used for `wa.me` and `tel:` links.
pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Builder@Example.COM "), "builder@example.com");
    }

    #[test]
    fn validates_email_shape() {
        assert!(is_valid_email("a@b.in"));
        assert!(is_valid_email(" sales@acme.co.in "));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two words@x.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn strips_phone_formatting() {
        assert_eq!(phone_digits("+91 98765-43210"), "919876543210");
    }
}
