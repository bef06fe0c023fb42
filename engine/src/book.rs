use std::fmt;

/// Venue/symbol pair identifying one order-book engine.
///
/// Both components are validated with [`is_valid_name`] before a `BookKey`
/// is ever used to look up or create a book.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BookKey {
    pub venue: String,
    pub symbol: String,
}

impl BookKey {
    pub fn new(venue: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            symbol: symbol.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_name(&self.venue) && is_valid_name(&self.symbol)
    }
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.venue, self.symbol)
    }
}

/// Account/venue/symbol name rule: length 1-20, ASCII alphanumeric or `_`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let len = name.chars().count();
    if !(1..=20).contains(&len) {
        return false;
    }
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumeric_and_underscore() {
        assert!(is_valid_name("TESTEX"));
        assert!(is_valid_name("FOO_BAR_99"));
        assert!(is_valid_name("a"));
    }

    #[test]
    fn rejects_empty_and_overlong() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name(&"a".repeat(21)));
    }

    #[test]
    fn rejects_punctuation() {
        assert!(!is_valid_name("!!!"));
        assert!(!is_valid_name("foo-bar"));
        assert!(!is_valid_name("foo bar"));
    }

    #[test]
    fn book_key_validity_requires_both_parts() {
        assert!(BookKey::new("TESTEX", "FOOBAR").is_valid());
        assert!(!BookKey::new("!!!", "FOOBAR").is_valid());
        assert!(!BookKey::new("TESTEX", "").is_valid());
    }
}
