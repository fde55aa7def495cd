//! Language to locale mapping for the account service

/// Locale code for a two-letter language; unknown languages fall back to
/// `en-US`.
#[must_use]
pub fn language_code(language: &str) -> &'static str {
    match language.trim().to_ascii_lowercase().as_str() {
        "pl" => "pl-PL",
        _ => "en-US",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_languages() {
        assert_eq!(language_code("pl"), "pl-PL");
        assert_eq!(language_code("PL"), "pl-PL");
        assert_eq!(language_code("en"), "en-US");
    }

    #[test]
    fn unknown_language_defaults_to_english() {
        assert_eq!(language_code("de"), "en-US");
        assert_eq!(language_code(""), "en-US");
    }
}
