//! Supported content languages.
//!
//! Language codes are stored lower-cased (`en`, `es`, `fr`, `pt-br`). Every
//! code that reaches a repository has been through [`validate_language`].

use std::collections::BTreeSet;

use crate::error::{CoreError, CoreResult};

/// The language new content is written in when the request names none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Supported codes with their display names, in canonical order.
pub const SUPPORTED_LANGUAGES: [(&str, &str); 4] = [
    ("en", "English"),
    ("es", "Spanish (Español)"),
    ("fr", "French (Français)"),
    ("pt-br", "Portuguese - Brazil (Português)"),
];

const ALIASES: [(&str, &str); 7] = [
    ("pt", "pt-br"),
    ("pt_br", "pt-br"),
    ("ptbr", "pt-br"),
    ("portuguese", "pt-br"),
    ("spanish", "es"),
    ("french", "fr"),
    ("english", "en"),
];

fn canonical(language: &str) -> String {
    language.trim().to_lowercase()
}

pub fn is_supported(language: &str) -> bool {
    let code = canonical(language);
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// Validate a language code, returning its canonical (lower-case) form.
pub fn validate_language(language: &str) -> CoreResult<String> {
    let code = canonical(language);
    if is_supported(&code) {
        Ok(code)
    } else {
        Err(CoreError::BadRequest(format!(
            "Language '{}' is not supported. Supported languages: {}",
            language.trim(),
            supported_codes().join(", ")
        )))
    }
}

/// Resolve a code or common alias ("pt", "spanish") to a supported code.
pub fn normalize_language(language: &str) -> Option<&'static str> {
    let code = canonical(language);
    SUPPORTED_LANGUAGES
        .iter()
        .map(|(c, _)| *c)
        .find(|c| *c == code)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == code)
                .map(|(_, c)| *c)
        })
}

pub fn language_name(language: &str) -> Option<&'static str> {
    let code = canonical(language);
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

pub fn supported_codes() -> Vec<&'static str> {
    SUPPORTED_LANGUAGES.iter().map(|(c, _)| *c).collect()
}

/// Supported languages absent from `available`, sorted.
pub fn missing_languages<S: AsRef<str>>(available: &[S]) -> Vec<String> {
    let have: BTreeSet<String> = available.iter().map(|l| canonical(l.as_ref())).collect();
    let mut missing: Vec<String> = SUPPORTED_LANGUAGES
        .iter()
        .map(|(c, _)| c.to_string())
        .filter(|c| !have.contains(c))
        .collect();
    missing.sort();
    missing
}
