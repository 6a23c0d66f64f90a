//! PostgreSQL implementations of the repository traits.

mod content;
mod media;
mod translation;

pub use content::PgContentRepository;
pub use media::PgMediaRepository;
pub use translation::PgTranslationRepository;

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("school"), "%school%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }
}
