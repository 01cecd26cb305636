use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Reduces a recipient name to a safe download-filename stem: drop anything
/// that is not a word character, whitespace or hyphen, trim, then collapse
/// whitespace runs to a single underscore. Idempotent.
pub fn sanitize_download_stem(name: &str) -> String {
    let stripped = strip_re().replace_all(name, "");
    let trimmed = stripped.trim();
    whitespace_re().replace_all(trimmed, "_").into_owned()
}

pub fn certificate_filename(name: &str, ext: &str) -> String {
    format!("{}_certificate.{}", sanitize_download_stem(name), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_spaces_with_underscores() {
        assert_eq!(sanitize_download_stem("Jane Doe"), "Jane_Doe");
        assert_eq!(certificate_filename("Jane Doe", "png"), "Jane_Doe_certificate.png");
        assert_eq!(certificate_filename("Jane Doe", "pdf"), "Jane_Doe_certificate.pdf");
    }

    #[test]
    fn strips_punctuation_keeps_hyphens() {
        assert_eq!(sanitize_download_stem("Anne-Marie O'Neill!"), "Anne-Marie_ONeill");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(sanitize_download_stem("  Jane\t  Doe \n"), "Jane_Doe");
    }

    #[test]
    fn idempotent_on_sanitized_input() {
        for raw in ["Jane Doe", "Anne-Marie O'Neill", "  x  y  ", "plain"] {
            let once = sanitize_download_stem(raw);
            assert_eq!(sanitize_download_stem(&once), once);
        }
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(sanitize_download_stem("   "), "");
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
