/// Substitute for every character that cannot appear in a path component.
pub const REPLACEMENT: char = '_';

const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

/// Make a catalog-provided name usable as a single path component.
///
/// Separators, control characters and characters reserved on Windows are
/// replaced; surrounding whitespace and trailing dots are trimmed. Names that
/// would resolve to the current or parent directory collapse to
/// [`REPLACEMENT`].
pub fn sanitize_component(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                REPLACEMENT
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.');
    match trimmed {
        "" | "." | ".." => REPLACEMENT.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(sanitize_component("Realistic Vision v5.1"), "Realistic Vision v5.1");
    }

    #[test]
    fn replaces_separators() {
        assert_eq!(sanitize_component("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_component("what? <yes>"), "what_ _yes_");
    }

    #[test]
    fn rejects_traversal() {
        assert_eq!(sanitize_component(".."), "_");
        assert_eq!(sanitize_component("."), "_");
        assert_eq!(sanitize_component("   "), "_");
    }

    #[test]
    fn trims_trailing_dots() {
        assert_eq!(sanitize_component("model..."), "model");
    }
}
