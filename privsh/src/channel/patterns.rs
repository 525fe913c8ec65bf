//! Pattern matching utilities for prompt detection.

use regex::bytes::{Match, Regex};

/// Trait for prompt matching - regex by default, extensible for custom parsers.
///
/// Implementations only report a match that sits at the tail of `data`:
/// everything after the match must be whitespace. A prompt-looking line in
/// the middle of command output is not a prompt.
pub trait PromptMatcher: Send + Sync {
    /// Returns byte offset where match ends, or None if no match.
    fn find_match(&self, data: &[u8]) -> Option<usize>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_match(data).is_some()
    }
}

/// Regex-based prompt matcher (the default implementation).
impl PromptMatcher for Regex {
    fn find_match(&self, data: &[u8]) -> Option<usize> {
        find_at_tail(self, data).map(|m| m.end())
    }
}

/// Find the last match of `pattern` in `data`, accepting it only if nothing
/// but whitespace follows it.
pub fn find_at_tail<'h>(pattern: &Regex, data: &'h [u8]) -> Option<Match<'h>> {
    let m = pattern.find_iter(data).last()?;
    data[m.end()..]
        .iter()
        .all(u8::is_ascii_whitespace)
        .then_some(m)
}

/// Compile a prompt pattern string into a regex.
///
/// - Always case-insensitive and multi-line (`^`/`$` anchor on lines)
/// - ASCII classes: `\w`, `\s` and case folding never pull in Unicode tables,
///   which keeps counted repeats like `[\w.-]{1,63}` small enough to union
/// - Anchors to end of line if no anchor specified
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let anchored = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{pattern}\\s*$")
    };

    Regex::new(&format!("(?im-u){anchored}"))
}

/// Build one regex that matches any of the given patterns.
pub fn union_pattern<'a>(patterns: impl IntoIterator<Item = &'a Regex>) -> Result<Regex, regex::Error> {
    let combined = patterns
        .into_iter()
        .map(|p| format!("(?:{})", p.as_str()))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_prompt_matcher() {
        let pattern = compile_prompt_pattern(r"router#").unwrap();
        assert!(pattern.is_match(b"router# ".as_slice()));
        assert!(PromptMatcher::is_match(&pattern, b"some output\nrouter#"));
        assert!(!PromptMatcher::is_match(&pattern, b"router> "));
    }

    #[test]
    fn test_match_must_be_at_tail() {
        let pattern = compile_prompt_pattern(r"(?m)^router#").unwrap();

        // An old prompt followed by fresh output is not a match
        assert!(!PromptMatcher::is_match(&pattern, b"router#\nshow version\nVersion 1.2"));

        // Trailing whitespace and newlines are tolerated
        assert!(PromptMatcher::is_match(&pattern, b"banner\r\nrouter# \r\n"));
    }

    #[test]
    fn test_case_insensitive() {
        let pattern = compile_prompt_pattern(r"^password:").unwrap();
        assert!(PromptMatcher::is_match(&pattern, b"enable\nPassword: "));
    }

    #[test]
    fn test_compile_prompt_pattern() {
        // Pattern without anchor gets one added
        let pattern = compile_prompt_pattern(r"router#").unwrap();
        assert!(pattern.as_str().ends_with(r"\s*$"));

        // Pattern with anchor stays as-is
        let pattern = compile_prompt_pattern(r"router#$").unwrap();
        assert_eq!(pattern.as_str(), "(?im-u)router#$");
    }

    #[test]
    fn test_union_pattern() {
        let user = compile_prompt_pattern(r"^\w+>").unwrap();
        let admin = compile_prompt_pattern(r"^\w+#").unwrap();
        let any = union_pattern([&user, &admin]).unwrap();

        assert!(PromptMatcher::is_match(&any, b"router>"));
        assert!(PromptMatcher::is_match(&any, b"router#"));
        assert!(!PromptMatcher::is_match(&any, b"router%"));
    }

    #[test]
    fn test_union_of_counted_classes_compiles() {
        let levels = [
            r"^[\w.\-@/:]{1,63}>\s*$",
            r"^[\w.\-@/:]{1,63}#\s*$",
            r"^[\w.\-@/:]{1,63}\([\w.\-@/:+]{0,32}\)#\s*$",
            r"^[\w.\-@()/: ]{1,63}\(config[\w.\-@/:+]{0,63}\)#\s?$",
        ]
        .map(|p| compile_prompt_pattern(p).unwrap());

        let any = union_pattern(&levels).unwrap();
        let auth = compile_prompt_pattern(r"^password:\s?$").unwrap();
        let with_auth = union_pattern([&auth, &any]).unwrap();

        assert!(PromptMatcher::is_match(&any, b"core-1.lab(config-if)#"));
        assert!(PromptMatcher::is_match(&with_auth, b"Password: "));
    }
}
