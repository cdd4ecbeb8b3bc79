//! Character rules for attacker-controlled names.

/// Returns `true` if `c` may not appear in a record path or symlink target.
///
/// Rejected: Unicode control characters (C0, DEL, C1) and invisible
/// formatting code points that make a name render differently from what is
/// stored (zero-width characters, bidirectional overrides and isolates, the
/// byte-order mark).
#[must_use]
pub fn is_disallowed(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '\u{200B}'..='\u{200F}'
                | '\u{202A}'..='\u{202E}'
                | '\u{2060}'..='\u{2064}'
                | '\u{2066}'..='\u{2069}'
                | '\u{FEFF}'
        )
}

/// Returns `true` if any character of `name` is disallowed.
///
/// # Examples
///
/// ```
/// use sealpack_core::security::chars::has_disallowed_chars;
///
/// assert!(!has_disallowed_chars("docs/readme.md"));
/// assert!(!has_disallowed_chars("données/été.txt"));
/// assert!(has_disallowed_chars("evil\nname"));
/// assert!(has_disallowed_chars("invoice\u{202e}fdp.exe"));
/// ```
#[must_use]
pub fn has_disallowed_chars(name: &str) -> bool {
    name.chars().any(is_disallowed)
}
