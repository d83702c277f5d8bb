//! Lightweight markup for responder replies
//!
//! Replies may use `**bold**` and `` `code` `` and nothing else. By default every
//! other character that means something to HTML is escaped before the two
//! substitutions run, so those two tags are the only markup a reply can
//! produce. [`MarkupPolicy::Trusted`] skips the escaping and passes the reply
//! through as-is apart from the substitutions.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkupPolicy {
    #[default]
    Escaped,
    Trusted,
}

impl MarkupPolicy {
    pub fn from_trust(trust_responder_markup: bool) -> Self {
        if trust_responder_markup {
            MarkupPolicy::Trusted
        } else {
            MarkupPolicy::Escaped
        }
    }
}

fn bold_pattern() -> &'static Regex {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"))
}

fn code_pattern() -> &'static Regex {
    static CODE: OnceLock<Regex> = OnceLock::new();
    CODE.get_or_init(|| Regex::new(r"`(.*?)`").expect("code pattern is valid"))
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turn a raw responder reply into entry markup.
///
/// Bold runs first, then code, each a single non-greedy pass over the whole
/// string. Neither pattern matches across a newline.
pub fn format_reply(raw: &str, policy: MarkupPolicy) -> String {
    let text = match policy {
        MarkupPolicy::Escaped => escape_html(raw),
        MarkupPolicy::Trusted => raw.to_string(),
    };

    let text = bold_pattern().replace_all(&text, "<strong>$1</strong>");
    let text = code_pattern().replace_all(&text, "<code>$1</code>");
    text.into_owned()
}

/// Markup for text the user typed. User input never gets inline formatting.
pub fn format_user_text(raw: &str, policy: MarkupPolicy) -> String {
    match policy {
        MarkupPolicy::Escaped => escape_html(raw),
        MarkupPolicy::Trusted => raw.to_string(),
    }
}

/// A run of entry text with uniform styling
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    pub text: String,
    pub strong: bool,
    pub code: bool,
}

/// Read entry markup back into styled runs for displays that can't render HTML.
///
/// Only the tags [`format_reply`] emits are understood; anything else is kept
/// as literal text. Entities are decoded inside each run.
pub fn segments(markup: &str) -> Vec<Segment> {
    const TAGS: [(&str, bool, bool); 4] = [
        // (tag, is_strong, opens)
        ("<strong>", true, true),
        ("</strong>", true, false),
        ("<code>", false, true),
        ("</code>", false, false),
    ];

    let mut out: Vec<Segment> = Vec::new();
    let mut current = String::new();
    let mut strong = false;
    let mut code = false;
    let mut rest = markup;

    'scan: while let Some(c) = rest.chars().next() {
        if c == '<' {
            for (tag, is_strong, opens) in TAGS {
                if rest.starts_with(tag) {
                    if !current.is_empty() {
                        out.push(Segment {
                            text: unescape_html(&std::mem::take(&mut current)),
                            strong,
                            code,
                        });
                    }
                    if is_strong {
                        strong = opens;
                    } else {
                        code = opens;
                    }
                    rest = &rest[tag.len()..];
                    continue 'scan;
                }
            }
        }
        current.push(c);
        rest = &rest[c.len_utf8()..];
    }

    if !current.is_empty() {
        out.push(Segment {
            text: unescape_html(&current),
            strong,
            code,
        });
    }

    out
}

/// Inverse of [`escape_html`]. Unknown entities are left untouched.
pub fn unescape_html(text: &str) -> String {
    const ENTITIES: [(&str, char); 5] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#39;", '\''),
    ];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    'scan: while let Some(c) = rest.chars().next() {
        if c == '&' {
            for (entity, ch) in ENTITIES {
                if rest.starts_with(entity) {
                    out.push(ch);
                    rest = &rest[entity.len()..];
                    continue 'scan;
                }
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_code() {
        let out = format_reply("Hello **world** and `code`", MarkupPolicy::Escaped);
        assert_eq!(out, "Hello <strong>world</strong> and <code>code</code>");
    }

    #[test]
    fn test_substitution_is_non_greedy() {
        let out = format_reply("**a** b **c**", MarkupPolicy::Escaped);
        assert_eq!(out, "<strong>a</strong> b <strong>c</strong>");
    }

    #[test]
    fn test_unpaired_markers_stay_literal() {
        assert_eq!(format_reply("2 ** 3", MarkupPolicy::Escaped), "2 ** 3");
        assert_eq!(format_reply("a ` b", MarkupPolicy::Escaped), "a ` b");
    }

    #[test]
    fn test_pattern_does_not_cross_newline() {
        let out = format_reply("**a\nb**", MarkupPolicy::Escaped);
        assert_eq!(out, "**a\nb**");
    }

    #[test]
    fn test_escaped_policy_neutralises_html() {
        let out = format_reply("<script>x</script> **ok**", MarkupPolicy::Escaped);
        assert_eq!(out, "&lt;script&gt;x&lt;/script&gt; <strong>ok</strong>");
    }

    #[test]
    fn test_trusted_policy_keeps_html() {
        let out = format_reply("<em>hi</em> `x`", MarkupPolicy::Trusted);
        assert_eq!(out, "<em>hi</em> <code>x</code>");
    }

    #[test]
    fn test_user_text_is_escaped_without_formatting() {
        let out = format_user_text("**a** & <b>", MarkupPolicy::Escaped);
        assert_eq!(out, "**a** &amp; &lt;b&gt;");
    }

    #[test]
    fn test_segments_split_styles() {
        let segs = segments("Hello <strong>world</strong> and <code>a &lt; b</code>");
        assert_eq!(
            segs,
            vec![
                Segment { text: "Hello ".into(), strong: false, code: false },
                Segment { text: "world".into(), strong: true, code: false },
                Segment { text: " and ".into(), strong: false, code: false },
                Segment { text: "a < b".into(), strong: false, code: true },
            ]
        );
    }

    #[test]
    fn test_segments_keep_unknown_tags_literal() {
        let segs = segments("<em>x</em>");
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].text, "<em>x</em>");
    }

    #[test]
    fn test_segments_handle_multibyte_text() {
        let segs = segments("Привет <strong>мир</strong>");
        assert_eq!(segs[0].text, "Привет ");
        assert_eq!(segs[1].text, "мир");
        assert!(segs[1].strong);
    }

    #[test]
    fn test_unescape_round_trips_escape() {
        let raw = "a & b < c > d \"e\" 'f' &unknown;";
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }
}
