use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Plain,
    Link,
    Hashtag,
    Mention,
}

/// A typed slice of comment text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub kind: SpanKind,
    pub text: &'a str,
}

impl<'a> Span<'a> {
    pub fn new(kind: SpanKind, text: &'a str) -> Self {
        Self { kind, text }
    }
}

fn token_start() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"https?://\S+|#[A-Za-z0-9_]+|@").expect("token pattern is valid")
    })
}

/// Splits comment text into plain runs, links, hashtags and mentions.
///
/// The spans cover the input exactly, in order. Links and hashtags end where their pattern
/// ends. A mention is an `@` followed by letters, digits, `_`, `.` or spaces, cut at the first
/// point that is followed by whitespace and then another `@`, `#` or `http`, by a newline, or by
/// the end of the text; an `@` without such a cut point stays plain.
pub fn tokenize(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut plain_from = 0;
    let mut search_from = 0;

    while let Some(found) = token_start().find_at(text, search_from) {
        let start = found.start();
        let (kind, end) = match found.as_str().as_bytes()[0] {
            b'@' => match mention_len(&text[start..]) {
                Some(len) => (SpanKind::Mention, start + len),
                None => {
                    search_from = found.end();
                    continue;
                }
            },
            b'#' => (SpanKind::Hashtag, found.end()),
            _ => (SpanKind::Link, found.end()),
        };

        if plain_from < start {
            spans.push(Span::new(SpanKind::Plain, &text[plain_from..start]));
        }
        spans.push(Span::new(kind, &text[start..end]));
        plain_from = end;
        search_from = end;
    }

    if plain_from < text.len() {
        spans.push(Span::new(SpanKind::Plain, &text[plain_from..]));
    }
    spans
}

fn is_mention_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b' ' | b'.')
}

/// Length of the shortest mention at the start of `rest`, which begins with `@`.
fn mention_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut end = 1;
    while end < bytes.len() && is_mention_byte(bytes[end]) {
        end += 1;
        if mention_ends_before(&rest[end..]) {
            return Some(end);
        }
    }
    None
}

fn mention_ends_before(after: &str) -> bool {
    if after.is_empty() || after.starts_with('\n') {
        return true;
    }
    let mut chars = after.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => {
            let next = chars.as_str();
            next.starts_with('@') || next.starts_with('#') || next.starts_with("http")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SpanKind::*;

    fn kinds(text: &str) -> Vec<(SpanKind, &str)> {
        tokenize(text).into_iter().map(|s| (s.kind, s.text)).collect()
    }

    #[test]
    fn splits_every_token_kind() {
        assert_eq!(
            kinds("hello @Ali #x http://a.com"),
            vec![
                (Plain, "hello "),
                (Mention, "@Ali"),
                (Plain, " "),
                (Hashtag, "#x"),
                (Plain, " "),
                (Link, "http://a.com"),
            ]
        );
    }

    #[test]
    fn adjacent_tokens_end_where_their_pattern_ends() {
        assert_eq!(
            kinds("#tag@mention"),
            vec![(Hashtag, "#tag"), (Mention, "@mention")]
        );
        assert_eq!(
            kinds("see https://x.io/a#b and #c"),
            vec![
                (Plain, "see "),
                (Link, "https://x.io/a#b"),
                (Plain, " and "),
                (Hashtag, "#c"),
            ]
        );
    }

    #[test]
    fn mentions_may_span_spaces() {
        assert_eq!(
            kinds("@Ali Rahimi @Bob"),
            vec![(Mention, "@Ali Rahimi"), (Plain, " "), (Mention, "@Bob")]
        );
        assert_eq!(
            kinds("@Ali\nnext line"),
            vec![(Mention, "@Ali"), (Plain, "\nnext line")]
        );
    }

    #[test]
    fn unterminated_mentions_stay_plain() {
        assert_eq!(kinds("thanks @Ali Rahimi!"), vec![(Plain, "thanks @Ali Rahimi!")]);
        assert_eq!(kinds("a lone # and @"), vec![(Plain, "a lone # and @")]);
    }

    #[test]
    fn spans_reproduce_the_input() {
        let inputs = [
            "",
            "plain only",
            "ünïcödé @Ana and #tag_1 https://ex.com/path?q=1 done",
            "@Farzan.S #launch\nhttps://a.b @Jane Doe",
            "##double @@twice",
        ];
        for input in inputs {
            let joined: String = tokenize(input).iter().map(|s| s.text).collect();
            assert_eq!(joined, input);
        }
        assert!(tokenize("").is_empty());
    }
}
