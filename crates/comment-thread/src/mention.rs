use crate::model::Author;

/// The `@`-prefixed word being typed just before the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MentionQuery<'a> {
    /// Byte offset of the `@`.
    pub at: usize,
    pub query: &'a str,
}

/// Finds the mention in progress: the last `@` before the cursor, provided it starts the text
/// or follows whitespace.
pub fn mention_query(before_cursor: &str) -> Option<MentionQuery<'_>> {
    let at = before_cursor.rfind('@')?;
    let preceded_ok = before_cursor[..at]
        .chars()
        .next_back()
        .is_none_or(char::is_whitespace);
    preceded_ok.then(|| MentionQuery {
        at,
        query: &before_cursor[at + 1..],
    })
}

/// Whether `text` already contains `@name` not directly followed by a word character.
pub fn is_mentioned(text: &str, name: &str) -> bool {
    let needle = format!("@{name}");
    text.match_indices(&needle).any(|(start, _)| {
        text[start + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'))
    })
}

/// Users offered for the mention in progress, in the order given.
///
/// `text` is the whole composer text and `cursor` a byte offset into it. Users already mentioned
/// anywhere in the text are left out.
pub fn suggestions<'a>(
    text: &str,
    cursor: usize,
    users: impl IntoIterator<Item = &'a Author>,
) -> Vec<&'a Author> {
    let Some(query) = text.get(..cursor).and_then(mention_query) else {
        return Vec::new();
    };
    let needle = query.query.to_lowercase();
    users
        .into_iter()
        .filter(|user| user.name.to_lowercase().contains(&needle))
        .filter(|user| !is_mentioned(text, &user.name))
        .collect()
}

/// Replaces the mention in progress with `@name ` and returns the new text and cursor.
pub fn insert_mention(text: &str, cursor: usize, name: &str) -> Option<(String, usize)> {
    let before = text.get(..cursor)?;
    let at = before.rfind('@')?;
    let mut out = String::with_capacity(text.len() + name.len() + 2);
    out.push_str(&text[..at]);
    out.push('@');
    out.push_str(name);
    out.push(' ');
    let new_cursor = out.len();
    out.push_str(&text[cursor..]);
    Some((out, new_cursor))
}

/// Suggestion list with a highlighted entry, as shown under the composer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionPicker {
    names: Vec<String>,
    highlighted: usize,
}

impl MentionPicker {
    /// Recomputes the suggestions for the text, resetting the highlight.
    pub fn refresh<'a>(
        &mut self,
        text: &str,
        cursor: usize,
        users: impl IntoIterator<Item = &'a Author>,
    ) {
        self.names = suggestions(text, cursor, users)
            .into_iter()
            .map(|a| a.name.clone())
            .collect();
        self.highlighted = 0;
    }

    pub fn close(&mut self) {
        self.names.clear();
        self.highlighted = 0;
    }

    pub fn is_open(&self) -> bool {
        !self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn next(&mut self) {
        if self.is_open() {
            self.highlighted = (self.highlighted + 1) % self.names.len();
        }
    }

    pub fn previous(&mut self) {
        if self.is_open() {
            self.highlighted = (self.highlighted + self.names.len() - 1) % self.names.len();
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.names.get(self.highlighted).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<Author> {
        ["Ali Rahimi", "Jane Doe", "Sadeghi"]
            .into_iter()
            .map(Author::named)
            .collect()
    }

    fn names<'a>(authors: &[&'a Author]) -> Vec<&'a str> {
        authors.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn detects_mentions_at_word_starts_only() {
        assert_eq!(
            mention_query("@al"),
            Some(MentionQuery { at: 0, query: "al" })
        );
        assert_eq!(
            mention_query("hi @Ja"),
            Some(MentionQuery { at: 3, query: "Ja" })
        );
        assert_eq!(mention_query("mail@host"), None);
        assert_eq!(mention_query("no mention"), None);
    }

    #[test]
    fn suggests_case_insensitively_and_skips_mentioned_users() {
        let users = users();
        let text = "hey @";
        assert_eq!(
            names(&suggestions(text, text.len(), &users)),
            vec!["Ali Rahimi", "Jane Doe", "Sadeghi"]
        );

        let text = "@Jane Doe and @a";
        assert_eq!(
            names(&suggestions(text, text.len(), &users)),
            vec!["Ali Rahimi", "Sadeghi"]
        );

        let text = "@Jane Doex @jane";
        assert_eq!(names(&suggestions(text, text.len(), &users)), vec!["Jane Doe"]);
    }

    #[test]
    fn inserts_the_chosen_name_with_a_trailing_space() {
        let (text, cursor) = insert_mention("ping @ja now", 8, "Jane Doe").unwrap();
        assert_eq!(text, "ping @Jane Doe  now");
        assert_eq!(cursor, "ping @Jane Doe ".len());
        assert_eq!(insert_mention("nothing", 7, "Jane Doe"), None);
    }

    #[test]
    fn picker_cycles_through_suggestions() {
        let users = users();
        let mut picker = MentionPicker::default();
        picker.refresh("@", 1, &users);
        assert!(picker.is_open());
        assert_eq!(picker.selected(), Some("Ali Rahimi"));
        picker.previous();
        assert_eq!(picker.selected(), Some("Sadeghi"));
        picker.next();
        picker.next();
        assert_eq!(picker.selected(), Some("Jane Doe"));

        picker.refresh("@zzz", 4, &users);
        assert!(!picker.is_open());
        assert_eq!(picker.selected(), None);
    }
}
