use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use comment_thread::{Attachment, Author, Comment, CommentId, Reaction};
use tracing::{info, warn};

use super::{CommentSource, SourceError};

/// The built-in conversation, served after a simulated network delay.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    delay: Duration,
    fail: bool,
}

impl FixtureSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay, fail: false }
    }

    /// Makes every fetch fail once the delay has passed.
    pub fn failing(self, fail: bool) -> Self {
        Self { fail, ..self }
    }
}

#[async_trait]
impl CommentSource for FixtureSource {
    async fn fetch(&self) -> Result<Vec<Comment>, SourceError> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            warn!("Fixture source configured to fail");
            return Err(SourceError::Unavailable);
        }
        let comments = sample_comments(Utc::now());
        info!(count = comments.len(), "Serving fixture comments");
        Ok(comments)
    }
}

fn reactions(entries: &[(&str, &str)]) -> Vec<Reaction> {
    entries
        .iter()
        .map(|(emoji, user)| Reaction {
            emoji: emoji.to_string(),
            user: user.to_string(),
        })
        .collect()
}

fn comment(id: u64, author: &str, created_at: DateTime<Utc>, text: &str) -> Comment {
    Comment {
        id: CommentId(id),
        author: Author::named(author),
        created_at,
        text: text.to_string(),
        reactions: Vec::new(),
        parent_id: None,
        attachment: None,
        resolved: false,
        is_edited: false,
        is_pinned: false,
    }
}

/// A small design review conversation, timestamped relative to `now`.
pub fn sample_comments(now: DateTime<Utc>) -> Vec<Comment> {
    let minutes = |m: i64| now - TimeDelta::minutes(m);
    let hours = |h: i64| now - TimeDelta::hours(h);

    vec![
        Comment {
            reactions: reactions(&[
                ("🚀", "Farzan"),
                ("🚀", "You"),
                ("🌍", "Erfan"),
                ("🌍", "Jane Doe"),
                ("🗿", "Sadeghi"),
            ]),
            is_pinned: true,
            ..comment(
                1,
                "Ali Rahimi",
                minutes(13),
                "The font pairings work well, especially for both UI and marketing contexts. 🙏\n\
                 #Hashtag #Hashtag\n\
                 @Farzan Sadeghi @Ali Rahimi\n\
                 @Erfan Sharif\n\
                 https://www.figma.com/design/Plb1fhJJ2GYHWDHlacpBXs/Dizno-Studio?node-id=18980-32510",
            )
        },
        Comment {
            parent_id: Some(CommentId(1)),
            ..comment(10, "You", minutes(12), "Totally agree!")
        },
        Comment {
            parent_id: Some(CommentId(1)),
            attachment: Some(Attachment::image(
                "https://images.unsplash.com/photo-1559056199-641a0ac8b55e?q=80&w=400",
            )),
            ..comment(11, "Farzan Sadeghi", minutes(10), "Good find, @Ali Rahimi!")
        },
        Comment {
            parent_id: Some(CommentId(11)),
            ..comment(
                12,
                "You",
                minutes(9),
                "What do you think about using a serif font for headings?",
            )
        },
        Comment {
            reactions: reactions(&[("👍", "Ali Rahimi")]),
            ..comment(
                2,
                "Jane Doe",
                hours(2),
                "Great point! I've been looking for some good font pairings. This is super helpful. #Design #Typography",
            )
        },
        Comment {
            reactions: reactions(&[("❤️", "You"), ("❤️", "Ali Rahimi"), ("❤️", "Jane Doe")]),
            ..comment(
                3,
                "Sadeghi",
                hours(3),
                "Totally agree with @Jane Doe. Good typography is a game changer. Also, check out this resource: https://fonts.google.com/",
            )
        },
        Comment {
            reactions: reactions(&[("🎉", "Farzan")]),
            resolved: true,
            ..comment(
                4,
                "Erfan Sharif",
                hours(5),
                "Just pushed a new update. Let me know what you guys think!\n#feedback #update",
            )
        },
        comment(
            5,
            "Farzan Sadeghi",
            hours(24),
            "I found a small bug on the login page. It happens on mobile when you rotate the screen. Can someone from the dev team take a look? @Ali Rahimi",
        ),
        Comment {
            reactions: reactions(&[("👍", "Farzan Sadeghi")]),
            parent_id: Some(CommentId(5)),
            resolved: true,
            ..comment(
                6,
                "You",
                hours(24) + TimeDelta::seconds(10),
                "On it! I will check it out. #bugfix",
            )
        },
    ]
}

#[cfg(test)]
mod tests {
    use comment_thread::CommentStore;

    use super::*;

    #[test]
    fn sample_conversation_is_a_valid_store() {
        let store = CommentStore::from_comments(sample_comments(Utc::now())).unwrap();
        assert_eq!(store.len(), 9);
        assert_eq!(store.pinned().map(|c| c.id), Some(CommentId(1)));
        assert_eq!(store.descendant_count(CommentId(1)), 3);
    }

    #[tokio::test]
    async fn failing_fixture_reports_unavailable() {
        let source = FixtureSource::new(Duration::ZERO).failing(true);
        assert!(matches!(source.fetch().await, Err(SourceError::Unavailable)));

        let source = FixtureSource::new(Duration::ZERO);
        assert_eq!(source.fetch().await.unwrap().len(), 9);
    }
}
