use anyhow::anyhow;
use comment_thread::CommentId;

pub trait Clipboard: Send + Sync {
    fn set_contents(&self, text: String) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_contents(&self, text: String) -> anyhow::Result<()> {
        cli_clipboard::set_contents(text).map_err(|_| anyhow!("Error copying to clipboard"))
    }
}

/// Shareable link to a comment: the page address without its fragment, plus `#comment-<id>`.
pub fn comment_link(base_url: &str, id: CommentId) -> String {
    let page = base_url.split('#').next().unwrap_or(base_url);
    format!("{page}#comment-{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_any_existing_fragment() {
        assert_eq!(
            comment_link("https://board.example/doc", CommentId(7)),
            "https://board.example/doc#comment-7"
        );
        assert_eq!(
            comment_link("https://board.example/doc#comment-3", CommentId(12)),
            "https://board.example/doc#comment-12"
        );
    }
}
