//! Executes the side effects requested by the panel reducer.
//!
//! Slow work (fetching, reading attachments) runs on spawned tasks; its completion is sent back
//! through the action channel as an [`Action::Panel`] message. Draft writes are applied
//! immediately so that consecutive writes to the same key land in order.
use std::sync::Arc;

use tokio::sync::mpsc::Sender;
use tracing::{debug, instrument, warn};

use crate::{
    attachment::read_image,
    clipboard::Clipboard,
    drafts::DraftStore,
    source::CommentSource,
    ui::{
        Action,
        components::toast::{ToastMessage, ToastType},
        panel::{Effect, Msg},
    },
};

/// The outside world as seen by the panel.
#[derive(Clone)]
pub struct Services {
    pub source: Arc<dyn CommentSource>,
    pub drafts: Arc<dyn DraftStore>,
    pub clipboard: Arc<dyn Clipboard>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct EffectRunner {
    services: Services,
    action_tx: Sender<Action>,
}

impl EffectRunner {
    pub fn new(services: Services, action_tx: Sender<Action>) -> Self {
        Self {
            services,
            action_tx,
        }
    }

    #[instrument(skip(self))]
    pub fn run(&self, effect: Effect) {
        match effect {
            Effect::FetchComments { request } => {
                let source = self.services.source.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = source.fetch().await.map_err(|err| err.to_string());
                    let _ = tx.send(Action::Panel(Msg::Loaded { request, result })).await;
                });
            }
            Effect::LoadDraft(key) => {
                let text = self.services.drafts.get(&key.to_string());
                debug!(%key, found = text.is_some(), "Loaded draft");
                self.reply(Msg::DraftLoaded { key, text });
            }
            Effect::SaveDraft { key, text } => {
                if let Err(err) = self.services.drafts.set(&key.to_string(), &text) {
                    warn!(%key, %err, "Failed to save draft");
                }
            }
            Effect::ClearDraft(key) => {
                if let Err(err) = self.services.drafts.remove(&key.to_string()) {
                    warn!(%key, %err, "Failed to clear draft");
                }
            }
            Effect::ReadAttachment { request, path } => {
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = read_image(&path).await.map_err(|err| err.to_string());
                    let _ = tx
                        .send(Action::Panel(Msg::AttachmentRead { request, result }))
                        .await;
                });
            }
            Effect::CopyToClipboard { id, text } => match self.services.clipboard.set_contents(text)
            {
                Ok(()) => self.reply(Msg::LinkCopied(id)),
                Err(err) => warn!(%id, %err, "Failed to copy link"),
            },
            Effect::ShowToast { message, duration } => {
                self.send(
                    ToastMessage::Show {
                        message,
                        toast_type: ToastType::Success,
                        duration,
                    }
                    .into(),
                );
            }
        }
    }

    fn reply(&self, msg: Msg) {
        self.send(Action::Panel(msg));
    }

    // The run loop is the receiver, so sends must not be awaited from inside it.
    fn send(&self, action: Action) {
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(action).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use comment_thread::{CommentId, DraftKey};

    use super::*;
    use crate::{drafts::MemoryDraftStore, source::FixtureSource};

    #[derive(Default)]
    struct RecordingClipboard {
        copied: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn set_contents(&self, text: String) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("no clipboard");
            }
            self.copied
                .lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?
                .push(text);
            Ok(())
        }
    }

    fn runner(
        clipboard: Arc<RecordingClipboard>,
    ) -> (EffectRunner, Arc<MemoryDraftStore>, tokio::sync::mpsc::Receiver<Action>) {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let drafts = Arc::new(MemoryDraftStore::default());
        let services = Services {
            source: Arc::new(FixtureSource::new(Duration::ZERO)),
            drafts: drafts.clone(),
            clipboard,
        };
        (EffectRunner::new(services, tx), drafts, rx)
    }

    #[tokio::test]
    async fn fetch_reports_back_with_its_request_id() {
        let (runner, _, mut rx) = runner(Arc::default());
        runner.run(Effect::FetchComments { request: 3 });
        match rx.recv().await {
            Some(Action::Panel(Msg::Loaded { request, result })) => {
                assert_eq!(request, 3);
                assert_eq!(result.unwrap().len(), 9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn drafts_round_trip_through_the_store() {
        let (runner, drafts, mut rx) = runner(Arc::default());
        let key = DraftKey::Thread(CommentId(4));
        runner.run(Effect::SaveDraft {
            key,
            text: "half a thought".to_string(),
        });
        assert_eq!(
            drafts.get("commentDraft_thread_4").as_deref(),
            Some("half a thought")
        );

        runner.run(Effect::LoadDraft(key));
        match rx.recv().await {
            Some(Action::Panel(Msg::DraftLoaded { key: loaded, text })) => {
                assert_eq!(loaded, key);
                assert_eq!(text.as_deref(), Some("half a thought"));
            }
            other => panic!("unexpected {other:?}"),
        }

        runner.run(Effect::ClearDraft(key));
        assert_eq!(drafts.get("commentDraft_thread_4"), None);
    }

    #[tokio::test]
    async fn copied_links_are_confirmed() {
        let clipboard = Arc::new(RecordingClipboard::default());
        let (runner, _, mut rx) = runner(clipboard.clone());
        runner.run(Effect::CopyToClipboard {
            id: CommentId(2),
            text: "https://board.example/doc#comment-2".to_string(),
        });
        assert!(matches!(
            rx.recv().await,
            Some(Action::Panel(Msg::LinkCopied(CommentId(2))))
        ));
        assert_eq!(
            clipboard.copied.lock().unwrap().as_slice(),
            ["https://board.example/doc#comment-2"]
        );
    }

    #[tokio::test]
    async fn clipboard_failures_stay_quiet() {
        let clipboard = Arc::new(RecordingClipboard {
            fail: true,
            ..Default::default()
        });
        let (runner, _, mut rx) = runner(clipboard);
        runner.run(Effect::CopyToClipboard {
            id: CommentId(2),
            text: "link".to_string(),
        });
        runner.run(Effect::ShowToast {
            message: "marker".to_string(),
            duration: Duration::from_secs(2),
        });
        assert!(matches!(
            rx.recv().await,
            Some(Action::Toast(ToastMessage::Show { .. }))
        ));
    }
}
