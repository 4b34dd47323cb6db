use std::{sync::Arc, time::Duration};

use tracing::info;

use crate::{
    clipboard::SystemClipboard,
    drafts::FileDraftStore,
    errors::AppError,
    logging,
    source::{CommentSource, FixtureSource, JsonFileSource},
    ui::{self, AppState, effects::Services, panel::PanelConfig},
};

pub mod cli;

pub struct App {
    args: cli::Args,
}

impl App {
    pub fn new(cli: cli::Cli) -> Self {
        Self { args: cli.args }
    }

    pub async fn run(&mut self) -> Result<(), AppError> {
        logging::init(self.args.log_level)?;
        info!(user = %self.args.user, "Starting threadpanel");

        let services = Services {
            source: self.source(),
            drafts: Arc::new(FileDraftStore::open_default()),
            clipboard: Arc::new(SystemClipboard),
        };
        let config = PanelConfig {
            current_user: self.args.user.clone(),
            base_url: self.args.base_url.clone(),
        };
        ui::run(AppState::new(config, services, self.source_label())).await
    }

    fn source(&self) -> Arc<dyn CommentSource> {
        match &self.args.comments {
            Some(path) => Arc::new(JsonFileSource::new(path)),
            None => Arc::new(
                FixtureSource::new(Duration::from_millis(self.args.load_delay_ms))
                    .failing(self.args.fail_load),
            ),
        }
    }

    fn source_label(&self) -> String {
        match &self.args.comments {
            Some(path) => path.display().to_string(),
            None => "sample conversation".to_string(),
        }
    }
}
