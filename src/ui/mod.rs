pub mod components;
pub mod effects;
pub mod layout;
pub mod panel;
pub mod popover;
pub mod utils;

use crate::{
    errors::AppError,
    help_keybind, help_text,
    ui::{
        components::{
            Component, DumbComponent,
            comment_panel::CommentPanel,
            help::{HelpComponent, HelpElementKind},
            status_bar::StatusBar,
            toast::{ToastEngine, ToastMessage},
        },
        effects::Services,
        panel::{Msg, PanelConfig},
    },
};
use crossterm::{
    event::{EventStream, KeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
};
use futures::{StreamExt, future::FutureExt};
use rat_widget::{
    event::{HandleEvent, Outcome, Regular},
    focus::{Focus, FocusBuilder, FocusFlag},
};
use ratatui::{crossterm, prelude::*, widgets::Block};
use std::{io::stdout, sync::OnceLock};
use termprofile::{DetectorSettings, TermProfile};
use tokio::{select, sync::mpsc::Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

const TICK_RATE: std::time::Duration = std::time::Duration::from_millis(100);
pub static COLOR_PROFILE: OnceLock<TermProfile> = OnceLock::new();
const HELP_TEXT: &[HelpElementKind] = &[
    help_text!("Global Help"),
    help_text!(""),
    help_keybind!("Tab / Shift+Tab", "switch between comments and composer"),
    help_keybind!("[ / ]", "previous / next tab"),
    help_keybind!("q / Ctrl+C", "quit"),
    help_keybind!("? / Ctrl+H", "toggle this help"),
    help_text!(""),
    help_text!("Each part of the panel lists its own keys once focused."),
];

pub async fn run(state: AppState) -> Result<(), AppError> {
    if COLOR_PROFILE.get().is_none() {
        COLOR_PROFILE
            .set(TermProfile::detect(&stdout(), DetectorSettings::default()))
            .map_err(|_| AppError::ErrorSettingGlobal("color profile"))?;
    }
    let mut terminal = ratatui::init();
    let (action_tx, action_rx) = tokio::sync::mpsc::channel(100);
    let mut app = App::new(action_tx, action_rx, state);
    let result = app.run(&mut terminal).await;
    ratatui::restore();
    result
}

struct App {
    action_tx: tokio::sync::mpsc::Sender<Action>,
    action_rx: tokio::sync::mpsc::Receiver<Action>,
    focus: Option<Focus>,
    cancel_action: CancellationToken,
    components: Vec<Box<dyn Component>>,
    dumb_components: Vec<Box<dyn DumbComponent>>,
    toasts: ToastEngine,
    help: Option<&'static [HelpElementKind]>,
    in_help: bool,
    last_focused: Option<FocusFlag>,
}

/// Everything the UI needs from the bootstrap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: PanelConfig,
    pub services: Services,
    pub source_label: String,
}

impl AppState {
    pub fn new(config: PanelConfig, services: Services, source_label: String) -> Self {
        Self {
            config,
            services,
            source_label,
        }
    }
}

fn focus(state: &mut App) -> &mut Focus {
    let mut f = FocusBuilder::new(state.focus.take());
    for component in state.components.iter() {
        if component.should_render() {
            f.widget(component.as_ref());
        }
    }
    state.focus.insert(f.build())
}

impl App {
    fn new(
        action_tx: Sender<Action>,
        action_rx: tokio::sync::mpsc::Receiver<Action>,
        state: AppState,
    ) -> Self {
        let status_bar = StatusBar::new(&state);
        let comment_panel = CommentPanel::new(state.config, state.services);
        Self {
            focus: None,
            in_help: false,
            help: None,
            toasts: ToastEngine::new(Rect::default()).action_tx(action_tx.clone()),
            action_tx,
            action_rx,
            last_focused: None,
            cancel_action: Default::default(),
            components: vec![Box::new(comment_panel)],
            dumb_components: vec![Box::new(status_bar)],
        }
    }

    async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<impl std::io::Write>>,
    ) -> Result<(), AppError> {
        let ctok = self.cancel_action.clone();
        let action_tx = self.action_tx.clone();
        for component in self.components.iter_mut() {
            component.register_action_tx(action_tx.clone());
        }
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        tokio::spawn(async move {
            let mut tick_interval = tokio::time::interval(TICK_RATE);
            let mut event_stream = EventStream::new();

            loop {
                let event = select! {
                    _ = ctok.cancelled() => break,
                    _ = tick_interval.tick() => Action::Tick,
                    kevent = event_stream.next().fuse() => {
                        match kevent {
                            Some(Ok(kevent)) => Action::AppEvent(kevent),
                            Some(Err(..)) => Action::None,
                            None => break,
                        }
                    }
                };
                if action_tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok::<(), AppError>(())
        });
        focus(self);
        if let Some(ref mut focus) = self.focus
            && let Some(first) = self.components.first()
        {
            focus.focus(&**first);
        }
        self.draw(terminal)?;
        let ctok = self.cancel_action.clone();
        loop {
            let action = self.action_rx.recv().await;
            if let Some(ref action) = action {
                for component in self.components.iter_mut() {
                    component.handle_event(action.clone()).await?;
                    if component.gained_focus() && self.last_focused != Some(component.focus()) {
                        self.last_focused = Some(component.focus());
                        component.set_global_help();
                    }
                }
            }
            let should_draw = match &action {
                Some(Action::Tick) => self.has_animated_components(),
                Some(Action::None) => false,
                Some(Action::Quit) | None => false,
                _ => true,
            };
            match action {
                Some(Action::None) | Some(Action::Tick) => {}
                Some(Action::ForceFocusChange) => {
                    let r = focus(self).next_force();
                    debug!(outcome = ?r, "Focus");
                }
                Some(Action::ForceFocusChangeRev) => {
                    let r = focus(self).prev_force();
                    debug!(outcome = ?r, "Focus");
                }
                Some(Action::AppEvent(ref event)) => {
                    self.handle_event(event).await?;
                }
                Some(Action::SetHelp(help)) => {
                    self.help = Some(help);
                }
                Some(Action::Toast(message)) => self.toasts.handle(message),
                Some(Action::Quit) | None => {
                    ctok.cancel();
                    break;
                }
                _ => {}
            }
            if should_draw {
                self.draw(terminal)?;
            }
            if self.cancel_action.is_cancelled() {
                break;
            }
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn handle_event(&mut self, event: &crossterm::event::Event) -> Result<(), AppError> {
        use crossterm::event::Event::Key;
        use rat_widget::event::ct_event;
        debug!(?event, "Handling event");
        if matches!(
            event,
            ct_event!(key press CONTROL-'c') | ct_event!(key press CONTROL-'q')
        ) {
            self.cancel_action.cancel();
            return Ok(());
        }
        if matches!(event, ct_event!(key press CONTROL-'h')) {
            self.in_help = !self.in_help;
            return Ok(());
        }
        if self.in_help && matches!(event, ct_event!(keycode press Esc)) {
            self.in_help = false;
            return Ok(());
        }

        let capture_focus = self
            .components
            .iter()
            .any(|c| c.should_render() && c.capture_focus_event(event));
        if capture_focus {
            return Ok(());
        }
        let outcome = focus(self).handle(event, Regular);
        debug!(outcome = ?outcome, "Focus");
        if let Outcome::Continue = outcome
            && let Key(key) = event
        {
            self.handle_key(key);
        }
        Ok(())
    }

    fn handle_key(&mut self, key: &crossterm::event::KeyEvent) {
        use crossterm::event::KeyCode::*;
        match key.code {
            Char('q') => {
                info!("Quit requested");
                self.cancel_action.cancel();
            }
            Char('?') => self.in_help = !self.in_help,
            _ => {}
        }
    }

    fn has_animated_components(&self) -> bool {
        self.components
            .iter()
            .any(|component| component.should_render() && component.is_animating())
    }

    fn draw(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<impl std::io::Write>>,
    ) -> Result<(), AppError> {
        terminal.draw(|f| {
            let area = f.area();
            let layout = layout::Layout::new(area);
            for component in self.components.iter() {
                if component.should_render()
                    && let Some(p) = component.cursor()
                {
                    f.set_cursor_position(p);
                }
            }
            let buf = f.buffer_mut();
            for component in self.components.iter_mut() {
                if component.should_render() {
                    component.render(layout, buf);
                }
            }
            for component in self.dumb_components.iter_mut() {
                component.render(layout, buf);
            }
            self.toasts.set_area(layout.main_content);
            (&self.toasts).render(area, buf);
            if self.in_help {
                let help_component = HelpComponent::new(self.help.unwrap_or(HELP_TEXT))
                    .set_constraint(60)
                    .block(
                        Block::bordered()
                            .title("Help")
                            .border_type(ratatui::widgets::BorderType::Rounded),
                    );
                help_component.render(area, buf);
            }
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Action {
    None,
    Tick,
    Quit,
    AppEvent(crossterm::event::Event),
    ForceRender,
    Panel(Msg),
    Toast(ToastMessage),
    ForceFocusChange,
    ForceFocusChangeRev,
    SetHelp(&'static [HelpElementKind]),
}
