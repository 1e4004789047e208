use crate::app::{update, AppMsg, Effect};
use crate::i18n::{I18n, Lang};
use crate::model::{load_config, AppConfig, FormMode};
use crate::services::dispatch::{quote_arg, spawn_dispatch, DispatchKind, DispatchMsg};
use crate::store::InMemoryFormStore;
use crate::widgets::api_docs::ApiDocsWidget;
use crate::widgets::entry_form::FormState;
use crate::widgets::entry_form_widget::EntryFormWidget;
use crate::widgets::landing::LandingWidget;
use crate::widgets::status_bar::draw_status_bar;
use crate::widgets::Widget as _;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::prelude::*;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

const TICK_MS: u64 = 200;
const TICKS_PER_SECOND: u64 = 1000 / TICK_MS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Landing,
    Form,
    ApiDocs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub text: String,
    pub level: ToastLevel,
    pub expires_at: u64,
}

pub struct AppState {
    pub config: AppConfig,
    pub i18n: I18n,
    pub view: View,
    pub form: EntryFormWidget,
    pub landing: LandingWidget,
    pub api_docs: ApiDocsWidget,
    pub tick: u64,
    pub submitting: bool,
    pub status_text: Option<String>,
    pub toast: Option<Toast>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let i18n = I18n::load(Lang::from_tag(&config.language));
        let form = EntryFormWidget::new(
            FormState::new(&config, i18n.clone()),
            Box::new(InMemoryFormStore::default()),
        );
        let landing = LandingWidget::new(i18n.clone());
        let api_docs = ApiDocsWidget::new(&i18n);
        Self {
            config,
            i18n,
            view: View::Landing,
            form,
            landing,
            api_docs,
            tick: 0,
            submitting: false,
            status_text: None,
            toast: None,
        }
    }

    /// Mounts a fresh form; the previous one is discarded entirely.
    pub fn reset_form(&mut self) {
        self.form = EntryFormWidget::new(
            FormState::new(&self.config, self.i18n.clone()),
            Box::new(InMemoryFormStore::default()),
        );
    }

    pub fn show_toast(&mut self, text: String, level: ToastLevel, seconds: u64) {
        self.toast = Some(Toast {
            text,
            level,
            expires_at: self.tick + seconds * TICKS_PER_SECOND,
        });
    }
}

pub fn run() -> Result<()> {
    let config = load_config()?;
    let mut state = AppState::new(config);
    let (tx, rx) = mpsc::channel::<DispatchMsg>();
    if std::env::var("OFDB_TUI_HEADLESS").is_ok() {
        return run_headless(&mut state, &tx, &rx);
    }
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let res = run_loop(&mut terminal, &mut state, &tx, &rx);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    tx: &Sender<DispatchMsg>,
    rx: &Receiver<DispatchMsg>,
) -> Result<()> {
    loop {
        pump_dispatch(state, rx, tx);
        terminal.draw(|f| draw(f, state))?;
        if event::poll(Duration::from_millis(TICK_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(state, key, tx) {
                    return Ok(());
                }
            }
        } else {
            state.tick += 1;
            if let Some(t) = &state.toast {
                if t.expires_at <= state.tick {
                    state.toast = None;
                }
            }
        }
    }
}

/// Smoke mode for CI: renders a few frames against a test backend and
/// optionally prints a JSON summary.
fn run_headless(
    state: &mut AppState,
    tx: &Sender<DispatchMsg>,
    rx: &Receiver<DispatchMsg>,
) -> Result<()> {
    let ticks: u64 = std::env::var("OFDB_TUI_TICKS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);
    let backend = TestBackend::new(100, 40);
    let mut terminal = Terminal::new(backend)?;
    for _ in 0..ticks {
        pump_dispatch(state, rx, tx);
        terminal.draw(|f| draw(f, state))?;
        state.tick += 1;
    }
    if std::env::var("OFDB_TUI_SMOKE_SUMMARY").is_ok() {
        let view = match state.view {
            View::Landing => "landing",
            View::Form => "form",
            View::ApiDocs => "api_docs",
        };
        println!(
            "{}",
            serde_json::json!({"ok": true, "ticks": state.tick, "view": view})
        );
    }
    Ok(())
}

fn pump_dispatch(state: &mut AppState, rx: &Receiver<DispatchMsg>, tx: &Sender<DispatchMsg>) {
    while let Ok(msg) = rx.try_recv() {
        let app_msg = match msg.kind {
            DispatchKind::Submit => AppMsg::LoadedSubmit {
                outcome: msg.outcome,
            },
            DispatchKind::Geocode => AppMsg::LoadedGeocode {
                outcome: msg.outcome,
            },
        };
        let effects = update(state, app_msg);
        run_effects(state, effects, tx);
    }
}

/// Returns true when the app should quit.
fn handle_key(state: &mut AppState, key: KeyEvent, tx: &Sender<DispatchMsg>) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        copy_view_content(state);
        return false;
    }
    let capturing = state.view == View::Form && state.form.is_capturing();
    if !capturing {
        match key.code {
            KeyCode::F(1) => {
                switch_view(state, View::Landing);
                return false;
            }
            KeyCode::F(2) => {
                switch_view(state, View::Form);
                return false;
            }
            KeyCode::F(3) => {
                switch_view(state, View::ApiDocs);
                return false;
            }
            KeyCode::Char('q') if state.view != View::Form => return true,
            _ => {}
        }
    }
    let effects = match state.view {
        View::Landing => state.landing.on_key(key.code),
        View::Form => state.form.on_key(key.code),
        View::ApiDocs => state.api_docs.on_key(key.code),
    };
    run_effects(state, effects, tx);
    false
}

/// Navigating away from the form discards it; entering mounts a fresh one.
fn switch_view(state: &mut AppState, target: View) {
    if state.view == target {
        return;
    }
    if state.view == View::Form || target == View::Form {
        state.reset_form();
    }
    state.view = target;
}

fn copy_view_content(state: &mut AppState) {
    let text = match state.view {
        View::Landing => state.landing.raw_content(),
        View::ApiDocs => state.api_docs.raw_content().to_string(),
        View::Form => state.form.form.build_submit_cmdline(),
    };
    match arboard::Clipboard::new().and_then(|mut c| c.set_text(text)) {
        Ok(()) => state.show_toast("Copied to clipboard".into(), ToastLevel::Success, 3),
        Err(e) => state.show_toast(format!("Clipboard: {e}"), ToastLevel::Error, 4),
    }
}

pub(crate) fn run_effects(state: &mut AppState, effects: Vec<Effect>, tx: &Sender<DispatchMsg>) {
    for effect in effects {
        match effect {
            Effect::SubmitEntry { cmdline } => {
                state.submitting = true;
                state.status_text = Some("Saving entry".into());
                state.form.form.disabled = true;
                spawn_dispatch(cmdline, DispatchKind::Submit, tx.clone());
            }
            Effect::Geocode { query } => {
                let cmdline = format!("{} {}", state.config.geocode_cmd, quote_arg(&query));
                state.status_text = Some("Looking up position".into());
                spawn_dispatch(cmdline, DispatchKind::Geocode, tx.clone());
            }
            Effect::CancelForm { mode } => {
                state.reset_form();
                state.view = View::Landing;
                let text = match mode {
                    FormMode::Create => "New entry discarded",
                    FormMode::Edit => "Edit cancelled",
                };
                state.show_toast(text.into(), ToastLevel::Info, 4);
            }
            Effect::ShowToast {
                text,
                level,
                seconds,
            } => state.show_toast(text, level, seconds),
        }
    }
}

fn draw(f: &mut Frame, state: &mut AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());
    draw_tabs(f, rows[0], state);
    let tick = state.tick;
    match state.view {
        View::Landing => state.landing.render(f, rows[1], true, tick),
        View::Form => state.form.render(f, rows[1], true, tick),
        View::ApiDocs => state.api_docs.render(f, rows[1], true, tick),
    }
    draw_status_bar(f, rows[2], state);
}

fn draw_tabs(f: &mut Frame, area: Rect, state: &AppState) {
    let form_label = match state.config.mode {
        FormMode::Create => "F2 New entry",
        FormMode::Edit => "F2 Edit entry",
    };
    let tabs = [
        (View::Landing, "F1 Home"),
        (View::Form, form_label),
        (View::ApiDocs, "F3 API docs"),
    ];
    let mut spans: Vec<Span> = Vec::new();
    for (view, label) in tabs {
        let style = if state.view == view {
            crate::theme::list_cursor_style()
        } else {
            crate::theme::text_muted()
        };
        spans.push(Span::styled(format!(" {label} "), style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(ratatui::widgets::Paragraph::new(Line::from(spans)), area);
}
