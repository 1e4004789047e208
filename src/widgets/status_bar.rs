use crate::ui::{AppState, View};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// One-line footer: busy spinner, then toast, then per-view key help.
pub fn draw_status_bar(f: &mut Frame, area: Rect, state: &AppState) {
    let line = if let Some(text) = &state.status_text {
        let frame = SPINNER[(state.tick as usize) % SPINNER.len()];
        Line::from(Span::styled(
            format!(" {frame} {text}"),
            crate::theme::text_active_bold(),
        ))
    } else if let Some(toast) = &state.toast {
        Line::from(Span::styled(
            format!(" {}", toast.text),
            Style::default().fg(crate::theme::toast_color(toast.level)),
        ))
    } else {
        let help = match state.view {
            View::Landing => " F2 new entry | F3 API docs | ^C copy | q quit",
            View::Form if state.form.is_capturing() => " Esc/Enter commit | type to edit",
            View::Form => " Up/Down move | Enter open | r new captcha | F1 leave",
            View::ApiDocs => " Up/Down/PgUp/PgDn scroll | w wrap | ^C copy | q quit",
        };
        Line::from(Span::styled(help, crate::theme::text_muted()))
    };
    f.render_widget(Paragraph::new(line), area);
}
