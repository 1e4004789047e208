use crate::app::Effect;
use crate::i18n::I18n;
use crate::widgets::chrome::panel_block;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::any::Any;
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme as SynTheme, ThemeSet};
use syntect::parsing::SyntaxSet;

const OPENAPI_YAML: &str = include_str!("../../docs/openapi.yaml");

fn highlighter() -> &'static (SyntaxSet, SynTheme) {
    static CELL: OnceLock<(SyntaxSet, SynTheme)> = OnceLock::new();
    CELL.get_or_init(|| {
        let ss = SyntaxSet::load_defaults_newlines();
        let theme = ThemeSet::load_defaults().themes["base16-ocean.dark"].clone();
        (ss, theme)
    })
}

/// Read-only, syntax-highlighted view of the embedded backend API
/// description.
pub struct ApiDocsWidget {
    heading: String,
    lines: Vec<Line<'static>>,
    scroll: u16,
    viewport_h: u16,
    wrap: bool,
}

impl ApiDocsWidget {
    pub fn new(tr: &I18n) -> Self {
        Self {
            heading: tr.t("apiDocs.heading"),
            lines: highlight_yaml(OPENAPI_YAML),
            scroll: 0,
            viewport_h: 0,
            wrap: false,
        }
    }

    /// The unhighlighted document, for the clipboard.
    pub fn raw_content(&self) -> &'static str {
        OPENAPI_YAML
    }

    fn max_scroll(&self) -> u16 {
        (self.lines.len() as u16).saturating_sub(self.viewport_h.max(1))
    }
}

fn highlight_yaml(src: &str) -> Vec<Line<'static>> {
    let (ss, theme) = highlighter();
    let syntax = ss
        .find_syntax_by_extension("yaml")
        .unwrap_or_else(|| ss.find_syntax_plain_text());
    let mut hl = HighlightLines::new(syntax, theme);
    let mut out = Vec::new();
    for line in src.lines() {
        let spans = match hl.highlight_line(line, ss) {
            Ok(regions) => regions
                .into_iter()
                .map(|(st, text)| {
                    Span::styled(
                        text.to_string(),
                        Style::default().fg(Color::Rgb(
                            st.foreground.r,
                            st.foreground.g,
                            st.foreground.b,
                        )),
                    )
                })
                .collect(),
            Err(_) => vec![Span::raw(line.to_string())],
        };
        out.push(Line::from(spans));
    }
    out
}

impl super::Widget for ApiDocsWidget {
    fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, _tick: u64) {
        self.viewport_h = area.height.saturating_sub(2);
        self.scroll = self.scroll.min(self.max_scroll());
        let mut para = Paragraph::new(self.lines.clone())
            .block(panel_block(&self.heading, focused))
            .scroll((self.scroll, 0));
        if self.wrap {
            para = para.wrap(ratatui::widgets::Wrap { trim: false });
        }
        f.render_widget(para, area);
    }

    fn on_key(&mut self, key: KeyCode) -> Vec<Effect> {
        match key {
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = (self.scroll + 1).min(self.max_scroll()),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(self.viewport_h.max(1)),
            KeyCode::PageDown => {
                self.scroll = (self.scroll + self.viewport_h.max(1)).min(self.max_scroll())
            }
            KeyCode::Home => self.scroll = 0,
            KeyCode::End => self.scroll = self.max_scroll(),
            KeyCode::Char('w') => self.wrap = !self.wrap,
            _ => {}
        }
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
