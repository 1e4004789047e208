use crate::app::Effect;
use crate::i18n::I18n;
use crate::widgets::chrome::panel_block;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};
use std::any::Any;

const SECTION_KEYS: [&str; 5] = ["about", "mapInfo", "workshop", "donate", "imprint"];

/// Static localized sections: a list on the left, the selected section's
/// text on the right.
pub struct LandingWidget {
    tr: I18n,
    sections: Vec<(&'static str, String)>,
    selected: usize,
}

impl LandingWidget {
    pub fn new(tr: I18n) -> Self {
        let sections = SECTION_KEYS
            .iter()
            .map(|key| (*key, tr.t(&format!("landing.sections.{key}"))))
            .collect();
        Self {
            tr,
            sections,
            selected: 0,
        }
    }

    fn body(&self) -> String {
        let key = self.sections[self.selected].0;
        self.tr.t(&format!("landing.{key}"))
    }

    /// Heading plus the selected section, for the clipboard.
    pub fn raw_content(&self) -> String {
        format!(
            "{}\n{}\n\n{}\n{}",
            self.tr.t("landing.heading"),
            self.tr.t("landing.subheading"),
            self.sections[self.selected].1,
            self.body()
        )
    }
}

impl super::Widget for LandingWidget {
    fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, _tick: u64) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(16), Constraint::Min(10)])
            .split(area);
        let mut lines: Vec<Line> = Vec::new();
        for (i, (_, title)) in self.sections.iter().enumerate() {
            let style = if i == self.selected {
                crate::theme::list_cursor_style()
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(format!(" {title} "), style)));
        }
        f.render_widget(
            Paragraph::new(lines).block(panel_block("Sections", focused)),
            cols[0],
        );
        let heading = self.tr.t("landing.heading");
        let mut body: Vec<Line> = vec![
            Line::from(Span::styled(
                self.tr.t("landing.subheading"),
                crate::theme::text_muted(),
            )),
            Line::from(""),
        ];
        for l in self.body().lines() {
            body.push(Line::from(l.to_string()));
        }
        f.render_widget(
            Paragraph::new(body)
                .wrap(Wrap { trim: false })
                .block(panel_block(&heading, focused)),
            cols[1],
        );
    }

    fn on_key(&mut self, key: KeyCode) -> Vec<Effect> {
        match key {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(self.sections.len() - 1),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Lang;
    use crate::widgets::Widget as _;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn lists_all_sections_and_moves_selection() {
        let mut w = LandingWidget::new(I18n::load(Lang::En));
        assert_eq!(w.sections.len(), 5);
        w.on_key(KeyCode::Down);
        w.on_key(KeyCode::Down);
        assert_eq!(w.selected, 2);
        w.on_key(KeyCode::Up);
        assert_eq!(w.selected, 1);
        for _ in 0..10 {
            w.on_key(KeyCode::Down);
        }
        assert_eq!(w.selected, 4);
    }

    #[test]
    fn renders_heading_and_selected_section() {
        let mut w = LandingWidget::new(I18n::load(Lang::En));
        let backend = TestBackend::new(80, 20);
        let mut term = Terminal::new(backend).unwrap();
        term.draw(|f| w.render(f, f.area(), true, 0)).unwrap();
        let buf = format!("{:?}", term.backend().buffer());
        assert!(buf.contains("Map of tomorrow"));
        assert!(buf.contains("About"));
    }

    #[test]
    fn raw_content_follows_the_selection() {
        let mut w = LandingWidget::new(I18n::load(Lang::En));
        assert!(w.raw_content().contains("initiatives"));
        w.on_key(KeyCode::Down);
        assert!(w.raw_content().contains("interactive map"));
    }
}
