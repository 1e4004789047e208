use crate::app::Effect;
use crate::store::{FormStore, StoreAction};
use crate::widgets::chrome::{centered_rect, panel_block};
use crate::widgets::date_picker::{today, DatePicker};
use crate::widgets::entry_form::{
    build_lines, Category, FieldKind, FieldValue, FormState, Row, CATEGORY_UNSET, EVENT_ID,
    INITIATIVE_ID,
};
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};
use regex::Regex;
use std::any::Any;
use std::sync::OnceLock;
use tui_textarea::{CursorMove, TextArea};

/// Telephone inputs drop everything but digits and '+'.
fn telephone_filter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d+]").expect("valid telephone filter"))
}

const ADDRESS_FIELDS: [&str; 3] = ["street", "zip", "city"];
const CATEGORY_OPTIONS: [&str; 3] = [CATEGORY_UNSET, INITIATIVE_ID, EVENT_ID];

/// The entry form as a focusable widget: key routing, the date-picker and
/// description overlays, and the effects the form emits towards the app.
pub struct EntryFormWidget {
    pub form: FormState,
    pub store: Box<dyn FormStore>,
    picker: Option<(&'static str, DatePicker)>,
    textarea: Option<TextArea<'static>>,
    category_cursor: usize,
    address_baseline: Option<String>,
    scroll: u16,
}

impl EntryFormWidget {
    pub fn new(form: FormState, mut store: Box<dyn FormStore>) -> Self {
        store.initialize(&form.values());
        Self {
            form,
            store,
            picker: None,
            textarea: None,
            category_cursor: 0,
            address_baseline: None,
            scroll: 0,
        }
    }

    /// True while a key press belongs to this widget rather than to the
    /// app-level bindings (quit, view switch).
    pub fn is_capturing(&self) -> bool {
        self.form.editing || self.picker.is_some() || self.textarea.is_some()
    }

    fn dispatch_field(&mut self, name: &str) {
        let value = match self.form.field(name).map(|f| &f.value) {
            Some(FieldValue::Text(s)) => s.clone(),
            Some(FieldValue::Bool(b)) => b.to_string(),
            None => return,
        };
        self.store.dispatch(StoreAction::SetField {
            name: name.to_string(),
            value,
        });
    }

    /// Geocode result landing in the position fields; the store sees the
    /// update like any other field change.
    pub fn set_position(&mut self, lat: f64, lng: f64) {
        self.form.set_position(lat, lng);
        self.dispatch_field("lat");
        self.dispatch_field("lng");
    }

    fn scroll_to_field(&mut self, name: &str) {
        let target = self.form.visible_rows().iter().position(|r| {
            matches!(r, Row::Field(i) if self.form.fields[*i].name == name)
        });
        if let Some(ix) = target {
            self.form.selected = ix;
        }
    }

    fn open_picker(&mut self, name: &'static str) {
        let now = today();
        let (min, max) = match name {
            "start" => self.form.start_bounds(now),
            _ => self.form.end_bounds(now),
        };
        let initial = match name {
            "start" => self.form.start_date(),
            _ => self.form.end_date(),
        };
        let title = self
            .form
            .field(name)
            .map(|f| f.label.clone())
            .unwrap_or_default();
        self.picker = Some((name, DatePicker::new(title, initial, min, max)));
    }

    fn open_description(&mut self) {
        let lines: Vec<String> = self
            .form
            .value_of("description")
            .split('\n')
            .map(str::to_string)
            .collect();
        let mut ta = TextArea::new(lines);
        ta.move_cursor(CursorMove::Bottom);
        ta.move_cursor(CursorMove::End);
        self.textarea = Some(ta);
    }

    fn description_overlay_len(ta: &TextArea) -> usize {
        let chars: usize = ta.lines().iter().map(|l| l.chars().count()).sum();
        chars + ta.lines().len().saturating_sub(1)
    }

    fn commit_description(&mut self) {
        if let Some(ta) = self.textarea.take() {
            let text = ta.lines().join("\n");
            self.form.on_description_change(&text);
            self.dispatch_field("description");
        }
    }

    fn begin_text_edit(&mut self, name: &str) {
        if ADDRESS_FIELDS.contains(&name) {
            self.address_baseline = Some(self.form.address_query());
        }
        self.form.editing = true;
    }

    /// Commit of a single-line edit. Leaving an address field with a
    /// changed value geocodes the composed address.
    fn commit_text_edit(&mut self) -> Vec<Effect> {
        self.form.editing = false;
        let Row::Field(i) = self.form.selected_row() else {
            return Vec::new();
        };
        let name = self.form.fields[i].name;
        self.form.fields[i].error = None;
        self.dispatch_field(name);
        if let Some(before) = self.address_baseline.take() {
            let query = self.form.address_query();
            if query != before && !query.is_empty() {
                return vec![Effect::Geocode { query }];
            }
        }
        Vec::new()
    }

    fn cycle_category(&mut self, delta: isize) {
        let current = CATEGORY_OPTIONS
            .iter()
            .position(|id| *id == self.form.value_of("category"))
            .unwrap_or(0);
        let next = (current as isize + delta).rem_euclid(CATEGORY_OPTIONS.len() as isize);
        self.form.select_category(CATEGORY_OPTIONS[next as usize]);
        self.clamp_selection();
        self.dispatch_field("category");
    }

    fn clamp_selection(&mut self) {
        let max = self.form.visible_rows().len() - 1;
        if self.form.selected > max {
            self.form.selected = max;
        }
    }

    fn toggle_checkbox(&mut self, i: usize) {
        if let FieldValue::Bool(b) = &mut self.form.fields[i].value {
            *b = !*b;
        }
        let name = self.form.fields[i].name;
        self.dispatch_field(name);
    }

    fn cancel(&mut self) -> Vec<Effect> {
        self.store.initialize(&[]);
        vec![Effect::CancelForm {
            mode: self.form.mode,
        }]
    }

    fn save(&mut self) -> Vec<Effect> {
        self.form.clear_errors();
        let Some(cmdline) = self.form.attempt_save() else {
            // blocked by the captcha gate: mark and message only
            return Vec::new();
        };
        // The scan follows delegation and pulls the first incomplete
        // input back into view.
        if let Some(name) = self.form.first_missing_required() {
            self.scroll_to_field(name);
        }
        vec![Effect::SubmitEntry { cmdline }]
    }

    fn on_picker_key(&mut self, key: KeyCode) {
        let Some((name, picker)) = self.picker.as_mut() else {
            return;
        };
        match key {
            KeyCode::Left => picker.move_days(-1),
            KeyCode::Right => picker.move_days(1),
            KeyCode::Up => picker.move_days(-7),
            KeyCode::Down => picker.move_days(7),
            KeyCode::PageUp => picker.move_months(-1),
            KeyCode::PageDown => picker.move_months(1),
            KeyCode::Enter => {
                if let Some(date) = picker.confirm() {
                    let now = today();
                    let accepted = match *name {
                        "start" => self.form.set_start_date(date, now),
                        _ => self.form.set_end_date(date, now),
                    };
                    if accepted {
                        let name = *name;
                        self.picker = None;
                        self.dispatch_field(name);
                    }
                }
            }
            KeyCode::Esc => self.picker = None,
            _ => {}
        }
    }

    fn on_textarea_key(&mut self, key: KeyCode) {
        let max = self.form.max_description_len;
        let Some(ta) = self.textarea.as_mut() else {
            return;
        };
        match key {
            KeyCode::Esc => {
                self.commit_description();
                return;
            }
            KeyCode::Char(c) => {
                if Self::description_overlay_len(ta) < max {
                    ta.insert_char(c);
                }
            }
            KeyCode::Enter => {
                if Self::description_overlay_len(ta) < max {
                    ta.insert_newline();
                }
            }
            KeyCode::Backspace => {
                ta.delete_char();
            }
            KeyCode::Delete => {
                ta.delete_next_char();
            }
            KeyCode::Left => ta.move_cursor(CursorMove::Back),
            KeyCode::Right => ta.move_cursor(CursorMove::Forward),
            KeyCode::Up => ta.move_cursor(CursorMove::Up),
            KeyCode::Down => ta.move_cursor(CursorMove::Down),
            KeyCode::Home => ta.move_cursor(CursorMove::Head),
            KeyCode::End => ta.move_cursor(CursorMove::End),
            _ => {}
        }
        // live counter while the overlay is open
        let len = Self::description_overlay_len(ta).min(max);
        self.form.description_len = len;
    }

    fn on_edit_key(&mut self, key: KeyCode) -> Vec<Effect> {
        match self.form.selected_row() {
            Row::CaptchaAnswer => {
                match key {
                    KeyCode::Char(c) => self.form.captcha_answer.push(c),
                    KeyCode::Backspace => {
                        self.form.captcha_answer.pop();
                    }
                    KeyCode::Enter | KeyCode::Esc => self.form.editing = false,
                    _ => {}
                }
                Vec::new()
            }
            Row::Field(i) if self.form.fields[i].kind == FieldKind::Select => {
                match key {
                    KeyCode::Up => {
                        self.category_cursor = self.category_cursor.saturating_sub(1);
                    }
                    KeyCode::Down => {
                        self.category_cursor =
                            (self.category_cursor + 1).min(CATEGORY_OPTIONS.len() - 1);
                    }
                    KeyCode::Enter => {
                        self.form
                            .select_category(CATEGORY_OPTIONS[self.category_cursor]);
                        self.form.editing = false;
                        self.clamp_selection();
                        self.dispatch_field("category");
                    }
                    KeyCode::Esc => self.form.editing = false,
                    _ => {}
                }
                Vec::new()
            }
            Row::Field(i) => match key {
                KeyCode::Char(c) => {
                    let fld = &mut self.form.fields[i];
                    if fld.name == "telephone" && telephone_filter().is_match(&c.to_string()) {
                        return Vec::new();
                    }
                    if let FieldValue::Text(s) = &mut fld.value {
                        if fld.max_len.map_or(true, |m| s.chars().count() < m) {
                            s.push(c);
                        }
                    }
                    Vec::new()
                }
                KeyCode::Backspace => {
                    if let FieldValue::Text(s) = &mut self.form.fields[i].value {
                        s.pop();
                    }
                    Vec::new()
                }
                KeyCode::Enter | KeyCode::Esc => self.commit_text_edit(),
                _ => Vec::new(),
            },
            _ => {
                self.form.editing = false;
                Vec::new()
            }
        }
    }

    fn on_nav_key(&mut self, key: KeyCode) -> Vec<Effect> {
        let rows = self.form.visible_rows();
        match key {
            KeyCode::Up => {
                self.form.selected = self.form.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                self.form.selected = (self.form.selected + 1).min(rows.len() - 1);
            }
            KeyCode::Left | KeyCode::Right
                if matches!(self.form.selected_row(),
                    Row::Field(i) if self.form.fields[i].kind == FieldKind::Select) =>
            {
                let delta = if key == KeyCode::Left { -1 } else { 1 };
                self.cycle_category(delta);
            }
            KeyCode::Char('r') | KeyCode::Char('R')
                if matches!(
                    self.form.selected_row(),
                    Row::CaptchaAnswer | Row::CaptchaVerify
                ) =>
            {
                self.form.regenerate_captcha();
            }
            KeyCode::Char(' ')
                if matches!(self.form.selected_row(),
                    Row::Field(i) if self.form.fields[i].kind == FieldKind::Checkbox) =>
            {
                if let Row::Field(i) = self.form.selected_row() {
                    self.toggle_checkbox(i);
                }
            }
            KeyCode::Enter => return self.activate(),
            _ => {}
        }
        Vec::new()
    }

    fn activate(&mut self) -> Vec<Effect> {
        match self.form.selected_row() {
            Row::Field(i) => {
                let name = self.form.fields[i].name;
                match self.form.fields[i].kind {
                    FieldKind::Select => {
                        self.category_cursor = Category::from_id(self.form.value_of("category"))
                            .and_then(|c| CATEGORY_OPTIONS.iter().position(|id| *id == c.id()))
                            .unwrap_or(0);
                        self.form.editing = true;
                    }
                    FieldKind::Text => self.begin_text_edit(name),
                    FieldKind::Date => match name {
                        "start" => self.open_picker("start"),
                        _ => self.open_picker("end"),
                    },
                    FieldKind::TextArea => self.open_description(),
                    FieldKind::Checkbox => self.toggle_checkbox(i),
                    FieldKind::ReadOnly => {}
                }
                Vec::new()
            }
            Row::CaptchaAnswer => {
                if self.form.captcha_answer_editable() {
                    self.form.editing = true;
                }
                Vec::new()
            }
            Row::CaptchaVerify => {
                self.form.verify_captcha();
                Vec::new()
            }
            Row::Cancel => self.cancel(),
            Row::Save => self.save(),
        }
    }
}

impl super::Widget for EntryFormWidget {
    fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, tick: u64) {
        let cursor_on = tick % 4 < 2;
        let (lines, row_lines) = build_lines(&self.form, cursor_on);
        let inner_h = area.height.saturating_sub(2);
        if let Some(&target) = row_lines.get(self.form.selected) {
            let target = target as u16;
            if target < self.scroll {
                self.scroll = target;
            } else if inner_h > 0 && target >= self.scroll + inner_h {
                self.scroll = target - inner_h + 1;
            }
        }
        let block = panel_block("Entry", focused);
        f.render_widget(
            Paragraph::new(lines).block(block).scroll((self.scroll, 0)),
            area,
        );
        if let Some((_, picker)) = &self.picker {
            picker.render(f, centered_rect(40, 50, area));
        }
        if let Some(ta) = self.textarea.as_mut() {
            let title = format!(
                "{} ({})",
                self.form.tr.entry_form("description"),
                self.form.description_counter()
            );
            ta.set_block(
                ratatui::widgets::Block::default()
                    .borders(ratatui::widgets::Borders::ALL)
                    .title(title)
                    .border_style(crate::theme::border_focused()),
            );
            ta.set_cursor_line_style(Style::default());
            let overlay = centered_rect(70, 60, area);
            f.render_widget(Clear, overlay);
            f.render_widget(&*ta, overlay);
        }
    }

    fn on_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if self.form.disabled {
            return Vec::new();
        }
        if self.picker.is_some() {
            self.on_picker_key(key);
            return Vec::new();
        }
        if self.textarea.is_some() {
            self.on_textarea_key(key);
            return Vec::new();
        }
        if self.form.editing {
            self.on_edit_key(key)
        } else {
            self.on_nav_key(key)
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
