use chrono::{Datelike, Months, NaiveDate};
use ratatui::prelude::*;
use ratatui::widgets::*;

/// Month-grid picker overlay for the event date range.
///
/// Selection is constrained, not rejected: days outside [min, max] render
/// muted and cannot be confirmed. The opposing field's value is passed in
/// as min/max so an accepted pair always satisfies start <= end.
pub struct DatePicker {
    pub cursor: NaiveDate,
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
    title: String,
}

impl DatePicker {
    pub fn new(
        title: impl Into<String>,
        initial: Option<NaiveDate>,
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    ) -> Self {
        let mut cursor = initial.or(min).unwrap_or_else(today);
        if let Some(lo) = min {
            if cursor < lo {
                cursor = lo;
            }
        }
        if let Some(hi) = max {
            if cursor > hi {
                cursor = hi;
            }
        }
        Self {
            cursor,
            min,
            max,
            title: title.into(),
        }
    }

    pub fn is_disabled(&self, day: NaiveDate) -> bool {
        if let Some(lo) = self.min {
            if day < lo {
                return true;
            }
        }
        if let Some(hi) = self.max {
            if day > hi {
                return true;
            }
        }
        false
    }

    pub fn move_days(&mut self, delta: i64) {
        if let Some(d) = self
            .cursor
            .checked_add_signed(chrono::Duration::days(delta))
        {
            self.cursor = d;
        }
    }

    pub fn move_months(&mut self, delta: i32) {
        let moved = if delta >= 0 {
            self.cursor.checked_add_months(Months::new(delta as u32))
        } else {
            self.cursor
                .checked_sub_months(Months::new(delta.unsigned_abs()))
        };
        if let Some(d) = moved {
            self.cursor = d;
        }
    }

    /// Returns the cursor date, or None when it falls on a disabled day.
    pub fn confirm(&self) -> Option<NaiveDate> {
        if self.is_disabled(self.cursor) {
            None
        } else {
            Some(self.cursor)
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let month_name = [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ][(self.cursor.month0()) as usize];
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(Span::styled(
            format!("{month_name} {}", self.cursor.year()),
            crate::theme::text_active_bold(),
        )));
        lines.push(Line::from(Span::styled(
            "Mo Tu We Th Fr Sa Su",
            crate::theme::text_muted(),
        )));
        for week in month_grid(self.cursor.year(), self.cursor.month()) {
            let mut spans: Vec<Span> = Vec::new();
            for slot in week {
                match slot {
                    None => spans.push(Span::raw("   ")),
                    Some(day) => {
                        let txt = format!("{:>2} ", day.day());
                        let st = if day == self.cursor {
                            crate::theme::list_cursor_style()
                        } else if self.is_disabled(day) {
                            crate::theme::text_muted()
                        } else if day == today() {
                            crate::theme::text_active_bold()
                        } else {
                            Style::default()
                        };
                        spans.push(Span::styled(txt, st));
                    }
                }
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(Span::styled(
            "←→↑↓ day/week • PgUp/PgDn month • Enter pick • Esc close",
            crate::theme::text_muted(),
        )));
        let block = crate::widgets::chrome::panel_block(&self.title, true);
        f.render_widget(Clear, area);
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Weeks of a month, Monday-first, padded with None outside the month.
pub fn month_grid(year: i32, month: u32) -> Vec<Vec<Option<NaiveDate>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month start");
    let mut weeks: Vec<Vec<Option<NaiveDate>>> = Vec::new();
    let mut week: Vec<Option<NaiveDate>> =
        vec![None; first.weekday().num_days_from_monday() as usize];
    let mut day = first;
    while day.month() == month {
        week.push(Some(day));
        if week.len() == 7 {
            weeks.push(week);
            week = Vec::new();
        }
        day = match day.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }
    if !week.is_empty() {
        week.resize(7, None);
        weeks.push(week);
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn grid_covers_whole_month_in_order() {
        let weeks = month_grid(2024, 2);
        let days: Vec<NaiveDate> = weeks.into_iter().flatten().flatten().collect();
        assert_eq!(days.len(), 29);
        assert_eq!(days.first(), Some(&d(2024, 2, 1)));
        assert_eq!(days.last(), Some(&d(2024, 2, 29)));
        // 2024-02-01 is a Thursday: three leading blanks
        let weeks = month_grid(2024, 2);
        assert_eq!(weeks[0].iter().filter(|s| s.is_none()).count(), 3);
    }

    #[test]
    fn end_picker_disables_days_before_start() {
        // start=2024-03-01 means 2024-02-28 cannot be selected as end
        let picker = DatePicker::new("End", None, Some(d(2024, 3, 1)), None);
        assert!(picker.is_disabled(d(2024, 2, 28)));
        assert!(!picker.is_disabled(d(2024, 3, 1)));
        assert!(!picker.is_disabled(d(2024, 3, 15)));
    }

    #[test]
    fn confirm_refuses_disabled_cursor() {
        let mut picker = DatePicker::new("End", Some(d(2024, 3, 5)), Some(d(2024, 3, 1)), None);
        assert_eq!(picker.confirm(), Some(d(2024, 3, 5)));
        picker.move_days(-10);
        assert_eq!(picker.cursor, d(2024, 2, 24));
        assert_eq!(picker.confirm(), None);
    }

    #[test]
    fn initial_cursor_is_clamped_into_range() {
        let picker = DatePicker::new("Start", Some(d(2024, 1, 1)), Some(d(2024, 3, 1)), None);
        assert_eq!(picker.cursor, d(2024, 3, 1));
    }

    #[test]
    fn month_navigation_moves_cursor() {
        let mut picker = DatePicker::new("Start", Some(d(2024, 1, 31)), None, None);
        picker.move_months(1);
        assert_eq!(picker.cursor, d(2024, 2, 29));
        picker.move_months(-1);
        assert_eq!(picker.cursor, d(2024, 1, 29));
    }
}
