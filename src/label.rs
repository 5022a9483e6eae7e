//! The two-line watermark label.
//!
//! A label is built fresh for every document from the language, an
//! optional user name and a local timestamp:
//!
//! ```text
//! For Reference Only[OBARA]
//! Current User     2024-05-01 09:07
//! ```

use crate::config::Language;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;

/// Text painted on every tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatermarkLabel {
    pub base: String,
    pub user: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24-hour.
    pub time: String,
}

impl WatermarkLabel {
    /// Build a label for a given moment.
    pub fn new(language: Language, user: Option<&str>, at: NaiveDateTime) -> Self {
        let (base, default_user) = match language {
            Language::En => ("For Reference Only[OBARA]", "Current User"),
            Language::Zh => ("仅供参考[OBARA]", "当前用户"),
        };
        let user = user
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(default_user);

        Self {
            base: base.to_string(),
            user: user.to_string(),
            date: at.format("%Y-%m-%d").to_string(),
            time: at.format("%H:%M").to_string(),
        }
    }

    /// Build a label stamped with the current local time.
    pub fn now(language: Language, user: Option<&str>) -> Self {
        Self::new(language, user, Local::now().naive_local())
    }

    /// The lines in paint order, top to bottom.
    pub fn lines(&self) -> [String; 2] {
        [
            self.base.clone(),
            format!("{}     {} {}", self.user, self.date, self.time),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn moment() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 7, 59)
            .unwrap()
    }

    #[test]
    fn english_label_lines() {
        let label = WatermarkLabel::new(Language::En, None, moment());
        assert_eq!(
            label.lines(),
            [
                "For Reference Only[OBARA]".to_string(),
                "Current User     2024-05-01 09:07".to_string(),
            ]
        );
    }

    #[test]
    fn chinese_label_lines() {
        let label = WatermarkLabel::new(Language::Zh, None, moment());
        assert_eq!(label.base, "仅供参考[OBARA]");
        assert_eq!(label.lines()[1], "当前用户     2024-05-01 09:07");
    }

    #[test]
    fn explicit_user_replaces_placeholder() {
        let label = WatermarkLabel::new(Language::En, Some("  j.doe "), moment());
        assert_eq!(label.lines()[1], "j.doe     2024-05-01 09:07");

        let blank = WatermarkLabel::new(Language::En, Some("   "), moment());
        assert_eq!(blank.user, "Current User");
    }

    #[test]
    fn time_is_zero_padded_24h() {
        let late = NaiveDate::from_ymd_opt(2023, 12, 9)
            .unwrap()
            .and_hms_opt(23, 5, 0)
            .unwrap();
        let label = WatermarkLabel::new(Language::En, None, late);
        assert_eq!(label.date, "2023-12-09");
        assert_eq!(label.time, "23:05");
    }
}
