use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::schema::Table;

/// Box metrics of a rendered table: a title bar followed by one row per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMetrics {
    pub char_width: f64,
    pub title_height: f64,
    pub row_height: f64,
    /// Top plus bottom padding around the column rows.
    pub padding: f64,
    pub padding_x: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            title_height: 50.0,
            row_height: 32.0,
            padding: 30.0,
            padding_x: 12.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    /// Height estimate for a table that has not been rendered yet.
    pub fn estimate_height(&self, table: &Table) -> f64 {
        self.title_height + table.columns.len() as f64 * self.row_height + self.padding
    }

    /// Vertical centre of the `index`-th column row, relative to the box top.
    pub fn row_center(&self, index: usize) -> f64 {
        self.title_height + self.padding / 2.0 + index as f64 * self.row_height + self.row_height / 2.0
    }

    /// Shorten `text` with a trailing ellipsis so it fits in `max_width`.
    pub fn truncate(&self, text: &str, max_width: f64) -> String {
        if self.text_width(text) <= max_width {
            return text.to_string();
        }

        let budget = max_width - self.text_width("…");
        let mut out = String::new();
        let mut used = 0.0;
        for c in text.chars() {
            let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0) as f64 * self.char_width;
            if used + w > budget {
                break;
            }
            used += w;
            out.push(c);
        }
        out.push('…');
        out
    }
}
