//! Data structures for layout computation.

use serde::{Deserialize, Serialize};

use crate::error::ErdError;
use crate::measure::TextMetrics;
use crate::schema::Table;

/// Top-left corner of a table box in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A placed table rectangle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBox {
    pub table: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TableBox {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }
}

/// Size of the visible scroll region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

/// A cluster of tables laid out together.
///
/// Related groups have a `main_table`; the single unrelated group has none and carries every
/// isolated table in `related_tables`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group<'a> {
    pub main_table: Option<&'a Table>,
    pub related_tables: Vec<&'a Table>,
    pub is_related: bool,
}

impl<'a> Group<'a> {
    /// Main table first, then related tables in order.
    pub fn tables(&self) -> impl Iterator<Item = &'a Table> + '_ {
        self.main_table
            .into_iter()
            .chain(self.related_tables.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.related_tables.len() + usize::from(self.main_table.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How relationship-bearing tables are clustered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingStrategy {
    /// One left-to-right pass absorbing direct referrers of each main table.
    #[default]
    Greedy,
    /// Full connected components over foreign-key edges.
    Connected,
}

impl GroupingStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "greedy" => Some(Self::Greedy),
            "connected" => Some(Self::Connected),
            _ => None,
        }
    }
}

/// Layout and viewport constants. Missing fields in a config file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub table_width: f64,
    pub min_table_height: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    pub group_gap: f64,
    pub related_per_row: usize,
    pub unrelated_per_row: usize,
    /// Horizontal cursor beyond which related groups wrap to a new band.
    pub wrap_threshold: f64,
    pub start_floor: f64,
    pub fit_padding: f64,
    pub min_zoom_percent: u32,
    pub max_zoom_percent: u32,
    pub zoom_step_percent: u32,
    pub grouping: GroupingStrategy,
    pub metrics: TextMetrics,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            table_width: 450.0,
            min_table_height: 200.0,
            horizontal_gap: 450.0,
            vertical_gap: 100.0,
            group_gap: 200.0,
            related_per_row: 6,
            unrelated_per_row: 4,
            wrap_threshold: 4000.0,
            start_floor: 100.0,
            fit_padding: 100.0,
            min_zoom_percent: 10,
            max_zoom_percent: 300,
            zoom_step_percent: 10,
            grouping: GroupingStrategy::Greedy,
            metrics: TextMetrics::default(),
        }
    }
}

impl LayoutConfig {
    /// Reject values that would make the layout degenerate.
    pub fn validate(&self) -> Result<(), String> {
        if self.related_per_row == 0 || self.unrelated_per_row == 0 {
            return Err("tables per row must be at least 1".to_string());
        }
        if self.table_width <= 0.0 || !self.table_width.is_finite() {
            return Err("table_width must be positive".to_string());
        }
        if self.min_zoom_percent == 0 || self.min_zoom_percent > self.max_zoom_percent {
            return Err("zoom bounds must satisfy 0 < min <= max".to_string());
        }
        if self.zoom_step_percent == 0 {
            return Err("zoom_step_percent must be at least 1".to_string());
        }
        Ok(())
    }

    /// Parse a possibly partial JSON object; absent fields keep their defaults.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate().map_err(ErdError::Config)?;
        Ok(config)
    }

    /// Distance between the left edges of neighbouring boxes in a row.
    pub fn column_pitch(&self) -> f64 {
        self.table_width + self.horizontal_gap
    }
}

/// Result of a layout pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    /// One box per table, in input order.
    pub boxes: Vec<TableBox>,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn get(&self, table: &str) -> Option<&TableBox> {
        self.boxes.iter().find(|b| b.table == table)
    }

    pub fn position(&self, table: &str) -> Option<Position> {
        self.get(table).map(TableBox::position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config = LayoutConfig::from_json(r#"{"table_width": 300, "grouping": "connected"}"#).unwrap();
        assert_eq!(config.table_width, 300.0);
        assert_eq!(config.grouping, GroupingStrategy::Connected);
        assert_eq!(config.related_per_row, 6);
        assert_eq!(config.column_pitch(), 750.0);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            LayoutConfig::from_json(r#"{"related_per_row": 0}"#),
            Err(ErdError::Config(_))
        ));
        assert!(matches!(
            LayoutConfig::from_json("{not json"),
            Err(ErdError::Json(_))
        ));
    }

    #[test]
    fn test_grouping_from_str() {
        assert_eq!(GroupingStrategy::from_str("greedy"), Some(GroupingStrategy::Greedy));
        assert_eq!(GroupingStrategy::from_str("bfs"), None);
    }
}
