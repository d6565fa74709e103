//! Connector geometry between foreign-key column rows.

use std::collections::HashMap;

use serde::Serialize;

use crate::measure::TextMetrics;
use crate::schema::Table;

use super::types::TableBox;

/// Horizontal reach of the loop drawn for a self-referencing key.
const SELF_REF_OFFSET: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConnectorPath {
    Line {
        start: (f64, f64),
        end: (f64, f64),
    },
    /// Cubic curve leaving and re-entering the right edge of the same table.
    Curve {
        start: (f64, f64),
        control1: (f64, f64),
        control2: (f64, f64),
        end: (f64, f64),
    },
}

impl ConnectorPath {
    pub fn endpoints(&self) -> ((f64, f64), (f64, f64)) {
        match *self {
            ConnectorPath::Line { start, end } | ConnectorPath::Curve { start, end, .. } => {
                (start, end)
            }
        }
    }
}

/// A drawable foreign-key connector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub path: ConnectorPath,
}

/// Compute connectors for every foreign key whose two column rows are on the diagram.
///
/// Keys pointing at a missing table, a missing column, or a table without a box are skipped.
pub fn route_connectors(tables: &[Table], boxes: &[TableBox], metrics: &TextMetrics) -> Vec<Connector> {
    let by_name: HashMap<&str, &Table> = tables.iter().map(|t| (t.table_name.as_str(), t)).collect();
    let box_of: HashMap<&str, &TableBox> = boxes.iter().map(|b| (b.table.as_str(), b)).collect();

    let mut connectors = Vec::new();
    for table in tables {
        for fk in &table.foreign_keys {
            let Some(from_box) = box_of.get(table.table_name.as_str()) else {
                continue;
            };
            let Some(to_box) = box_of.get(fk.references_table.as_str()) else {
                continue;
            };
            let Some(target) = by_name.get(fk.references_table.as_str()) else {
                continue;
            };
            let (Some(from_idx), Some(to_idx)) = (
                table.column_index(&fk.column),
                target.column_index(&fk.references_column),
            ) else {
                continue;
            };

            let from_y = from_box.y + metrics.row_center(from_idx);
            let to_y = to_box.y + metrics.row_center(to_idx);

            let path = if table.table_name == fk.references_table {
                route_self_ref(from_box, from_y, to_y)
            } else {
                route_straight(from_box, from_y, to_box, to_y)
            };

            connectors.push(Connector {
                from_table: table.table_name.clone(),
                from_column: fk.column.clone(),
                to_table: fk.references_table.clone(),
                to_column: fk.references_column.clone(),
                path,
            });
        }
    }

    connectors
}

/// Exit towards the target: right edge into its left edge when the target lies to the
/// right, otherwise left edge into its right edge.
fn route_straight(from: &TableBox, from_y: f64, to: &TableBox, to_y: f64) -> ConnectorPath {
    let (start_x, end_x) = if from.x < to.x {
        (from.right(), to.x)
    } else {
        (from.x, to.right())
    };

    ConnectorPath::Line {
        start: (start_x, from_y),
        end: (end_x, to_y),
    }
}

fn route_self_ref(node: &TableBox, from_y: f64, to_y: f64) -> ConnectorPath {
    let x = node.right();
    ConnectorPath::Curve {
        start: (x, from_y),
        control1: (x + SELF_REF_OFFSET, from_y),
        control2: (x + SELF_REF_OFFSET, to_y),
        end: (x, to_y),
    }
}
