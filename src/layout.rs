//! Grouping, placement and viewport fitting of tables.

pub mod analysis;
pub mod fit;
pub mod placement;
pub mod routing;
pub mod types;

use std::collections::HashMap;

use tracing::info;

use crate::error::ErdError;
use crate::schema::Table;

pub use analysis::{group_tables, has_relationship, related_tables};
pub use fit::{fit_viewport, round_zoom_percent, ViewportFit, ZoomState};
pub use routing::{route_connectors, Connector, ConnectorPath};
pub use types::{Group, GroupingStrategy, Layout, LayoutConfig, Position, TableBox, Viewport};

use placement::{place_related_groups, place_unrelated, start_point};

/// Layout engine configuration and computation.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    pub(crate) config: LayoutConfig,
}

impl LayoutEngine {
    /// Build an engine, rejecting configs that would make placement or fitting degenerate.
    pub fn new(config: LayoutConfig) -> crate::error::Result<Self> {
        config.validate().map_err(ErdError::Config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Rendered height when known, otherwise the estimate from the column count.
    pub fn table_height(&self, table: &Table, measured: &HashMap<String, f64>) -> f64 {
        measured
            .get(&table.table_name)
            .copied()
            .unwrap_or_else(|| self.config.metrics.estimate_height(table))
    }

    /// Compute the top-left position of every table.
    pub fn compute_positions(
        &self,
        tables: &[Table],
        measured: &HashMap<String, f64>,
        viewport: Viewport,
    ) -> HashMap<String, Position> {
        let mut positions = HashMap::new();
        if tables.is_empty() {
            return positions;
        }

        let start = start_point(viewport, &self.config);
        let groups = group_tables(tables, self.config.grouping);
        let (related, unrelated): (Vec<&Group>, Vec<&Group>) =
            groups.iter().partition(|g| g.is_related);

        let height_of = |t: &Table| self.table_height(t, measured);
        let max_related_x =
            place_related_groups(&related, &height_of, start, &self.config, &mut positions);

        if let Some(group) = unrelated.first() {
            let origin = Position {
                x: max_related_x + self.config.group_gap * 2.0,
                y: start.y,
            };
            place_unrelated(&group.related_tables, origin, &self.config, &mut positions);
        }

        info!(
            tables = tables.len(),
            groups = groups.len(),
            "computed table positions"
        );
        positions
    }

    /// Compute positions and the resulting table rectangles, in input order.
    pub fn layout(
        &self,
        tables: &[Table],
        measured: &HashMap<String, f64>,
        viewport: Viewport,
    ) -> Layout {
        let positions = self.compute_positions(tables, measured, viewport);
        self.boxes_at(tables, &positions, measured)
    }

    /// Build table rectangles from existing positions; tables without a position are left out.
    pub fn boxes_at(
        &self,
        tables: &[Table],
        positions: &HashMap<String, Position>,
        measured: &HashMap<String, f64>,
    ) -> Layout {
        let boxes: Vec<TableBox> = tables
            .iter()
            .filter_map(|t| {
                let p = positions.get(&t.table_name)?;
                Some(TableBox {
                    table: t.table_name.clone(),
                    x: p.x,
                    y: p.y,
                    width: self.config.table_width,
                    height: self.table_height(t, measured),
                })
            })
            .collect();

        let margin = self.config.start_floor;
        let width = boxes.iter().map(TableBox::right).fold(0.0, f64::max) + margin;
        let height = boxes.iter().map(TableBox::bottom).fold(0.0, f64::max) + margin;

        Layout {
            boxes,
            width,
            height,
        }
    }

    /// Fit the given layout into the viewport.
    pub fn fit(&self, layout: &Layout, viewport: Viewport) -> Option<ViewportFit> {
        fit_viewport(&layout.boxes, viewport, &self.config)
    }
}
