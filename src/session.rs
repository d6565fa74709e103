//! Session-scoped diagram state.
//!
//! A [`Session`] owns the schema model, the heights reported by the renderer and the current
//! table positions. A visualize pass runs in three explicit steps:
//!
//! 1. [`Session::submit`] parses SQL and adds only the tables whose names are new; the host
//!    materializes a placeholder for each name in [`Submission::added`].
//! 2. [`Session::record_height`] feeds back the real rendered heights.
//! 3. [`Session::layout`] recomputes every position over the whole schema and refits the
//!    viewport.
//!
//! [`Session::visualize`] runs steps 1 and 3 back to back for hosts that cannot measure.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ErdError, Result};
use crate::layout::{
    has_relationship, related_tables, Layout, LayoutConfig, LayoutEngine, Position, Viewport,
    ViewportFit,
};
use crate::schema::{Schema, Table};
use crate::sql::{export_table, parse_sql, ParseReport};

/// Outcome of submitting SQL to a session.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    /// Names of the tables added by this submission, in source order.
    pub added: Vec<String>,
    pub report: ParseReport,
}

/// Outcome of a full layout pass.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutPass {
    pub layout: Layout,
    pub fit: Option<ViewportFit>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    engine: LayoutEngine,
    schema: Schema,
    measured: HashMap<String, f64>,
    positions: HashMap<String, Position>,
}

impl Session {
    pub fn new(config: LayoutConfig) -> Result<Self> {
        Ok(Self {
            engine: LayoutEngine::new(config)?,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        self.engine.config()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn tables(&self) -> &[Table] {
        self.schema.tables()
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    /// Parse `sql` and add tables not yet in the schema. Existing tables are never replaced.
    pub fn submit(&mut self, sql: &str) -> Submission {
        let report = parse_sql(sql);
        let mut added = Vec::new();

        for table in &report.tables {
            let name = table.table_name.clone();
            if self.schema.insert(table.clone()) {
                added.push(name);
            } else {
                debug!(table = %name, "table already present, skipping");
            }
        }

        info!(
            added = added.len(),
            total = self.schema.len(),
            skipped = report.skipped.len(),
            "submitted SQL"
        );
        Submission { added, report }
    }

    /// Record the rendered height of a table. Unknown names are ignored.
    pub fn record_height(&mut self, table: &str, height: f64) {
        if self.schema.contains(table) && height.is_finite() && height > 0.0 {
            self.measured.insert(table.to_string(), height);
        }
    }

    /// Recompute every position from scratch and refit the viewport.
    pub fn layout(&mut self, viewport: Viewport) -> LayoutPass {
        let tables = self.schema.tables();
        self.positions = self.engine.compute_positions(tables, &self.measured, viewport);
        let layout = self.engine.boxes_at(tables, &self.positions, &self.measured);
        let fit = self.engine.fit(&layout, viewport);

        info!(
            tables = layout.boxes.len(),
            zoom = fit.map(|f| f.zoom_percent),
            "layout pass complete"
        );
        LayoutPass { layout, fit }
    }

    /// Submit and lay out. Returns `None` without touching positions when nothing was added.
    pub fn visualize(&mut self, sql: &str, viewport: Viewport) -> Option<LayoutPass> {
        let submission = self.submit(sql);
        if submission.added.is_empty() {
            info!("no new tables found");
            return None;
        }
        Some(self.layout(viewport))
    }

    /// Move a table after a drag. Only its position changes; no relayout or refit happens.
    pub fn move_table(&mut self, table: &str, x: f64, y: f64) -> Result<()> {
        let position = self
            .positions
            .get_mut(table)
            .ok_or_else(|| ErdError::UnknownTable(table.to_string()))?;
        *position = Position { x, y };
        Ok(())
    }

    /// Table rectangles at the current positions, including dragged ones.
    pub fn current_layout(&self) -> Layout {
        self.engine
            .boxes_at(self.schema.tables(), &self.positions, &self.measured)
    }

    pub fn export_table(&self, table: &str) -> Result<String> {
        self.schema
            .get(table)
            .map(export_table)
            .ok_or_else(|| ErdError::UnknownTable(table.to_string()))
    }

    /// Tables to emphasize when `table` is highlighted.
    pub fn highlight(&self, table: &str) -> Result<Vec<String>> {
        if !self.schema.contains(table) {
            return Err(ErdError::UnknownTable(table.to_string()));
        }
        Ok(related_tables(table, self.schema.tables()))
    }

    pub fn is_unrelated(&self, table: &str) -> Option<bool> {
        self.schema
            .get(table)
            .map(|t| !has_relationship(t, self.schema.tables()))
    }
}
