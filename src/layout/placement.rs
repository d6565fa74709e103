//! Table placement: related groups in horizontal bands, isolated tables in a side region.

use std::collections::HashMap;

use tracing::trace;

use crate::schema::Table;

use super::types::{Group, LayoutConfig, Position, Viewport};

/// Top-left of the first group: a quarter of the viewport width and a sixth of its height,
/// each floored at `start_floor`.
pub fn start_point(viewport: Viewport, config: &LayoutConfig) -> Position {
    Position {
        x: (viewport.width / 4.0).max(config.start_floor),
        y: (viewport.height / 6.0).max(config.start_floor),
    }
}

/// Row heights of a group laid out `per_row` wide: tallest table of each row, never below the
/// minimum box height.
pub fn row_heights<F>(tables: &[&Table], per_row: usize, height_of: &F, min_height: f64) -> Vec<f64>
where
    F: Fn(&Table) -> f64,
{
    tables
        .chunks(per_row)
        .map(|row| row.iter().map(|&t| height_of(t)).fold(min_height, f64::max))
        .collect()
}

/// Place related groups left to right, wrapping to a new band past the wrap threshold.
///
/// Returns the rightmost horizontal cursor reached, including the trailing group gap.
pub fn place_related_groups<F>(
    groups: &[&Group<'_>],
    height_of: &F,
    start: Position,
    config: &LayoutConfig,
    positions: &mut HashMap<String, Position>,
) -> f64
where
    F: Fn(&Table) -> f64,
{
    let pitch = config.column_pitch();
    let per_row = config.related_per_row;

    let mut current_x = start.x;
    let mut current_y = start.y;
    let mut band_height: f64 = 0.0;
    let mut max_related_x = start.x;

    for group in groups {
        let tables: Vec<&Table> = group.tables().collect();
        if tables.is_empty() {
            continue;
        }

        let heights = row_heights(&tables, per_row, height_of, config.min_table_height);

        let mut row_top = current_y;
        for (row_idx, row) in tables.chunks(per_row).enumerate() {
            for (col_idx, table) in row.iter().enumerate() {
                let position = Position {
                    x: current_x + col_idx as f64 * pitch,
                    y: row_top,
                };
                trace!(table = %table.table_name, x = position.x, y = position.y, "placed related table");
                positions.insert(table.table_name.clone(), position);
            }
            row_top += heights[row_idx] + config.vertical_gap;
        }

        let group_width = per_row.min(tables.len()) as f64 * pitch;
        let group_height = heights.iter().sum::<f64>()
            + heights.len().saturating_sub(1) as f64 * config.vertical_gap;
        band_height = band_height.max(group_height);

        current_x += group_width + config.group_gap;
        max_related_x = max_related_x.max(current_x);

        if current_x > config.wrap_threshold {
            current_x = start.x;
            current_y += band_height + config.group_gap;
            band_height = 0.0;
        }
    }

    max_related_x
}

/// Place isolated tables in a grid starting at `origin`, spaced by the minimum box height.
pub fn place_unrelated(
    tables: &[&Table],
    origin: Position,
    config: &LayoutConfig,
    positions: &mut HashMap<String, Position>,
) {
    let pitch_x = config.column_pitch();
    let pitch_y = config.min_table_height + config.vertical_gap;

    for (index, table) in tables.iter().enumerate() {
        let row = index / config.unrelated_per_row;
        let col = index % config.unrelated_per_row;
        let position = Position {
            x: origin.x + col as f64 * pitch_x,
            y: origin.y + row as f64 * pitch_y,
        };
        trace!(table = %table.table_name, x = position.x, y = position.y, "placed unrelated table");
        positions.insert(table.table_name.clone(), position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    fn table(name: &str, columns: usize) -> Table {
        let mut t = Table::new(name);
        for i in 0..columns {
            t.columns.push(Column {
                name: format!("c{i}"),
                typ: "INT".to_string(),
            });
        }
        t
    }

    #[test]
    fn test_start_point() {
        let config = LayoutConfig::default();
        let p = start_point(Viewport { width: 1200.0, height: 800.0 }, &config);
        assert_eq!(p, Position { x: 300.0, y: 800.0 / 6.0 });

        let small = start_point(Viewport { width: 200.0, height: 300.0 }, &config);
        assert_eq!(small, Position { x: 100.0, y: 100.0 });
    }

    #[test]
    fn test_row_heights_floor() {
        let small = table("a", 1);
        let tall = table("b", 10);
        let tables = vec![&small, &tall, &small];
        let heights = row_heights(&tables, 2, &|t: &Table| 50.0 + t.columns.len() as f64 * 32.0 + 30.0, 200.0);
        assert_eq!(heights, vec![50.0 + 320.0 + 30.0, 200.0]);
    }

    #[test]
    fn test_group_rows_wrap_at_six() {
        let config = LayoutConfig::default();
        let tables: Vec<Table> = (0..8).map(|i| table(&format!("t{i}"), 2)).collect();
        let group = Group {
            main_table: Some(&tables[0]),
            related_tables: tables[1..].iter().collect(),
            is_related: true,
        };
        let mut positions = HashMap::new();
        let start = Position { x: 100.0, y: 100.0 };
        let max_x = place_related_groups(&[&group], &|_: &Table| 150.0, start, &config, &mut positions);

        assert_eq!(positions["t0"], Position { x: 100.0, y: 100.0 });
        assert_eq!(positions["t5"], Position { x: 100.0 + 5.0 * 900.0, y: 100.0 });
        // second row sits below a 200-high first row plus the vertical gap
        assert_eq!(positions["t6"], Position { x: 100.0, y: 400.0 });
        assert_eq!(max_x, 100.0 + 6.0 * 900.0 + 200.0);
    }

    #[test]
    fn test_groups_wrap_to_new_band() {
        let config = LayoutConfig::default();
        let tables: Vec<Table> = (0..10).map(|i| table(&format!("t{i}"), 1)).collect();
        let groups: Vec<Group> = tables
            .chunks(2)
            .map(|pair| Group {
                main_table: Some(&pair[0]),
                related_tables: vec![&pair[1]],
                is_related: true,
            })
            .collect();
        let refs: Vec<&Group> = groups.iter().collect();
        let mut positions = HashMap::new();
        let start = Position { x: 100.0, y: 100.0 };
        place_related_groups(&refs, &|_: &Table| 100.0, start, &config, &mut positions);

        // each group is 1800 wide plus a 200 gap: cursor passes 4000 after the second group
        assert_eq!(positions["t0"].x, 100.0);
        assert_eq!(positions["t2"].x, 2100.0);
        assert_eq!(positions["t4"], Position { x: 100.0, y: 100.0 + 200.0 + 200.0 });
    }

    #[test]
    fn test_unrelated_grid() {
        let config = LayoutConfig::default();
        let tables: Vec<Table> = (0..5).map(|i| table(&format!("u{i}"), 30)).collect();
        let refs: Vec<&Table> = tables.iter().collect();
        let mut positions = HashMap::new();
        place_unrelated(&refs, Position { x: 1000.0, y: 100.0 }, &config, &mut positions);

        assert_eq!(positions["u3"], Position { x: 1000.0 + 3.0 * 900.0, y: 100.0 });
        // spacing ignores the tall measured height
        assert_eq!(positions["u4"], Position { x: 1000.0, y: 400.0 });
    }
}
