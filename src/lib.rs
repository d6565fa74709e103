pub mod error;
pub mod layout;
pub mod measure;
pub mod schema;
pub mod session;
pub mod sql;
pub mod svg;

use std::collections::HashMap;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use layout::{Layout, LayoutConfig, LayoutEngine, Viewport, ViewportFit};
use schema::{Schema, Table};
use sql::Skipped;
use svg::SvgRenderer;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Everything a host needs to draw one diagram.
#[derive(Debug, Serialize)]
pub struct Diagram {
    pub tables: Vec<Table>,
    pub skipped: Vec<Skipped>,
    pub layout: Layout,
    pub fit: Option<ViewportFit>,
}

/// Parse, lay out and fit in one pass. Repeated table names keep their first definition.
pub fn build_diagram(
    sql: &str,
    viewport: Viewport,
    config: LayoutConfig,
) -> error::Result<Diagram> {
    let engine = LayoutEngine::new(config)?;
    let report = sql::parse_sql(sql);
    let mut skipped = report.skipped;
    let mut schema = Schema::new();
    for table in report.tables {
        let name = table.table_name.clone();
        if !schema.insert(table) {
            skipped.push(Skipped::DuplicateTable { table: name });
        }
    }

    let layout = engine.layout(schema.tables(), &HashMap::new(), viewport);
    let fit = engine.fit(&layout, viewport);

    Ok(Diagram {
        tables: schema.tables().to_vec(),
        skipped,
        layout,
        fit,
    })
}

fn config_from(json: Option<&str>) -> Result<LayoutConfig, String> {
    match json {
        Some(json) if !json.trim().is_empty() => {
            LayoutConfig::from_json(json).map_err(|e| e.to_string())
        }
        _ => Ok(LayoutConfig::default()),
    }
}

/// Render SQL DDL to SVG
#[wasm_bindgen(js_name = "sqlToSvg")]
pub fn sql_to_svg(sql: &str, width: f64, height: f64) -> Result<String, String> {
    let diagram = build_diagram(sql, Viewport { width, height }, LayoutConfig::default())
        .map_err(|e| e.to_string())?;
    let svg = SvgRenderer::default().render(&diagram.tables, &diagram.layout, None);
    Ok(svg)
}

/// Parse SQL DDL into the table model, as JSON
#[wasm_bindgen(js_name = "parseSchema")]
pub fn parse_schema(sql: &str) -> Result<String, String> {
    serde_json::to_string(&sql::parse_sql(sql)).map_err(|e| e.to_string())
}

/// Parse and lay out SQL DDL, as JSON
#[wasm_bindgen(js_name = "layoutSchema")]
pub fn layout_schema(
    sql: &str,
    width: f64,
    height: f64,
    config: Option<String>,
) -> Result<String, String> {
    let config = config_from(config.as_deref())?;
    let diagram =
        build_diagram(sql, Viewport { width, height }, config).map_err(|e| e.to_string())?;
    serde_json::to_string(&diagram).map_err(|e| e.to_string())
}

/// Zoom and scroll that fit the laid-out diagram, as `{ zoom, zoomPercent, scrollX, scrollY }`
#[wasm_bindgen(js_name = "fitViewport")]
pub fn fit_viewport(sql: &str, width: f64, height: f64) -> Result<JsValue, JsValue> {
    let diagram = build_diagram(sql, Viewport { width, height }, LayoutConfig::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let Some(fit) = diagram.fit else {
        return Ok(JsValue::NULL);
    };

    let obj = js_sys::Object::new();
    js_sys::Reflect::set(&obj, &"zoom".into(), &fit.zoom.into())?;
    js_sys::Reflect::set(&obj, &"zoomPercent".into(), &fit.zoom_percent.into())?;
    js_sys::Reflect::set(&obj, &"scrollX".into(), &fit.scroll_x.into())?;
    js_sys::Reflect::set(&obj, &"scrollY".into(), &fit.scroll_y.into())?;
    Ok(obj.into())
}
