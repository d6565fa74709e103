use crate::layout::{
    has_relationship, related_tables, route_connectors, Connector, ConnectorPath, Layout, TableBox,
};
use crate::measure::TextMetrics;
use crate::schema::Table;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

pub struct SvgRenderer {
    metrics: TextMetrics,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
        }
    }
}

impl SvgRenderer {
    pub fn new(metrics: TextMetrics) -> Self {
        Self { metrics }
    }

    /// Render boxes and connectors. With `highlight`, only that table's neighbourhood stays
    /// emphasized.
    pub fn render(&self, tables: &[Table], layout: &Layout, highlight: Option<&str>) -> String {
        let neighbourhood = highlight.map(|name| related_tables(name, tables));
        self.render_highlighted(tables, layout, neighbourhood.as_deref())
    }

    /// Render with an already computed set of emphasized table names.
    pub fn render_highlighted(
        &self,
        tables: &[Table],
        layout: &Layout,
        highlighted: Option<&[String]>,
    ) -> String {
        let mut svg = String::new();

        writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            layout.width, layout.height, layout.width, layout.height
        )
        .unwrap();

        writeln!(
            &mut svg,
            r##"<defs>
  <marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="6" markerHeight="6" orient="auto-start-reverse">
    <path d="M 0 0 L 10 5 L 0 10 z" fill="#3498db" />
  </marker>
</defs>
<style>
  .table-box {{ fill: #fff; stroke: #333; stroke-width: 1.5; }}
  .table-box.unrelated {{ stroke-dasharray: 6 4; }}
  .table-box.dimmed {{ opacity: 0.3; }}
  .table-box.highlighted {{ stroke: #e67e22; stroke-width: 3; }}
  .table-header {{ fill: #e0e0e0; }}
  .table-name {{ font-family: monospace; font-size: 16px; font-weight: bold; }}
  .column {{ font-family: monospace; font-size: 13px; }}
  .connection-normal {{ stroke: #3498db; stroke-width: 2; fill: none; }}
  .connection-self {{ stroke: #e74c3c; stroke-width: 2; fill: none; }}
  .connection-background {{ stroke: white; stroke-width: 6; fill: none; }}
</style>"##
        )
        .unwrap();

        let highlighted: Option<HashSet<&str>> =
            highlighted.map(|names| names.iter().map(String::as_str).collect());

        // Connectors first (behind boxes)
        for connector in route_connectors(tables, &layout.boxes, &self.metrics) {
            let emphasized = match &highlighted {
                None => true,
                Some(set) => {
                    set.contains(connector.from_table.as_str())
                        && set.contains(connector.to_table.as_str())
                }
            };
            self.render_connector(&mut svg, &connector, emphasized, highlighted.is_some());
        }

        let table_map: HashMap<&str, &Table> =
            tables.iter().map(|t| (t.table_name.as_str(), t)).collect();
        for table_box in &layout.boxes {
            if let Some(table) = table_map.get(table_box.table.as_str()) {
                let mut class = String::from("table-box");
                if !has_relationship(table, tables) {
                    class.push_str(" unrelated");
                }
                if let Some(set) = &highlighted {
                    class.push_str(if set.contains(table.table_name.as_str()) {
                        " highlighted"
                    } else {
                        " dimmed"
                    });
                }
                self.render_table(&mut svg, table_box, table, &class);
            }
        }

        writeln!(&mut svg, "</svg>").unwrap();
        svg
    }

    fn render_table(&self, svg: &mut String, layout: &TableBox, table: &Table, class: &str) {
        let x = layout.x;
        let y = layout.y;
        let w = layout.width;
        let header_h = self.metrics.title_height;
        let text_width = w - self.metrics.padding_x * 2.0;

        writeln!(svg, r#"<g id="table-{}">"#, escape_xml(&table.table_name)).unwrap();
        writeln!(
            svg,
            r#"<rect class="{}" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
            class, x, y, w, layout.height
        )
        .unwrap();
        writeln!(
            svg,
            r#"<rect class="table-header" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
            x, y, w, header_h
        )
        .unwrap();
        writeln!(
            svg,
            r#"<text class="table-name" x="{}" y="{}" text-anchor="middle">{}</text>"#,
            x + w / 2.0,
            y + header_h / 2.0 + 5.0,
            escape_xml(&self.metrics.truncate(&table.table_name, text_width))
        )
        .unwrap();

        for (idx, col) in table.columns.iter().enumerate() {
            let label = format!("{} ({})", col.name, col.typ);
            writeln!(
                svg,
                r#"<text class="column" id="{}-{}" x="{}" y="{}">{}</text>"#,
                escape_xml(&table.table_name),
                escape_xml(&col.name),
                x + self.metrics.padding_x,
                y + self.metrics.row_center(idx) + 4.0,
                escape_xml(&self.metrics.truncate(&label, text_width))
            )
            .unwrap();
        }

        writeln!(svg, "</g>").unwrap();
    }

    fn render_connector(&self, svg: &mut String, connector: &Connector, emphasized: bool, highlight_mode: bool) {
        let d = match connector.path {
            ConnectorPath::Line { start, end } => {
                format!("M{},{} L{},{}", start.0, start.1, end.0, end.1)
            }
            ConnectorPath::Curve {
                start,
                control1,
                control2,
                end,
            } => format!(
                "M{},{} C{},{} {},{} {},{}",
                start.0, start.1, control1.0, control1.1, control2.0, control2.1, end.0, end.1
            ),
        };

        if highlight_mode && emphasized {
            writeln!(svg, r#"<path class="connection-background" d="{}" />"#, d).unwrap();
        }

        let class = match connector.path {
            ConnectorPath::Line { .. } => "connection-normal",
            ConnectorPath::Curve { .. } => "connection-self",
        };
        let opacity = if emphasized { "" } else { r#" opacity="0.3""# };
        writeln!(
            svg,
            r#"<path class="{}" d="{}" marker-end="url(#arrow)"{} />"#,
            class, d, opacity
        )
        .unwrap();
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutEngine, Viewport};
    use crate::sql::parse;

    const SHOP: &str = "CREATE TABLE users (id INT, name VARCHAR(255)) ENGINE=InnoDB;
        CREATE TABLE orders (id INT, user_id INT, CONSTRAINT fk1 FOREIGN KEY (user_id) REFERENCES users(id)) ENGINE=InnoDB;
        CREATE TABLE logs (id INT, message TEXT) ENGINE=InnoDB;";

    fn render(highlight: Option<&str>) -> String {
        let tables = parse(SHOP);
        let layout = LayoutEngine::default().layout(&tables, &HashMap::new(), Viewport::default());
        SvgRenderer::default().render(&tables, &layout, highlight)
    }

    #[test]
    fn test_render_basic() {
        let svg = render(None);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"id="table-users""#));
        assert!(svg.contains("name (VARCHAR(255))"));
        assert!(svg.contains(r#"class="connection-normal""#));
        assert!(svg.contains(r#"class="table-box unrelated""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_render_highlight() {
        let svg = render(Some("orders"));
        assert!(svg.contains(r#"class="table-box highlighted""#));
        assert!(svg.contains(r#"class="table-box unrelated dimmed""#));
        assert!(svg.contains("connection-background"));
        assert!(!svg.contains(r#"opacity="0.3""#));

        let svg = render(Some("logs"));
        assert!(svg.contains(r#"opacity="0.3""#));
    }

    #[test]
    fn test_render_highlighted_matches_render() {
        let tables = parse(SHOP);
        let layout = LayoutEngine::default().layout(&tables, &HashMap::new(), Viewport::default());
        let renderer = SvgRenderer::default();
        let names = vec!["orders".to_string(), "users".to_string()];

        assert_eq!(
            renderer.render_highlighted(&tables, &layout, Some(&names)),
            renderer.render(&tables, &layout, Some("orders"))
        );
    }

    #[test]
    fn test_render_escapes() {
        let tables = parse("CREATE TABLE t (note VARCHAR(10) DEFAULT '<none>') ENGINE=InnoDB;");
        let layout = LayoutEngine::default().layout(&tables, &HashMap::new(), Viewport::default());
        let svg = SvgRenderer::default().render(&tables, &layout, None);
        assert!(svg.contains("&lt;none&gt;"));
    }

    #[test]
    fn test_render_unicode() {
        let tables = parse("CREATE TABLE ユーザー (名前 TEXT) ENGINE=InnoDB;");
        let layout = LayoutEngine::default().layout(&tables, &HashMap::new(), Viewport::default());
        let svg = SvgRenderer::default().render(&tables, &layout, None);
        assert!(svg.contains("ユーザー"));
        assert!(svg.contains("名前 (TEXT)"));
    }
}
