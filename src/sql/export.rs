//! Serializer for converting a parsed table back into MySQL DDL.

use crate::schema::{Column, ForeignKey, Table};

const TABLE_OPTIONS: &str = "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

/// Serialize a table to a `CREATE TABLE` statement.
///
/// Identifiers are backtick-quoted, one column per line, and every foreign key becomes a
/// trailing `CONSTRAINT fk_<table>_<column>` clause.
pub fn export_table(table: &Table) -> String {
    let mut output = format!("CREATE TABLE `{}` (\n", table.table_name);

    let mut lines: Vec<String> = table.columns.iter().map(serialize_column).collect();
    lines.extend(
        table
            .foreign_keys
            .iter()
            .map(|fk| serialize_foreign_key(&table.table_name, fk)),
    );

    output.push_str(&lines.join(",\n"));
    output.push_str("\n) ");
    output.push_str(TABLE_OPTIONS);
    output.push(';');
    output
}

/// Serialize every table, separated by blank lines.
pub fn export_tables<'a>(tables: impl IntoIterator<Item = &'a Table>) -> String {
    tables
        .into_iter()
        .map(export_table)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn serialize_column(column: &Column) -> String {
    format!("  `{}` {}", column.name, column.typ)
}

fn serialize_foreign_key(table_name: &str, fk: &ForeignKey) -> String {
    format!(
        "  CONSTRAINT `fk_{}_{}` FOREIGN KEY (`{}`) REFERENCES `{}` (`{}`)",
        table_name, fk.column, fk.column, fk.references_table, fk.references_column
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parse;

    fn orders() -> Table {
        Table {
            table_name: "orders".to_string(),
            columns: vec![
                Column {
                    name: "id".to_string(),
                    typ: "INT NOT NULL".to_string(),
                },
                Column {
                    name: "user_id".to_string(),
                    typ: "INT".to_string(),
                },
            ],
            foreign_keys: vec![ForeignKey {
                column: "user_id".to_string(),
                references_table: "users".to_string(),
                references_column: "id".to_string(),
            }],
        }
    }

    #[test]
    fn test_export_format() {
        let sql = export_table(&orders());
        let expected = "CREATE TABLE `orders` (\n  `id` INT NOT NULL,\n  `user_id` INT,\n  CONSTRAINT `fk_orders_user_id` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`)\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_export_without_foreign_keys() {
        let mut table = orders();
        table.foreign_keys.clear();
        let sql = export_table(&table);
        assert!(sql.ends_with("`user_id` INT\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;"));
        assert!(!sql.contains("CONSTRAINT"));
    }

    #[test]
    fn test_export_reparses() {
        let table = orders();
        let reparsed = parse(&export_table(&table));
        assert_eq!(reparsed, vec![table]);
    }
}
