//! Best-effort extraction of tables, columns and foreign keys from MySQL DDL.
//!
//! Only one statement shape is recognized: `CREATE TABLE name ( ... ) ENGINE=...`, with
//! foreign keys declared as `CONSTRAINT name FOREIGN KEY (col) REFERENCES table (col)`.
//! Anything else is skipped without failing the parse; every skip is reported in
//! [`ParseReport::skipped`].

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::split::split_fragments;
use crate::schema::{Column, ForeignKey, Table};

/// `CREATE TABLE` up to the first `) ENGINE=`; the body is matched lazily across lines.
static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)CREATE\s+TABLE\s+[`"]?(\w+)[`"]?\s*\((.*?)\)\s*ENGINE\s*="#).unwrap()
});

/// Named foreign key constraint with single-column local and target sides.
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)CONSTRAINT\s+[`"]?\w+[`"]?\s+FOREIGN\s+KEY\s*\(\s*[`"]?(\w+)[`"]?\s*\)\s*REFERENCES\s+[`"]?(\w+)[`"]?\s*\(\s*[`"]?(\w+)[`"]?\s*\)"#,
    )
    .unwrap()
});

/// Table-level key and constraint declarations inside a CREATE TABLE body.
static KEY_DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:PRIMARY\s+KEY|UNIQUE\s+(?:KEY|INDEX)|FULLTEXT\s+KEY|FOREIGN\s+KEY|KEY|INDEX|CONSTRAINT)\b|UNIQUE\s*\()",
    )
    .unwrap()
});

/// Column definition: optionally quoted name, whitespace, type clause.
static COLUMN_DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[`"]?(\w+)[`"]?\s+([^\r]+)"#).unwrap());

/// A fragment or constraint the parser could not use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Skipped {
    /// `PRIMARY KEY (...)`, `KEY idx (...)`, `CONSTRAINT ...` and similar lines.
    KeyDeclaration { table: String, fragment: String },
    /// A body fragment that does not look like `name type`.
    UnrecognizedColumn { table: String, fragment: String },
    /// A later CREATE TABLE reusing a name that is already taken.
    DuplicateTable { table: String },
    /// No parsed table owns the constrained column.
    #[serde(rename_all = "camelCase")]
    UnresolvedForeignKey {
        column: String,
        references_table: String,
    },
    /// The constrained column name exists in several tables; `chosen` received the key.
    AmbiguousForeignKey {
        column: String,
        chosen: String,
        candidates: Vec<String>,
    },
}

/// Result of a parse: the tables in source order plus everything that was dropped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseReport {
    pub tables: Vec<Table>,
    pub skipped: Vec<Skipped>,
}

/// Parse DDL into tables, discarding diagnostics.
pub fn parse(sql: &str) -> Vec<Table> {
    parse_sql(sql).tables
}

/// Parse DDL into tables and a list of skipped fragments.
pub fn parse_sql(sql: &str) -> ParseReport {
    let mut report = ParseReport::default();
    let mut spans: Vec<Range<usize>> = Vec::new();

    for caps in CREATE_TABLE_RE.captures_iter(sql) {
        let (Some(whole), Some(name), Some(body)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let table = parse_table(name.as_str(), body.as_str(), &mut report.skipped);
        spans.push(whole.range());
        report.tables.push(table);
    }

    for caps in FOREIGN_KEY_RE.captures_iter(sql) {
        let (Some(whole), Some(column), Some(target), Some(target_column)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };

        let enclosing = spans.iter().position(|span| span.contains(&whole.start()));
        let fk = ForeignKey {
            column: column.as_str().to_string(),
            references_table: target.as_str().to_string(),
            references_column: target_column.as_str().to_string(),
        };
        attach_foreign_key(&mut report, enclosing, fk);
    }

    debug!(
        tables = report.tables.len(),
        skipped = report.skipped.len(),
        "parsed DDL"
    );
    report
}

fn parse_table(name: &str, body: &str, skipped: &mut Vec<Skipped>) -> Table {
    let mut table = Table::new(name);

    for fragment in split_fragments(body) {
        if KEY_DECLARATION_RE.is_match(fragment) {
            skipped.push(Skipped::KeyDeclaration {
                table: name.to_string(),
                fragment: fragment.to_string(),
            });
            continue;
        }

        match parse_column(fragment) {
            Some(column) => table.columns.push(column),
            None => {
                debug!(table = name, fragment, "skipping unrecognized column fragment");
                skipped.push(Skipped::UnrecognizedColumn {
                    table: name.to_string(),
                    fragment: fragment.to_string(),
                });
            }
        }
    }

    table
}

fn parse_column(fragment: &str) -> Option<Column> {
    let caps = COLUMN_DEF_RE.captures(fragment)?;
    let name = caps.get(1)?.as_str();
    let typ = caps
        .get(2)?
        .as_str()
        .trim()
        .trim_end_matches(',')
        .trim_end();

    if typ.is_empty() {
        return None;
    }

    Some(Column {
        name: name.to_string(),
        typ: typ.to_string(),
    })
}

/// Attach a foreign key to its owning table.
///
/// The enclosing CREATE TABLE wins when it owns the column; otherwise the first parsed table
/// owning a column of that name receives the key.
fn attach_foreign_key(report: &mut ParseReport, enclosing: Option<usize>, fk: ForeignKey) {
    let owners: Vec<usize> = report
        .tables
        .iter()
        .enumerate()
        .filter(|(_, t)| t.has_column(&fk.column))
        .map(|(i, _)| i)
        .collect();

    let owner = enclosing
        .filter(|i| owners.contains(i))
        .or_else(|| owners.first().copied());

    let Some(owner) = owner else {
        debug!(
            column = %fk.column,
            references = %fk.references_table,
            "dropping foreign key with no owning column"
        );
        report.skipped.push(Skipped::UnresolvedForeignKey {
            column: fk.column,
            references_table: fk.references_table,
        });
        return;
    };

    if owners.len() > 1 {
        report.skipped.push(Skipped::AmbiguousForeignKey {
            column: fk.column.clone(),
            chosen: report.tables[owner].table_name.clone(),
            candidates: owners
                .iter()
                .map(|&i| report.tables[i].table_name.clone())
                .collect(),
        });
    }

    report.tables[owner].foreign_keys.push(fk);
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS_ORDERS: &str = "CREATE TABLE users (id INT, name VARCHAR(255)) ENGINE=InnoDB; \
        CREATE TABLE orders (id INT, user_id INT, CONSTRAINT fk1 FOREIGN KEY (user_id) REFERENCES users(id)) ENGINE=InnoDB;";

    #[test]
    fn test_parse_simple_table() {
        let sql = r#"
            CREATE TABLE `users` (
              `id` int(11) NOT NULL AUTO_INCREMENT,
              `email` varchar(255) NOT NULL,
              `created_at` datetime DEFAULT NULL
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#;

        let tables = parse(sql);
        assert_eq!(tables.len(), 1);

        let users = &tables[0];
        assert_eq!(users.table_name, "users");
        let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "created_at"]);
        assert_eq!(users.columns[0].typ, "int(11) NOT NULL AUTO_INCREMENT");
        assert_eq!(users.columns[2].typ, "datetime DEFAULT NULL");
        assert!(users.foreign_keys.is_empty());
    }

    #[test]
    fn test_parse_with_foreign_key() {
        let tables = parse(USERS_ORDERS);
        assert_eq!(tables.len(), 2);

        let orders = &tables[1];
        assert_eq!(orders.table_name, "orders");
        assert_eq!(
            orders.foreign_keys,
            vec![ForeignKey {
                column: "user_id".to_string(),
                references_table: "users".to_string(),
                references_column: "id".to_string(),
            }]
        );
        // The constraint line is a declaration, not a column.
        assert_eq!(orders.columns.len(), 2);
        assert!(tables[0].foreign_keys.is_empty());
    }

    #[test]
    fn test_key_declarations_skipped() {
        let sql = "CREATE TABLE t (
            id INT NOT NULL,
            code CHAR(3),
            PRIMARY KEY (id),
            UNIQUE KEY uq_code (code),
            KEY idx_code (code)
        ) ENGINE=InnoDB;";

        let report = parse_sql(sql);
        let t = &report.tables[0];
        assert_eq!(t.columns.len(), 2);
        assert!(
            t.columns
                .iter()
                .all(|c| c.name != "PRIMARY" && c.name != "UNIQUE" && c.name != "KEY")
        );
        let declarations = report
            .skipped
            .iter()
            .filter(|s| matches!(s, Skipped::KeyDeclaration { .. }))
            .count();
        assert_eq!(declarations, 3);
    }

    #[test]
    fn test_key_prefixed_column_kept() {
        let sql = "CREATE TABLE t (key_id INT, keyword VARCHAR(20)) ENGINE=InnoDB;";
        let tables = parse(sql);
        assert_eq!(tables[0].columns.len(), 2);
        assert_eq!(tables[0].columns[0].name, "key_id");
    }

    #[test]
    fn test_decimal_single_column() {
        let sql = "CREATE TABLE prices (amount DECIMAL(10,2) NOT NULL) ENGINE=InnoDB;";
        let tables = parse(sql);
        assert_eq!(tables[0].columns.len(), 1);
        assert_eq!(tables[0].columns[0].typ, "DECIMAL(10,2) NOT NULL");
    }

    #[test]
    fn test_escaped_quote_in_default() {
        let sql = r"CREATE TABLE t (id INT, note VARCHAR(20) DEFAULT 'it\'s', a INT, b INT) ENGINE=InnoDB;";
        let tables = parse(sql);
        let names: Vec<&str> = tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "note", "a", "b"]);
        assert_eq!(tables[0].columns[1].typ, r"VARCHAR(20) DEFAULT 'it\'s'");
    }

    #[test]
    fn test_case_insensitive_and_quotes() {
        let sql = "create table \"accounts\" (\r\n  \"id\" bigint,\r\n  balance int\r\n) engine=MyISAM;";
        let tables = parse(sql);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table_name, "accounts");
        assert_eq!(tables[0].columns[0].name, "id");
        assert_eq!(tables[0].columns[0].typ, "bigint");
        assert_eq!(tables[0].columns[1].typ, "int");
    }

    #[test]
    fn test_missing_engine_skipped() {
        let sql = "CREATE TABLE a (id INT);\nCREATE TABLE b (id INT) ENGINE=InnoDB;";
        let tables = parse(sql);
        // Lazy body match runs on to the first `) ENGINE=`, so `a` swallows `b`.
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table_name, "a");

        assert!(parse("CREATE TABLE lonely (id INT);").is_empty());
    }

    #[test]
    fn test_unrecognized_fragment_reported() {
        let report = parse_sql("CREATE TABLE t (id INT, ???, name TEXT) ENGINE=InnoDB;");
        assert_eq!(report.tables[0].columns.len(), 2);
        assert!(report.skipped.iter().any(|s| matches!(
            s,
            Skipped::UnrecognizedColumn { fragment, .. } if fragment == "???"
        )));
    }

    #[test]
    fn test_unresolved_foreign_key_dropped() {
        let sql = "CREATE TABLE orders (id INT, CONSTRAINT fk FOREIGN KEY (ghost_id) REFERENCES users(id)) ENGINE=InnoDB;";
        let report = parse_sql(sql);
        assert!(report.tables.iter().all(|t| t.foreign_keys.is_empty()));
        assert!(report.skipped.iter().any(|s| matches!(
            s,
            Skipped::UnresolvedForeignKey { column, .. } if column == "ghost_id"
        )));
    }

    #[test]
    fn test_foreign_key_prefers_enclosing_table() {
        let sql = "CREATE TABLE a (id INT, parent_id INT) ENGINE=InnoDB;
            CREATE TABLE b (id INT, parent_id INT,
              CONSTRAINT fk_b FOREIGN KEY (parent_id) REFERENCES a (id)) ENGINE=InnoDB;";
        let report = parse_sql(sql);
        assert!(report.tables[0].foreign_keys.is_empty());
        assert_eq!(report.tables[1].foreign_keys.len(), 1);
        assert!(report.skipped.iter().any(|s| matches!(
            s,
            Skipped::AmbiguousForeignKey { chosen, .. } if chosen == "b"
        )));
    }

    #[test]
    fn test_foreign_key_outside_table_first_owner() {
        let sql = "CREATE TABLE a (id INT, ref_id INT) ENGINE=InnoDB;
            CREATE TABLE b (id INT, ref_id INT) ENGINE=InnoDB;
            ALTER TABLE b ADD CONSTRAINT fk_x FOREIGN KEY (ref_id) REFERENCES c (id);";
        let tables = parse(sql);
        assert_eq!(tables[0].foreign_keys.len(), 1);
        assert!(tables[1].foreign_keys.is_empty());
    }

    #[test]
    fn test_quoted_foreign_key() {
        let sql = "CREATE TABLE `users` (`id` INT) ENGINE=InnoDB;
            CREATE TABLE `posts` (
              `id` INT,
              `author_id` INT,
              CONSTRAINT `fk_posts_author` FOREIGN KEY (`author_id`) REFERENCES `users` (`id`)
            ) ENGINE=InnoDB;";
        let tables = parse(sql);
        assert_eq!(tables[1].foreign_keys[0].references_table, "users");
        assert_eq!(tables[1].foreign_keys[0].column, "author_id");
    }
}
