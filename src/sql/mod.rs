//! MySQL DDL to schema model conversion.

mod export;
mod parser;
mod split;

pub use export::{export_table, export_tables};
pub use parser::{parse, parse_sql, ParseReport, Skipped};
pub use split::{split_fragments, FragmentSplitter};
