/// Query options and SQL assembly
///
/// Operations arrive from the host either as literal SQL text (`raw` mode)
/// or as a structured operation (`gui` mode). The bulk primary-key update is
/// the one operation with bespoke text generation; its output format is a
/// compatibility target and must not be "improved" without breaking legacy
/// consumers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One input record: an ordered mapping from column name to value.
pub type Record = Map<String, Value>;

/// Execution mode plus everything the chosen mode needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum QueryOptions {
    /// Execute the given SQL text verbatim.
    Raw { query: String },

    /// A structured operation assembled by this crate.
    Gui {
        #[serde(flatten)]
        operation: GuiOperation,
    },
}

/// Structured operations offered by the host UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum GuiOperation {
    /// Update many rows by primary key via the legacy PL/SQL block text.
    BulkUpdatePkey {
        table: String,
        primary_key_column: String,
        records: Vec<Record>,
    },

    Insert {
        table: String,
        /// Comma-separated column list; empty means "use each record's keys"
        #[serde(default)]
        columns: String,
        records: Vec<Record>,
    },

    Update {
        table: String,
        update_key: String,
        #[serde(default)]
        columns: String,
        records: Vec<Record>,
    },

    Delete {
        table: String,
        delete_key: String,
        records: Vec<Record>,
    },
}

/// Renders a value the way the legacy generator interpolated it: strings
/// bare (the caller adds quotes where the template has them), everything
/// else via its JSON rendering.
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds the legacy bulk-update text: one `begin UPDATE ...; end;` block
/// per record, concatenated with no separator.
///
/// The primary-key column is excluded from the SET clause; values are
/// interpolated as unescaped single-quoted literals and the key value is
/// unquoted. A record with no non-key columns produces a malformed
/// `SET  WHERE` clause; that degenerate output is part of the legacy
/// contract and is passed through unchanged.
pub fn build_bulk_update_sql(table: &str, primary_key_column: &str, records: &[Record]) -> String {
    let mut sql = String::new();
    for record in records {
        sql.push_str(&format!("begin UPDATE {} SET ", table));
        for (column, value) in record {
            if column == primary_key_column {
                continue;
            }
            sql.push_str(&format!("{} = '{}', ", column, literal(value)));
        }
        if sql.ends_with(", ") {
            sql.truncate(sql.len() - 2);
        }
        let key_value = record
            .get(primary_key_column)
            .map(literal)
            .unwrap_or_else(|| "null".to_string());
        sql.push_str(&format!(" WHERE {} = {}; end;", primary_key_column, key_value));
    }
    sql
}

/// Parses a comma-separated column list: trim each entry, drop empties.
/// An empty result means "use all input keys".
pub fn parse_column_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
