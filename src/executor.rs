/// Operation execution
///
/// `run` resolves the SQL for an operation, obtains a pooled connection via
/// the connection cache, executes, and hands rows back as JSON records.
/// `test_connection` probes a source over a fresh, uncached pool. Failures
/// propagate unchanged; the `*_to_result` wrappers are the only places an
/// error is caught, and only to tag it for the host.

use oracle::sql_type::{OracleType, ToSql};
use oracle::{Connection, Row};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{self, CacheKey};
use crate::error::Error;
use crate::query::{build_bulk_update_sql, parse_column_list, GuiOperation, QueryOptions, Record};
use crate::source::SourceOptions;

/// Fixed, side-effect-free query used only to verify connectivity.
pub const PROBE_QUERY: &str = "SELECT * FROM v$version";

/// Oversized text columns are cut here before being handed to the workflow.
const MAX_TEXT_LEN: usize = 1_000_000;

/// Host-facing result of `run`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryResult {
    Ok { data: Vec<Record> },
    Error { message: String },
}

/// Host-facing result of `test_connection`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestOutcome {
    Ok,
    Error { message: String },
}

/// Executes one operation against the cached pool for `key`.
pub fn run(
    source: &SourceOptions,
    options: &QueryOptions,
    key: &CacheKey,
) -> Result<Vec<Record>, Error> {
    let pool = cache::get_pool(source, Some(key))?;
    let conn = pool.get()?;

    match options {
        QueryOptions::Raw { query } => execute_text(&conn, query),
        QueryOptions::Gui { operation } => match operation {
            GuiOperation::BulkUpdatePkey {
                table,
                primary_key_column,
                records,
            } => {
                let sql = build_bulk_update_sql(table, primary_key_column, records);
                execute_text(&conn, &sql)
            }
            GuiOperation::Insert {
                table,
                columns,
                records,
            } => insert_records(&conn, table, columns, records),
            GuiOperation::Update {
                table,
                update_key,
                columns,
                records,
            } => update_records(&conn, table, update_key, columns, records),
            GuiOperation::Delete {
                table,
                delete_key,
                records,
            } => delete_records(&conn, table, delete_key, records),
        },
    }
}

/// `run`, tagged for the host.
pub fn run_to_result(source: &SourceOptions, options: &QueryOptions, key: &CacheKey) -> QueryResult {
    match run(source, options, key) {
        Ok(data) => QueryResult::Ok { data },
        Err(e) => QueryResult::Error {
            message: e.to_string(),
        },
    }
}

/// Verifies connectivity over a fresh, uncached pool.
pub fn test_connection(source: &SourceOptions) -> Result<(), Error> {
    let pool = cache::get_pool(source, None)?;
    let conn = pool.get()?;
    log::info!("probing connectivity with {}", PROBE_QUERY);
    conn.query_row(PROBE_QUERY, &[])?;
    Ok(())
}

/// `test_connection`, tagged for the host.
pub fn test_connection_to_result(source: &SourceOptions) -> TestOutcome {
    match test_connection(source) {
        Ok(()) => TestOutcome::Ok,
        Err(e) => TestOutcome::Error {
            message: e.to_string(),
        },
    }
}

/// Executes SQL text as-is. A query returns its rows as JSON records; any
/// other statement executes, commits, and returns no rows.
fn execute_text(conn: &Connection, sql: &str) -> Result<Vec<Record>, Error> {
    log::debug!("executing: {}", sql);
    let mut stmt = conn.statement(sql).build()?;
    if stmt.is_query() {
        let rows = stmt.query(&[])?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row_to_record(&row?)?);
        }
        Ok(records)
    } else {
        stmt.execute(&[])?;
        conn.commit()?;
        Ok(Vec::new())
    }
}

/// Converts a record value for binding: NULL stays NULL, strings pass
/// through, everything else binds via its JSON rendering and is converted
/// by the database.
fn bind_value(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn execute_per_record(
    conn: &Connection,
    sql: &str,
    columns: &[String],
    record: &Record,
    extra: Option<&str>,
) -> Result<(), Error> {
    let mut values: Vec<Option<String>> = columns
        .iter()
        .map(|c| bind_value(record.get(c)))
        .collect();
    if let Some(key) = extra {
        values.push(bind_value(record.get(key)));
    }
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
    conn.execute(sql, &params)?;
    Ok(())
}

fn insert_records(
    conn: &Connection,
    table: &str,
    columns: &str,
    records: &[Record],
) -> Result<Vec<Record>, Error> {
    let listed = parse_column_list(columns);
    for record in records {
        let cols: Vec<String> = if listed.is_empty() {
            record.keys().cloned().collect()
        } else {
            listed.clone()
        };
        if cols.is_empty() {
            log::warn!("skipping empty record for insert into {}", table);
            continue;
        }
        let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!(":{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", ")
        );
        log::debug!("executing: {}", sql);
        execute_per_record(conn, &sql, &cols, record, None)?;
    }
    conn.commit()?;
    Ok(Vec::new())
}

fn update_records(
    conn: &Connection,
    table: &str,
    update_key: &str,
    columns: &str,
    records: &[Record],
) -> Result<Vec<Record>, Error> {
    let listed = parse_column_list(columns);
    for record in records {
        let cols: Vec<String> = if listed.is_empty() {
            record.keys().cloned().collect()
        } else {
            listed.clone()
        };
        let set_cols: Vec<String> = cols.into_iter().filter(|c| c != update_key).collect();
        if set_cols.is_empty() {
            log::warn!("skipping record with nothing to update in {}", table);
            continue;
        }
        let assignments: Vec<String> = set_cols
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = :{}", c, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = :{}",
            table,
            assignments.join(", "),
            update_key,
            set_cols.len() + 1
        );
        log::debug!("executing: {}", sql);
        execute_per_record(conn, &sql, &set_cols, record, Some(update_key))?;
    }
    conn.commit()?;
    Ok(Vec::new())
}

fn delete_records(
    conn: &Connection,
    table: &str,
    delete_key: &str,
    records: &[Record],
) -> Result<Vec<Record>, Error> {
    let sql = format!("DELETE FROM {} WHERE {} = :1", table, delete_key);
    log::debug!("executing: {}", sql);
    for record in records {
        execute_per_record(conn, &sql, &[], record, Some(delete_key))?;
    }
    conn.commit()?;
    Ok(Vec::new())
}

/// Converts one row to a JSON record, column order preserved.
fn row_to_record(row: &Row) -> Result<Record, Error> {
    let mut record = Record::new();
    for (idx, info) in row.column_info().iter().enumerate() {
        let value = column_to_json(row, idx, info.oracle_type())?;
        record.insert(info.name().to_string(), value);
    }
    Ok(record)
}

/// Type-aware conversion of one column value.
///
/// Numbers are fetched as text to keep Oracle NUMBER precision, then turned
/// back into JSON numbers when they fit. Text has control characters (other
/// than newline and tab) stripped and is truncated at `MAX_TEXT_LEN`.
/// Binary columns are represented by a placeholder rather than forwarded.
fn column_to_json(row: &Row, idx: usize, oracle_type: &OracleType) -> Result<Value, Error> {
    // NULL probe first; not every type fetches as text.
    let is_null = match row.get::<usize, Option<String>>(idx) {
        Ok(v) => v.is_none(),
        Err(_) => match row.get::<usize, Option<i64>>(idx) {
            Ok(v) => v.is_none(),
            Err(_) => false,
        },
    };
    if is_null {
        return Ok(Value::Null);
    }

    match oracle_type {
        OracleType::Varchar2(_)
        | OracleType::Char(_)
        | OracleType::NVarchar2(_)
        | OracleType::NChar(_)
        | OracleType::CLOB => match row.get::<usize, String>(idx) {
            Ok(s) => Ok(Value::String(clean_text(s))),
            Err(_) => Ok(Value::Null),
        },

        OracleType::Number(_, _)
        | OracleType::Float(_)
        | OracleType::BinaryFloat
        | OracleType::BinaryDouble => match row.get::<usize, String>(idx) {
            Ok(s) => Ok(parse_number(s)),
            Err(_) => Ok(Value::Null),
        },

        OracleType::Date
        | OracleType::Timestamp(_)
        | OracleType::TimestampTZ(_)
        | OracleType::TimestampLTZ(_) => match row.get::<usize, String>(idx) {
            Ok(s) => Ok(Value::String(s)),
            Err(_) => Ok(Value::Null),
        },

        OracleType::BLOB | OracleType::Raw(_) | OracleType::LongRaw => {
            Ok(Value::String("[binary data]".to_string()))
        }

        _ => match row.get::<usize, String>(idx) {
            Ok(s) => Ok(Value::String(s)),
            Err(_) => Ok(Value::Null),
        },
    }
}

fn clean_text(s: String) -> String {
    let mut cleaned: String = s
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    if cleaned.len() > MAX_TEXT_LEN {
        let mut end = MAX_TEXT_LEN;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned.truncate(end);
        cleaned.push_str("... [truncated]");
    }
    cleaned
}

/// Turns Oracle's textual number rendering back into a JSON number where it
/// fits; otherwise the text survives as-is (NUMBER can exceed f64).
fn parse_number(s: String) -> Value {
    if let Ok(i) = s.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = s.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_result_serialization() {
        let ok = QueryResult::Ok {
            data: vec![json!({"A": 1}).as_object().unwrap().clone()],
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "ok", "data": [{"A": 1}]})
        );

        let err = QueryResult::Error {
            message: "boom".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": "error", "message": "boom"})
        );
    }

    #[test]
    fn test_test_outcome_serialization() {
        assert_eq!(
            serde_json::to_value(TestOutcome::Ok).unwrap(),
            json!({"status": "ok"})
        );
        assert_eq!(
            serde_json::to_value(TestOutcome::Error {
                message: "no listener".to_string()
            })
            .unwrap(),
            json!({"status": "error", "message": "no listener"})
        );
    }

    #[test]
    fn test_bind_value() {
        assert_eq!(bind_value(None), None);
        assert_eq!(bind_value(Some(&Value::Null)), None);
        assert_eq!(bind_value(Some(&json!("x"))), Some("x".to_string()));
        assert_eq!(bind_value(Some(&json!(42))), Some("42".to_string()));
        assert_eq!(bind_value(Some(&json!(true))), Some("true".to_string()));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42".to_string()), json!(42));
        assert_eq!(parse_number("-7".to_string()), json!(-7));
        assert_eq!(parse_number("1.5".to_string()), json!(1.5));
        // out of f64 range; survives as text
        assert_eq!(parse_number("1e999".to_string()), json!("1e999"));
    }

    #[test]
    fn test_clean_text_strips_control_chars() {
        assert_eq!(clean_text("a\u{0}b\nc\td".to_string()), "ab\nc\td");
    }
}
