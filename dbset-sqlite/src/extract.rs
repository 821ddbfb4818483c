use crate::DECIMAL_TYPE;
use dbset_core::{ColumnDescriptor, ColumnType, IndexDescriptor, Result, TableDescriptor, Value};
use rusqlite::{OptionalExtension, types::ValueRef};
use rust_decimal::Decimal;
use std::cmp::Ordering;

pub(crate) fn extract_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(v),
        ValueRef::Real(v) => Value::Float64(v),
        ValueRef::Text(v) => Value::Varchar(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Blob(v.into()),
    }
}

/// Category of a declared column type, decimals are stored as text.
pub(crate) fn column_type(declared: &str) -> ColumnType {
    let upper = declared.trim().to_ascii_uppercase();
    match upper.strip_prefix(DECIMAL_TYPE) {
        Some(arguments) => ColumnType::from_sql_type(&format!("DECIMAL{}", arguments)),
        None => ColumnType::from_sql_type(declared),
    }
}

/// Order of the text of two decimals by numeric value, text that is not a number sorts last.
pub(crate) fn compare_decimals(a: &str, b: &str) -> Ordering {
    let parse = |value: &str| {
        let value = value.trim();
        value
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(value))
            .ok()
    };
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(..), None) => Ordering::Less,
        (None, Some(..)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Read the schema of `table` from the catalog pragmas.
pub(crate) fn describe_table(
    connection: &rusqlite::Connection,
    table: &str,
) -> Result<Option<TableDescriptor>> {
    let exists = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(None);
    }
    let mut descriptor = TableDescriptor::new(table);
    let mut statement = connection
        .prepare(r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1) ORDER BY cid"#)?;
    let mut rows = statement.query([table])?;
    while let Some(row) = rows.next()? {
        let declared = row.get::<_, String>(1)?;
        let column_type = column_type(&declared);
        let primary_key = row.get::<_, i64>(3)? > 0;
        descriptor.columns.push(ColumnDescriptor {
            name: row.get(0)?,
            // Only `INTEGER PRIMARY KEY` aliases the rowid
            auto_increment: primary_key && declared.eq_ignore_ascii_case("INTEGER"),
            nullable: row.get::<_, i64>(2)? == 0 && !primary_key,
            primary_key,
            column_type,
        });
    }
    let mut statement =
        connection.prepare(r#"SELECT name, "unique", origin FROM pragma_index_list(?1)"#)?;
    let indexes = statement
        .query_map([table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut statement =
        connection.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
    let mut definitions =
        connection.prepare("SELECT sql FROM sqlite_master WHERE type = 'index' AND name = ?1")?;
    for (name, unique, origin) in indexes {
        if origin == "pk" {
            continue;
        }
        let columns = statement
            .query_map([&name], |row| row.get::<_, Option<String>>(0))?
            .collect::<rusqlite::Result<Option<Vec<_>>>>()?;
        // Expression indexes have no column name
        let Some(columns) = columns else {
            continue;
        };
        let definition = definitions
            .query_row([&name], |row| row.get::<_, Option<String>>(0))
            .optional()?
            .flatten();
        descriptor.indexes.push(IndexDescriptor {
            name,
            columns,
            unique,
            definition,
        });
    }
    descriptor.indexes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Some(descriptor))
}

pub(crate) fn table_names(connection: &rusqlite::Connection) -> Result<Vec<String>> {
    let mut statement = connection.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' ORDER BY name",
    )?;
    let names = statement
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}
