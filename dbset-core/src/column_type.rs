use crate::{Value, parse_date, parse_timestamp};
use rust_decimal::Decimal;
use std::fmt::{self, Display, Formatter};

/// Storage category of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    /// Fixed point, `(precision, scale)` or unbounded.
    Decimal(Option<(u8, u8)>),
    Boolean,
    /// Unbounded text.
    Text,
    /// Bounded text, used for generated string keys and reflected `VARCHAR(n)`.
    String(u32),
    Timestamp,
    Date,
    Json,
    /// Binary JSON of the Postgres family.
    Jsonb,
    Blob,
}

/// Relational engine family in use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    #[default]
    Generic,
    Sqlite,
    Postgres,
    MySql,
}

impl Dialect {
    pub fn supports_jsonb(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Engines that refuse to index a text column without a prefix length.
    pub fn requires_text_index_prefix(&self) -> bool {
        matches!(self, Dialect::MySql)
    }
}

impl ColumnType {
    pub fn is_json(&self) -> bool {
        matches!(self, ColumnType::Json | ColumnType::Jsonb)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::String(..))
    }

    /// Map a declared SQL type back to its category.
    pub fn from_sql_type(declared: &str) -> ColumnType {
        let declared = declared.trim().to_ascii_uppercase();
        let (base, arguments) = match declared.split_once('(') {
            Some((base, rest)) => (base.trim(), rest.trim_end_matches(')').trim()),
            None => (declared.as_str(), ""),
        };
        let arguments = arguments
            .split(',')
            .filter_map(|v| v.trim().parse::<u32>().ok())
            .collect::<Vec<_>>();
        match base {
            v if v.starts_with("BOOL") => ColumnType::Boolean,
            "JSONB" => ColumnType::Jsonb,
            "JSON" => ColumnType::Json,
            v if v.starts_with("TIMESTAMP") || v == "DATETIME" => ColumnType::Timestamp,
            "DATE" => ColumnType::Date,
            "NUMERIC" | "DECIMAL" => match arguments[..] {
                [precision, scale] => ColumnType::Decimal(Some((
                    precision.min(u8::MAX as u32) as u8,
                    scale.min(u8::MAX as u32) as u8,
                ))),
                [precision] => ColumnType::Decimal(Some((precision.min(u8::MAX as u32) as u8, 0))),
                _ => ColumnType::Decimal(None),
            },
            v if v.contains("INT") || v.ends_with("SERIAL") => ColumnType::Integer,
            v if v.starts_with("REAL") || v.starts_with("FLOA") || v.starts_with("DOUB") => {
                ColumnType::Float
            }
            v if v.contains("CHAR") => match arguments[..] {
                [length] => ColumnType::String(length),
                _ => ColumnType::Text,
            },
            "TEXT" | "CLOB" | "STRING" => ColumnType::Text,
            "BLOB" | "BYTEA" | "BINARY" | "VARBINARY" => ColumnType::Blob,
            _ => {
                log::warn!(
                    "Unknown column type `{}`, it will be treated as text",
                    declared
                );
                ColumnType::Text
            }
        }
    }

    /// Reshape a value read from the engine so that it matches this category.
    ///
    /// Engines with a loose type system hand back their storage class (SQLite
    /// returns booleans as integers and dates as text), this restores the value
    /// that was written. Values that do not parse are returned unchanged.
    pub fn conform(&self, value: Value) -> Value {
        match (self, value) {
            (_, Value::Null) => Value::Null,
            (ColumnType::Boolean, Value::Int64(v)) => Value::Boolean(v != 0),
            (ColumnType::Boolean, Value::Varchar(v)) => match v.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Value::Boolean(true),
                "false" | "f" | "0" => Value::Boolean(false),
                _ => Value::Varchar(v),
            },
            (ColumnType::Float, Value::Int64(v)) => Value::Float64(v as f64),
            (ColumnType::Decimal(size), value) => {
                let decimal = match &value {
                    Value::Int64(v) => Some(Decimal::from(*v)),
                    Value::Float64(v) => Decimal::try_from(*v).ok(),
                    Value::Varchar(v) => v.parse::<Decimal>().ok(),
                    _ => None,
                };
                match (decimal, size) {
                    (Some(mut decimal), Some((_, scale))) => {
                        decimal = decimal.round_dp(*scale as u32);
                        decimal.rescale(*scale as u32);
                        Value::Decimal(decimal)
                    }
                    (Some(decimal), None) => Value::Decimal(decimal),
                    (None, ..) => value,
                }
            }
            (ColumnType::Date, Value::Varchar(v)) => match parse_date(&v) {
                Some(date) => Value::Date(date),
                None => Value::Varchar(v),
            },
            (ColumnType::Timestamp, Value::Varchar(v)) => match parse_timestamp(&v) {
                Some(timestamp) => Value::Timestamp(timestamp),
                None => Value::Varchar(v),
            },
            (ColumnType::Json | ColumnType::Jsonb, Value::Varchar(v)) => {
                match serde_json::from_str::<serde_json::Value>(&v) {
                    Ok(json) => Value::from_json(json),
                    Err(..) => Value::Varchar(v),
                }
            }
            (_, value) => value,
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("INTEGER"),
            ColumnType::Float => f.write_str("FLOAT"),
            ColumnType::Decimal(Some((precision, scale))) => {
                write!(f, "DECIMAL({},{})", precision, scale)
            }
            ColumnType::Decimal(None) => f.write_str("DECIMAL"),
            ColumnType::Boolean => f.write_str("BOOLEAN"),
            ColumnType::Text => f.write_str("TEXT"),
            ColumnType::String(length) => write!(f, "VARCHAR({})", length),
            ColumnType::Timestamp => f.write_str("TIMESTAMP"),
            ColumnType::Date => f.write_str("DATE"),
            ColumnType::Json => f.write_str("JSON"),
            ColumnType::Jsonb => f.write_str("JSONB"),
            ColumnType::Blob => f.write_str("BLOB"),
        }
    }
}
