use crate::{DbError, Error, Result};
use rust_decimal::Decimal;
use std::{collections::BTreeMap, fmt::Write};
use time::{Date, PrimitiveDateTime, Time, macros::format_description};
use uuid::Uuid;

/// A single cell, either written to or read back from a table.
///
/// `List` and `Map` are the structured variants, they are stored in JSON
/// capable columns and come back with the same shape.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Decimal(Decimal),
    Varchar(String),
    Blob(Box<[u8]>),
    Date(Date),
    Timestamp(PrimitiveDateTime),
    Uuid(Uuid),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(..) => "boolean",
            Value::Int64(..) => "integer",
            Value::Float64(..) => "float",
            Value::Decimal(..) => "decimal",
            Value::Varchar(..) => "string",
            Value::Blob(..) => "blob",
            Value::Date(..) => "date",
            Value::Timestamp(..) => "timestamp",
            Value::Uuid(..) => "uuid",
            Value::List(..) => "list",
            Value::Map(..) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            Value::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Convert into a JSON document.
    ///
    /// Temporal values, decimals and uuids become strings. Binary data and
    /// non finite floats have no JSON form and fail with a type inference error.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(v) => serde_json::Value::Bool(*v),
            Value::Int64(v) => serde_json::Value::Number((*v).into()),
            Value::Float64(v) => match serde_json::Number::from_f64(*v) {
                Some(v) => serde_json::Value::Number(v),
                None => {
                    return Err(DbError::TypeInference(format!(
                        "The float {} cannot be represented inside a JSON document",
                        v
                    ))
                    .into());
                }
            },
            Value::Decimal(v) => serde_json::Value::String(v.to_string()),
            Value::Varchar(v) => serde_json::Value::String(v.clone()),
            Value::Blob(..) => {
                return Err(DbError::TypeInference(
                    "Binary data cannot be stored inside a JSON document".into(),
                )
                .into());
            }
            Value::Date(v) => serde_json::Value::String(format_date(v)),
            Value::Timestamp(v) => serde_json::Value::String(format_timestamp(v)),
            Value::Uuid(v) => serde_json::Value::String(v.to_string()),
            Value::List(v) => {
                serde_json::Value::Array(v.iter().map(Value::to_json).collect::<Result<_>>()?)
            }
            Value::Map(v) => serde_json::Value::Object(
                v.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Build a value from a JSON document, numbers become `Int64` when integral.
    pub fn from_json(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(v) => Value::Boolean(v),
            serde_json::Value::Number(v) => match v.as_i64() {
                Some(v) => Value::Int64(v),
                None => Value::Float64(v.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(v) => Value::Varchar(v),
            serde_json::Value::Array(v) => Value::List(v.into_iter().map(Value::from_json).collect()),
            serde_json::Value::Object(v) => {
                Value::Map(v.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect())
            }
        }
    }

    /// Serialized JSON text of a structured value.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.to_json()?).map_err(Error::new)
    }
}

pub fn format_date(value: &Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        value.year(),
        value.month() as u8,
        value.day()
    )
}

pub fn format_time(value: &Time) -> String {
    let mut out = format!(
        "{:02}:{:02}:{:02}",
        value.hour(),
        value.minute(),
        value.second()
    );
    let mut subsecond = value.nanosecond();
    if subsecond != 0 {
        let mut width = 9;
        while subsecond % 10 == 0 {
            subsecond /= 10;
            width -= 1;
        }
        let _ = write!(out, ".{:0width$}", subsecond);
    }
    out
}

pub fn format_timestamp(value: &PrimitiveDateTime) -> String {
    format!("{}T{}", format_date(&value.date()), format_time(&value.time()))
}

/// Parse `YYYY-MM-DD`, also accepting the date part of a timestamp.
pub fn parse_date(value: &str) -> Option<Date> {
    let value = value.trim();
    let value = value.get(..10).unwrap_or(value);
    Date::parse(value, format_description!("[year]-[month]-[day]")).ok()
}

/// Parse `YYYY-MM-DD[T| ]HH:MM:SS[.fraction]`, a bare date is midnight.
pub fn parse_timestamp(value: &str) -> Option<PrimitiveDateTime> {
    let value = value.trim().trim_end_matches('Z');
    if value.len() == 10 {
        return parse_date(value).map(|v| v.midnight());
    }
    let normalized = value.replacen('T', " ", 1);
    if normalized.contains('.') {
        PrimitiveDateTime::parse(
            &normalized,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        )
        .ok()
    } else {
        PrimitiveDateTime::parse(
            &normalized,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
        .ok()
    }
}
