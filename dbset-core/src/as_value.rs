use crate::{Error, Result, Value, parse_date, parse_timestamp};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::{any, collections::BTreeMap};
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

/// Conversion between Rust types and [`Value`].
pub trait AsValue: Sized {
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert a {} value ({:?}) into {}",
        value.kind(),
        value,
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl AsValue for $ty {
                fn as_value(self) -> Value {
                    Value::Int64(self as i64)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    let integer = match &value {
                        Value::Int64(v) => Some(*v),
                        Value::Float64(v) if v.fract() == 0.0 => Some(*v as i64),
                        Value::Decimal(v) if v.fract().is_zero() => v.to_i64(),
                        Value::Boolean(v) => Some(*v as i64),
                        _ => None,
                    };
                    integer
                        .and_then(|v| <$ty>::try_from(v).ok())
                        .ok_or_else(|| mismatch::<$ty>(&value))
                }
            }
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.as_value()
                }
            }
        )+
    };
}

impl_as_value_integer!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_from_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.as_value()
                }
            }
        )+
    };
}

impl_from_value!(
    bool,
    f32,
    f64,
    Decimal,
    String,
    Date,
    PrimitiveDateTime,
    Uuid,
    Box<[u8]>,
    serde_json::Value,
);

impl AsValue for Value {
    fn as_value(self) -> Value {
        self
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl AsValue for bool {
    fn as_value(self) -> Value {
        Value::Boolean(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            Value::Int64(v @ (0 | 1)) => Ok(v == 1),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for f32 {
    fn as_value(self) -> Value {
        Value::Float64(self as f64)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        f64::try_from_value(value).map(|v| v as f32)
    }
}

impl AsValue for f64 {
    fn as_value(self) -> Value {
        Value::Float64(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Float64(v) => Ok(*v),
            Value::Int64(v) => Ok(*v as f64),
            Value::Decimal(v) => v.to_f64().ok_or_else(|| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Decimal {
    fn as_value(self) -> Value {
        Value::Decimal(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Decimal(v) => Ok(*v),
            Value::Int64(v) => Ok(Decimal::from(*v)),
            Value::Float64(v) => Decimal::try_from(*v).map_err(|_| mismatch::<Self>(&value)),
            Value::Varchar(v) => v.parse().map_err(|_| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_value(self) -> Value {
        Value::Varchar(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(v) => Ok(v),
            Value::Uuid(v) => Ok(v.to_string()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Date {
    fn as_value(self) -> Value {
        Value::Date(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Date(v) => Ok(*v),
            Value::Timestamp(v) => Ok(v.date()),
            Value::Varchar(v) => parse_date(v).ok_or_else(|| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_value(self) -> Value {
        Value::Timestamp(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Timestamp(v) => Ok(*v),
            Value::Date(v) => Ok(v.midnight()),
            Value::Varchar(v) => parse_timestamp(v).ok_or_else(|| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Uuid {
    fn as_value(self) -> Value {
        Value::Uuid(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Uuid(v) => Ok(*v),
            Value::Varchar(v) => Uuid::parse_str(v).map_err(|_| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_value(self) -> Value {
        Value::Blob(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(v),
            Value::Varchar(v) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for serde_json::Value {
    fn as_value(self) -> Value {
        Value::from_json(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(v) => serde_json::from_str(&v).map_err(Error::new),
            v => v.to_json(),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from_value(v).map(Some),
        }
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_value(self) -> Value {
        Value::List(self.into_iter().map(AsValue::as_value).collect())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(v) => v.into_iter().map(T::try_from_value).collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for BTreeMap<String, T> {
    fn as_value(self) -> Value {
        Value::Map(self.into_iter().map(|(k, v)| (k, v.as_value())).collect())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(v) => v
                .into_iter()
                .map(|(k, v)| Ok((k, T::try_from_value(v)?)))
                .collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(value.to_owned())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Varchar(value.clone())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(value: [T; N]) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(value: BTreeMap<String, T>) -> Self {
        Value::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}
