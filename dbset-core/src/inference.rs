use crate::{ColumnType, Dialect, Result, Row, Value};

/// Decimal precision accepted by every supported engine.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Maps sample values to storage categories and widens categories that disagree.
pub struct TypeInference;

impl TypeInference {
    /// Category able to store `value`.
    ///
    /// `Null` carries no signal and maps to text. Structured values map to JSON,
    /// binary JSON when the dialect has it.
    pub fn infer_type(value: &Value, dialect: Dialect) -> Result<ColumnType> {
        Ok(match value {
            Value::Null => ColumnType::Text,
            Value::Boolean(..) => ColumnType::Boolean,
            Value::Int64(..) => ColumnType::Integer,
            Value::Float64(..) => ColumnType::Float,
            Value::Decimal(v) => {
                let mantissa = v.mantissa().unsigned_abs();
                let digits = if mantissa == 0 {
                    1
                } else {
                    mantissa.ilog10() as u8 + 1
                };
                let scale = v.scale().min(MAX_DECIMAL_PRECISION as u32) as u8;
                let precision = digits.max(scale).min(MAX_DECIMAL_PRECISION);
                ColumnType::Decimal(Some((precision, scale)))
            }
            Value::Varchar(..) | Value::Uuid(..) | Value::Blob(..) => ColumnType::Text,
            Value::Date(..) => ColumnType::Date,
            Value::Timestamp(..) => ColumnType::Timestamp,
            Value::List(..) | Value::Map(..) => {
                // Fails when a nested value has no JSON form
                value.to_json()?;
                if dialect.supports_jsonb() {
                    ColumnType::Jsonb
                } else {
                    ColumnType::Json
                }
            }
        })
    }

    /// Category of every column of `row`, in column order.
    pub fn infer_types_from_row(row: &Row, dialect: Dialect) -> Result<Vec<(String, ColumnType)>> {
        row.iter()
            .map(|(k, v)| Ok((k.to_string(), Self::infer_type(v, dialect)?)))
            .collect()
    }

    /// Merged categories across a batch of rows.
    ///
    /// Columns are listed in first appearance order. `Null` values do not take
    /// part in the merge, a column that is `Null` in every row is `None`.
    pub fn infer_types_from_rows<'r>(
        rows: impl IntoIterator<Item = &'r Row>,
        dialect: Dialect,
    ) -> Result<Vec<(String, Option<ColumnType>)>> {
        let mut result: Vec<(String, Option<ColumnType>)> = Vec::new();
        for row in rows {
            for (column, value) in row.iter() {
                let inferred = if value.is_null() {
                    None
                } else {
                    Some(Self::infer_type(value, dialect)?)
                };
                match result.iter_mut().find(|(k, _)| k == column) {
                    Some((_, current)) => {
                        *current = match (current.take(), inferred) {
                            (Some(a), Some(b)) => Some(Self::merge_types(&a, &b)),
                            (a, b) => a.or(b),
                        }
                    }
                    None => result.push((column.to_string(), inferred)),
                }
            }
        }
        Ok(result)
    }

    /// Smallest category able to store values of both `a` and `b`.
    ///
    /// Commutative and associative: categories form families (numbers, texts,
    /// temporals, JSON) joined inside the family, text absorbs everything and is
    /// the result of any cross family merge.
    pub fn merge_types(a: &ColumnType, b: &ColumnType) -> ColumnType {
        use ColumnType::*;
        match (a, b) {
            (a, b) if a == b => a.clone(),
            (Integer, Float) | (Float, Integer) => Float,
            (Decimal(..), Float) | (Float, Decimal(..)) => Float,
            (Integer, Decimal(v)) | (Decimal(v), Integer) => Decimal(*v),
            (Decimal(a), Decimal(b)) => Decimal(match (a, b) {
                (Some((pa, sa)), Some((pb, sb))) => {
                    let scale = *sa.max(sb);
                    let digits = (pa.saturating_sub(*sa)).max(pb.saturating_sub(*sb));
                    let precision = digits.saturating_add(scale).min(MAX_DECIMAL_PRECISION);
                    Some((precision.max(scale), scale))
                }
                _ => None,
            }),
            (String(a), String(b)) => String(*a.max(b)),
            (Date, Timestamp) | (Timestamp, Date) => Timestamp,
            (Json, Jsonb) | (Jsonb, Json) => Jsonb,
            _ => Text,
        }
    }

    /// Fold [`TypeInference::merge_types`] over `types`.
    pub fn merge_all<'t>(types: impl IntoIterator<Item = &'t ColumnType>) -> Option<ColumnType> {
        types.into_iter().fold(None, |acc, v| match acc {
            None => Some(v.clone()),
            Some(acc) => Some(Self::merge_types(&acc, v)),
        })
    }
}
