use crate::{
    Between, BinaryOp, BinaryOpType, DbError, Expression, Like, Operand, Order, Ordered, Result,
    Row, TableDescriptor, Value, escape_like_pattern,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

/// Control keys of a [`Filter`], they never name a column.
pub const CONTROL_KEYS: [&str; 3] = ["_order_by", "_limit", "_offset"];

/// Operators accepted in the operator form of a filter entry.
pub const OPERATORS: [&str; 18] = [
    "=", "==", "!=", ">", ">=", "<", "<=", "in", "not_in", "like", "ilike", "not_like",
    "startswith", "endswith", "contains", "between", "is", "is_not",
];

/// Right hand side of a filter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Equality, or membership when the value is a list.
    Literal(Value),
    /// `(operator, operand)` pairs that must all hold.
    Operators(Vec<(String, Value)>),
}

macro_rules! impl_filter_value_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::Literal(value.into())
                }
            }
        )+
    };
}

impl_filter_value_from!(
    Value,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    Decimal,
    String,
    &str,
    &String,
    Date,
    PrimitiveDateTime,
    Uuid,
);

impl<T: Into<Value>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        FilterValue::Literal(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for FilterValue {
    fn from(value: Vec<T>) -> Self {
        FilterValue::Literal(value.into())
    }
}

/// Ordered filter entries: column to literal or operators, plus control keys.
///
/// ```
/// use dbset_core::{Filter, filter};
/// let adults = filter! {
///     "age" => { ">=" => 18, "<" => 65 },
///     "country" => "NZ",
///     "_order_by" => "-age",
///     "_limit" => 10,
/// };
/// let same = Filter::new()
///     .op("age", ">=", 18)
///     .op("age", "<", 65)
///     .eq("country", "NZ")
///     .order_by("-age")
///     .limit(10);
/// assert_eq!(adults, same);
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Filter {
    entries: Vec<(String, FilterValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry of `key`, replacing a previous one.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, current)) => *current = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(column, FilterValue::Literal(value.into()))
    }

    /// Add `column op value`, operators on the same column are combined with AND.
    pub fn op(
        mut self,
        column: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let column = column.into();
        let pair = (op.into(), value.into());
        match self.entries.iter_mut().find(|(k, _)| *k == column) {
            Some((_, FilterValue::Operators(operators))) => operators.push(pair),
            Some((_, current)) => *current = FilterValue::Operators(vec![pair]),
            None => self
                .entries
                .push((column, FilterValue::Operators(vec![pair]))),
        }
        self
    }

    /// Column name or list of names, a leading `-` sorts descending.
    pub fn order_by(self, order: impl Into<Value>) -> Self {
        self.with("_order_by", FilterValue::Literal(order.into()))
    }

    /// Values past `i64::MAX` are clamped to it.
    pub fn limit(self, limit: u64) -> Self {
        self.with("_limit", FilterValue::Literal(Self::count_value(limit)))
    }

    pub fn offset(self, offset: u64) -> Self {
        self.with("_offset", FilterValue::Literal(Self::count_value(offset)))
    }

    fn count_value(value: u64) -> Value {
        Value::Int64(i64::try_from(value).unwrap_or(i64::MAX))
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| if k == key { Some(v) } else { None })
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when an entry other than the control keys is present.
    pub fn has_conditions(&self) -> bool {
        self.entries
            .iter()
            .any(|(k, _)| !CONTROL_KEYS.contains(&k.as_str()))
    }
}

impl From<Row> for Filter {
    fn from(value: Row) -> Self {
        value
            .into_iter()
            .fold(Filter::new(), |filter, (k, v)| filter.with(k, v))
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for Filter {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Filter::new(), |filter, (k, v)| filter.with(k, v))
    }
}

/// Build a [`Filter`], an entry is either `column => value` or `column => { op => value, .. }`.
#[macro_export]
macro_rules! filter {
    (@acc $filter:expr;) => { $filter };
    (@acc $filter:expr; $key:expr => { $($op:expr => $value:expr),* $(,)? } $(, $($rest:tt)*)?) => {
        $crate::filter!(@acc $filter $(.op($key, $op, $value))*; $($($rest)*)?)
    };
    (@acc $filter:expr; $key:expr => $value:expr $(, $($rest:tt)*)?) => {
        $crate::filter!(@acc $filter.with($key, $value); $($($rest)*)?)
    };
    ($($body:tt)*) => {
        $crate::filter!(@acc $crate::Filter::new(); $($body)*)
    };
}

/// Ordering and paging extracted from the control keys.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueryOptions {
    pub order_by: Vec<Ordered<Operand>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Result of [`FilterBuilder::build`].
#[derive(Debug, Default)]
pub struct CompiledFilter {
    /// Conjunction of every entry, `None` matches all rows.
    pub condition: Option<Box<dyn Expression>>,
    pub options: QueryOptions,
}

impl CompiledFilter {
    pub fn condition(&self) -> Option<&dyn Expression> {
        self.condition.as_deref()
    }
}

/// Compiles a [`Filter`] against a table into a predicate and query options.
pub struct FilterBuilder;

impl FilterBuilder {
    pub fn build(table: &TableDescriptor, filter: &Filter) -> Result<CompiledFilter> {
        let options = Self::extract_options(table, filter)?;
        let mut condition: Option<Box<dyn Expression>> = None;
        for (key, value) in filter.iter() {
            if CONTROL_KEYS.contains(&key) {
                continue;
            }
            if !table.has_column(key) {
                return Err(DbError::Query(format!(
                    "Unknown column `{}` in filter on table `{}`",
                    key, table.name
                ))
                .into());
            }
            let predicates = match value {
                FilterValue::Literal(Value::Map(operators)) => operators
                    .iter()
                    .map(|(op, v)| Self::predicate(key, op, v))
                    .collect::<Result<Vec<_>>>()?,
                FilterValue::Literal(v) => vec![Self::literal(key, v)],
                FilterValue::Operators(operators) => operators
                    .iter()
                    .map(|(op, v)| Self::predicate(key, op, v))
                    .collect::<Result<Vec<_>>>()?,
            };
            for predicate in predicates {
                condition = Some(match condition {
                    Some(lhs) => Box::new(BinaryOp {
                        op: BinaryOpType::And,
                        lhs,
                        rhs: predicate,
                    }),
                    None => predicate,
                });
            }
        }
        Ok(CompiledFilter { condition, options })
    }

    /// Equality predicate on every entry of `values`, without checking the columns.
    pub fn equalities(values: &Row) -> Option<Box<dyn Expression>> {
        values
            .iter()
            .map(|(k, v)| Self::literal(k, v))
            .reduce(|lhs, rhs| {
                Box::new(BinaryOp {
                    op: BinaryOpType::And,
                    lhs,
                    rhs,
                })
            })
    }

    /// Read `_order_by`, `_limit` and `_offset`.
    pub fn extract_options(table: &TableDescriptor, filter: &Filter) -> Result<QueryOptions> {
        let mut options = QueryOptions::default();
        if let Some(order) = filter.get("_order_by") {
            let names = match order {
                FilterValue::Literal(Value::Varchar(v)) => vec![v.as_str()],
                FilterValue::Literal(Value::List(list)) => list
                    .iter()
                    .map(|v| {
                        v.as_str().ok_or_else(|| {
                            DbError::Query(format!(
                                "_order_by entries must be column names, found {}",
                                v.kind()
                            ))
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?,
                _ => {
                    return Err(DbError::Query(
                        "_order_by must be a column name or a list of column names".into(),
                    )
                    .into());
                }
            };
            for name in names {
                let (order, column) = match name.strip_prefix('-') {
                    Some(column) => (Order::DESC, column),
                    None => (Order::ASC, name),
                };
                if !table.has_column(column) {
                    return Err(DbError::Query(format!(
                        "Unknown column `{}` in _order_by on table `{}`",
                        column, table.name
                    ))
                    .into());
                }
                options.order_by.push(Ordered {
                    order,
                    expression: Operand::Column(column.into()),
                });
            }
        }
        options.limit = Self::non_negative(filter, "_limit")?;
        options.offset = Self::non_negative(filter, "_offset")?;
        Ok(options)
    }

    fn non_negative(filter: &Filter, key: &str) -> Result<Option<u64>> {
        match filter.get(key) {
            None | Some(FilterValue::Literal(Value::Null)) => Ok(None),
            Some(FilterValue::Literal(Value::Int64(v))) if *v >= 0 => Ok(Some(*v as u64)),
            Some(..) => {
                Err(DbError::Query(format!("{} must be a non negative integer", key)).into())
            }
        }
    }

    fn literal(column: &str, value: &Value) -> Box<dyn Expression> {
        let lhs = Operand::Column(column.into());
        match value {
            Value::Null => Box::new(BinaryOp {
                op: BinaryOpType::Is,
                lhs,
                rhs: Operand::Null,
            }),
            Value::List(list) => Self::membership(lhs, list, false),
            v => Box::new(BinaryOp {
                op: BinaryOpType::Equal,
                lhs,
                rhs: Operand::Variable(v.clone()),
            }),
        }
    }

    fn membership(lhs: Operand, list: &[Value], negated: bool) -> Box<dyn Expression> {
        if list.is_empty() {
            // Nothing is in the empty set
            return Box::new(Operand::LitBool(negated));
        }
        Box::new(BinaryOp {
            op: if negated {
                BinaryOpType::NotIn
            } else {
                BinaryOpType::In
            },
            lhs,
            rhs: Operand::List(list.to_vec()),
        })
    }

    fn predicate(column: &str, op: &str, value: &Value) -> Result<Box<dyn Expression>> {
        let lhs = Operand::Column(column.into());
        let comparison = |op: BinaryOpType| -> Result<Box<dyn Expression>> {
            if matches!(value, Value::List(..) | Value::Map(..)) {
                return Err(DbError::Query(format!(
                    "Operator on column `{}` expects a scalar, found {}",
                    column,
                    value.kind()
                ))
                .into());
            }
            Ok(Box::new(BinaryOp {
                op,
                lhs: Operand::Column(column.into()),
                rhs: Operand::Variable(value.clone()),
            }))
        };
        let pattern = |value: &Value| -> Result<String> {
            value.as_str().map(str::to_string).ok_or_else(|| {
                DbError::Query(format!(
                    "Operator `{}` on column `{}` expects a string, found {}",
                    op,
                    column,
                    value.kind()
                ))
                .into()
            })
        };
        let like = |pattern: String, escape: bool, negated: bool, case_insensitive: bool| {
            Box::new(Like {
                expression: Operand::Column(column.into()),
                pattern,
                escape: escape.then_some('\\'),
                negated,
                case_insensitive,
            }) as Box<dyn Expression>
        };
        Ok(match op {
            "=" | "==" if value.is_null() => Box::new(BinaryOp {
                op: BinaryOpType::Is,
                lhs,
                rhs: Operand::Null,
            }),
            "!=" if value.is_null() => Box::new(BinaryOp {
                op: BinaryOpType::IsNot,
                lhs,
                rhs: Operand::Null,
            }),
            "=" | "==" => comparison(BinaryOpType::Equal)?,
            "!=" => comparison(BinaryOpType::NotEqual)?,
            ">" => comparison(BinaryOpType::Greater)?,
            ">=" => comparison(BinaryOpType::GreaterEqual)?,
            "<" => comparison(BinaryOpType::Less)?,
            "<=" => comparison(BinaryOpType::LessEqual)?,
            "in" | "not_in" => match value {
                Value::List(list) => Self::membership(lhs, list, op == "not_in"),
                _ => {
                    return Err(DbError::Query(format!(
                        "Operator `{}` on column `{}` expects a list, found {}",
                        op,
                        column,
                        value.kind()
                    ))
                    .into());
                }
            },
            "like" => like(pattern(value)?, false, false, false),
            "ilike" => like(pattern(value)?, false, false, true),
            "not_like" => like(pattern(value)?, false, true, false),
            "startswith" => like(
                format!("{}%", escape_like_pattern(&pattern(value)?)),
                true,
                false,
                false,
            ),
            "endswith" => like(
                format!("%{}", escape_like_pattern(&pattern(value)?)),
                true,
                false,
                false,
            ),
            "contains" => like(
                format!("%{}%", escape_like_pattern(&pattern(value)?)),
                true,
                false,
                false,
            ),
            "between" => match value.as_list() {
                Some([low, high]) if !low.is_null() && !high.is_null() => Box::new(Between {
                    expression: lhs,
                    low: low.clone(),
                    high: high.clone(),
                }),
                _ => {
                    return Err(DbError::Query(format!(
                        "Operator `between` on column `{}` expects a list [low, high]",
                        column
                    ))
                    .into());
                }
            },
            "is" | "is_not" => {
                if !value.is_null() {
                    return Err(DbError::Query(format!(
                        "Operator `{}` on column `{}` only accepts null, use `=` to compare values",
                        op, column
                    ))
                    .into());
                }
                Box::new(BinaryOp {
                    op: if op == "is" {
                        BinaryOpType::Is
                    } else {
                        BinaryOpType::IsNot
                    },
                    lhs,
                    rhs: Operand::Null,
                })
            }
            _ => {
                return Err(DbError::Query(format!(
                    "Unknown operator `{}` on column `{}`, expected one of: {}",
                    op,
                    column,
                    OPERATORS.join(", ")
                ))
                .into());
            }
        })
    }
}

impl From<BTreeMap<String, Value>> for FilterValue {
    fn from(value: BTreeMap<String, Value>) -> Self {
        FilterValue::Operators(value.into_iter().collect())
    }
}
