use crate::{AsValue, Error, Result, RowLabeled, Value};
use std::ops::Index;

/// Ordered mapping from column name to [`Value`].
///
/// Column order is the insertion order, replacing an existing column keeps its
/// position.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

static NULL: Value = Value::Null;

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Set `column` to `value`, returning the previous value if any.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == column) {
            Some((_, current)) => Some(std::mem::replace(current, value)),
            None => {
                self.entries.push((column, value));
                None
            }
        }
    }

    /// Builder flavour of [`Row::insert`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| if k == column { Some(v) } else { None })
    }

    /// Typed access to a column, missing columns convert from `Null`.
    pub fn get_as<T: AsValue>(&self, column: &str) -> Result<T> {
        T::try_from_value(self.get(column).cloned().unwrap_or_default())
            .map_err(|e| e.context(format!("While reading column `{}`", column)))
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let position = self.entries.iter().position(|(k, _)| k == column)?;
        Some(self.entries.remove(position).1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this row keeping only the columns matching `predicate`.
    pub fn filtered(&self, mut predicate: impl FnMut(&str) -> bool) -> Row {
        Row {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| predicate(k.as_str()))
                .cloned()
                .collect(),
        }
    }
}

impl Index<&str> for Row {
    type Output = Value;

    /// Missing columns read as `Null`.
    fn index(&self, column: &str) -> &Self::Output {
        self.get(column).unwrap_or(&NULL)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        Row {
            entries: value
                .labels
                .iter()
                .cloned()
                .zip(value.values.into_vec())
                .collect(),
        }
    }
}

impl TryFrom<Value> for Row {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Map(v) => Ok(v.into_iter().collect()),
            v => Err(Error::msg(format!("Expected a map, found a {} value", v.kind()))),
        }
    }
}

/// Build a [`Row`] from `column => value` pairs.
///
/// ```
/// # use dbset_core::{Value, row};
/// let row = row! { "name" => "John", "age" => 30 };
/// assert_eq!(row["age"], Value::Int64(30));
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $(row.insert($column, $value);)+
        row
    }};
}
