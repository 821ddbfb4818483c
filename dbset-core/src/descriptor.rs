use crate::{ColumnType, Row, RowLabeled};

/// A live column, as reflected from the engine catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            auto_increment: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescriptor {
    pub name: String,
    /// Member columns, order is part of the identity.
    pub columns: Vec<String>,
    pub unique: bool,
    /// Statement that created the index, when the engine keeps it.
    pub definition: Option<String>,
}

impl IndexDescriptor {
    pub fn covers<S: AsRef<str>>(&self, columns: &[S]) -> bool {
        self.columns.len() == columns.len()
            && self
                .columns
                .iter()
                .zip(columns)
                .all(|(a, b)| a == b.as_ref())
    }
}

/// Snapshot of a table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|v| v.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|v| v.name.as_str())
    }

    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|v| v.primary_key)
    }

    /// Index with exactly these member columns (and uniqueness, when given).
    pub fn find_index<S: AsRef<str>>(
        &self,
        columns: &[S],
        unique: Option<bool>,
    ) -> Option<&IndexDescriptor> {
        self.indexes
            .iter()
            .find(|v| v.covers(columns) && unique.is_none_or(|u| u == v.unique))
    }

    pub fn index(&self, name: &str) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|v| v.name == name)
    }

    /// Turn a raw row into a [`Row`] conforming every value to its column.
    pub fn decode_row(&self, row: RowLabeled) -> Row {
        let RowLabeled { labels, values } = row;
        labels
            .iter()
            .zip(values.into_vec())
            .map(|(label, value)| {
                let value = match self.column(label) {
                    Some(column) => column.column_type.conform(value),
                    None => value,
                };
                (label.clone(), value)
            })
            .collect::<Row>()
    }
}

