use dbset_core::{
    ColumnType, Context, Dialect, Expression, Fragment, IndexOptions, Like, OpPrecedence, SqlWriter,
    TableDescriptor, possibly_parenthesized, separated_by,
};
use rust_decimal::Decimal;
use std::fmt::Write;

/// Savepoint wrapping the table rebuild of a column widening.
const WIDEN_SAVEPOINT: &str = "dbset_widen";

/// Declared type of decimal columns.
///
/// The `TEXT` in the name gives the column text affinity, so the digits are
/// stored as written instead of being folded into a double.
pub const DECIMAL_TYPE: &str = "DECIMAL_TEXT";

/// Collation of decimal columns, comparing the stored text by numeric value.
pub const DECIMAL_COLLATION: &str = "DBSET_DECIMAL";

pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &ColumnType) {
        match value {
            ColumnType::Integer => out.push_str("INTEGER"),
            ColumnType::Float => out.push_str("REAL"),
            ColumnType::Decimal(Some((precision, scale))) => {
                let _ = write!(
                    out,
                    "{}({},{}) COLLATE {}",
                    DECIMAL_TYPE, precision, scale, DECIMAL_COLLATION
                );
            }
            ColumnType::Decimal(None) => {
                let _ = write!(out, "{} COLLATE {}", DECIMAL_TYPE, DECIMAL_COLLATION);
            }
            ColumnType::Boolean => out.push_str("BOOLEAN"),
            ColumnType::Text => out.push_str("TEXT"),
            ColumnType::String(length) => {
                let _ = write!(out, "VARCHAR({})", length);
            }
            ColumnType::Timestamp => out.push_str("TIMESTAMP"),
            ColumnType::Date => out.push_str("DATE"),
            ColumnType::Json | ColumnType::Jsonb => out.push_str("JSON"),
            ColumnType::Blob => out.push_str("BLOB"),
        }
    }

    fn write_value_infinity(&self, _context: &mut Context, out: &mut String, negative: bool) {
        if negative {
            out.push('-');
        }
        out.push_str("9e999");
    }

    fn write_value_nan(&self, context: &mut Context, out: &mut String) {
        // Stored as NULL by the engine anyway
        self.write_value_none(context, out);
    }

    fn write_value_decimal(&self, context: &mut Context, out: &mut String, value: &Decimal) {
        self.write_value_string(context, out, &value.to_string());
    }

    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    /// `LIKE` is already case insensitive for ASCII.
    fn write_expression_like(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Like<&dyn Expression>,
    ) {
        possibly_parenthesized!(
            out,
            value.expression.precedence(self.as_dyn()) <= self.expression_like_precedence(),
            value.expression.write_query(self.as_dyn(), context, out)
        );
        out.push_str(if value.negated { " NOT LIKE " } else { " LIKE " });
        self.write_value_string(context, out, &value.pattern);
        if let Some(escape) = value.escape {
            out.push_str(" ESCAPE ");
            let mut buffer = [0u8; 4];
            self.write_value_string(context, out, escape.encode_utf8(&mut buffer));
        }
    }

    fn write_column_auto_increment_primary_key(&self, _context: &mut Context, out: &mut String) {
        out.push_str("INTEGER PRIMARY KEY AUTOINCREMENT");
    }

    /// SQLite can not change a column type, the table is rebuilt under a savepoint.
    ///
    /// Values are converted with `CAST`, the user indexes are created again.
    fn write_alter_column_type(
        &self,
        out: &mut String,
        table: &TableDescriptor,
        column: &str,
        column_type: &ColumnType,
    ) {
        let mut context = Context::new(Fragment::SqlAlterTable);
        let rebuilt = format!("{}_{}", WIDEN_SAVEPOINT, table.name);
        let mut columns = table.columns.clone();
        for v in columns.iter_mut().filter(|v| v.name == column) {
            v.column_type = column_type.clone();
        }
        if !out.is_empty() {
            out.push('\n');
        }
        self.write_savepoint(out, WIDEN_SAVEPOINT);
        self.write_drop_table(out, &rebuilt, true);
        self.write_create_table(out, &rebuilt, &columns, false);
        out.push_str("\nINSERT INTO ");
        self.write_identifier_quoted(&mut context, out, &rebuilt);
        out.push_str(" (");
        separated_by(
            out,
            &columns,
            |out, v| {
                self.write_identifier_quoted(&mut context, out, &v.name);
            },
            ", ",
        );
        out.push_str(")\nSELECT ");
        separated_by(
            out,
            &columns,
            |out, v| {
                let cast = match column_type {
                    ColumnType::Text | ColumnType::String(..) | ColumnType::Decimal(..) => {
                        Some("TEXT")
                    }
                    ColumnType::Float => Some("REAL"),
                    // Text dates would be truncated by a numeric cast, the affinity is enough
                    _ => None,
                };
                match cast {
                    Some(cast) if v.name == column => {
                        out.push_str("CAST(");
                        self.write_identifier_quoted(&mut context, out, &v.name);
                        let _ = write!(out, " AS {})", cast);
                    }
                    _ => self.write_identifier_quoted(&mut context, out, &v.name),
                }
            },
            ", ",
        );
        out.push_str("\nFROM ");
        self.write_identifier_quoted(&mut context, out, &table.name);
        out.push(';');
        self.write_drop_table(out, &table.name, false);
        out.push_str("\nALTER TABLE ");
        self.write_identifier_quoted(&mut context, out, &rebuilt);
        out.push_str(" RENAME TO ");
        self.write_identifier_quoted(&mut context, out, &table.name);
        out.push(';');
        for index in table
            .indexes
            .iter()
            .filter(|v| !v.name.starts_with("sqlite_"))
        {
            match &index.definition {
                // Keeps the predicate and the collations of the original
                Some(definition) => {
                    out.push('\n');
                    out.push_str(definition.trim_end_matches(';'));
                    out.push(';');
                }
                None => {
                    self.write_create_index(out, &table.name, index, &IndexOptions::default(), false)
                }
            }
        }
        out.push('\n');
        self.write_release_savepoint(out, WIDEN_SAVEPOINT);
    }

    fn write_alter_column_type_recovery(&self, out: &mut String) {
        if !out.is_empty() {
            out.push('\n');
        }
        self.write_rollback_to_savepoint(out, WIDEN_SAVEPOINT);
        out.push('\n');
        self.write_release_savepoint(out, WIDEN_SAVEPOINT);
    }

    fn write_limit_offset(
        &self,
        _context: &mut Context,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
    ) {
        match (limit, offset) {
            (Some(limit), _) => {
                let _ = write!(out, "\nLIMIT {}", limit);
            }
            // An offset needs a limit
            (None, Some(..)) => out.push_str("\nLIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = offset {
            let _ = write!(out, "\nOFFSET {}", offset);
        }
    }
}
