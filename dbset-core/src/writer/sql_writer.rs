use crate::{
    BinaryOp, BinaryOpType, ColumnDescriptor, ColumnType, Dialect, Expression, Fragment,
    IndexDescriptor, IndexOptions, Like, Operand, Order, Ordered, Row, TableDescriptor, Value,
    format_date, format_timestamp, possibly_parenthesized, separated_by, writer::Context,
};
use rust_decimal::Decimal;
use std::fmt::Write;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($this:ident, $context:ident, $out:ident, $value:expr) => {{
        if $value.is_infinite() {
            $this.write_value_infinity($context, $out, $value.is_sign_negative());
        } else if $value.is_nan() {
            $this.write_value_nan($context, $out);
        } else {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        }
    }};
}

/// Select statement parts, see [`SqlWriter::write_select`].
#[derive(Debug, Default)]
pub struct SelectParts<'a> {
    /// Projected columns, `*` when empty.
    pub columns: &'a [String],
    pub distinct: bool,
    pub condition: Option<&'a dyn Expression>,
    pub order_by: &'a [Ordered<Operand>],
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Dialect printer converting semantic constructs into concrete SQL strings.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn dialect(&self) -> Dialect {
        Dialect::Generic
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    /// Render the SQL type of a column category.
    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &ColumnType) {
        match value {
            ColumnType::Integer => out.push_str("BIGINT"),
            ColumnType::Float => out.push_str("DOUBLE PRECISION"),
            ColumnType::Decimal(Some((precision, scale))) => {
                let _ = write!(out, "NUMERIC({},{})", precision, scale);
            }
            ColumnType::Decimal(None) => out.push_str("NUMERIC"),
            ColumnType::Boolean => out.push_str("BOOLEAN"),
            ColumnType::Text => out.push_str("TEXT"),
            ColumnType::String(length) => {
                let _ = write!(out, "VARCHAR({})", length);
            }
            ColumnType::Timestamp => out.push_str("TIMESTAMP"),
            ColumnType::Date => out.push_str("DATE"),
            ColumnType::Json => out.push_str("JSON"),
            ColumnType::Jsonb => out.push_str("JSONB"),
            ColumnType::Blob => out.push_str("BYTEA"),
        }
    }

    /// Render a concrete value (including proper quoting / escaping).
    fn write_value(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            Value::Null => self.write_value_none(context, out),
            Value::Boolean(v) => self.write_value_bool(context, out, *v),
            Value::Int64(v) => write_integer!(out, *v),
            Value::Float64(v) => write_float!(self, context, out, *v),
            Value::Decimal(v) => self.write_value_decimal(context, out, v),
            Value::Varchar(v) => self.write_value_string(context, out, v),
            Value::Blob(v) => self.write_value_blob(context, out, v),
            Value::Date(v) => self.write_value_string(context, out, &format_date(v)),
            Value::Timestamp(v) => self.write_value_string(context, out, &format_timestamp(v)),
            Value::Uuid(v) => {
                let _ = write!(out, "'{}'", v);
            }
            Value::List(..) | Value::Map(..) => self.write_value_json(context, out, value),
        };
    }

    /// Render a decimal, with every digit of its scale.
    fn write_value_decimal(&self, _context: &mut Context, out: &mut String, value: &Decimal) {
        let _ = write!(out, "{}", value);
    }

    /// Render NULL literal.
    fn write_value_none(&self, _context: &mut Context, out: &mut String) {
        out.push_str("NULL");
    }

    /// Render boolean literal.
    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    /// Render +/- INF via CAST for dialect portability.
    fn write_value_infinity(&self, _context: &mut Context, out: &mut String, negative: bool) {
        out.push_str(if negative {
            "CAST('-Infinity' AS DOUBLE PRECISION)"
        } else {
            "CAST('Infinity' AS DOUBLE PRECISION)"
        });
    }

    /// Render NaN via CAST for dialect portability.
    fn write_value_nan(&self, _context: &mut Context, out: &mut String) {
        out.push_str("CAST('NaN' AS DOUBLE PRECISION)");
    }

    /// Render and escape a string literal using single quotes.
    fn write_value_string(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(context, out, value, '\'', "''");
        out.push('\'');
    }

    /// Render a blob literal using the hex escape format.
    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push_str("'\\x");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    /// Render a structured value as its JSON text.
    fn write_value_json(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value.to_json_string() {
            Ok(json) => self.write_value_string(context, out, &json),
            Err(e) => {
                log::error!("{:#}", e);
                self.write_value_none(context, out);
            }
        }
    }

    /// Precedence table for binary operators.
    fn expression_binary_op_precedence(&self, value: &BinaryOpType) -> i32 {
        match value {
            BinaryOpType::Or => 100,
            BinaryOpType::And => 200,
            BinaryOpType::Equal => 300,
            BinaryOpType::NotEqual => 300,
            BinaryOpType::Less => 300,
            BinaryOpType::Greater => 300,
            BinaryOpType::LessEqual => 300,
            BinaryOpType::GreaterEqual => 300,
            BinaryOpType::Is => 400,
            BinaryOpType::IsNot => 400,
            BinaryOpType::In => 400,
            BinaryOpType::NotIn => 400,
        }
    }

    fn expression_like_precedence(&self) -> i32 {
        400
    }

    fn expression_between_precedence(&self) -> i32 {
        400
    }

    /// Render an operand (literal / column / value list).
    fn write_expression_operand(&self, context: &mut Context, out: &mut String, value: &Operand) {
        match value {
            Operand::LitBool(v) => self.write_value_bool(context, out, *v),
            Operand::Null => self.write_value_none(context, out),
            Operand::Column(v) => self.write_identifier_quoted(context, out, v),
            Operand::Variable(v) => self.write_value(context, out, v),
            Operand::List(v) => {
                out.push('(');
                separated_by(
                    out,
                    v,
                    |out, v| {
                        self.write_value(context, out, v);
                    },
                    ", ",
                );
                out.push(')');
            }
        };
    }

    /// Render binary operator expression handling precedence / parenthesis.
    fn write_expression_binary_op(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &BinaryOp<&dyn Expression, &dyn Expression>,
    ) {
        let infix = match value.op {
            BinaryOpType::Is => " IS ",
            BinaryOpType::IsNot => " IS NOT ",
            BinaryOpType::In => " IN ",
            BinaryOpType::NotIn => " NOT IN ",
            BinaryOpType::Equal => " = ",
            BinaryOpType::NotEqual => " != ",
            BinaryOpType::Less => " < ",
            BinaryOpType::LessEqual => " <= ",
            BinaryOpType::Greater => " > ",
            BinaryOpType::GreaterEqual => " >= ",
            BinaryOpType::And => " AND ",
            BinaryOpType::Or => " OR ",
        };
        let precedence = self.expression_binary_op_precedence(&value.op);
        possibly_parenthesized!(
            out,
            value.lhs.precedence(self.as_dyn()) < precedence,
            value.lhs.write_query(self.as_dyn(), context, out)
        );
        out.push_str(infix);
        possibly_parenthesized!(
            out,
            value.rhs.precedence(self.as_dyn()) <= precedence,
            value.rhs.write_query(self.as_dyn(), context, out)
        );
    }

    /// Render a pattern match, the case insensitive form uses `ILIKE`.
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
        out.push_str(match (value.negated, value.case_insensitive) {
            (false, false) => " LIKE ",
            (true, false) => " NOT LIKE ",
            (false, true) => " ILIKE ",
            (true, true) => " NOT ILIKE ",
        });
        self.write_value_string(context, out, &value.pattern);
        if let Some(escape) = value.escape {
            out.push_str(" ESCAPE ");
            let mut buffer = [0u8; 4];
            self.write_value_string(context, out, escape.encode_utf8(&mut buffer));
        }
    }

    /// Render an inclusive range test.
    fn write_expression_between(
        &self,
        context: &mut Context,
        out: &mut String,
        expression: &dyn Expression,
        low: &Value,
        high: &Value,
    ) {
        possibly_parenthesized!(
            out,
            expression.precedence(self.as_dyn()) <= self.expression_between_precedence(),
            expression.write_query(self.as_dyn(), context, out)
        );
        out.push_str(" BETWEEN ");
        self.write_value(context, out, low);
        out.push_str(" AND ");
        self.write_value(context, out, high);
    }

    /// Render ordered expression inside ORDER BY.
    fn write_expression_ordered(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Ordered<&dyn Expression>,
    ) {
        value.expression.write_query(self.as_dyn(), context, out);
        if context.fragment == Fragment::SqlSelectOrderBy {
            out.push_str(match value.order {
                Order::ASC => " ASC",
                Order::DESC => " DESC",
            });
        }
    }

    /// Emit BEGIN statement.
    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN;");
    }

    /// Emit COMMIT statement.
    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT;");
    }

    /// Emit ROLLBACK statement.
    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK;");
    }

    fn write_savepoint(&self, out: &mut String, name: &str) {
        out.push_str("SAVEPOINT ");
        self.write_identifier_quoted(&mut Context::default(), out, name);
        out.push(';');
    }

    fn write_release_savepoint(&self, out: &mut String, name: &str) {
        out.push_str("RELEASE SAVEPOINT ");
        self.write_identifier_quoted(&mut Context::default(), out, name);
        out.push(';');
    }

    fn write_rollback_to_savepoint(&self, out: &mut String, name: &str) {
        out.push_str("ROLLBACK TO SAVEPOINT ");
        self.write_identifier_quoted(&mut Context::default(), out, name);
        out.push(';');
    }

    /// Emit CREATE TABLE with the given columns.
    fn write_create_table(
        &self,
        out: &mut String,
        table: &str,
        columns: &[ColumnDescriptor],
        if_not_exists: bool,
    ) {
        let mut context = Context::new(Fragment::SqlCreateTable);
        out.reserve(64 + columns.len() * 32);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("CREATE TABLE ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_identifier_quoted(&mut context, out, table);
        out.push_str(" (\n");
        separated_by(
            out,
            columns,
            |out, v| {
                self.write_create_table_column_fragment(&mut context, out, v);
            },
            ",\n",
        );
        out.push_str(");");
    }

    /// Emit single column definition fragment.
    fn write_create_table_column_fragment(
        &self,
        context: &mut Context,
        out: &mut String,
        column: &ColumnDescriptor,
    ) {
        self.write_identifier_quoted(context, out, &column.name);
        out.push(' ');
        if column.primary_key && column.auto_increment {
            self.write_column_auto_increment_primary_key(context, out);
            return;
        }
        self.write_column_type(context, out, &column.column_type);
        if column.primary_key {
            out.push_str(" PRIMARY KEY");
        } else if !column.nullable {
            out.push_str(" NOT NULL");
        }
    }

    /// Type and constraint of an engine assigned integer key.
    fn write_column_auto_increment_primary_key(&self, _context: &mut Context, out: &mut String) {
        out.push_str("BIGSERIAL PRIMARY KEY");
    }

    /// Emit DROP TABLE statement.
    fn write_drop_table(&self, out: &mut String, table: &str, if_exists: bool) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("DROP TABLE ");
        if if_exists {
            out.push_str("IF EXISTS ");
        }
        self.write_identifier_quoted(&mut Context::new(Fragment::SqlDropTable), out, table);
        out.push(';');
    }

    /// Emit ALTER TABLE .. ADD COLUMN.
    fn write_add_column(&self, out: &mut String, table: &str, column: &ColumnDescriptor) {
        let mut context = Context::new(Fragment::SqlAlterTable);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("ALTER TABLE ");
        self.write_identifier_quoted(&mut context, out, table);
        out.push_str(" ADD COLUMN ");
        self.write_create_table_column_fragment(&mut context, out, column);
        out.push(';');
    }

    /// Emit the statements changing the type of an existing column to a wider one.
    fn write_alter_column_type(
        &self,
        out: &mut String,
        table: &TableDescriptor,
        column: &str,
        column_type: &ColumnType,
    ) {
        let mut context = Context::new(Fragment::SqlAlterTable);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("ALTER TABLE ");
        self.write_identifier_quoted(&mut context, out, &table.name);
        out.push_str(" ALTER COLUMN ");
        self.write_identifier_quoted(&mut context, out, column);
        out.push_str(" TYPE ");
        self.write_column_type(&mut context, out, column_type);
        out.push_str(" USING CAST(");
        self.write_identifier_quoted(&mut context, out, column);
        out.push_str(" AS ");
        self.write_column_type(&mut context, out, column_type);
        out.push_str(");");
    }

    /// Statements restoring a consistent state after [`SqlWriter::write_alter_column_type`] failed halfway.
    fn write_alter_column_type_recovery(&self, _out: &mut String) {}

    /// Emit CREATE INDEX.
    fn write_create_index(
        &self,
        out: &mut String,
        table: &str,
        index: &IndexDescriptor,
        options: &IndexOptions,
        if_not_exists: bool,
    ) {
        let mut context = Context::new(Fragment::SqlCreateIndex);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("CREATE ");
        if index.unique {
            out.push_str("UNIQUE ");
        }
        out.push_str("INDEX ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_identifier_quoted(&mut context, out, &index.name);
        out.push_str(" ON ");
        self.write_identifier_quoted(&mut context, out, table);
        out.push_str(" (");
        separated_by(
            out,
            &index.columns,
            |out, v| {
                self.write_identifier_quoted(&mut context, out, v);
                if let Some(length) = options.prefix_length(v) {
                    let _ = write!(out, "({})", length);
                }
            },
            ", ",
        );
        out.push(')');
        if let Some(predicate) = &options.predicate {
            out.push_str(" WHERE ");
            out.push_str(predicate);
        }
        out.push(';');
    }

    /// Emit SELECT statement (projection, FROM, WHERE, ORDER, LIMIT).
    fn write_select(&self, out: &mut String, table: &str, parts: &SelectParts) {
        let mut context = Context::new(Fragment::SqlSelect);
        out.reserve(128 + parts.columns.len() * 32);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("SELECT ");
        if parts.distinct {
            out.push_str("DISTINCT ");
        }
        if parts.columns.is_empty() {
            out.push('*');
        } else {
            separated_by(
                out,
                parts.columns,
                |out, v| {
                    self.write_identifier_quoted(&mut context, out, v);
                },
                ", ",
            );
        }
        out.push_str("\nFROM ");
        self.write_identifier_quoted(
            &mut context.switch_fragment(Fragment::SqlSelectFrom).current,
            out,
            table,
        );
        if let Some(condition) = parts.condition {
            out.push_str("\nWHERE ");
            condition.write_query(
                self.as_dyn(),
                &mut context.switch_fragment(Fragment::SqlSelectWhere).current,
                out,
            );
        }
        if !parts.order_by.is_empty() {
            out.push_str("\nORDER BY ");
            let mut order_context = context.switch_fragment(Fragment::SqlSelectOrderBy);
            separated_by(
                out,
                parts.order_by,
                |out, v| {
                    v.write_query(self.as_dyn(), &mut order_context.current, out);
                },
                ", ",
            );
        }
        self.write_limit_offset(&mut context, out, parts.limit, parts.offset);
        out.push(';');
    }

    fn write_limit_offset(
        &self,
        _context: &mut Context,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
    ) {
        if let Some(limit) = limit {
            let _ = write!(out, "\nLIMIT {}", limit);
        }
        if let Some(offset) = offset {
            let _ = write!(out, "\nOFFSET {}", offset);
        }
    }

    /// Emit SELECT COUNT(*).
    fn write_count(&self, out: &mut String, table: &str, condition: Option<&dyn Expression>) {
        let mut context = Context::new(Fragment::SqlSelect);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("SELECT COUNT(*) AS \"count\"\nFROM ");
        self.write_identifier_quoted(
            &mut context.switch_fragment(Fragment::SqlSelectFrom).current,
            out,
            table,
        );
        if let Some(condition) = condition {
            out.push_str("\nWHERE ");
            condition.write_query(
                self.as_dyn(),
                &mut context.switch_fragment(Fragment::SqlSelectWhere).current,
                out,
            );
        }
        out.push(';');
    }

    /// Emit INSERT of one or more rows, columns missing from a row are NULL.
    fn write_insert(&self, out: &mut String, table: &str, columns: &[String], rows: &[Row]) {
        if rows.is_empty() {
            return;
        }
        let mut context = Context::new(Fragment::SqlInsertInto);
        out.reserve(64 + rows.len() * columns.len() * 16);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("INSERT INTO ");
        self.write_identifier_quoted(&mut context, out, table);
        if columns.is_empty() {
            // Only a single row can be inserted with all defaults
            out.push_str(" DEFAULT VALUES;");
            return;
        }
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, v| {
                self.write_identifier_quoted(&mut context, out, v);
            },
            ", ",
        );
        out.push_str(") VALUES\n");
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
        separated_by(
            out,
            rows,
            |out, row| {
                out.push('(');
                separated_by(
                    out,
                    columns,
                    |out, column| match row.get(column) {
                        Some(value) => self.write_value(&mut context.current, out, value),
                        None => self.write_value_none(&mut context.current, out),
                    },
                    ", ",
                );
                out.push(')');
            },
            ",\n",
        );
        out.push(';');
    }

    /// Emit UPDATE .. SET .. WHERE.
    fn write_update(
        &self,
        out: &mut String,
        table: &str,
        values: &Row,
        condition: Option<&dyn Expression>,
    ) {
        let mut context = Context::new(Fragment::SqlUpdate);
        out.reserve(64 + values.len() * 32);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("UPDATE ");
        self.write_identifier_quoted(&mut context, out, table);
        out.push_str("\nSET ");
        {
            let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
            separated_by(
                out,
                values.iter(),
                |out, (column, value)| {
                    self.write_identifier_quoted(&mut context.current, out, column);
                    out.push_str(" = ");
                    self.write_value(&mut context.current, out, value);
                },
                ", ",
            );
        }
        if let Some(condition) = condition {
            out.push_str("\nWHERE ");
            condition.write_query(
                self.as_dyn(),
                &mut context.switch_fragment(Fragment::SqlUpdateWhere).current,
                out,
            );
        }
        out.push(';');
    }

    /// Emit DELETE statement, without condition every row goes.
    fn write_delete(&self, out: &mut String, table: &str, condition: Option<&dyn Expression>) {
        let mut context = Context::new(Fragment::SqlDeleteFrom);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("DELETE FROM ");
        self.write_identifier_quoted(&mut context, out, table);
        if let Some(condition) = condition {
            out.push_str("\nWHERE ");
            condition.write_query(
                self.as_dyn(),
                &mut context.switch_fragment(Fragment::SqlDeleteFromWhere).current,
                out,
            );
        }
        out.push(';');
    }
}

/// Fallback generic SQL writer (closest to PostgreSQL conventions).
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericSqlWriter {
    pub dialect: Dialect,
}

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generic printer reporting `dialect`, for engines without a dedicated writer.
    pub fn with_dialect(dialect: Dialect) -> Self {
        Self { dialect }
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}
