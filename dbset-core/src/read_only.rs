use crate::{DbError, Result};
use regex::Regex;
use std::{borrow::Cow, collections::BTreeSet, sync::LazyLock};

/// Keywords that make a statement a write wherever they appear.
pub const FORBIDDEN_KEYWORDS: [&str; 11] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE", "GRANT", "REVOKE",
    "EXECUTE", "EXEC",
];

const READ_VERBS: [&str; 6] = ["SELECT", "WITH", "EXPLAIN", "SHOW", "DESCRIBE", "VALUES"];

static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|`[^`]*`|--[^\n]*|/\*(?s:.*?)\*/"#)
        .expect("valid pattern")
});

static FORBIDDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", FORBIDDEN_KEYWORDS.join("|")))
        .expect("valid pattern")
});

static FUNCTION_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(EXTRACT|SUBSTRING|POSITION|TRIM)\s*\([^)]*\bFROM\b[^)]*\)")
        .expect("valid pattern")
});

static TABLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN)\s+([a-zA-Z_][a-zA-Z0-9_]*)")
        .expect("valid pattern")
});

/// Literals become `''`, comments a blank, so that keywords inside them are not seen.
fn strip_quoted(sql: &str) -> Cow<'_, str> {
    QUOTED.replace_all(sql, |captures: &regex::Captures| {
        let found = &captures[0];
        if found.starts_with("--") || found.starts_with("/*") {
            " "
        } else {
            "''"
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

/// Decides whether raw SQL may run on a read-only handle.
pub struct ReadOnlyValidator;

impl ReadOnlyValidator {
    /// Classify `sql`, every statement it contains must be a read for the whole to be one.
    ///
    /// String literals, quoted identifiers and comments are ignored.
    pub fn classify(sql: &str) -> StatementKind {
        let stripped = strip_quoted(sql);
        if FORBIDDEN.is_match(&stripped) {
            return StatementKind::Write;
        }
        let mut statements = stripped
            .split(';')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .peekable();
        if statements.peek().is_none() {
            return StatementKind::Write;
        }
        if statements.all(Self::is_read_statement) {
            StatementKind::Read
        } else {
            StatementKind::Write
        }
    }

    fn is_read_statement(statement: &str) -> bool {
        let statement = statement.trim_start_matches('(').trim_start();
        let verb = statement
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        if verb == "PRAGMA" {
            // Reading a pragma is fine, assigning one is not
            return !statement.contains('=');
        }
        READ_VERBS.contains(&verb.as_str())
    }

    /// `ReadOnly` error unless `sql` is a read.
    pub fn validate_sql(sql: &str) -> Result<()> {
        if sql.trim().is_empty() {
            return Err(DbError::ReadOnly("Empty SQL query".into()).into());
        }
        if let Some(found) = FORBIDDEN.captures(&strip_quoted(sql)) {
            return Err(DbError::ReadOnly(format!(
                "Forbidden keyword detected: {}",
                found[1].to_ascii_uppercase()
            ))
            .into());
        }
        match Self::classify(sql) {
            StatementKind::Read => Ok(()),
            StatementKind::Write => Err(DbError::ReadOnly(format!(
                "Only read statements are allowed, got `{}`",
                crate::truncate_long!(sql.trim())
            ))
            .into()),
        }
    }

    /// `ReadOnly` error when `operation` names a write.
    pub fn validate_operation(operation: &str) -> Result<()> {
        let upper = operation.trim().to_ascii_uppercase();
        if FORBIDDEN_KEYWORDS.contains(&upper.as_str()) || upper == "UPSERT" {
            return Err(DbError::ReadOnly(format!(
                "Operation `{}` not allowed in read-only mode",
                operation
            ))
            .into());
        }
        Ok(())
    }

    /// Tables named after `FROM` and `JOIN`, deduplicated and sorted.
    pub fn extract_table_names(sql: &str) -> Vec<String> {
        let stripped = strip_quoted(sql);
        let cleaned = FUNCTION_FROM.replace_all(&stripped, "");
        TABLE_REFERENCE
            .captures_iter(&cleaned)
            .map(|v| v[1].to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `Validation` error listing the referenced tables missing from `existing` (case insensitive).
    pub fn validate_tables_exist<S: AsRef<str>>(sql: &str, existing: &[S]) -> Result<()> {
        let missing = Self::extract_table_names(sql)
            .into_iter()
            .filter(|table| {
                !existing
                    .iter()
                    .any(|v| v.as_ref().eq_ignore_ascii_case(table))
            })
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(
                DbError::Validation(format!("Tables not found: {}", missing.join(", "))).into(),
            );
        }
        Ok(())
    }
}
