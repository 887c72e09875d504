//! SQL text paired with its positional parameters
//!
//! A fragment is the only way clause text travels through the query layer, so a
//! `?` can never be appended without its value (or the other way round).

use crate::errors::StoreError;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    sql: String,
    params: Vec<Value>,
}

impl SqlFragment {
    /// Build a fragment, checking placeholder and parameter counts agree
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Result<Self, StoreError> {
        let sql = sql.into();
        let placeholders = count_placeholders(&sql);
        if placeholders != params.len() {
            return Err(StoreError::ValidationError(format!(
                "SQL fragment has {} placeholders but {} parameters: {}",
                placeholders,
                params.len(),
                sql
            )));
        }
        Ok(Self { sql, params })
    }

    /// Fragment without parameters
    pub fn raw(sql: impl Into<String>) -> Result<Self, StoreError> {
        Self::new(sql, Vec::new())
    }

    /// Empty fragment
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single placeholder bound to `value`
    pub fn param(value: impl Into<Value>) -> Self {
        Self {
            sql: "?".to_string(),
            params: vec![value.into()],
        }
    }

    /// Built by the generator, which maintains the pairing itself
    pub(crate) fn trusted(sql: String, params: Vec<Value>) -> Self {
        debug_assert_eq!(count_placeholders(&sql), params.len(), "{}", sql);
        Self { sql, params }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Append another fragment, separated by `separator` when both are non-empty
    pub fn push(&mut self, separator: &str, other: SqlFragment) {
        if other.is_empty() {
            return;
        }
        if !self.is_empty() {
            self.sql.push_str(separator);
        }
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }

    /// Append literal SQL that carries no placeholders
    pub fn push_sql(&mut self, sql: &str) {
        debug_assert_eq!(count_placeholders(sql), 0, "{}", sql);
        self.sql.push_str(sql);
    }

    /// Combine with AND
    pub fn and(mut self, other: SqlFragment) -> Self {
        self.push(" AND ", other);
        self
    }

    /// Join fragments with `separator`, wrapping the result in parentheses when
    /// more than one fragment contributes
    pub fn join(fragments: Vec<SqlFragment>, separator: &str) -> Self {
        let parts: Vec<SqlFragment> = fragments.into_iter().filter(|f| !f.is_empty()).collect();
        let wrap = parts.len() > 1;
        let mut joined = Self::empty();
        for part in parts {
            joined.push(separator, part);
        }
        if wrap {
            joined.sql = format!("({})", joined.sql);
        }
        joined
    }

    /// Combine with OR, parenthesised
    pub fn or(fragments: Vec<SqlFragment>) -> Self {
        Self::join(fragments, " OR ")
    }
}

/// Count `?` placeholders outside quoted literals and identifiers
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;

    for c in sql.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '?' => count += 1,
                _ => {}
            },
        }
    }

    count
}
