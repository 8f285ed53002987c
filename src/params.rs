//! Query-parameter construction for API requests.
//!
//! Request structs are flattened into an ordered key/value multimap before
//! dispatch. Keys may repeat (list filters); insertion order is preserved so
//! the encoded query string is deterministic.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};


/// Sort specification for list queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Field name to sort by.
    pub name: String,
    /// Sort direction.
    pub ascending: bool,
}

impl SortField {
    /// Creates an ascending sort on the given field.
    #[must_use]
    pub fn ascending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ascending: true,
        }
    }

    /// Creates a descending sort on the given field.
    #[must_use]
    pub fn descending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ascending: false,
        }
    }
}

/// Ordered query-parameter multimap, built fresh for each request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends an entry unconditionally.
    pub(crate) fn push(&mut self, name: &str, value: impl Into<String>) {
        self.0.push((name.to_string(), value.into()));
    }

    /// Appends a string value, skipping empty strings.
    pub(crate) fn add_str(&mut self, name: &str, value: &str) {
        if !value.is_empty() {
            self.push(name, value);
        }
    }

    /// Appends an integer value as a decimal string. Zero is included.
    pub(crate) fn add_int(&mut self, name: &str, value: u32) {
        self.push(name, value.to_string());
    }

    /// Appends one entry per list element, preserving source order.
    pub(crate) fn add_str_list(&mut self, name: &str, values: &[String]) {
        for value in values {
            self.add_str(name, value);
        }
    }

    /// Appends a timestamp as Unix-epoch seconds, skipped when absent.
    pub(crate) fn add_epoch(&mut self, name: &str, value: Option<DateTime<Utc>>) {
        if let Some(t) = value {
            self.push(name, t.timestamp().to_string());
        }
    }

    /// Appends a timestamp as RFC3339 text, skipped when absent.
    pub(crate) fn add_rfc3339(&mut self, name: &str, value: Option<DateTime<Utc>>) {
        if let Some(t) = value {
            self.push(name, t.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
    }

    /// Appends sort fields encoded as `<name>.asc` / `<name>.desc`,
    /// preserving input order.
    pub(crate) fn add_sort_fields(&mut self, name: &str, sort_fields: &[SortField]) {
        for field in sort_fields {
            let direction = if field.ascending { "asc" } else { "desc" };
            self.add_str(name, &format!("{}.{}", field.name, direction));
        }
    }

    /// URL-encodes the accumulated parameters.
    pub(crate) fn encode(&self) -> String {
        serde_urlencoded::to_string(&self.0).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[(String, String)] {
        &self.0
    }
}
