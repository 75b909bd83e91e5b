use std::collections::BTreeMap;

use bytes::Bytes;

/// Column name → value for one row.
pub type Columns = BTreeMap<String, Bytes>;

/// Build a [`Columns`] map from `(name, value)` pairs.
pub fn columns<I, K, V>(pairs: I) -> Columns
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Bytes>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A row returned by scans and queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub key: Bytes,
    pub columns: Columns,
}

impl Row {
    /// Value of one column.
    pub fn column(&self, name: &str) -> Option<&Bytes> {
        self.columns.get(name)
    }
}

/// Column layout declared when a table is created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<String>,
}

impl TableSchema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Sort direction for [`Query::order_by`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

/// A single-table query: optional equality filter on one column and optional
/// ordering by one column. Comparisons are byte-wise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub filter: Option<(String, Bytes)>,
    pub order_by: Option<(String, Order)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose `column` equals `value`.
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.filter = Some((column.into(), value.into()));
        self
    }

    /// Order results by `column`.
    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order_by = Some((column.into(), order));
        self
    }

    /// Whether a row passes the filter.
    pub fn matches(&self, columns: &Columns) -> bool {
        match &self.filter {
            Some((name, value)) => columns.get(name) == Some(value),
            None => true,
        }
    }
}
