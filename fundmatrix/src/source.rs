//! Paged row sources.
//!
//! A [`RowSource`] serves one page of a named table per request, the way a
//! PostgREST-style backend answers a `range(from, to)` query. The loader in
//! [`crate::fetch`] walks pages until the table is exhausted. Chart series
//! come from stored procedures instead and go through [`RpcSource`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{FundmatrixError, Result};

/// Table names served by the dashboard backend.
pub mod tables {
    /// Market columns of the funding matrix.
    pub const EXCHANGE_COLUMNS: &str = "exchange_columns";
    /// Materialized funding matrix, one row per token.
    pub const FUNDING_MATRIX: &str = "token_funding_matrix_mv";
    /// Precomputed long/short opportunities, one row per token, window and
    /// leg pair.
    pub const ARB_OPPORTUNITIES: &str = "arb_opportunities_mv";
    /// Per-market funding dashboard, one row per exchange listing.
    pub const FUNDING_DASHBOARD: &str = "funding_dashboard_mv";
}

/// Stored procedures served by the dashboard backend.
pub mod rpc {
    /// `get_funding_chart(p_market_id, p_days)`.
    pub const FUNDING_CHART: &str = "get_funding_chart";
    /// `get_arb_chart_data(p_base_asset, p_long_exchange, p_short_exchange, p_days)`.
    pub const ARB_CHART: &str = "get_arb_chart_data";
}

/// Sort applied before a page is cut. Nulls always sort last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Equality filter on one column, applied before ordering and paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Numbers compare by value, so `7` matches `7.0`.
    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.column)
            .is_some_and(|v| compare_values(v, &self.value) == Ordering::Equal)
    }
}

/// One page request; `from` and `to` are inclusive row offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub table: String,
    pub filter: Option<Filter>,
    pub order: Option<OrderBy>,
    pub from: usize,
    pub to: usize,
}

impl PageRequest {
    /// Number of rows the request asks for.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.to - self.from).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }
}

/// Backend serving table pages.
pub trait RowSource: Send + Sync {
    /// Fetch the rows of `req.table` in `[req.from, req.to]`.
    ///
    /// Returns fewer rows than requested (possibly none) past the end of the
    /// table.
    fn fetch_page<T>(&self, req: &PageRequest) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: DeserializeOwned + Send;
}

/// Backend answering stored-procedure calls with named JSON parameters.
pub trait RpcSource: Send + Sync {
    fn call<T>(&self, function: &str, params: &Value) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send;
}

/// A recorded procedure call and its response.
#[derive(Debug, Clone, Deserialize)]
struct StoredCall {
    function: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    result: Value,
}

/// Row source backed by a dashboard payload saved to disk.
///
/// Payload keys map to tables: `columns` serves
/// [`tables::EXCHANGE_COLUMNS`], `rows` serves [`tables::FUNDING_MATRIX`],
/// `arbitrage` serves [`tables::ARB_OPPORTUNITIES`] and `funding` serves
/// [`tables::FUNDING_DASHBOARD`]. An optional `rpc` array holds recorded
/// `{function, params, result}` calls.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    tables: HashMap<String, Vec<Value>>,
    calls: Vec<StoredCall>,
}

impl SnapshotSource {
    /// Read and index a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `FundmatrixError::Io` if the file cannot be read, or
    /// `FundmatrixError::Json` if it is not a JSON object.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await?;
        let source = Self::from_slice(&raw)?;
        debug!(
            path = %path.display(),
            tables = source.tables.len(),
            calls = source.calls.len(),
            "snapshot opened"
        );
        Ok(source)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let mut payload: HashMap<String, Value> = serde_json::from_slice(raw)?;
        let mut source = Self::default();
        for (key, table) in [
            ("columns", tables::EXCHANGE_COLUMNS),
            ("rows", tables::FUNDING_MATRIX),
            ("arbitrage", tables::ARB_OPPORTUNITIES),
            ("funding", tables::FUNDING_DASHBOARD),
        ] {
            let rows = match payload.remove(key) {
                Some(Value::Array(rows)) => rows,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(FundmatrixError::Source {
                        table: table.to_string(),
                        message: format!("expected an array under `{key}`, got {other}"),
                    })
                }
            };
            source.tables.insert(table.to_string(), rows);
        }
        if let Some(calls) = payload.remove("rpc").filter(|v| !v.is_null()) {
            source.calls = serde_json::from_value(calls)?;
        }
        Ok(source)
    }

    /// Add or replace a table.
    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        self.tables.insert(name.into(), rows);
        self
    }

    /// Record the response of `function` for `params`.
    pub fn with_call(mut self, function: impl Into<String>, params: Value, result: Value) -> Self {
        self.calls.push(StoredCall {
            function: function.into(),
            params,
            result,
        });
        self
    }

    fn page(&self, req: &PageRequest) -> Result<Vec<Value>> {
        let rows = self
            .tables
            .get(&req.table)
            .ok_or_else(|| FundmatrixError::UnknownTable(req.table.clone()))?;

        let mut selected: Vec<&Value> = rows
            .iter()
            .filter(|row| req.filter.as_ref().map_or(true, |f| f.matches(row)))
            .collect();
        if req.is_empty() || req.from >= selected.len() {
            return Ok(Vec::new());
        }
        if let Some(order) = &req.order {
            selected.sort_by(|a, b| compare_column(a, b, order));
        }

        let end = req.from.saturating_add(req.len()).min(selected.len());
        Ok(selected[req.from..end].iter().map(|v| (*v).clone()).collect())
    }

    /// Recorded response for `function` called with exactly `params`.
    ///
    /// A known function called with unrecorded parameters answers an empty
    /// array, as a procedure with no matching rows would.
    fn stored_result(&self, function: &str, params: &Value) -> Result<Value> {
        let mut known = false;
        for call in self.calls.iter().filter(|c| c.function == function) {
            if call.params == *params {
                return Ok(call.result.clone());
            }
            known = true;
        }
        if known {
            Ok(Value::Array(Vec::new()))
        } else {
            Err(FundmatrixError::UnknownFunction(function.to_string()))
        }
    }
}

impl RowSource for SnapshotSource {
    async fn fetch_page<T>(&self, req: &PageRequest) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.page(req)?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(FundmatrixError::from))
            .collect()
    }
}

impl RpcSource for SnapshotSource {
    async fn call<T>(&self, function: &str, params: &Value) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let result = self.stored_result(function, params)?;
        debug!(function, "rpc answered from snapshot");
        Ok(serde_json::from_value(result)?)
    }
}

/// Compare two rows on `order.column`; missing and null values go last in
/// both directions.
fn compare_column(a: &Value, b: &Value, order: &OrderBy) -> Ordering {
    let a = a.get(&order.column).filter(|v| !v.is_null());
    let b = b.get(&order.column).filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_values(a, b);
            if order.ascending {
                ord
            } else {
                ord.reverse()
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
