// In-memory store connector for tests
//
// Understands exactly the statements the repositories issue. Every
// connection is tracked so tests can assert on the open/close lifecycle.

use crate::db::gateway::PING;
use crate::db::repositories::{book, category};
use crate::db::store::{QueryOutcome, Row, SqlParam, StoreConnection, StoreConnector};
use crate::errors::DataAccessError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Storage type of a column, used to coerce bound values as MySQL does
#[derive(Debug, Clone, Copy)]
enum Kind {
    Integer,
    Decimal,
    Text,
}

const BOOK_COLUMNS: [(&str, Kind); 7] = [
    ("id", Kind::Integer),
    ("titulo", Kind::Text),
    ("autor", Kind::Text),
    ("preco", Kind::Decimal),
    ("imagem", Kind::Text),
    ("categoria_id", Kind::Integer),
    ("descricao", Kind::Text),
];
const BOOK_MUTABLE_COLUMNS: [(&str, Kind); 6] = [
    ("titulo", Kind::Text),
    ("autor", Kind::Text),
    ("preco", Kind::Decimal),
    ("imagem", Kind::Text),
    ("descricao", Kind::Text),
    ("categoria_id", Kind::Integer),
];
const CATEGORY_COLUMNS: [(&str, Kind); 2] = [("id", Kind::Integer), ("nome", Kind::Text)];
const CATEGORY_MUTABLE_COLUMNS: [(&str, Kind); 1] = [("nome", Kind::Text)];

/// Connection lifecycle counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub opened: u64,
    pub closed: u64,
    pub open_now: usize,
    pub peak_open: usize,
}

#[derive(Default)]
struct Tables {
    livros: BTreeMap<i64, Row>,
    categorias: BTreeMap<i64, Row>,
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    refuse_connections: AtomicBool,
    opened: AtomicU64,
    closed: AtomicU64,
    open_now: AtomicUsize,
    peak_open: AtomicUsize,
}

/// Shared in-memory tables; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    latency: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every statement, so concurrent requests overlap
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make `connect` fail as an unreachable store would
    pub fn refuse_connections(&self, refuse: bool) {
        self.shared.refuse_connections.store(refuse, Ordering::SeqCst);
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            opened: self.shared.opened.load(Ordering::SeqCst),
            closed: self.shared.closed.load(Ordering::SeqCst),
            open_now: self.shared.open_now.load(Ordering::SeqCst),
            peak_open: self.shared.peak_open.load(Ordering::SeqCst),
        }
    }

    /// Number of rows in `table`
    pub fn row_count(&self, table: &str) -> usize {
        let tables = self.shared.tables.lock().unwrap_or_else(|e| e.into_inner());
        match table {
            "livros" => tables.livros.len(),
            "categorias" => tables.categorias.len(),
            _ => 0,
        }
    }

    /// Store `row` as-is, bypassing column constraints
    ///
    /// Stands in for rows written before a constraint existed, such as a
    /// NULL in a column added later. Rows without an integer `id` are ignored.
    pub fn seed(&self, table: &str, row: Row) {
        let Some(id) = row.get("id").and_then(Value::as_i64) else {
            return;
        };
        let mut tables = self.shared.tables.lock().unwrap_or_else(|e| e.into_inner());
        match table {
            "livros" => {
                tables.livros.insert(id, row);
            }
            "categorias" => {
                tables.categorias.insert(id, row);
            }
            _ => {}
        }
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, DataAccessError> {
        if self.shared.refuse_connections.load(Ordering::SeqCst) {
            return Err(DataAccessError::Connection(
                "connect ECONNREFUSED 127.0.0.1:3306".to_string(),
            ));
        }

        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        let open_now = self.shared.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.peak_open.fetch_max(open_now, Ordering::SeqCst);

        Ok(Box::new(MemoryConnection {
            shared: self.shared.clone(),
            latency: self.latency,
            open: true,
        }))
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
    latency: Duration,
    open: bool,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if self.open {
            self.shared.closed.fetch_add(1, Ordering::SeqCst);
            self.shared.open_now.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn query(
        &mut self,
        statement: &str,
        params: Vec<SqlParam>,
    ) -> Result<QueryOutcome, DataAccessError> {
        if !self.open {
            return Err(DataAccessError::NotConnected);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let params: Vec<Value> = params.into_iter().map(param_to_json).collect();
        let mut tables = self.shared.tables.lock().unwrap_or_else(|e| e.into_inner());

        match statement {
            PING => Ok(QueryOutcome::Rows(vec![row(&["1"], &[json!(1)])])),
            book::sql::SELECT_ALL => Ok(QueryOutcome::Rows(
                tables.livros.values().cloned().collect(),
            )),
            book::sql::SELECT_BY_ID => {
                let id = key(&params, 0)?;
                Ok(QueryOutcome::Rows(
                    tables.livros.get(&id).cloned().into_iter().collect(),
                ))
            }
            book::sql::INSERT => insert(&mut tables.livros, &BOOK_COLUMNS, &params),
            book::sql::UPDATE => update(&mut tables.livros, &BOOK_MUTABLE_COLUMNS, &params),
            book::sql::DELETE => delete(&mut tables.livros, &params),
            category::sql::SELECT_ALL => Ok(QueryOutcome::Rows(
                tables.categorias.values().cloned().collect(),
            )),
            category::sql::INSERT => insert(&mut tables.categorias, &CATEGORY_COLUMNS, &params),
            category::sql::UPDATE => {
                update(&mut tables.categorias, &CATEGORY_MUTABLE_COLUMNS, &params)
            }
            category::sql::DELETE => delete(&mut tables.categorias, &params),
            other => Err(DataAccessError::Query(format!(
                "You have an error in your SQL syntax near '{}'",
                other
            ))),
        }
    }

    async fn close(&mut self) -> Result<(), DataAccessError> {
        if self.open {
            self.open = false;
            self.shared.closed.fetch_add(1, Ordering::SeqCst);
            self.shared.open_now.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

fn param_to_json(param: SqlParam) -> Value {
    match param {
        SqlParam::Null => Value::Null,
        SqlParam::Int(v) => json!(v),
        SqlParam::Float(v) => json!(v),
        SqlParam::Text(v) => json!(v),
    }
}

fn row(columns: &[&str], values: &[Value]) -> Row {
    columns
        .iter()
        .zip(values)
        .map(|(c, v)| (c.to_string(), v.clone()))
        .collect()
}

fn coerce(column: &str, kind: Kind, value: &Value) -> Result<Value, DataAccessError> {
    let invalid = |label: &str| {
        DataAccessError::Query(format!(
            "Incorrect {} value: '{}' for column '{}'",
            label, value, column
        ))
    };
    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (Kind::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(json!(i)),
            None => n
                .as_f64()
                .map(|f| json!(f.round() as i64))
                .ok_or_else(|| invalid("integer")),
        },
        (Kind::Integer, Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
                .map(|i| json!(i))
                .ok_or_else(|| invalid("integer"))
        }
        (Kind::Decimal, Value::Number(_)) => Ok(value.clone()),
        (Kind::Decimal, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(|f| json!(f))
            .map_err(|_| invalid("decimal")),
        (Kind::Text, Value::String(_)) => Ok(value.clone()),
        (Kind::Text, Value::Number(n)) => Ok(json!(n.to_string())),
        (Kind::Integer, _) => Err(invalid("integer")),
        (Kind::Decimal, _) => Err(invalid("decimal")),
        (Kind::Text, _) => Ok(json!(value.to_string())),
    }
}

fn key(params: &[Value], index: usize) -> Result<i64, DataAccessError> {
    match params.get(index).map(|v| coerce("id", Kind::Integer, v)) {
        Some(Ok(Value::Number(n))) => n.as_i64().ok_or_else(|| {
            DataAccessError::Query("Incorrect integer value for column 'id'".to_string())
        }),
        Some(Err(e)) => Err(e),
        _ => Err(DataAccessError::Query(
            "Incorrect integer value for column 'id'".to_string(),
        )),
    }
}

/// Coerce each value to its column type; every column is NOT NULL
fn check_columns(columns: &[(&str, Kind)], values: &[Value]) -> Result<Vec<Value>, DataAccessError> {
    if values.len() != columns.len() {
        return Err(DataAccessError::Query(
            "Column count doesn't match value count".to_string(),
        ));
    }
    columns
        .iter()
        .zip(values)
        .map(|((column, kind), value)| {
            if value.is_null() {
                return Err(DataAccessError::Query(format!(
                    "Column '{}' cannot be null",
                    column
                )));
            }
            coerce(column, *kind, value)
        })
        .collect()
}

fn names<'a>(columns: &[(&'a str, Kind)]) -> Vec<&'a str> {
    columns.iter().map(|(name, _)| *name).collect()
}

fn insert(
    table: &mut BTreeMap<i64, Row>,
    columns: &[(&str, Kind)],
    params: &[Value],
) -> Result<QueryOutcome, DataAccessError> {
    let values = check_columns(columns, params)?;
    let id = key(&values, 0)?;
    if table.contains_key(&id) {
        return Err(DataAccessError::Query(format!(
            "Duplicate entry '{}' for key 'PRIMARY'",
            id
        )));
    }
    table.insert(id, row(&names(columns), &values));
    Ok(QueryOutcome::Affected {
        affected_rows: 1,
        last_insert_id: Some(0),
    })
}

/// `params` holds the new column values followed by the id
fn update(
    table: &mut BTreeMap<i64, Row>,
    columns: &[(&str, Kind)],
    params: &[Value],
) -> Result<QueryOutcome, DataAccessError> {
    let (values, id) = params.split_at(params.len().saturating_sub(1));
    let values = check_columns(columns, values)?;
    let id = key(id, 0)?;

    let affected_rows = match table.get_mut(&id) {
        Some(existing) => {
            for ((column, _), value) in columns.iter().zip(values) {
                existing.insert(column.to_string(), value);
            }
            1
        }
        None => 0,
    };
    Ok(QueryOutcome::Affected {
        affected_rows,
        last_insert_id: Some(0),
    })
}

fn delete(table: &mut BTreeMap<i64, Row>, params: &[Value]) -> Result<QueryOutcome, DataAccessError> {
    let id = key(params, 0)?;
    let affected_rows = u64::from(table.remove(&id).is_some());
    Ok(QueryOutcome::Affected {
        affected_rows,
        last_insert_id: Some(0),
    })
}
