// MySQL store connector built on mysql_async
//
// Every `connect` opens a dedicated connection (no pool); the gateway that
// receives it is its only owner.

use crate::config::DatabaseConfig;
use crate::db::store::{QueryOutcome, Row, SqlParam, StoreConnection, StoreConnector};
use crate::errors::DataAccessError;
use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Params, Value};
use serde_json::json;
use std::time::Duration;

/// Opens MySQL connections from the database section of the settings
#[derive(Clone)]
pub struct MySqlConnector {
    opts: Opts,
    connect_timeout: Duration,
}

impl MySqlConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        let opts = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.name.clone()));

        Self {
            opts: opts.into(),
            connect_timeout: config.connect_timeout(),
        }
    }
}

impl std::fmt::Debug for MySqlConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConnector")
            .field("host", &self.opts.ip_or_hostname())
            .field("port", &self.opts.tcp_port())
            .field("db_name", &self.opts.db_name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StoreConnector for MySqlConnector {
    #[tracing::instrument(skip(self), fields(database_type = "mysql", host = %self.opts.ip_or_hostname()))]
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, DataAccessError> {
        tracing::debug!("Connecting to MySQL database");

        let conn = tokio::time::timeout(self.connect_timeout, Conn::new(self.opts.clone()))
            .await
            .map_err(|_| {
                DataAccessError::Connection(format!(
                    "Timed out connecting to MySQL after {:?}",
                    self.connect_timeout
                ))
            })?
            .map_err(|e| {
                DataAccessError::Connection(format!("Failed to connect to MySQL: {}", e))
            })?;

        Ok(Box::new(MySqlConnection { conn: Some(conn) }))
    }
}

/// A single live MySQL connection
pub struct MySqlConnection {
    conn: Option<Conn>,
}

#[async_trait]
impl StoreConnection for MySqlConnection {
    async fn query(
        &mut self,
        statement: &str,
        params: Vec<SqlParam>,
    ) -> Result<QueryOutcome, DataAccessError> {
        let conn = self.conn.as_mut().ok_or(DataAccessError::NotConnected)?;
        let params = to_mysql_params(params);

        if is_read_statement(statement) {
            let rows: Vec<mysql_async::Row> = conn.exec(statement, params).await.map_err(|e| {
                DataAccessError::Query(format!("MySQL query failed: {}", e))
            })?;
            tracing::debug!("MySQL query returned {} rows", rows.len());
            Ok(QueryOutcome::Rows(rows.into_iter().map(row_to_json).collect()))
        } else {
            conn.exec_drop(statement, params).await.map_err(|e| {
                DataAccessError::Query(format!("MySQL statement failed: {}", e))
            })?;
            Ok(QueryOutcome::Affected {
                affected_rows: conn.affected_rows(),
                last_insert_id: conn.last_insert_id(),
            })
        }
    }

    async fn close(&mut self) -> Result<(), DataAccessError> {
        match self.conn.take() {
            Some(conn) => conn.disconnect().await.map_err(|e| {
                DataAccessError::Connection(format!("Failed to disconnect from MySQL: {}", e))
            }),
            None => Ok(()),
        }
    }
}

/// Statements that produce a result set
fn is_read_statement(statement: &str) -> bool {
    let head = statement
        .trim_start()
        .split_whitespace()
        .next()
        .unwrap_or_default();
    ["SELECT", "SHOW", "DESCRIBE", "EXPLAIN"]
        .iter()
        .any(|kw| head.eq_ignore_ascii_case(kw))
}

fn to_mysql_params(params: Vec<SqlParam>) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }
    Params::Positional(params.into_iter().map(to_mysql_value).collect())
}

fn to_mysql_value(param: SqlParam) -> Value {
    match param {
        SqlParam::Null => Value::NULL,
        SqlParam::Int(v) => Value::Int(v),
        SqlParam::Float(v) => Value::Double(v),
        SqlParam::Text(v) => Value::Bytes(v.into_bytes()),
    }
}

fn row_to_json(row: mysql_async::Row) -> Row {
    let mut row_map = Row::new();
    let columns = row.columns_ref();

    for (i, column) in columns.iter().enumerate() {
        let value = row.as_ref(i).map_or(serde_json::Value::Null, value_to_json);
        row_map.insert(column.name_str().to_string(), value);
    }

    row_map
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::NULL => serde_json::Value::Null,
        Value::Bytes(bytes) => json!(String::from_utf8_lossy(bytes)),
        Value::Int(v) => json!(v),
        Value::UInt(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::Double(v) => json!(v),
        Value::Date(year, month, day, hour, minute, second, _micros) => json!(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        )),
        Value::Time(negative, days, hours, minutes, seconds, _micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            json!(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}"))
        }
    }
}
