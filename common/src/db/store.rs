// Store abstraction: connection establishment and parameterized execution

use crate::errors::DataAccessError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// One result row keyed by column name
pub type Row = Map<String, Value>;

/// A positional query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(v)
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

/// A submitted JSON value bound as-is; the store coerces it to the column type
impl From<Value> for SqlParam {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Int(i64::from(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Int(i),
                None => SqlParam::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => SqlParam::Text(s),
            other => SqlParam::Text(other.to_string()),
        }
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

/// Result of a single statement
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Rows in the order the store returned them
    Rows(Vec<Row>),
    /// Write metadata
    Affected {
        affected_rows: u64,
        last_insert_id: Option<u64>,
    },
}

impl QueryOutcome {
    /// Rows of a read; a write yields no rows
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryOutcome::Rows(rows) => rows,
            QueryOutcome::Affected { .. } => Vec::new(),
        }
    }

    pub fn affected_rows(&self) -> u64 {
        match self {
            QueryOutcome::Rows(rows) => rows.len() as u64,
            QueryOutcome::Affected { affected_rows, .. } => *affected_rows,
        }
    }

    pub fn last_insert_id(&self) -> Option<u64> {
        match self {
            QueryOutcome::Rows(_) => None,
            QueryOutcome::Affected { last_insert_id, .. } => *last_insert_id,
        }
    }

    /// Decode every row into `T`
    pub fn decode<T: DeserializeOwned>(self) -> Result<Vec<T>, DataAccessError> {
        self.into_rows()
            .into_iter()
            .map(|row| {
                serde_json::from_value(Value::Object(row))
                    .map_err(|e| DataAccessError::Query(format!("Unexpected row shape: {}", e)))
            })
            .collect()
    }
}

/// A live connection owned by exactly one gateway
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreConnection: Send {
    /// Run one parameterized statement
    async fn query(
        &mut self,
        statement: &str,
        params: Vec<SqlParam>,
    ) -> Result<QueryOutcome, DataAccessError>;

    /// Close the connection; the handle is dropped afterwards
    async fn close(&mut self) -> Result<(), DataAccessError>;
}

/// Opens fresh connections; shared read-only across requests
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, DataAccessError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        id: i64,
        nome: String,
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_decode_rows_in_order() {
        let outcome = QueryOutcome::Rows(vec![
            row(json!({"id": 2, "nome": "Poesia"})),
            row(json!({"id": 1, "nome": "Ficção"})),
        ]);
        let decoded: Vec<Named> = outcome.decode().unwrap();
        assert_eq!(decoded[0].id, 2);
        assert_eq!(decoded[1].nome, "Ficção");
    }

    #[test]
    fn test_decode_reports_shape_mismatch_as_query_error() {
        let outcome = QueryOutcome::Rows(vec![row(json!({"id": "x"}))]);
        let result: Result<Vec<Named>, _> = outcome.decode();
        assert!(matches!(result, Err(DataAccessError::Query(_))));
    }

    #[test]
    fn test_write_outcome_metadata() {
        let outcome = QueryOutcome::Affected {
            affected_rows: 1,
            last_insert_id: Some(0),
        };
        assert_eq!(outcome.affected_rows(), 1);
        assert_eq!(outcome.last_insert_id(), Some(0));
        assert!(outcome.into_rows().is_empty());
    }

    #[test]
    fn test_optional_params_become_null() {
        assert_eq!(SqlParam::from(None::<String>), SqlParam::Null);
        assert_eq!(SqlParam::from(Some(3_i64)), SqlParam::Int(3));
        assert_eq!(SqlParam::from(None::<Value>), SqlParam::Null);
    }

    #[test]
    fn test_json_values_bind_by_their_own_type() {
        assert_eq!(SqlParam::from(json!(7)), SqlParam::Int(7));
        assert_eq!(SqlParam::from(json!(29.9)), SqlParam::Float(29.9));
        assert_eq!(SqlParam::from(json!("0")), SqlParam::Text("0".to_string()));
        assert_eq!(SqlParam::from(json!(true)), SqlParam::Int(1));
        assert_eq!(SqlParam::from(json!(null)), SqlParam::Null);
    }
}
