// Data models for books and categories

use crate::errors::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A book row in the `livros` table
///
/// Only the key is guaranteed; any other column may come back NULL and is
/// passed through as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub autor: Option<String>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub preco: Option<f64>,
    #[serde(default)]
    pub imagem: Option<String>,
    #[serde(default, deserialize_with = "de::opt_integer")]
    pub categoria_id: Option<i64>,
    #[serde(default)]
    pub descricao: Option<String>,
}

/// A category row in the `categorias` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(default)]
    pub nome: Option<String>,
}

/// Book payload as submitted on creation
///
/// Fields keep the raw JSON the client sent; `validate` only checks that
/// each one is present and truthy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookDraft {
    pub id: Option<Value>,
    pub titulo: Option<Value>,
    pub autor: Option<Value>,
    pub preco: Option<Value>,
    pub imagem: Option<Value>,
    pub categoria_id: Option<Value>,
    pub descricao: Option<Value>,
}

/// A book payload whose every field is present and truthy
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub id: Value,
    pub titulo: Value,
    pub autor: Value,
    pub preco: Value,
    pub imagem: Value,
    pub categoria_id: Value,
    pub descricao: Value,
}

impl BookDraft {
    /// Require every field to be present and truthy
    ///
    /// `null`, `false`, `0` and `""` count as missing. Strings such as `"0"`
    /// are truthy and go to the store unchanged.
    pub fn validate(self) -> Result<NewBook, ValidationError> {
        Ok(NewBook {
            id: required("id", self.id)?,
            titulo: required("titulo", self.titulo)?,
            autor: required("autor", self.autor)?,
            preco: required("preco", self.preco)?,
            imagem: required("imagem", self.imagem)?,
            categoria_id: required("categoria_id", self.categoria_id)?,
            descricao: required("descricao", self.descricao)?,
        })
    }
}

/// Replacement values for a book's mutable columns
///
/// Absent fields are written as NULL; the store decides whether that is
/// acceptable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookChanges {
    pub titulo: Option<Value>,
    pub autor: Option<Value>,
    pub preco: Option<Value>,
    pub imagem: Option<Value>,
    pub descricao: Option<Value>,
    pub categoria_id: Option<Value>,
}

/// Category payload as submitted on creation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryDraft {
    pub id: Option<Value>,
    pub nome: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub id: Value,
    pub nome: Value,
}

impl CategoryDraft {
    pub fn validate(self) -> Result<NewCategory, ValidationError> {
        Ok(NewCategory {
            id: required("id", self.id)?,
            nome: required("nome", self.nome)?,
        })
    }
}

/// Category rename payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryChanges {
    pub nome: Option<Value>,
}

/// Store-assigned metadata returned by a write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReceipt {
    pub affected_rows: u64,
    pub insert_id: Option<u64>,
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn required(field: &'static str, value: Option<Value>) -> Result<Value, ValidationError> {
    match value {
        Some(v) if is_truthy(&v) => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Lenient numeric deserializers for rows
///
/// MySQL returns DECIMAL columns as text.
mod de {
    use super::*;
    use serde::de::Error;

    pub fn opt_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| D::Error::custom("number out of range")),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid number: {s}"))),
            other => Err(D::Error::custom(format!("expected a number, got {other}"))),
        }
    }

    pub fn opt_integer<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Some(i)),
                None => Err(D::Error::custom(format!("expected an integer, got {n}"))),
            },
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid integer: {s}"))),
            other => Err(D::Error::custom(format!("expected an integer, got {other}"))),
        }
    }
}
