// Book repository: CRUD over the `livros` table

use crate::db::gateway::GatewayFactory;
use crate::db::store::SqlParam;
use crate::errors::ResourceError;
use crate::models::{Book, BookChanges, BookDraft, WriteReceipt};
use futures::FutureExt;
use tracing::instrument;

/// Statements issued against `livros`
pub mod sql {
    pub const SELECT_ALL: &str =
        "SELECT id, titulo, autor, preco, imagem, categoria_id, descricao FROM livros";
    pub const SELECT_BY_ID: &str =
        "SELECT id, titulo, autor, preco, imagem, categoria_id, descricao FROM livros WHERE id = ?";
    pub const INSERT: &str = "INSERT INTO livros (id, titulo, autor, preco, imagem, categoria_id, descricao) VALUES (?, ?, ?, ?, ?, ?, ?)";
    pub const UPDATE: &str = "UPDATE livros SET titulo = ?, autor = ?, preco = ?, imagem = ?, descricao = ?, categoria_id = ? WHERE id = ?";
    pub const DELETE: &str = "DELETE FROM livros WHERE id = ?";
}

/// Repository for book-related database operations
///
/// Every operation opens its own gateway and releases it before returning.
#[derive(Debug, Clone)]
pub struct BookRepository {
    gateways: GatewayFactory,
}

impl BookRepository {
    pub fn new(gateways: GatewayFactory) -> Self {
        Self { gateways }
    }

    /// All books in store order
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Book>, ResourceError> {
        let outcome = self
            .gateways
            .open()
            .scoped(|gw| async move { gw.execute(sql::SELECT_ALL, Vec::new()).await }.boxed())
            .await?;

        let books: Vec<Book> = outcome.decode()?;
        tracing::debug!(count = books.len(), "Listed books");
        Ok(books)
    }

    /// The book with `id`, if any
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Book>, ResourceError> {
        let outcome = self
            .gateways
            .open()
            .scoped(move |gw| {
                async move { gw.execute(sql::SELECT_BY_ID, vec![SqlParam::Int(id)]).await }.boxed()
            })
            .await?;

        Ok(outcome.decode::<Book>()?.into_iter().next())
    }

    /// Insert a new book
    ///
    /// The draft is validated before a connection is opened, so a rejected
    /// payload never reaches the store.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: BookDraft) -> Result<WriteReceipt, ResourceError> {
        let book = draft.validate()?;
        let id = book.id.to_string();
        let params = vec![
            SqlParam::from(book.id),
            SqlParam::from(book.titulo),
            SqlParam::from(book.autor),
            SqlParam::from(book.preco),
            SqlParam::from(book.imagem),
            SqlParam::from(book.categoria_id),
            SqlParam::from(book.descricao),
        ];

        let outcome = self
            .gateways
            .open()
            .scoped(move |gw| async move { gw.execute(sql::INSERT, params).await }.boxed())
            .await?;

        tracing::info!(book_id = %id, "Book created successfully");
        Ok(WriteReceipt {
            affected_rows: outcome.affected_rows(),
            insert_id: outcome.last_insert_id(),
        })
    }

    /// Replace every mutable column of the book with `id`
    ///
    /// Reports success even when no row matched.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i64, changes: BookChanges) -> Result<WriteReceipt, ResourceError> {
        let params = vec![
            SqlParam::from(changes.titulo),
            SqlParam::from(changes.autor),
            SqlParam::from(changes.preco),
            SqlParam::from(changes.imagem),
            SqlParam::from(changes.descricao),
            SqlParam::from(changes.categoria_id),
            SqlParam::Int(id),
        ];

        let outcome = self
            .gateways
            .open()
            .scoped(move |gw| async move { gw.execute(sql::UPDATE, params).await }.boxed())
            .await?;

        tracing::info!(
            book_id = id,
            affected_rows = outcome.affected_rows(),
            "Book updated"
        );
        Ok(WriteReceipt {
            affected_rows: outcome.affected_rows(),
            insert_id: None,
        })
    }

    /// Delete the book with `id`; a missing row is not an error
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<WriteReceipt, ResourceError> {
        let outcome = self
            .gateways
            .open()
            .scoped(move |gw| {
                async move { gw.execute(sql::DELETE, vec![SqlParam::Int(id)]).await }.boxed()
            })
            .await?;

        tracing::info!(
            book_id = id,
            affected_rows = outcome.affected_rows(),
            "Book deleted"
        );
        Ok(WriteReceipt {
            affected_rows: outcome.affected_rows(),
            insert_id: None,
        })
    }
}
