// Category repository: CRUD over the `categorias` table

use crate::db::gateway::GatewayFactory;
use crate::db::store::SqlParam;
use crate::errors::ResourceError;
use crate::models::{Category, CategoryChanges, CategoryDraft, WriteReceipt};
use futures::FutureExt;
use tracing::instrument;

/// Statements issued against `categorias`
pub mod sql {
    pub const SELECT_ALL: &str = "SELECT id, nome FROM categorias";
    pub const INSERT: &str = "INSERT INTO categorias (id, nome) VALUES (?, ?)";
    pub const UPDATE: &str = "UPDATE categorias SET nome = ? WHERE id = ?";
    pub const DELETE: &str = "DELETE FROM categorias WHERE id = ?";
}

/// Repository for category-related database operations
///
/// Deleting a category does not look at the books referencing it.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    gateways: GatewayFactory,
}

impl CategoryRepository {
    pub fn new(gateways: GatewayFactory) -> Self {
        Self { gateways }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Category>, ResourceError> {
        let outcome = self
            .gateways
            .open()
            .scoped(|gw| async move { gw.execute(sql::SELECT_ALL, Vec::new()).await }.boxed())
            .await?;

        let categories: Vec<Category> = outcome.decode()?;
        tracing::debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }

    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: CategoryDraft) -> Result<WriteReceipt, ResourceError> {
        let category = draft.validate()?;
        let id = category.id.to_string();
        let params = vec![SqlParam::from(category.id), SqlParam::from(category.nome)];

        let outcome = self
            .gateways
            .open()
            .scoped(move |gw| async move { gw.execute(sql::INSERT, params).await }.boxed())
            .await?;

        tracing::info!(category_id = %id, "Category created successfully");
        Ok(WriteReceipt {
            affected_rows: outcome.affected_rows(),
            insert_id: outcome.last_insert_id(),
        })
    }

    /// Rename the category with `id`; success even when no row matched
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i64,
        changes: CategoryChanges,
    ) -> Result<WriteReceipt, ResourceError> {
        let params = vec![SqlParam::from(changes.nome), SqlParam::Int(id)];

        let outcome = self
            .gateways
            .open()
            .scoped(move |gw| async move { gw.execute(sql::UPDATE, params).await }.boxed())
            .await?;

        tracing::info!(
            category_id = id,
            affected_rows = outcome.affected_rows(),
            "Category updated"
        );
        Ok(WriteReceipt {
            affected_rows: outcome.affected_rows(),
            insert_id: None,
        })
    }

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
            category_id = id,
            affected_rows = outcome.affected_rows(),
            "Category deleted"
        );
        Ok(WriteReceipt {
            affected_rows: outcome.affected_rows(),
            insert_id: None,
        })
    }
}
