use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use livraria_common::config::Settings;
use livraria_common::db::repositories::{BookRepository, CategoryRepository};
use livraria_common::db::{GatewayFactory, StoreConnector};

/// Application state shared across all handlers
///
/// Holds no connection: each request gets its own gateway from `gateways`.
#[derive(Clone)]
pub struct AppState {
    pub gateways: GatewayFactory,
    pub config: Arc<Settings>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        config: Settings,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            gateways: GatewayFactory::new(connector, config.database.query_timeout()),
            config: Arc::new(config),
            metrics,
        }
    }

    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.gateways.clone())
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.gateways.clone())
    }
}
