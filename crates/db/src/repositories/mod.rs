use async_trait::async_trait;
use thiserror::Error;

use carlot_core::domain::catalog::{CatalogStatistics, FieldMetadata, PriceRange, YearRange};
use carlot_core::domain::vehicle::{Vehicle, VehicleId};
use carlot_core::search::{Filter, ResultPage};

pub mod memory;
pub mod vehicle;

pub use memory::InMemoryVehicleRepository;
pub use vehicle::SqlVehicleRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read access to the vehicle catalog. Searches only accept a validated [`Filter`].
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn search(&self, filter: &Filter) -> Result<ResultPage, RepositoryError>;
    async fn find_by_id(&self, id: VehicleId) -> Result<Option<Vehicle>, RepositoryError>;
    /// Distinct brands, sorted.
    async fn list_brands(&self) -> Result<Vec<String>, RepositoryError>;
    async fn price_range(&self) -> Result<Option<PriceRange>, RepositoryError>;
    async fn year_range(&self) -> Result<Option<YearRange>, RepositoryError>;
    async fn statistics(&self) -> Result<CatalogStatistics, RepositoryError>;
    async fn field_metadata(&self) -> Result<Vec<FieldMetadata>, RepositoryError>;
}
