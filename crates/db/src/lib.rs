pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod query;
pub mod repositories;
pub mod service;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{DemoCatalog, SeedResult, VerificationResult};
pub use repositories::{
    CatalogRepository, InMemoryVehicleRepository, RepositoryError, SqlVehicleRepository,
};
pub use service::{
    CatalogClient, CatalogMethod, CatalogRequest, CatalogResponse, CatalogService, StorageError,
};
