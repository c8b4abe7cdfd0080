//! Request/response boundary in front of the catalog repository.
//!
//! Callers send a [`CatalogRequest`] naming one method and its params; the
//! service answers with a [`CatalogResponse`] carrying either a JSON result or
//! an error message. [`CatalogClient`] wraps the exchange with typed methods.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use carlot_core::domain::catalog::{CatalogStatistics, FieldMetadata, PriceRange, YearRange};
use carlot_core::domain::vehicle::{Vehicle, VehicleId};
use carlot_core::search::{Filter, FilterLimits, ResultPage};

use crate::repositories::{CatalogRepository, RepositoryError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogMethod {
    Search,
    GetById,
    ListBrands,
    PriceRange,
    YearRange,
    Statistics,
    FieldMetadata,
}

impl CatalogMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::GetById => "get_by_id",
            Self::ListBrands => "list_brands",
            Self::PriceRange => "price_range",
            Self::YearRange => "year_range",
            Self::Statistics => "statistics",
            Self::FieldMetadata => "field_metadata",
        }
    }
}

impl fmt::Display for CatalogMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogMethod {
    type Err = StorageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "search" => Ok(Self::Search),
            "get_by_id" => Ok(Self::GetById),
            "list_brands" => Ok(Self::ListBrands),
            "price_range" => Ok(Self::PriceRange),
            "year_range" => Ok(Self::YearRange),
            "statistics" => Ok(Self::Statistics),
            "field_metadata" => Ok(Self::FieldMetadata),
            other => Err(StorageError::UnknownMethod(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogRequest {
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl CatalogRequest {
    pub fn new(method: CatalogMethod, params: Map<String, Value>) -> Self {
        Self { method: method.as_str().to_string(), params }
    }

    pub fn without_params(method: CatalogMethod) -> Self {
        Self::new(method, Map::new())
    }
}

/// Exactly one of `result` and `error` is populated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogResponse {
    result: Option<Value>,
    error: Option<String>,
}

impl CatalogResponse {
    pub fn ok(result: Value) -> Self {
        Self { result: Some(result), error: None }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self { result: None, error: Some(message.into()) }
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn into_result(self) -> Result<Value, String> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(error),
            (Some(result), None) => Ok(result),
            (None, None) => Err("empty catalog response".to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unknown catalog method `{0}`")]
    UnknownMethod(String),
    #[error("invalid request params: {0}")]
    InvalidParams(String),
    #[error("vehicle `{0}` was not found")]
    NotFound(VehicleId),
    #[error("catalog storage failed: {0}")]
    Storage(String),
    #[error("malformed catalog payload: {0}")]
    Malformed(String),
}

impl From<RepositoryError> for StorageError {
    fn from(error: RepositoryError) -> Self {
        Self::Storage(error.to_string())
    }
}

pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
    limits: FilterLimits,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn CatalogRepository>) -> Self {
        Self { repository, limits: FilterLimits::default() }
    }

    pub fn with_limits(mut self, limits: FilterLimits) -> Self {
        self.limits = limits;
        self
    }

    pub async fn handle(&self, request: &CatalogRequest) -> CatalogResponse {
        match self.dispatch(request).await {
            Ok(result) => CatalogResponse::ok(result),
            Err(error) => {
                warn!(
                    event_name = "catalog.request_failed",
                    method = %request.method,
                    error = %error,
                    "catalog request failed"
                );
                CatalogResponse::err(error.to_string())
            }
        }
    }

    async fn dispatch(&self, request: &CatalogRequest) -> Result<Value, StorageError> {
        let method: CatalogMethod = request.method.parse()?;
        debug!(event_name = "catalog.request", method = %method, "handling catalog request");

        match method {
            CatalogMethod::Search => {
                let filter = Filter::from_map_with(&request.params, &self.limits)
                    .map_err(|e| StorageError::InvalidParams(e.to_string()))?;
                let page = self.repository.search(&filter).await?;
                Ok(json!({
                    "total_matched": page.total_matched(),
                    "total_shown": page.total_shown(),
                    "offset": page.offset(),
                    "limit": page.limit(),
                    "items": to_value(page.items())?,
                }))
            }
            CatalogMethod::GetById => {
                let id = request
                    .params
                    .get("id")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| StorageError::InvalidParams("`id` must be an integer".into()))?;
                let vehicle = self.repository.find_by_id(VehicleId(id)).await?;
                to_value(&vehicle)
            }
            CatalogMethod::ListBrands => to_value(&self.repository.list_brands().await?),
            CatalogMethod::PriceRange => to_value(&self.repository.price_range().await?),
            CatalogMethod::YearRange => to_value(&self.repository.year_range().await?),
            CatalogMethod::Statistics => to_value(&self.repository.statistics().await?),
            CatalogMethod::FieldMetadata => to_value(&self.repository.field_metadata().await?),
        }
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, StorageError> {
    serde_json::to_value(value).map_err(|e| StorageError::Malformed(e.to_string()))
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, StorageError> {
    serde_json::from_value(value).map_err(|e| StorageError::Malformed(e.to_string()))
}

#[derive(Deserialize)]
struct SearchPayload {
    total_matched: u64,
    offset: u64,
    limit: u32,
    items: Vec<Vehicle>,
}

/// Typed calls over [`CatalogService`].
#[derive(Clone)]
pub struct CatalogClient {
    service: Arc<CatalogService>,
}

impl CatalogClient {
    pub fn new(service: Arc<CatalogService>) -> Self {
        Self { service }
    }

    async fn call(&self, request: CatalogRequest) -> Result<Value, StorageError> {
        self.service.handle(&request).await.into_result().map_err(StorageError::Storage)
    }

    pub async fn search(&self, filter: &Filter) -> Result<ResultPage, StorageError> {
        let value = self.call(CatalogRequest::new(CatalogMethod::Search, filter.to_map())).await?;
        let payload: SearchPayload = from_value(value)?;
        Ok(ResultPage::new(payload.total_matched, payload.items, payload.limit, payload.offset))
    }

    pub async fn get_by_id(&self, id: VehicleId) -> Result<Vehicle, StorageError> {
        let mut params = Map::new();
        params.insert("id".to_string(), Value::from(id.0));
        let value = self.call(CatalogRequest::new(CatalogMethod::GetById, params)).await?;
        let vehicle: Option<Vehicle> = from_value(value)?;
        vehicle.ok_or(StorageError::NotFound(id))
    }

    pub async fn list_brands(&self) -> Result<Vec<String>, StorageError> {
        from_value(self.call(CatalogRequest::without_params(CatalogMethod::ListBrands)).await?)
    }

    pub async fn price_range(&self) -> Result<Option<PriceRange>, StorageError> {
        from_value(self.call(CatalogRequest::without_params(CatalogMethod::PriceRange)).await?)
    }

    pub async fn year_range(&self) -> Result<Option<YearRange>, StorageError> {
        from_value(self.call(CatalogRequest::without_params(CatalogMethod::YearRange)).await?)
    }

    pub async fn statistics(&self) -> Result<CatalogStatistics, StorageError> {
        from_value(self.call(CatalogRequest::without_params(CatalogMethod::Statistics)).await?)
    }

    pub async fn field_metadata(&self) -> Result<Vec<FieldMetadata>, StorageError> {
        from_value(self.call(CatalogRequest::without_params(CatalogMethod::FieldMetadata)).await?)
    }
}
