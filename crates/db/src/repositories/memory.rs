use std::cmp::Ordering;
use std::collections::BTreeMap;

use tokio::sync::RwLock;

use carlot_core::domain::catalog::{
    describe_column, sort_buckets, CatalogStatistics, CountBucket, FieldMetadata, PriceRange,
    YearRange, VEHICLE_COLUMNS,
};
use carlot_core::domain::vehicle::{cents_to_price, Vehicle, VehicleId};
use carlot_core::search::{Filter, OrderBy, ResultPage};

use super::{CatalogRepository, RepositoryError};

/// Evaluates the same predicates as the SQL repository, over a vector.
#[derive(Default)]
pub struct InMemoryVehicleRepository {
    vehicles: RwLock<Vec<Vehicle>>,
}

impl InMemoryVehicleRepository {
    pub fn new(vehicles: Vec<Vehicle>) -> Self {
        Self { vehicles: RwLock::new(vehicles) }
    }

    pub async fn insert(&self, vehicle: Vehicle) {
        let mut vehicles = self.vehicles.write().await;
        vehicles.retain(|existing| existing.id != vehicle.id);
        vehicles.push(vehicle);
    }

    pub async fn remove(&self, id: VehicleId) -> Option<Vehicle> {
        let mut vehicles = self.vehicles.write().await;
        let index = vehicles.iter().position(|vehicle| vehicle.id == id)?;
        Some(vehicles.remove(index))
    }
}

fn compare(order_by: Option<OrderBy>, left: &Vehicle, right: &Vehicle) -> Ordering {
    let primary = match order_by {
        None => Ordering::Equal,
        Some(OrderBy::PriceAsc) => left.price_cents().cmp(&right.price_cents()),
        Some(OrderBy::PriceDesc) => right.price_cents().cmp(&left.price_cents()),
        Some(OrderBy::MileageAsc) => left.mileage_km.cmp(&right.mileage_km),
        Some(OrderBy::YearDesc) => right.manufacture_year.cmp(&left.manufacture_year),
    };
    primary.then_with(|| left.id.cmp(&right.id))
}

fn buckets<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<CountBucket> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut buckets: Vec<CountBucket> = counts
        .into_iter()
        .map(|(label, count)| CountBucket { label: label.to_string(), count })
        .collect();
    sort_buckets(&mut buckets);
    buckets
}

fn price_range_of(vehicles: &[Vehicle]) -> Option<PriceRange> {
    let min = vehicles.iter().map(Vehicle::price_cents).min()?;
    let max = vehicles.iter().map(Vehicle::price_cents).max()?;
    let sum: i128 = vehicles.iter().map(|vehicle| i128::from(vehicle.price_cents())).sum();
    let average = (sum as f64 / vehicles.len() as f64).round() as i64;
    Some(PriceRange {
        min: cents_to_price(min),
        max: cents_to_price(max),
        average: cents_to_price(average),
    })
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryVehicleRepository {
    async fn search(&self, filter: &Filter) -> Result<ResultPage, RepositoryError> {
        let vehicles = self.vehicles.read().await;
        let mut matched: Vec<&Vehicle> =
            vehicles.iter().filter(|vehicle| filter.matches(vehicle)).collect();
        matched.sort_by(|left, right| compare(filter.order_by(), left, right));

        let total = matched.len() as u64;
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(offset)
            .take(filter.limit() as usize)
            .cloned()
            .collect();

        Ok(ResultPage::new(total, items, filter.limit(), filter.offset()))
    }

    async fn find_by_id(&self, id: VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles.iter().find(|vehicle| vehicle.id == id).cloned())
    }

    async fn list_brands(&self) -> Result<Vec<String>, RepositoryError> {
        let vehicles = self.vehicles.read().await;
        let mut brands: Vec<String> =
            vehicles.iter().map(|vehicle| vehicle.brand.clone()).collect();
        brands.sort();
        brands.dedup();
        Ok(brands)
    }

    async fn price_range(&self) -> Result<Option<PriceRange>, RepositoryError> {
        let vehicles = self.vehicles.read().await;
        Ok(price_range_of(&vehicles))
    }

    async fn year_range(&self) -> Result<Option<YearRange>, RepositoryError> {
        let vehicles = self.vehicles.read().await;
        let min = vehicles.iter().map(|vehicle| vehicle.manufacture_year).min();
        let max = vehicles.iter().map(|vehicle| vehicle.manufacture_year).max();
        Ok(min.zip(max).map(|(min, max)| YearRange { min, max }))
    }

    async fn statistics(&self) -> Result<CatalogStatistics, RepositoryError> {
        let vehicles = self.vehicles.read().await;
        Ok(CatalogStatistics {
            total: vehicles.len() as u64,
            by_brand: buckets(vehicles.iter().map(|vehicle| vehicle.brand.as_str())),
            by_fuel_type: buckets(vehicles.iter().map(|vehicle| vehicle.fuel_type.as_str())),
            by_transmission: buckets(
                vehicles.iter().map(|vehicle| vehicle.transmission.as_str()),
            ),
            price_range: price_range_of(&vehicles),
        })
    }

    async fn field_metadata(&self) -> Result<Vec<FieldMetadata>, RepositoryError> {
        Ok(VEHICLE_COLUMNS
            .iter()
            .map(|(column, sql_type)| describe_column(column, sql_type))
            .collect())
    }
}
