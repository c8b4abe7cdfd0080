use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};
use tracing::debug;

use carlot_core::domain::catalog::{
    describe_column, CatalogStatistics, CountBucket, FieldMetadata, PriceRange, YearRange,
};
use carlot_core::domain::vehicle::{cents_to_price, Vehicle, VehicleId};
use carlot_core::search::{Filter, ResultPage};

use super::{CatalogRepository, RepositoryError};
use crate::query::{count_query, page_query, SELECT_VEHICLE};
use crate::DbPool;

pub struct SqlVehicleRepository {
    pool: DbPool,
}

impl SqlVehicleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn count_by(&self, column: &'static str) -> Result<Vec<CountBucket>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {column} AS label, COUNT(*) AS count
             FROM vehicles
             GROUP BY {column}
             ORDER BY count DESC, label ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let count: i64 = column_value(row, "count")?;
                Ok(CountBucket { label: column_value(row, "label")?, count: to_u64(count)? })
            })
            .collect()
    }
}

fn column_value<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn to_u64(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| RepositoryError::Decode(format!("negative count {value}")))
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column} `{value}`: {e}")))
}

pub(crate) fn row_to_vehicle(row: &SqliteRow) -> Result<Vehicle, RepositoryError> {
    let fuel_type: String = column_value(row, "fuel_type")?;
    let transmission: String = column_value(row, "transmission")?;
    let body_style: String = column_value(row, "body_style")?;
    let doors: i64 = column_value(row, "doors")?;
    let price_cents: i64 = column_value(row, "price_cents")?;
    let registered_at: String = column_value(row, "registered_at")?;
    let last_service_at: Option<String> = column_value(row, "last_service_at")?;

    Ok(Vehicle {
        id: VehicleId(column_value(row, "id")?),
        brand: column_value(row, "brand")?,
        model: column_value(row, "model")?,
        manufacture_year: column_value(row, "manufacture_year")?,
        model_year: column_value(row, "model_year")?,
        engine: column_value(row, "engine")?,
        fuel_type: fuel_type.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?,
        transmission: transmission.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?,
        doors: u8::try_from(doors)
            .map_err(|_| RepositoryError::Decode(format!("doors out of range: {doors}")))?,
        body_style: body_style.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?,
        mileage_km: column_value(row, "mileage_km")?,
        color: column_value(row, "color")?,
        price: cents_to_price(price_cents),
        plate: column_value(row, "plate")?,
        chassis: column_value(row, "chassis")?,
        registered_at: parse_timestamp("registered_at", &registered_at)?,
        last_service_at: last_service_at
            .as_deref()
            .map(|value| parse_timestamp("last_service_at", value))
            .transpose()?,
    })
}

#[async_trait::async_trait]
impl CatalogRepository for SqlVehicleRepository {
    async fn search(&self, filter: &Filter) -> Result<ResultPage, RepositoryError> {
        let mut count = count_query(filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut page = page_query(filter);
        let rows = page.build().fetch_all(&self.pool).await?;
        let items = rows.iter().map(row_to_vehicle).collect::<Result<Vec<_>, _>>()?;

        debug!(
            event_name = "catalog.search",
            total_matched = total,
            returned = items.len(),
            limit = filter.limit(),
            offset = filter.offset(),
            "catalog search executed"
        );

        Ok(ResultPage::new(to_u64(total)?, items, filter.limit(), filter.offset()))
    }

    async fn find_by_id(&self, id: VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_VEHICLE} WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_vehicle).transpose()
    }

    async fn list_brands(&self) -> Result<Vec<String>, RepositoryError> {
        let brands = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT brand FROM vehicles ORDER BY brand ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(brands)
    }

    async fn price_range(&self) -> Result<Option<PriceRange>, RepositoryError> {
        let row = sqlx::query(
            "SELECT MIN(price_cents) AS min_cents,
                    MAX(price_cents) AS max_cents,
                    AVG(price_cents) AS avg_cents
             FROM vehicles",
        )
        .fetch_one(&self.pool)
        .await?;

        let min: Option<i64> = column_value(&row, "min_cents")?;
        let max: Option<i64> = column_value(&row, "max_cents")?;
        let average: Option<f64> = column_value(&row, "avg_cents")?;

        Ok(match (min, max, average) {
            (Some(min), Some(max), Some(average)) => Some(PriceRange {
                min: cents_to_price(min),
                max: cents_to_price(max),
                average: cents_to_price(average.round() as i64),
            }),
            _ => None,
        })
    }

    async fn year_range(&self) -> Result<Option<YearRange>, RepositoryError> {
        let row = sqlx::query(
            "SELECT MIN(manufacture_year) AS min_year, MAX(manufacture_year) AS max_year
             FROM vehicles",
        )
        .fetch_one(&self.pool)
        .await?;

        let min: Option<i32> = column_value(&row, "min_year")?;
        let max: Option<i32> = column_value(&row, "max_year")?;
        Ok(min.zip(max).map(|(min, max)| YearRange { min, max }))
    }

    async fn statistics(&self) -> Result<CatalogStatistics, RepositoryError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vehicles").fetch_one(&self.pool).await?;

        Ok(CatalogStatistics {
            total: to_u64(total)?,
            by_brand: self.count_by("brand").await?,
            by_fuel_type: self.count_by("fuel_type").await?,
            by_transmission: self.count_by("transmission").await?,
            price_range: self.price_range().await?,
        })
    }

    async fn field_metadata(&self) -> Result<Vec<FieldMetadata>, RepositoryError> {
        let rows = sqlx::query("PRAGMA table_info(vehicles)").fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let name: String = column_value(row, "name")?;
                let sql_type: String = column_value(row, "type")?;
                Ok(describe_column(&name, &sql_type))
            })
            .collect()
    }
}
