use std::sync::Arc;

use rust_decimal::Decimal;

use carlot_core::domain::vehicle::VehicleId;
use carlot_core::search::Filter;
use carlot_db::{
    connect_with_settings, migrations, CatalogClient, CatalogRepository, CatalogService,
    DemoCatalog, InMemoryVehicleRepository, SqlVehicleRepository, StorageError,
};

type CatalogTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

async fn seeded_client() -> CatalogTestResult<CatalogClient> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.map_err(|e| e.to_string())?;
    migrations::run_pending(&pool).await.map_err(|e| e.to_string())?;
    DemoCatalog::load(&pool).await.map_err(|e| e.to_string())?;

    let service = CatalogService::new(Arc::new(SqlVehicleRepository::new(pool)));
    Ok(CatalogClient::new(Arc::new(service)))
}

#[tokio::test]
async fn red_cars_under_forty_thousand_round_trip_through_the_client() -> CatalogTestResult {
    let client = seeded_client().await?;
    let filter = Filter::builder()
        .color("Vermelho")
        .price_range(None, Some(Decimal::from(40_000)))
        .build()
        .map_err(|e| e.to_string())?;

    let page = client.search(&filter).await.map_err(|e| e.to_string())?;

    require!(page.total_matched() > 0, "expected at least one red car under 40000");
    require_eq!(page.limit(), 20);
    for vehicle in page.items() {
        require!(vehicle.color.to_lowercase().contains("vermelho"));
        require!(vehicle.price <= Decimal::from(40_000), "price {} above bound", vehicle.price);
    }
    Ok(())
}

#[tokio::test]
async fn limit_one_and_offset_at_total_stay_within_bounds() -> CatalogTestResult {
    let client = seeded_client().await?;
    let total = DemoCatalog::vehicles().len() as u64;

    let first = Filter::builder().limit(1).build().map_err(|e| e.to_string())?;
    let page = client.search(&first).await.map_err(|e| e.to_string())?;
    require_eq!(page.total_shown(), 1);
    require_eq!(page.total_matched(), total);

    let past_end = Filter::builder().offset(total).build().map_err(|e| e.to_string())?;
    let page = client.search(&past_end).await.map_err(|e| e.to_string())?;
    require!(page.is_empty());
    require_eq!(page.total_matched(), total);
    Ok(())
}

#[tokio::test]
async fn get_by_id_distinguishes_missing_records() -> CatalogTestResult {
    let client = seeded_client().await?;

    let found = client.get_by_id(VehicleId(1)).await.map_err(|e| e.to_string())?;
    require_eq!(found.plate, DemoCatalog::vehicles()[0].plate);

    match client.get_by_id(VehicleId(4_242)).await {
        Err(StorageError::NotFound(id)) => require_eq!(id, VehicleId(4_242)),
        other => return Err(format!("expected NotFound, got {other:?}")),
    }
    Ok(())
}

#[tokio::test]
async fn catalog_context_queries_agree_with_demo_data() -> CatalogTestResult {
    let client = seeded_client().await?;
    let vehicles = DemoCatalog::vehicles();

    let brands = client.list_brands().await.map_err(|e| e.to_string())?;
    require!(brands.iter().any(|brand| brand == "Toyota"));

    let statistics = client.statistics().await.map_err(|e| e.to_string())?;
    require_eq!(statistics.total, vehicles.len() as u64);
    let brand_total: u64 = statistics.by_brand.iter().map(|bucket| bucket.count).sum();
    require_eq!(brand_total, statistics.total);

    let cheapest = vehicles.iter().map(|vehicle| vehicle.price).min();
    let prices = client.price_range().await.map_err(|e| e.to_string())?;
    require_eq!(prices.map(|range| range.min), cheapest);

    let oldest = vehicles.iter().map(|vehicle| vehicle.manufacture_year).min();
    let years = client.year_range().await.map_err(|e| e.to_string())?;
    require_eq!(years.map(|range| range.min), oldest);

    let fields = client.field_metadata().await.map_err(|e| e.to_string())?;
    require!(fields.iter().any(|field| field.name == "price"));
    Ok(())
}

#[tokio::test]
async fn sql_and_memory_backends_fold_brand_case_alike() -> CatalogTestResult {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.map_err(|e| e.to_string())?;
    migrations::run_pending(&pool).await.map_err(|e| e.to_string())?;
    DemoCatalog::load(&pool).await.map_err(|e| e.to_string())?;
    sqlx::query("UPDATE vehicles SET brand = 'Citroën' WHERE id = 1")
        .execute(&pool)
        .await
        .map_err(|e| e.to_string())?;

    let memory = InMemoryVehicleRepository::new(DemoCatalog::vehicles());
    let mut citroen = DemoCatalog::vehicles().remove(0);
    citroen.brand = "Citroën".to_string();
    memory.insert(citroen).await;
    let sql = SqlVehicleRepository::new(pool);

    for (needle, expected) in [("citroën", 1), ("CITROëN", 1), ("CITRO", 1), ("CITROËN", 0)] {
        let filter = Filter::builder().brand(needle).build().map_err(|e| e.to_string())?;
        let from_sql = sql.search(&filter).await.map_err(|e| e.to_string())?;
        let from_memory = memory.search(&filter).await.map_err(|e| e.to_string())?;

        require_eq!(from_sql.total_matched(), expected);
        require_eq!(from_memory.total_matched(), expected);
    }
    Ok(())
}
