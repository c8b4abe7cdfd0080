use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::{connect_with_settings, migrations::MIGRATOR};

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "vehicles",
        "idx_vehicles_brand",
        "idx_vehicles_model",
        "idx_vehicles_manufacture_year",
        "idx_vehicles_price_cents",
        "idx_vehicles_brand_model",
        "idx_vehicles_price_year",
    ];

    #[tokio::test]
    async fn migrations_create_vehicle_table() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let vehicle_count = sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = 'vehicles'",
        )
        .fetch_one(&pool)
        .await
        .expect("check vehicles table")
        .get::<i64, _>("count");

        assert_eq!(vehicle_count, 1);
    }

    #[tokio::test]
    async fn plate_and_chassis_are_unique() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let insert = "INSERT INTO vehicles
                (brand, model, manufacture_year, model_year, engine, fuel_type, transmission,
                 doors, body_style, mileage_km, color, price_cents, plate, chassis, registered_at)
             VALUES ('Fiat', 'Argo', 2021, 2022, '1.0', 'flex', 'manual', 4, 'hatch', 1000,
                     'Branco', 6500000, ?, ?, '2024-01-01T00:00:00Z')";

        sqlx::query(insert).bind("ABC1D23").bind("CHASSIS-1").execute(&pool).await.expect("insert");
        let duplicate_plate =
            sqlx::query(insert).bind("ABC1D23").bind("CHASSIS-2").execute(&pool).await;
        let duplicate_chassis =
            sqlx::query(insert).bind("XYZ9K87").bind("CHASSIS-1").execute(&pool).await;

        assert!(duplicate_plate.is_err());
        assert!(duplicate_chassis.is_err());
    }

    #[tokio::test]
    async fn migrations_up_down_up_preserves_schema_signature() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let initial_signature = managed_schema_signature(&pool).await;
        assert_eq!(
            initial_signature.len(),
            MANAGED_SCHEMA_OBJECTS.len(),
            "initial migration pass should create all managed schema objects",
        );

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");

        let after_down_signature = managed_schema_signature(&pool).await;
        assert!(
            after_down_signature.is_empty(),
            "managed schema objects should be removed after full undo",
        );

        run_pending(&pool).await.expect("re-run migrations");

        let after_second_up_signature = managed_schema_signature(&pool).await;
        assert_eq!(
            after_second_up_signature, initial_signature,
            "up/down/up should preserve migration-managed schema signature",
        );
    }

    async fn managed_schema_signature(pool: &sqlx::SqlitePool) -> Vec<(String, String, String)> {
        let mut signature: Vec<(String, String, String)> = sqlx::query(
            "SELECT type, name, IFNULL(sql, '') AS sql
             FROM sqlite_master
             WHERE type IN ('table', 'index')",
        )
        .fetch_all(pool)
        .await
        .expect("load schema objects")
        .into_iter()
        .filter_map(|row| {
            let name = row.get::<String, _>("name");
            if MANAGED_SCHEMA_OBJECTS.contains(&name.as_str()) {
                Some((row.get::<String, _>("type"), name, row.get::<String, _>("sql")))
            } else {
                None
            }
        })
        .collect();
        signature.sort();
        signature
    }
}
