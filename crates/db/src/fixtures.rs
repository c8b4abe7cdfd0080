use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use carlot_core::domain::vehicle::{
    cents_to_price, BodyStyle, FuelType, Transmission, Vehicle, VehicleId,
};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

struct DemoVehicle {
    brand: &'static str,
    model: &'static str,
    manufacture_year: i32,
    model_year: i32,
    engine: &'static str,
    fuel_type: FuelType,
    transmission: Transmission,
    doors: u8,
    body_style: BodyStyle,
    mileage_km: i64,
    color: &'static str,
    price_cents: i64,
    plate: &'static str,
    chassis: &'static str,
    registered_on: (i32, u32, u32),
    last_service_on: Option<(i32, u32, u32)>,
}

/// Fixed demo catalog. Order defines the ids a fresh database assigns.
const DEMO_VEHICLES: &[DemoVehicle] = &[
    DemoVehicle {
        brand: "Toyota",
        model: "Corolla XEi",
        manufacture_year: 2021,
        model_year: 2022,
        engine: "2.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Cvt,
        doors: 4,
        body_style: BodyStyle::Sedan,
        mileage_km: 38_000,
        color: "Prata",
        price_cents: 11_890_000,
        plate: "QRS1A23",
        chassis: "9BRBL3HE0M0100001",
        registered_on: (2024, 1, 15),
        last_service_on: Some((2024, 11, 4)),
    },
    DemoVehicle {
        brand: "Volkswagen",
        model: "Gol",
        manufacture_year: 2015,
        model_year: 2016,
        engine: "1.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Manual,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 98_000,
        color: "Vermelho",
        price_cents: 3_290_000,
        plate: "KLM4B56",
        chassis: "9BWAA05U0FP100002",
        registered_on: (2023, 9, 2),
        last_service_on: None,
    },
    DemoVehicle {
        brand: "Fiat",
        model: "Uno Way",
        manufacture_year: 2016,
        model_year: 2016,
        engine: "1.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Manual,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 87_000,
        color: "Vermelho",
        price_cents: 3_550_000,
        plate: "FGH7C89",
        chassis: "9BD195A4NG0100003",
        registered_on: (2023, 11, 20),
        last_service_on: Some((2024, 6, 12)),
    },
    DemoVehicle {
        brand: "Chevrolet",
        model: "Onix LT",
        manufacture_year: 2020,
        model_year: 2021,
        engine: "1.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Manual,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 45_000,
        color: "Branco",
        price_cents: 6_290_000,
        plate: "BRA2E19",
        chassis: "9BGKS48U0LG100004",
        registered_on: (2024, 2, 8),
        last_service_on: Some((2025, 1, 17)),
    },
    DemoVehicle {
        brand: "Honda",
        model: "Civic EXL",
        manufacture_year: 2019,
        model_year: 2020,
        engine: "2.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Cvt,
        doors: 4,
        body_style: BodyStyle::Sedan,
        mileage_km: 52_000,
        color: "Preto",
        price_cents: 11_250_000,
        plate: "HND3F45",
        chassis: "93HFC2650KZ100005",
        registered_on: (2023, 7, 30),
        last_service_on: Some((2024, 8, 21)),
    },
    DemoVehicle {
        brand: "Hyundai",
        model: "HB20 Comfort",
        manufacture_year: 2019,
        model_year: 2019,
        engine: "1.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Manual,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 61_000,
        color: "Prata",
        price_cents: 5_490_000,
        plate: "HYU5G67",
        chassis: "9BHBG51CAKP100006",
        registered_on: (2024, 3, 11),
        last_service_on: None,
    },
    DemoVehicle {
        brand: "Jeep",
        model: "Compass Longitude",
        manufacture_year: 2021,
        model_year: 2021,
        engine: "2.0 Turbo",
        fuel_type: FuelType::Diesel,
        transmission: Transmission::Automatic,
        doors: 4,
        body_style: BodyStyle::Suv,
        mileage_km: 33_000,
        color: "Cinza",
        price_cents: 16_490_000,
        plate: "JEP6H78",
        chassis: "988675141MK100007",
        registered_on: (2024, 4, 3),
        last_service_on: Some((2025, 2, 14)),
    },
    DemoVehicle {
        brand: "Toyota",
        model: "Hilux SRV",
        manufacture_year: 2020,
        model_year: 2020,
        engine: "2.8",
        fuel_type: FuelType::Diesel,
        transmission: Transmission::Automatic,
        doors: 4,
        body_style: BodyStyle::Pickup,
        mileage_km: 72_000,
        color: "Branco",
        price_cents: 21_990_000,
        plate: "HLX8J90",
        chassis: "8AJFA8CD0L0100008",
        registered_on: (2023, 5, 19),
        last_service_on: Some((2024, 12, 1)),
    },
    DemoVehicle {
        brand: "Renault",
        model: "Kwid Zen",
        manufacture_year: 2022,
        model_year: 2023,
        engine: "1.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Manual,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 12_000,
        color: "Vermelho",
        price_cents: 5_290_000,
        plate: "RNT9K12",
        chassis: "93YRBB001NJ100009",
        registered_on: (2024, 6, 25),
        last_service_on: None,
    },
    DemoVehicle {
        brand: "Ford",
        model: "Ka SE",
        manufacture_year: 2018,
        model_year: 2018,
        engine: "1.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Manual,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 74_000,
        color: "Azul",
        price_cents: 4_190_000,
        plate: "FRD1L34",
        chassis: "9BFZH55L0J8100010",
        registered_on: (2023, 10, 9),
        last_service_on: Some((2024, 3, 28)),
    },
    DemoVehicle {
        brand: "Volkswagen",
        model: "T-Cross Highline",
        manufacture_year: 2022,
        model_year: 2022,
        engine: "1.4 TSI",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Automatic,
        doors: 4,
        body_style: BodyStyle::Suv,
        mileage_km: 21_000,
        color: "Azul",
        price_cents: 14_990_000,
        plate: "VWT2M56",
        chassis: "9BWBH6BF0N4100011",
        registered_on: (2024, 7, 14),
        last_service_on: None,
    },
    DemoVehicle {
        brand: "Fiat",
        model: "Toro Volcano",
        manufacture_year: 2021,
        model_year: 2022,
        engine: "2.0",
        fuel_type: FuelType::Diesel,
        transmission: Transmission::Automatic,
        doors: 4,
        body_style: BodyStyle::Pickup,
        mileage_km: 48_000,
        color: "Vermelho",
        price_cents: 15_990_000,
        plate: "FTR3N78",
        chassis: "988226171NK100012",
        registered_on: (2024, 1, 29),
        last_service_on: Some((2024, 10, 10)),
    },
    DemoVehicle {
        brand: "Chevrolet",
        model: "Celta LT",
        manufacture_year: 2012,
        model_year: 2012,
        engine: "1.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Manual,
        doors: 2,
        body_style: BodyStyle::Hatch,
        mileage_km: 142_000,
        color: "Preto",
        price_cents: 2_290_000,
        plate: "CLT4P90",
        chassis: "9BGRX08X0CG100013",
        registered_on: (2022, 12, 5),
        last_service_on: Some((2023, 12, 18)),
    },
    DemoVehicle {
        brand: "Toyota",
        model: "Yaris XL",
        manufacture_year: 2022,
        model_year: 2023,
        engine: "1.5",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Cvt,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 15_000,
        color: "Branco",
        price_cents: 9_490_000,
        plate: "YRS5Q12",
        chassis: "9BRKB3F30N8100014",
        registered_on: (2024, 8, 2),
        last_service_on: None,
    },
    DemoVehicle {
        brand: "Honda",
        model: "Fit EX",
        manufacture_year: 2017,
        model_year: 2017,
        engine: "1.5",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Cvt,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 81_000,
        color: "Prata",
        price_cents: 6_890_000,
        plate: "HFT6R34",
        chassis: "93HGK5860HZ100015",
        registered_on: (2023, 4, 17),
        last_service_on: Some((2024, 4, 9)),
    },
    DemoVehicle {
        brand: "Nissan",
        model: "Kicks SV",
        manufacture_year: 2020,
        model_year: 2021,
        engine: "1.6",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Cvt,
        doors: 4,
        body_style: BodyStyle::Suv,
        mileage_km: 40_000,
        color: "Cinza",
        price_cents: 9_990_000,
        plate: "NSK7S56",
        chassis: "94DFCAP15LB100016",
        registered_on: (2024, 2, 26),
        last_service_on: Some((2025, 3, 3)),
    },
    DemoVehicle {
        brand: "BYD",
        model: "Dolphin",
        manufacture_year: 2023,
        model_year: 2024,
        engine: "Electric 95 hp",
        fuel_type: FuelType::Electric,
        transmission: Transmission::Automatic,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 8_000,
        color: "Azul",
        price_cents: 14_980_000,
        plate: "BYD8T78",
        chassis: "LGXCE4CB0P0100017",
        registered_on: (2024, 9, 12),
        last_service_on: None,
    },
    DemoVehicle {
        brand: "Toyota",
        model: "Corolla Cross XRX Hybrid",
        manufacture_year: 2023,
        model_year: 2023,
        engine: "1.8 Hybrid",
        fuel_type: FuelType::Hybrid,
        transmission: Transmission::Cvt,
        doors: 4,
        body_style: BodyStyle::Suv,
        mileage_km: 9_000,
        color: "Preto",
        price_cents: 18_990_000,
        plate: "CRX9U90",
        chassis: "9BRKZAAG0P0100018",
        registered_on: (2024, 10, 1),
        last_service_on: None,
    },
    DemoVehicle {
        brand: "Volkswagen",
        model: "Fusca",
        manufacture_year: 1978,
        model_year: 1978,
        engine: "1.6",
        fuel_type: FuelType::Gasoline,
        transmission: Transmission::Manual,
        doors: 2,
        body_style: BodyStyle::Coupe,
        mileage_km: 150_000,
        color: "Amarelo",
        price_cents: 4_500_000,
        plate: "FSC1V23",
        chassis: "BH100019",
        registered_on: (2022, 8, 8),
        last_service_on: Some((2024, 5, 20)),
    },
    DemoVehicle {
        brand: "Mazda",
        model: "MX-5",
        manufacture_year: 2019,
        model_year: 2019,
        engine: "2.0",
        fuel_type: FuelType::Gasoline,
        transmission: Transmission::Manual,
        doors: 2,
        body_style: BodyStyle::Convertible,
        mileage_km: 25_000,
        color: "Vermelho",
        price_cents: 23_990_000,
        plate: "MXF2W45",
        chassis: "JMZND6E70K0100020",
        registered_on: (2023, 3, 3),
        last_service_on: Some((2024, 9, 30)),
    },
    DemoVehicle {
        brand: "Fiat",
        model: "Strada Freedom",
        manufacture_year: 2021,
        model_year: 2021,
        engine: "1.3",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Manual,
        doors: 2,
        body_style: BodyStyle::Pickup,
        mileage_km: 56_000,
        color: "Branco",
        price_cents: 8_990_000,
        plate: "STR3X67",
        chassis: "9BD281A3AMY100021",
        registered_on: (2024, 5, 6),
        last_service_on: None,
    },
    DemoVehicle {
        brand: "Chevrolet",
        model: "Spin LTZ",
        manufacture_year: 2018,
        model_year: 2018,
        engine: "1.8",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Automatic,
        doors: 4,
        body_style: BodyStyle::Van,
        mileage_km: 69_000,
        color: "Prata",
        price_cents: 6_490_000,
        plate: "SPN4Y89",
        chassis: "9BGJB7520JB100022",
        registered_on: (2023, 6, 14),
        last_service_on: Some((2024, 7, 7)),
    },
    DemoVehicle {
        brand: "Peugeot",
        model: "208 Like",
        manufacture_year: 2022,
        model_year: 2022,
        engine: "1.0",
        fuel_type: FuelType::Flex,
        transmission: Transmission::Manual,
        doors: 4,
        body_style: BodyStyle::Hatch,
        mileage_km: 19_000,
        color: "Branco",
        price_cents: 7_290_000,
        plate: "PGT5Z12",
        chassis: "936CLYHZ0NB100023",
        registered_on: (2024, 11, 18),
        last_service_on: None,
    },
    DemoVehicle {
        brand: "Ford",
        model: "Ranger XLS",
        manufacture_year: 2017,
        model_year: 2017,
        engine: "2.2",
        fuel_type: FuelType::Diesel,
        transmission: Transmission::Manual,
        doors: 4,
        body_style: BodyStyle::Pickup,
        mileage_km: 110_000,
        color: "Prata",
        price_cents: 12_990_000,
        plate: "RGR6A34",
        chassis: "8AFAR23L0HJ100024",
        registered_on: (2022, 10, 27),
        last_service_on: Some((2024, 2, 2)),
    },
];

fn timestamp((year, month, day): (i32, u32, u32)) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_default()
}

/// Deterministic demo data used by `seed` and by tests.
pub struct DemoCatalog;

impl DemoCatalog {
    /// The demo vehicles with the ids a freshly migrated database assigns.
    pub fn vehicles() -> Vec<Vehicle> {
        DEMO_VEHICLES
            .iter()
            .enumerate()
            .map(|(index, demo)| Vehicle {
                id: VehicleId(index as i64 + 1),
                brand: demo.brand.to_string(),
                model: demo.model.to_string(),
                manufacture_year: demo.manufacture_year,
                model_year: demo.model_year,
                engine: demo.engine.to_string(),
                fuel_type: demo.fuel_type,
                transmission: demo.transmission,
                doors: demo.doors,
                body_style: demo.body_style,
                mileage_km: demo.mileage_km,
                color: demo.color.to_string(),
                price: cents_to_price(demo.price_cents),
                plate: demo.plate.to_string(),
                chassis: demo.chassis.to_string(),
                registered_at: timestamp(demo.registered_on),
                last_service_at: demo.last_service_on.map(timestamp),
            })
            .collect()
    }

    /// Inserts every demo vehicle whose plate is not present yet.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for vehicle in Self::vehicles() {
            let result = sqlx::query(
                "INSERT INTO vehicles
                    (brand, model, manufacture_year, model_year, engine, fuel_type, transmission,
                     doors, body_style, mileage_km, color, price_cents, plate, chassis,
                     registered_at, last_service_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(plate) DO NOTHING",
            )
            .bind(&vehicle.brand)
            .bind(&vehicle.model)
            .bind(vehicle.manufacture_year)
            .bind(vehicle.model_year)
            .bind(&vehicle.engine)
            .bind(vehicle.fuel_type.as_str())
            .bind(vehicle.transmission.as_str())
            .bind(i64::from(vehicle.doors))
            .bind(vehicle.body_style.as_str())
            .bind(vehicle.mileage_km)
            .bind(&vehicle.color)
            .bind(vehicle.price_cents())
            .bind(&vehicle.plate)
            .bind(&vehicle.chassis)
            .bind(vehicle.registered_at.to_rfc3339())
            .bind(vehicle.last_service_at.map(|timestamp| timestamp.to_rfc3339()))
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        let total = DEMO_VEHICLES.len() as u64;
        Ok(SeedResult { inserted, skipped: total.saturating_sub(inserted) })
    }

    /// Reports which demo plates are missing from the store.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut missing_plates = Vec::new();
        for demo in DEMO_VEHICLES {
            let exists: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vehicles WHERE plate = ?1)")
                    .bind(demo.plate)
                    .fetch_one(pool)
                    .await?;
            if exists == 0 {
                missing_plates.push(demo.plate);
            }
        }

        Ok(VerificationResult { all_present: missing_plates.is_empty(), missing_plates })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub inserted: u64,
    pub skipped: u64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub missing_plates: Vec<&'static str>,
}
