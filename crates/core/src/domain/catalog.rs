use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price spread over the whole catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
    pub average: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBucket {
    pub label: String,
    pub count: u64,
}

/// Aggregate view of the catalog, buckets sorted by count then label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    pub total: u64,
    pub by_brand: Vec<CountBucket>,
    pub by_fuel_type: Vec<CountBucket>,
    pub by_transmission: Vec<CountBucket>,
    pub price_range: Option<PriceRange>,
}

/// A user-facing description of one catalog attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    pub label: String,
    pub data_type: String,
}

/// Physical columns of the `vehicles` table and their SQLite types.
pub const VEHICLE_COLUMNS: &[(&str, &str)] = &[
    ("id", "INTEGER"),
    ("brand", "TEXT"),
    ("model", "TEXT"),
    ("manufacture_year", "INTEGER"),
    ("model_year", "INTEGER"),
    ("engine", "TEXT"),
    ("fuel_type", "TEXT"),
    ("transmission", "TEXT"),
    ("doors", "INTEGER"),
    ("body_style", "TEXT"),
    ("mileage_km", "INTEGER"),
    ("color", "TEXT"),
    ("price_cents", "INTEGER"),
    ("plate", "TEXT"),
    ("chassis", "TEXT"),
    ("registered_at", "TEXT"),
    ("last_service_at", "TEXT"),
];

/// Maps a storage column to the name and label shown to users.
pub fn describe_column(column: &str, sql_type: &str) -> FieldMetadata {
    let (name, label, data_type) = match column {
        "id" => ("id", "Identifier", "integer"),
        "brand" => ("brand", "Brand", "text"),
        "model" => ("model", "Model", "text"),
        "manufacture_year" => ("manufacture_year", "Manufacture year", "integer"),
        "model_year" => ("model_year", "Model year", "integer"),
        "engine" => ("engine", "Engine", "text"),
        "fuel_type" => ("fuel_type", "Fuel type", "text"),
        "transmission" => ("transmission", "Transmission", "text"),
        "doors" => ("doors", "Number of doors", "integer"),
        "body_style" => ("body_style", "Body style", "text"),
        "mileage_km" => ("mileage_km", "Mileage (km)", "integer"),
        "color" => ("color", "Color", "text"),
        "price_cents" => ("price", "Price", "decimal"),
        "plate" => ("plate", "License plate", "text"),
        "chassis" => ("chassis", "Chassis number", "text"),
        "registered_at" => ("registered_at", "Registration date", "date"),
        "last_service_at" => ("last_service_at", "Last service date", "date"),
        other => {
            return FieldMetadata {
                name: other.to_string(),
                label: other.replace('_', " "),
                data_type: sql_type.to_ascii_lowercase(),
            }
        }
    };
    FieldMetadata {
        name: name.to_string(),
        label: label.to_string(),
        data_type: data_type.to_string(),
    }
}

/// Sorts buckets by descending count, then label.
pub fn sort_buckets(buckets: &mut [CountBucket]) {
    buckets.sort_by(|left, right| {
        right.count.cmp(&left.count).then_with(|| left.label.cmp(&right.label))
    });
}

#[cfg(test)]
mod tests {
    use super::{describe_column, sort_buckets, CountBucket, VEHICLE_COLUMNS};

    #[test]
    fn price_column_is_presented_as_decimal_price() {
        let field = describe_column("price_cents", "INTEGER");
        assert_eq!(field.name, "price");
        assert_eq!(field.data_type, "decimal");
    }

    #[test]
    fn unknown_columns_fall_back_to_readable_names() {
        let field = describe_column("sunroof_kind", "TEXT");
        assert_eq!(field.label, "sunroof kind");
        assert_eq!(field.data_type, "text");
        assert!(VEHICLE_COLUMNS.iter().all(|(column, sql_type)| {
            describe_column(column, sql_type).label.starts_with(char::is_uppercase)
        }));
    }

    #[test]
    fn buckets_sort_by_count_then_label() {
        let mut buckets = vec![
            CountBucket { label: "Volkswagen".to_string(), count: 2 },
            CountBucket { label: "Fiat".to_string(), count: 3 },
            CountBucket { label: "Chevrolet".to_string(), count: 2 },
        ];
        sort_buckets(&mut buckets);
        let labels: Vec<&str> = buckets.iter().map(|bucket| bucket.label.as_str()).collect();
        assert_eq!(labels, vec!["Fiat", "Chevrolet", "Volkswagen"]);
    }
}
