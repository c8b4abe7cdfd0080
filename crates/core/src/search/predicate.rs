use crate::domain::vehicle::{price_to_cents, Vehicle};
use crate::search::filter::Filter;

/// Catalog columns a predicate may reference. Nothing outside this set ever
/// reaches a storage query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Brand,
    Model,
    Color,
    ManufactureYear,
    PriceCents,
    FuelType,
    Transmission,
    Doors,
    Plate,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Color => "color",
            Self::ManufactureYear => "manufacture_year",
            Self::PriceCents => "price_cents",
            Self::FuelType => "fuel_type",
            Self::Transmission => "transmission",
            Self::Doors => "doors",
            Self::Plate => "plate",
        }
    }

    fn text(&self, vehicle: &Vehicle) -> Option<String> {
        match self {
            Self::Brand => Some(vehicle.brand.clone()),
            Self::Model => Some(vehicle.model.clone()),
            Self::Color => Some(vehicle.color.clone()),
            Self::FuelType => Some(vehicle.fuel_type.as_str().to_string()),
            Self::Transmission => Some(vehicle.transmission.as_str().to_string()),
            Self::Plate => Some(vehicle.plate.clone()),
            Self::ManufactureYear | Self::PriceCents | Self::Doors => None,
        }
    }

    fn integer(&self, vehicle: &Vehicle) -> Option<i64> {
        match self {
            Self::ManufactureYear => Some(i64::from(vehicle.manufacture_year)),
            Self::PriceCents => Some(vehicle.price_cents()),
            Self::Doors => Some(i64::from(vehicle.doors)),
            Self::Brand
            | Self::Model
            | Self::Color
            | Self::FuelType
            | Self::Transmission
            | Self::Plate => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PredicateValue {
    Integer(i64),
    Text(String),
}

/// One storage constraint. All predicates of a filter are combined with AND.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring match.
    Contains { column: Column, needle: String },
    /// Case-insensitive prefix match.
    StartsWith { column: Column, prefix: String },
    AtLeast { column: Column, value: i64 },
    AtMost { column: Column, value: i64 },
    Equals { column: Column, value: PredicateValue },
}

impl Predicate {
    pub fn column(&self) -> Column {
        match self {
            Self::Contains { column, .. }
            | Self::StartsWith { column, .. }
            | Self::AtLeast { column, .. }
            | Self::AtMost { column, .. }
            | Self::Equals { column, .. } => *column,
        }
    }

    /// Evaluates the predicate against an in-memory vehicle.
    ///
    /// Text comparisons fold ASCII case only, as SQLite's `LIKE` does, so
    /// `CITROËN` does not match `Citroën` on either backend.
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        match self {
            Self::Contains { column, needle } => column
                .text(vehicle)
                .is_some_and(|text| ascii_fold(&text).contains(&ascii_fold(needle))),
            Self::StartsWith { column, prefix } => column
                .text(vehicle)
                .is_some_and(|text| ascii_fold(&text).starts_with(&ascii_fold(prefix))),
            Self::AtLeast { column, value } => {
                column.integer(vehicle).is_some_and(|actual| actual >= *value)
            }
            Self::AtMost { column, value } => {
                column.integer(vehicle).is_some_and(|actual| actual <= *value)
            }
            Self::Equals { column, value: PredicateValue::Integer(value) } => {
                column.integer(vehicle) == Some(*value)
            }
            Self::Equals { column, value: PredicateValue::Text(value) } => column
                .text(vehicle)
                .is_some_and(|text| text.eq_ignore_ascii_case(value)),
        }
    }
}

fn ascii_fold(text: &str) -> String {
    text.to_ascii_lowercase()
}

/// Every filter field that narrows the result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterField {
    Brand,
    Model,
    Color,
    YearMin,
    YearMax,
    PriceMin,
    PriceMax,
    FuelType,
    Transmission,
    Doors,
    PlatePrefix,
}

impl FilterField {
    pub const ALL: [FilterField; 11] = [
        Self::Brand,
        Self::Model,
        Self::Color,
        Self::YearMin,
        Self::YearMax,
        Self::PriceMin,
        Self::PriceMax,
        Self::FuelType,
        Self::Transmission,
        Self::Doors,
        Self::PlatePrefix,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Color => "color",
            Self::YearMin => "year_min",
            Self::YearMax => "year_max",
            Self::PriceMin => "price_min",
            Self::PriceMax => "price_max",
            Self::FuelType => "fuel_type",
            Self::Transmission => "transmission",
            Self::Doors => "doors",
            Self::PlatePrefix => "plate_prefix",
        }
    }

    /// The predicate this field contributes, if the filter sets it.
    pub fn predicate(&self, filter: &Filter) -> Option<Predicate> {
        match self {
            Self::Brand => filter
                .brand()
                .map(|needle| Predicate::Contains { column: Column::Brand, needle: needle.into() }),
            Self::Model => filter
                .model()
                .map(|needle| Predicate::Contains { column: Column::Model, needle: needle.into() }),
            Self::Color => filter
                .color()
                .map(|needle| Predicate::Contains { column: Column::Color, needle: needle.into() }),
            Self::YearMin => filter.year_min().map(|year| Predicate::AtLeast {
                column: Column::ManufactureYear,
                value: i64::from(year),
            }),
            Self::YearMax => filter.year_max().map(|year| Predicate::AtMost {
                column: Column::ManufactureYear,
                value: i64::from(year),
            }),
            Self::PriceMin => filter.price_min().map(|price| Predicate::AtLeast {
                column: Column::PriceCents,
                value: price_to_cents(price),
            }),
            Self::PriceMax => filter.price_max().map(|price| Predicate::AtMost {
                column: Column::PriceCents,
                value: price_to_cents(price),
            }),
            Self::FuelType => filter.fuel_type().map(|fuel| Predicate::Equals {
                column: Column::FuelType,
                value: PredicateValue::Text(fuel.as_str().to_string()),
            }),
            Self::Transmission => filter.transmission().map(|transmission| Predicate::Equals {
                column: Column::Transmission,
                value: PredicateValue::Text(transmission.as_str().to_string()),
            }),
            Self::Doors => filter.doors().map(|doors| Predicate::Equals {
                column: Column::Doors,
                value: PredicateValue::Integer(i64::from(doors)),
            }),
            Self::PlatePrefix => filter.plate_prefix().map(|prefix| Predicate::StartsWith {
                column: Column::Plate,
                prefix: prefix.into(),
            }),
        }
    }
}

impl Filter {
    /// Predicates for every populated field, in [`FilterField::ALL`] order.
    pub fn predicates(&self) -> Vec<Predicate> {
        FilterField::ALL.iter().filter_map(|field| field.predicate(self)).collect()
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        self.predicates().iter().all(|predicate| predicate.matches(vehicle))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{Column, FilterField, Predicate, PredicateValue};
    use crate::domain::vehicle::{BodyStyle, FuelType, Transmission, Vehicle, VehicleId};
    use crate::search::filter::Filter;

    fn corolla() -> Vehicle {
        Vehicle {
            id: VehicleId(7),
            brand: "Toyota".to_string(),
            model: "Corolla XEi".to_string(),
            manufacture_year: 2020,
            model_year: 2021,
            engine: "2.0".to_string(),
            fuel_type: FuelType::Flex,
            transmission: Transmission::Cvt,
            doors: 4,
            body_style: BodyStyle::Sedan,
            mileage_km: 38_000,
            color: "Prata".to_string(),
            price: Decimal::from(118_900),
            plate: "QRS1A23".to_string(),
            chassis: "9BRBL3HE0M0100007".to_string(),
            registered_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap_or_default(),
            last_service_at: None,
        }
    }

    #[test]
    fn empty_filter_has_no_predicates() {
        assert!(Filter::default().predicates().is_empty());
        assert!(Filter::default().matches(&corolla()));
    }

    #[test]
    fn every_populated_field_contributes_exactly_one_predicate() {
        let filter = Filter::builder()
            .brand("toy")
            .model("corolla")
            .color("prata")
            .year_range(Some(2019), Some(2022))
            .price_range(Some(Decimal::from(100_000)), Some(Decimal::from(120_000)))
            .fuel_type(FuelType::Flex)
            .transmission(Transmission::Cvt)
            .doors(4)
            .plate_prefix("qrs")
            .build()
            .expect("valid filter");

        let predicates = filter.predicates();
        assert_eq!(predicates.len(), FilterField::ALL.len());
        assert!(filter.matches(&corolla()));
    }

    #[test]
    fn brand_is_a_case_insensitive_substring() {
        let filter = Filter::builder().brand("TOYO").build().expect("valid");
        assert!(filter.matches(&corolla()));
        let filter = Filter::builder().brand("Honda").build().expect("valid");
        assert!(!filter.matches(&corolla()));
    }

    #[test]
    fn text_matching_folds_ascii_case_only() {
        let mut citroen = corolla();
        citroen.brand = "Citroën".to_string();

        let predicate = |needle: &str| Predicate::Contains {
            column: Column::Brand,
            needle: needle.to_string(),
        };
        assert!(predicate("CITROëN").matches(&citroen));
        assert!(predicate("citro").matches(&citroen));
        assert!(!predicate("CITROËN").matches(&citroen));
    }

    #[test]
    fn price_bounds_compare_in_cents() {
        let filter = Filter::builder()
            .price_range(None, Some(Decimal::new(11_889_999, 2)))
            .build()
            .expect("valid");
        assert_eq!(
            filter.predicates(),
            vec![Predicate::AtMost { column: Column::PriceCents, value: 11_889_999 }]
        );
        assert!(!filter.matches(&corolla()));
    }

    #[test]
    fn year_bounds_use_manufacture_year() {
        let filter = Filter::builder().year_range(Some(2020), None).build().expect("valid");
        assert!(filter.matches(&corolla()));
        let filter = Filter::builder().year_range(None, Some(2019)).build().expect("valid");
        assert!(!filter.matches(&corolla()));
    }

    #[test]
    fn equality_predicates_use_storage_tokens() {
        let predicate = Predicate::Equals {
            column: Column::FuelType,
            value: PredicateValue::Text("flex".to_string()),
        };
        assert!(predicate.matches(&corolla()));
        assert_eq!(predicate.column().name(), "fuel_type");
    }
}
