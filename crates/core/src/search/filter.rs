use std::ops::RangeInclusive;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::vehicle::{FuelType, Transmission};
use crate::errors::ValidationError;
use crate::text::fold_text;

pub const YEAR_RANGE: RangeInclusive<i64> = 1900..=2030;
pub const DOOR_RANGE: RangeInclusive<i64> = 2..=5;
pub const ITEM_NUMBER_RANGE: RangeInclusive<i64> = 1..=100;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;
pub const MAX_PLATE_PREFIX_LEN: usize = 7;
/// Upper bound for price filters, in whole currency units.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

/// Canonical key first, then the aliases the extraction payload may use.
const BRAND_KEYS: &[&str] = &["brand", "marca"];
const MODEL_KEYS: &[&str] = &["model", "modelo"];
const COLOR_KEYS: &[&str] = &["color", "cor"];
const YEAR_MIN_KEYS: &[&str] = &["year_min", "ano_min"];
const YEAR_MAX_KEYS: &[&str] = &["year_max", "ano_max"];
const PRICE_MIN_KEYS: &[&str] = &["price_min", "preco_min"];
const PRICE_MAX_KEYS: &[&str] = &["price_max", "preco_max"];
const FUEL_TYPE_KEYS: &[&str] = &["fuel_type", "combustivel"];
const TRANSMISSION_KEYS: &[&str] = &["transmission", "transmissao"];
const DOORS_KEYS: &[&str] = &["doors", "numero_portas"];
const PLATE_PREFIX_KEYS: &[&str] = &["plate_prefix", "placa_inicia_com"];
const LIMIT_KEYS: &[&str] = &["limit"];
const OFFSET_KEYS: &[&str] = &["offset"];
const ORDER_BY_KEYS: &[&str] = &["order_by"];
const DETAILED_INFO_KEYS: &[&str] = &["detailed_info"];
const SPECIFIC_REQUEST_KEYS: &[&str] = &["specific_request"];
const ITEM_NUMBER_KEYS: &[&str] = &["item_number", "car_number"];

const FIELD_KEYS: &[&[&str]] = &[
    BRAND_KEYS,
    MODEL_KEYS,
    COLOR_KEYS,
    YEAR_MIN_KEYS,
    YEAR_MAX_KEYS,
    PRICE_MIN_KEYS,
    PRICE_MAX_KEYS,
    FUEL_TYPE_KEYS,
    TRANSMISSION_KEYS,
    DOORS_KEYS,
    PLATE_PREFIX_KEYS,
    LIMIT_KEYS,
    OFFSET_KEYS,
    ORDER_BY_KEYS,
    DETAILED_INFO_KEYS,
    SPECIFIC_REQUEST_KEYS,
    ITEM_NUMBER_KEYS,
];

/// Maps a recognized key or alias (`marca`, `preco_max`) to its canonical name.
pub fn canonical_key(key: &str) -> Option<&'static str> {
    FIELD_KEYS.iter().find(|keys| keys.contains(&key)).map(|keys| keys[0])
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    PriceAsc,
    PriceDesc,
    MileageAsc,
    YearDesc,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::MileageAsc => "mileage_asc",
            Self::YearDesc => "year_desc",
        }
    }
}

impl FromStr for OrderBy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match fold_text(value.trim()).as_str() {
            "price_asc" | "preco_asc" => Ok(Self::PriceAsc),
            "price_desc" | "preco_desc" => Ok(Self::PriceDesc),
            "mileage_asc" | "quilometragem_asc" => Ok(Self::MileageAsc),
            "year_desc" | "ano_desc" => Ok(Self::YearDesc),
            other => Err(ValidationError::new(
                "order_by",
                format!(
                    "unsupported ordering `{other}` (expected price_asc|price_desc|mileage_asc|year_desc)"
                ),
            )),
        }
    }
}

/// Pagination bounds applied while validating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self { default_limit: DEFAULT_LIMIT, max_limit: MAX_LIMIT }
    }
}

/// A fully validated search request. The only way to obtain one is through
/// [`Filter::from_map`], [`Filter::from_map_with`] or [`FilterBuilder::build`].
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    brand: Option<String>,
    model: Option<String>,
    color: Option<String>,
    year_min: Option<i32>,
    year_max: Option<i32>,
    price_min: Option<Decimal>,
    price_max: Option<Decimal>,
    fuel_type: Option<FuelType>,
    transmission: Option<Transmission>,
    doors: Option<u8>,
    plate_prefix: Option<String>,
    limit: u32,
    offset: u64,
    order_by: Option<OrderBy>,
    detailed_info: bool,
    specific_request: bool,
    item_number: Option<u32>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            brand: None,
            model: None,
            color: None,
            year_min: None,
            year_max: None,
            price_min: None,
            price_max: None,
            fuel_type: None,
            transmission: None,
            doors: None,
            plate_prefix: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            order_by: None,
            detailed_info: false,
            specific_request: false,
            item_number: None,
        }
    }
}

impl Filter {
    pub fn from_map(raw: &Map<String, Value>) -> Result<Self, ValidationError> {
        Self::from_map_with(raw, &FilterLimits::default())
    }

    pub fn from_map_with(
        raw: &Map<String, Value>,
        limits: &FilterLimits,
    ) -> Result<Self, ValidationError> {
        let year_min = optional_integer(raw, "year_min", YEAR_MIN_KEYS, YEAR_RANGE)?;
        let year_max = optional_integer(raw, "year_max", YEAR_MAX_KEYS, YEAR_RANGE)?;
        if let (Some(min), Some(max)) = (year_min, year_max) {
            if max < min {
                return Err(ValidationError::new(
                    "year_max",
                    format!("{max} must be greater than or equal to year_min ({min})"),
                ));
            }
        }

        let price_min = optional_price(raw, "price_min", PRICE_MIN_KEYS)?;
        let price_max = optional_price(raw, "price_max", PRICE_MAX_KEYS)?;
        if let (Some(min), Some(max)) = (price_min, price_max) {
            if max < min {
                return Err(ValidationError::new(
                    "price_max",
                    format!("{max} must be greater than or equal to price_min ({min})"),
                ));
            }
        }

        let limit_range = 1..=i64::from(limits.max_limit);
        let limit = optional_integer(raw, "limit", LIMIT_KEYS, limit_range)?
            .map(|value| value as u32)
            .unwrap_or(limits.default_limit);
        let offset =
            optional_integer(raw, "offset", OFFSET_KEYS, 0..=i64::MAX)?.map(|value| value as u64);

        Ok(Self {
            brand: optional_string(raw, "brand", BRAND_KEYS)?,
            model: optional_string(raw, "model", MODEL_KEYS)?,
            color: optional_string(raw, "color", COLOR_KEYS)?,
            year_min: year_min.map(|value| value as i32),
            year_max: year_max.map(|value| value as i32),
            price_min,
            price_max,
            fuel_type: optional_variant(raw, "fuel_type", FUEL_TYPE_KEYS)?,
            transmission: optional_variant(raw, "transmission", TRANSMISSION_KEYS)?,
            doors: optional_integer(raw, "doors", DOORS_KEYS, DOOR_RANGE)?.map(|value| value as u8),
            plate_prefix: optional_plate_prefix(raw)?,
            limit,
            offset: offset.unwrap_or(0),
            order_by: optional_order_by(raw)?,
            detailed_info: optional_bool(raw, "detailed_info", DETAILED_INFO_KEYS)?
                .unwrap_or(false),
            specific_request: optional_bool(raw, "specific_request", SPECIFIC_REQUEST_KEYS)?
                .unwrap_or(false),
            item_number: optional_integer(raw, "item_number", ITEM_NUMBER_KEYS, ITEM_NUMBER_RANGE)?
                .map(|value| value as u32),
        })
    }

    pub fn builder() -> FilterBuilder {
        FilterBuilder::default()
    }

    /// Canonical field map, as sent across the storage boundary.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        };

        put("brand", self.brand.clone().map(Value::from));
        put("model", self.model.clone().map(Value::from));
        put("color", self.color.clone().map(Value::from));
        put("year_min", self.year_min.map(Value::from));
        put("year_max", self.year_max.map(Value::from));
        put("price_min", self.price_min.map(|price| Value::from(price.to_string())));
        put("price_max", self.price_max.map(|price| Value::from(price.to_string())));
        put("fuel_type", self.fuel_type.map(|fuel| Value::from(fuel.as_str())));
        put("transmission", self.transmission.map(|value| Value::from(value.as_str())));
        put("doors", self.doors.map(Value::from));
        put("plate_prefix", self.plate_prefix.clone().map(Value::from));
        put("limit", Some(Value::from(self.limit)));
        put("offset", Some(Value::from(self.offset)));
        put("order_by", self.order_by.map(|order| Value::from(order.as_str())));
        put("detailed_info", self.detailed_info.then_some(Value::Bool(true)));
        put("specific_request", self.specific_request.then_some(Value::Bool(true)));
        put("item_number", self.item_number.map(Value::from));
        map
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn year_min(&self) -> Option<i32> {
        self.year_min
    }

    pub fn year_max(&self) -> Option<i32> {
        self.year_max
    }

    pub fn price_min(&self) -> Option<Decimal> {
        self.price_min
    }

    pub fn price_max(&self) -> Option<Decimal> {
        self.price_max
    }

    pub fn fuel_type(&self) -> Option<FuelType> {
        self.fuel_type
    }

    pub fn transmission(&self) -> Option<Transmission> {
        self.transmission
    }

    pub fn doors(&self) -> Option<u8> {
        self.doors
    }

    pub fn plate_prefix(&self) -> Option<&str> {
        self.plate_prefix.as_deref()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn order_by(&self) -> Option<OrderBy> {
        self.order_by
    }

    pub fn detailed_info(&self) -> bool {
        self.detailed_info
    }

    pub fn specific_request(&self) -> bool {
        self.specific_request
    }

    pub fn item_number(&self) -> Option<u32> {
        self.item_number
    }
}

/// Typed front door over [`Filter::from_map_with`]; `build` runs the same checks.
#[derive(Clone, Debug, Default)]
pub struct FilterBuilder {
    raw: Map<String, Value>,
    limits: FilterLimits,
}

impl FilterBuilder {
    pub fn limits(mut self, limits: FilterLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn brand(self, value: impl Into<String>) -> Self {
        self.set("brand", Value::from(value.into()))
    }

    pub fn model(self, value: impl Into<String>) -> Self {
        self.set("model", Value::from(value.into()))
    }

    pub fn color(self, value: impl Into<String>) -> Self {
        self.set("color", Value::from(value.into()))
    }

    pub fn year_range(self, min: Option<i32>, max: Option<i32>) -> Self {
        self.set_opt("year_min", min.map(Value::from)).set_opt("year_max", max.map(Value::from))
    }

    pub fn price_range(self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.set_opt("price_min", min.map(|price| Value::from(price.to_string())))
            .set_opt("price_max", max.map(|price| Value::from(price.to_string())))
    }

    pub fn fuel_type(self, value: FuelType) -> Self {
        self.set("fuel_type", Value::from(value.as_str()))
    }

    pub fn transmission(self, value: Transmission) -> Self {
        self.set("transmission", Value::from(value.as_str()))
    }

    pub fn doors(self, value: u8) -> Self {
        self.set("doors", Value::from(value))
    }

    pub fn plate_prefix(self, value: impl Into<String>) -> Self {
        self.set("plate_prefix", Value::from(value.into()))
    }

    pub fn limit(self, value: u32) -> Self {
        self.set("limit", Value::from(value))
    }

    pub fn offset(self, value: u64) -> Self {
        self.set("offset", Value::from(value))
    }

    pub fn order_by(self, value: OrderBy) -> Self {
        self.set("order_by", Value::from(value.as_str()))
    }

    pub fn build(self) -> Result<Filter, ValidationError> {
        Filter::from_map_with(&self.raw, &self.limits)
    }

    fn set(mut self, key: &str, value: Value) -> Self {
        self.raw.insert(key.to_string(), value);
        self
    }

    fn set_opt(self, key: &str, value: Option<Value>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }
}

fn lookup<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| raw.get(*key)).find(|value| !value.is_null())
}

fn optional_string(
    raw: &Map<String, Value>,
    field: &'static str,
    keys: &[&str],
) -> Result<Option<String>, ValidationError> {
    match lookup(raw, keys) {
        None => Ok(None),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(ValidationError::new(field, format!("expected text, got {other}"))),
    }
}

fn optional_integer(
    raw: &Map<String, Value>,
    field: &'static str,
    keys: &[&str],
    range: RangeInclusive<i64>,
) -> Result<Option<i64>, ValidationError> {
    let Some(value) = lookup(raw, keys) else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number.as_f64().filter(|float| float.fract() == 0.0 && float.abs() < 9.0e15).map(
                |float| float as i64,
            )
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    let Some(parsed) = parsed else {
        return Err(ValidationError::new(field, format!("expected an integer, got {value}")));
    };
    if !range.contains(&parsed) {
        return Err(ValidationError::new(
            field,
            format!("{parsed} is outside {}..={}", range.start(), range.end()),
        ));
    }
    Ok(Some(parsed))
}

fn optional_price(
    raw: &Map<String, Value>,
    field: &'static str,
    keys: &[&str],
) -> Result<Option<Decimal>, ValidationError> {
    let Some(value) = lookup(raw, keys) else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Some(Decimal::from(integer))
            } else if let Some(unsigned) = number.as_u64() {
                Some(Decimal::from(unsigned))
            } else {
                number.as_f64().and_then(|float| Decimal::try_from(float).ok())
            }
        }
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    };

    match parsed {
        None => Err(ValidationError::new(field, format!("expected a number, got {value}"))),
        Some(price) if price.is_sign_negative() && !price.is_zero() => {
            Err(ValidationError::new(field, format!("{price} must not be negative")))
        }
        Some(price) if price > Decimal::from(MAX_PRICE) => {
            Err(ValidationError::new(field, format!("{price} exceeds {MAX_PRICE}")))
        }
        Some(price) => Ok(Some(price.normalize())),
    }
}

fn optional_bool(
    raw: &Map<String, Value>,
    field: &'static str,
    keys: &[&str],
) -> Result<Option<bool>, ValidationError> {
    match lookup(raw, keys) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(ValidationError::new(field, format!("expected a boolean, got `{text}`"))),
        },
        Some(other) => Err(ValidationError::new(field, format!("expected a boolean, got {other}"))),
    }
}

fn optional_variant<T>(
    raw: &Map<String, Value>,
    field: &'static str,
    keys: &[&str],
) -> Result<Option<T>, ValidationError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_string(raw, field, keys)? {
        None => Ok(None),
        Some(text) => {
            text.parse::<T>()
                .map(Some)
                .map_err(|error| ValidationError::new(field, error.to_string()))
        }
    }
}

fn optional_order_by(raw: &Map<String, Value>) -> Result<Option<OrderBy>, ValidationError> {
    match optional_string(raw, "order_by", ORDER_BY_KEYS)? {
        None => Ok(None),
        Some(text) => text.parse().map(Some),
    }
}

fn optional_plate_prefix(raw: &Map<String, Value>) -> Result<Option<String>, ValidationError> {
    let Some(prefix) = optional_string(raw, "plate_prefix", PLATE_PREFIX_KEYS)? else {
        return Ok(None);
    };
    let valid = prefix.len() <= MAX_PLATE_PREFIX_LEN
        && prefix.chars().all(|character| character.is_ascii_alphanumeric());
    if !valid {
        return Err(ValidationError::new(
            "plate_prefix",
            format!("`{prefix}` must be 1..={MAX_PLATE_PREFIX_LEN} ASCII letters or digits"),
        ));
    }
    Ok(Some(prefix.to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::{json, Map, Value};

    use super::{canonical_key, Filter, FilterLimits, OrderBy};
    use crate::domain::vehicle::{FuelType, Transmission};

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn aliases_resolve_to_canonical_keys() {
        assert_eq!(canonical_key("marca"), Some("brand"));
        assert_eq!(canonical_key("preco_max"), Some("price_max"));
        assert_eq!(canonical_key("car_number"), Some("item_number"));
        assert_eq!(canonical_key("limit"), Some("limit"));
        assert_eq!(canonical_key("horsepower"), None);
    }

    #[test]
    fn empty_map_yields_default_pagination() {
        let filter = Filter::from_map(&Map::new()).expect("empty filter is valid");
        assert_eq!(filter.limit(), 20);
        assert_eq!(filter.offset(), 0);
        assert_eq!(filter, Filter::default());
    }

    #[test]
    fn year_max_below_year_min_is_rejected() {
        let error = Filter::from_map(&map(json!({"year_min": 2023, "year_max": 2020})))
            .expect_err("inverted year range");
        assert_eq!(error.field, "year_max");

        let filter = Filter::from_map(&map(json!({"ano_min": 2020, "ano_max": 2023})))
            .expect("ordered year range");
        assert_eq!((filter.year_min(), filter.year_max()), (Some(2020), Some(2023)));

        let same_year = Filter::from_map(&map(json!({"year_min": 2021, "year_max": 2021})));
        assert!(same_year.is_ok());
    }

    #[test]
    fn price_max_below_price_min_is_rejected() {
        let error = Filter::from_map(&map(json!({"price_min": 50000, "price_max": 30000})))
            .expect_err("inverted price range");
        assert_eq!(error.field, "price_max");

        let filter = Filter::from_map(&map(json!({"preco_min": 30000, "preco_max": 50000})))
            .expect("ordered price range");
        assert_eq!(filter.price_min(), Some(Decimal::from(30_000)));
        assert_eq!(filter.price_max(), Some(Decimal::from(50_000)));
    }

    #[test]
    fn out_of_range_pagination_fails_instead_of_clamping() {
        assert_eq!(
            Filter::from_map(&map(json!({"limit": 0}))).expect_err("zero limit").field,
            "limit"
        );
        assert_eq!(
            Filter::from_map(&map(json!({"limit": 101}))).expect_err("limit above max").field,
            "limit"
        );
        assert_eq!(
            Filter::from_map(&map(json!({"offset": -1}))).expect_err("negative offset").field,
            "offset"
        );
    }

    #[test]
    fn configured_default_limit_applies_only_when_absent() {
        let limits = FilterLimits { default_limit: 30, max_limit: 100 };
        let defaulted = Filter::from_map_with(&Map::new(), &limits).expect("valid");
        assert_eq!(defaulted.limit(), 30);

        let explicit = Filter::from_map_with(&map(json!({"limit": 5})), &limits).expect("valid");
        assert_eq!(explicit.limit(), 5);
    }

    #[test]
    fn range_checks_cover_years_doors_and_prices() {
        assert!(Filter::from_map(&map(json!({"year_min": 1899}))).is_err());
        assert!(Filter::from_map(&map(json!({"year_max": 2031}))).is_err());
        assert!(Filter::from_map(&map(json!({"doors": 6}))).is_err());
        assert!(Filter::from_map(&map(json!({"numero_portas": 4}))).is_ok());
        assert!(Filter::from_map(&map(json!({"price_min": -1}))).is_err());
        assert!(Filter::from_map(&map(json!({"price_max": 0}))).is_ok());
    }

    #[test]
    fn prices_beyond_the_cap_are_rejected() {
        let error = Filter::from_map(&map(json!({"price_max": 1e28}))).expect_err("huge float");
        assert_eq!(error.field, "price_max");

        let error = Filter::from_map(&map(json!({"preco_min": "79228162514264337593543950335"})))
            .expect_err("decimal max");
        assert_eq!(error.field, "price_min");

        let filter = Filter::from_map(&map(json!({"price_max": super::MAX_PRICE})))
            .expect("cap is inclusive");
        assert_eq!(filter.price_max(), Some(Decimal::from(super::MAX_PRICE)));
    }

    #[test]
    fn coercion_accepts_numeric_strings_and_whole_floats() {
        let filter = Filter::from_map(&map(json!({
            "year_min": "2019",
            "doors": 4.0,
            "price_max": "45999.90",
            "limit": "10",
        })))
        .expect("coercible values");
        assert_eq!(filter.year_min(), Some(2019));
        assert_eq!(filter.doors(), Some(4));
        assert_eq!(filter.price_max(), Some(Decimal::new(4_599_990, 2)));
        assert_eq!(filter.limit(), 10);

        let error = Filter::from_map(&map(json!({"doors": 4.5}))).expect_err("fractional doors");
        assert_eq!(error.field, "doors");
        let error = Filter::from_map(&map(json!({"year_min": "recent"}))).expect_err("text year");
        assert_eq!(error.field, "year_min");
    }

    #[test]
    fn one_bad_field_fails_the_whole_filter() {
        let result = Filter::from_map(&map(json!({
            "brand": "Toyota",
            "color": "Preto",
            "transmission": "teleport",
        })));
        let error = result.expect_err("unknown transmission");
        assert_eq!(error.field, "transmission");
    }

    #[test]
    fn enums_and_ordering_accept_portuguese_payloads() {
        let filter = Filter::from_map(&map(json!({
            "combustivel": "Flex",
            "transmissao": "Automático",
            "order_by": "preco_desc",
        })))
        .expect("portuguese enums");
        assert_eq!(filter.fuel_type(), Some(FuelType::Flex));
        assert_eq!(filter.transmission(), Some(Transmission::Automatic));
        assert_eq!(filter.order_by(), Some(OrderBy::PriceDesc));
    }

    #[test]
    fn unknown_fields_and_nulls_are_ignored() {
        let filter = Filter::from_map(&map(json!({
            "marca": null,
            "cor": "  ",
            "sunroof": true,
            "horsepower": "lots",
        })))
        .expect("ignored fields");
        assert_eq!(filter, Filter::default());
    }

    #[test]
    fn plate_prefix_is_normalized_and_bounded() {
        let filter =
            Filter::from_map(&map(json!({"placa_inicia_com": "abc"}))).expect("valid prefix");
        assert_eq!(filter.plate_prefix(), Some("ABC"));
        assert!(Filter::from_map(&map(json!({"plate_prefix": "AB-1"}))).is_err());
        assert!(Filter::from_map(&map(json!({"plate_prefix": "ABCDEFGH"}))).is_err());
    }

    #[test]
    fn canonical_map_revalidates_to_the_same_filter() {
        let filter = Filter::builder()
            .brand("Honda")
            .color("Prata")
            .year_range(Some(2018), Some(2022))
            .price_range(None, Some(Decimal::from(80_000)))
            .fuel_type(FuelType::Flex)
            .order_by(OrderBy::MileageAsc)
            .limit(15)
            .build()
            .expect("builder output is valid");

        let again = Filter::from_map(&filter.to_map()).expect("canonical map is valid");
        assert_eq!(again, filter);
        assert_eq!(filter.to_map().get("price_max"), Some(&json!("80000")));
    }

    #[test]
    fn detail_flags_and_item_reference_are_parsed() {
        let filter = Filter::from_map(&map(json!({
            "detailed_info": true,
            "specific_request": "true",
            "car_number": 3,
            "limit": 50,
        })))
        .expect("flags");
        assert!(filter.detailed_info());
        assert!(filter.specific_request());
        assert_eq!(filter.item_number(), Some(3));
        assert!(Filter::from_map(&map(json!({"item_number": 0}))).is_err());
    }
}
