use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::fold_text;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub i64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Gasoline,
    Ethanol,
    Flex,
    Diesel,
    Electric,
    Hybrid,
    Cng,
}

impl FuelType {
    pub const ALL: [FuelType; 7] = [
        Self::Gasoline,
        Self::Ethanol,
        Self::Flex,
        Self::Diesel,
        Self::Electric,
        Self::Hybrid,
        Self::Cng,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gasoline => "gasoline",
            Self::Ethanol => "ethanol",
            Self::Flex => "flex",
            Self::Diesel => "diesel",
            Self::Electric => "electric",
            Self::Hybrid => "hybrid",
            Self::Cng => "cng",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gasoline => "Gasoline",
            Self::Ethanol => "Ethanol",
            Self::Flex => "Flex",
            Self::Diesel => "Diesel",
            Self::Electric => "Electric",
            Self::Hybrid => "Hybrid",
            Self::Cng => "CNG",
        }
    }
}

impl FromStr for FuelType {
    type Err = ParseVariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match fold_text(value.trim()).as_str() {
            "gasoline" | "gasolina" | "petrol" | "gas" => Ok(Self::Gasoline),
            "ethanol" | "etanol" | "alcool" | "alcohol" => Ok(Self::Ethanol),
            "flex" => Ok(Self::Flex),
            "diesel" => Ok(Self::Diesel),
            "electric" | "eletrico" | "ev" => Ok(Self::Electric),
            "hybrid" | "hibrido" => Ok(Self::Hybrid),
            "cng" | "gnv" => Ok(Self::Cng),
            _ => Err(ParseVariantError { kind: "fuel type", value: value.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    Manual,
    Automatic,
    Cvt,
}

impl Transmission {
    pub const ALL: [Transmission; 3] = [Self::Manual, Self::Automatic, Self::Cvt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
            Self::Cvt => "cvt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Automatic => "Automatic",
            Self::Cvt => "CVT",
        }
    }
}

impl FromStr for Transmission {
    type Err = ParseVariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match fold_text(value.trim()).as_str() {
            "manual" | "mecanico" | "mecanica" => Ok(Self::Manual),
            "automatic" | "automatico" | "automatica" | "auto" => Ok(Self::Automatic),
            "cvt" => Ok(Self::Cvt),
            _ => Err(ParseVariantError { kind: "transmission", value: value.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyStyle {
    Hatch,
    Sedan,
    Suv,
    Pickup,
    Convertible,
    Coupe,
    Wagon,
    Van,
}

impl BodyStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hatch => "hatch",
            Self::Sedan => "sedan",
            Self::Suv => "suv",
            Self::Pickup => "pickup",
            Self::Convertible => "convertible",
            Self::Coupe => "coupe",
            Self::Wagon => "wagon",
            Self::Van => "van",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Hatch => "Hatch",
            Self::Sedan => "Sedan",
            Self::Suv => "SUV",
            Self::Pickup => "Pickup",
            Self::Convertible => "Convertible",
            Self::Coupe => "Coupe",
            Self::Wagon => "Wagon",
            Self::Van => "Van",
        }
    }
}

impl FromStr for BodyStyle {
    type Err = ParseVariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match fold_text(value.trim()).as_str() {
            "hatch" | "hatchback" => Ok(Self::Hatch),
            "sedan" => Ok(Self::Sedan),
            "suv" => Ok(Self::Suv),
            "pickup" | "picape" => Ok(Self::Pickup),
            "convertible" | "conversivel" => Ok(Self::Convertible),
            "coupe" => Ok(Self::Coupe),
            "wagon" | "perua" => Ok(Self::Wagon),
            "van" => Ok(Self::Van),
            _ => Err(ParseVariantError { kind: "body style", value: value.to_string() }),
        }
    }
}

/// One catalog entry. Created by seeding and never mutated by the search path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub brand: String,
    pub model: String,
    pub manufacture_year: i32,
    pub model_year: i32,
    pub engine: String,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub doors: u8,
    pub body_style: BodyStyle,
    pub mileage_km: i64,
    pub color: String,
    pub price: Decimal,
    pub plate: String,
    pub chassis: String,
    pub registered_at: DateTime<Utc>,
    pub last_service_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    /// Price in whole cents, the unit the store indexes on.
    pub fn price_cents(&self) -> i64 {
        price_to_cents(self.price)
    }
}

/// Saturates at the `i64` bounds instead of overflowing.
pub fn price_to_cents(price: Decimal) -> i64 {
    let saturated = if price.is_sign_negative() { i64::MIN } else { i64::MAX };
    price
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| i64::try_from(cents.round()).ok())
        .unwrap_or(saturated)
}

pub fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
