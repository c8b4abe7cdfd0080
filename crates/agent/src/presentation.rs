use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use carlot_core::config::SearchConfig;
use carlot_core::domain::catalog::PriceRange;
use carlot_core::domain::vehicle::{Vehicle, VehicleId};
use carlot_core::keywords::{item_reference, wants_detailed_view};
use carlot_core::search::ResultPage;
use carlot_core::text::{sanitize_text, NormalizedText};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    Detailed,
    Summary,
    NoResults,
}

/// What the user is shown for one search turn. `entries` are numbered from 1
/// in response order and `rendered_ids` follows the same order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Presentation {
    pub mode: PresentationMode,
    pub entries: Vec<String>,
    pub shown: usize,
    pub total: u64,
    pub truncation_note: Option<String>,
    pub rendered_ids: Vec<VehicleId>,
}

impl Presentation {
    pub fn no_results() -> Self {
        Self {
            mode: PresentationMode::NoResults,
            entries: Vec::new(),
            shown: 0,
            total: 0,
            truncation_note: None,
            rendered_ids: Vec::new(),
        }
    }

    /// Deterministic reply used when the phrasing step is unavailable.
    pub fn fallback_text(&self) -> String {
        let mut text = match self.mode {
            PresentationMode::NoResults => {
                return "I couldn't find any cars matching that. Try relaxing a criterion, \
                        such as the price or the year."
                    .to_string()
            }
            PresentationMode::Detailed => {
                format!("Here is what I found ({} total):\n\n", self.total)
            }
            PresentationMode::Summary => format!("I found {} cars:\n\n", self.total),
        };

        text.push_str(&self.entries.join("\n"));
        if let Some(note) = &self.truncation_note {
            text.push_str("\n\n");
            text.push_str(note);
        }
        if self.mode == PresentationMode::Summary {
            text.push_str("\n\nAsk me about any item number for the full details.");
        }
        text
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentationPolicy {
    pub detailed_threshold: u64,
    pub detailed_cap: usize,
    pub summary_cap: usize,
}

impl Default for PresentationPolicy {
    fn default() -> Self {
        Self { detailed_threshold: 5, detailed_cap: 5, summary_cap: 10 }
    }
}

impl From<&SearchConfig> for PresentationPolicy {
    fn from(config: &SearchConfig) -> Self {
        Self {
            detailed_threshold: config.detailed_threshold,
            detailed_cap: config.detailed_cap,
            summary_cap: config.summary_cap,
        }
    }
}

impl PresentationPolicy {
    pub fn mode_for(&self, utterance: &NormalizedText, total_matched: u64) -> PresentationMode {
        if total_matched == 0 {
            PresentationMode::NoResults
        } else if total_matched <= self.detailed_threshold
            || wants_detailed_view(utterance)
            || item_reference(utterance).is_some()
        {
            PresentationMode::Detailed
        } else {
            PresentationMode::Summary
        }
    }

    pub fn present(&self, utterance: &str, page: &ResultPage) -> Presentation {
        let text = NormalizedText::new(utterance);
        let mode = self.mode_for(&text, page.total_matched());

        let (cap, format): (usize, fn(&Vehicle, usize) -> String) = match mode {
            PresentationMode::NoResults => return Presentation::no_results(),
            PresentationMode::Detailed => (self.detailed_cap, format_detailed),
            PresentationMode::Summary => (self.summary_cap, format_summary),
        };

        let rendered: Vec<&Vehicle> = page.items().iter().take(cap).collect();
        let entries = rendered
            .iter()
            .enumerate()
            .map(|(index, vehicle)| sanitize_text(&format(vehicle, index + 1)))
            .collect();
        let shown = rendered.len();
        let total = page.total_matched();

        Presentation {
            mode,
            entries,
            shown,
            total,
            truncation_note: (total > shown as u64)
                .then(|| format!("(showing {shown} of {total})")),
            rendered_ids: rendered.iter().map(|vehicle| vehicle.id).collect(),
        }
    }
}

pub fn format_summary(vehicle: &Vehicle, number: usize) -> String {
    format!(
        "{number}. {} {} ({}) - {} - {} - {} km - Plate: {}",
        vehicle.brand,
        vehicle.model,
        vehicle.manufacture_year,
        format_price(vehicle.price),
        vehicle.color,
        group_thousands(&vehicle.mileage_km.to_string()),
        vehicle.plate,
    )
}

pub fn format_detailed(vehicle: &Vehicle, number: usize) -> String {
    let last_service = vehicle
        .last_service_at
        .as_ref()
        .map(format_date)
        .unwrap_or_else(|| "never serviced".to_string());

    [
        format!("{number}. {} {} ({})", vehicle.brand, vehicle.model, vehicle.manufacture_year),
        format!("   • Price: {}", format_price(vehicle.price)),
        format!("   • Color: {}", vehicle.color),
        format!("   • Mileage: {} km", group_thousands(&vehicle.mileage_km.to_string())),
        format!("   • Fuel: {}", vehicle.fuel_type.label()),
        format!("   • Transmission: {}", vehicle.transmission.label()),
        format!("   • Doors: {}", vehicle.doors),
        format!("   • Engine: {}", vehicle.engine),
        format!("   • Body style: {}", vehicle.body_style.label()),
        format!("   • Manufacture year: {}", vehicle.manufacture_year),
        format!("   • Model year: {}", vehicle.model_year),
        format!("   • Plate: {}", vehicle.plate),
        format!("   • Chassis: {}", vehicle.chassis),
        format!("   • Registered: {}", format_date(&vehicle.registered_at)),
        format!("   • Last service: {last_service}"),
    ]
    .join("\n")
}

pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%d/%m/%Y").to_string()
}

/// `R$ 118,900.00`
pub fn format_price(price: Decimal) -> String {
    let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("R$ {sign}{}.{cents}", group_thousands(whole))
}

pub fn format_price_range(range: Option<&PriceRange>) -> String {
    match range {
        Some(range) => format!("{} - {}", format_price(range.min), format_price(range.max)),
        None => "not available".to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, character) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(character);
    }
    format!("{sign}{grouped}")
}
