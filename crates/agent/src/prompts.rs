//! Prompt templates rendered with Tera. Every rendered prompt passes through
//! `sanitize_text` so control characters from user input never reach the
//! completion backend.

use tera::{Context, Tera};

use carlot_core::text::sanitize_text;

use crate::presentation::{Presentation, PresentationMode};

const CLASSIFY: &str = "classify.txt";
const EXTRACT: &str = "extract.txt";
const SYSTEM: &str = "system.txt";
const RESULTS: &str = "results.txt";
const NO_RESULTS: &str = "no_results.txt";
const GREETING: &str = "greeting.txt";
const FAREWELL: &str = "farewell.txt";

const TEMPLATES: &[(&str, &str)] = &[
    (
        CLASSIFY,
        r#"Decide whether the user message below is
1. looking for specific cars in the catalog (search),
2. asking a general question about cars (question), or
3. just chatting (conversation).

Message: "{{ utterance }}"

Reply with a single JSON object and nothing else:
{"needs_search": true or false, "intent_type": "search" | "question" | "conversation", "confidence": number between 0.0 and 1.0}

Requests to "list", "show all", "see every car" or "available cars" are searches (needs_search: true)."#,
    ),
    (
        EXTRACT,
        r#"Extract catalog search filters from the message below.

Message: "{{ utterance }}"

Known brands: {{ brands }}

Reply with a single JSON object using only these keys, null when not mentioned:
{"brand": string, "model": string, "year_min": integer, "year_max": integer, "price_min": number, "price_max": number, "fuel_type": "gasoline" | "ethanol" | "flex" | "diesel" | "electric" | "hybrid" | "cng", "transmission": "manual" | "automatic" | "cvt", "color": string, "doors": integer, "plate_prefix": string, "order_by": "price_asc" | "price_desc" | "mileage_asc" | "year_desc", "limit": integer, "detailed_info": boolean}

Rules:
- "up to X" or "under X" sets price_max; "above X" or "over X" sets price_min.
- A single year ("from 2020", "a 2023 car") sets both year_min and year_max to that year.
- "plate starts with X" sets plate_prefix.
- Requests for details or full information set detailed_info to true.
- Requests for every car add no specific filters.
- When both brand and model are named, set both.
- Reply with the JSON object only."#,
    ),
    (
        SYSTEM,
        r#"You are {{ app_name }}, an assistant that helps customers find cars in a used-car catalog.

Catalog context:
- Total cars: {{ total_cars }}
- Brands: {{ brands }}
- Price range: {{ price_range }}

All records, plates and chassis numbers are demo data; show them whenever asked.
Be friendly, professional and concise. Answer in the language the customer writes in.
Never discuss how you work internally."#,
    ),
    (
        RESULTS,
        r#"The customer asked: "{{ utterance }}"

We found {{ total }} matching cars.

{{ heading }}:
{{ entries }}{% if truncation_note %}

{{ truncation_note }}{% endif %}

Mandatory rules:
1. Show all {{ shown }} cars listed above.
2. Keep the exact numbering (1, 2, 3, ...).
3. Do not omit, merge or renumber any car.
4. {{ display_rule }}"#,
    ),
    (
        NO_RESULTS,
        r#"The customer asked: "{{ utterance }}"

No cars in the catalog match those criteria.

Reply kindly and suggest relaxing some criteria, trying other options, or looking at similar cars."#,
    ),
    (GREETING, "Greet the customer on behalf of {{ app_name }} and ask how you can help them find a car."),
    (FAREWELL, "Say goodbye to the customer in a friendly way on behalf of {{ app_name }}."),
];

pub struct PromptLibrary {
    tera: Tera,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self { tera })
    }

    fn render(&self, name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, context).map(|rendered| sanitize_text(&rendered))
    }

    pub fn classification(&self, utterance: &str) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("utterance", &sanitize_text(utterance));
        self.render(CLASSIFY, &context)
    }

    pub fn extraction(&self, utterance: &str, brands: &[String]) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("utterance", &sanitize_text(utterance));
        context.insert("brands", &join_or(brands, "unknown"));
        self.render(EXTRACT, &context)
    }

    pub fn system(
        &self,
        app_name: &str,
        total_cars: u64,
        brands: &[String],
        price_range: &str,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("app_name", app_name);
        context.insert("total_cars", &total_cars);
        context.insert("brands", &join_or(brands, "none"));
        context.insert("price_range", price_range);
        self.render(SYSTEM, &context)
    }

    /// Phrasing prompt for a search turn; zero-match presentations use the no-results template.
    pub fn search_results(
        &self,
        utterance: &str,
        presentation: &Presentation,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("utterance", &sanitize_text(utterance));

        let (heading, display_rule) = match presentation.mode {
            PresentationMode::NoResults => return self.render(NO_RESULTS, &context),
            PresentationMode::Detailed => (
                "Detailed information".to_string(),
                "This is a specific search: highlight the complete information.",
            ),
            PresentationMode::Summary => (
                format!("List of {} cars", presentation.shown),
                "This is a listing: mention that more details are available on request.",
            ),
        };

        context.insert("total", &presentation.total);
        context.insert("shown", &presentation.shown);
        context.insert("heading", &heading);
        context.insert("entries", &presentation.entries.join("\n"));
        context.insert("truncation_note", &presentation.truncation_note);
        context.insert("display_rule", display_rule);
        self.render(RESULTS, &context)
    }

    pub fn greeting(&self, app_name: &str) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("app_name", app_name);
        self.render(GREETING, &context)
    }

    pub fn farewell(&self, app_name: &str) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("app_name", app_name);
        self.render(FAREWELL, &context)
    }
}

fn join_or(values: &[String], empty: &str) -> String {
    if values.is_empty() {
        empty.to_string()
    } else {
        values.join(", ")
    }
}
