//! Renders a validated [`Filter`] into parameterized SQL. Column names come
//! from the closed `Column` set; every user value is bound.

use sqlx::{QueryBuilder, Sqlite};

use carlot_core::search::{Filter, OrderBy, Predicate, PredicateValue};

pub const SELECT_VEHICLE: &str = "SELECT id, brand, model, manufacture_year, model_year, engine, \
     fuel_type, transmission, doors, body_style, mileage_km, color, price_cents, plate, chassis, \
     registered_at, last_service_at FROM vehicles";

/// `COUNT(*)` over every predicate, ignoring pagination.
pub fn count_query(filter: &Filter) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) AS total FROM vehicles WHERE 1=1");
    push_predicates(&mut builder, &filter.predicates());
    builder
}

/// One page of rows: predicates, ordering with an `id` tie-break, then `LIMIT`/`OFFSET`.
pub fn page_query(filter: &Filter) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(SELECT_VEHICLE);
    builder.push(" WHERE 1=1");
    push_predicates(&mut builder, &filter.predicates());
    builder.push(" ORDER BY ");
    builder.push(order_clause(filter.order_by()));
    builder.push(" LIMIT ");
    builder.push_bind(i64::from(filter.limit()));
    builder.push(" OFFSET ");
    builder.push_bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX));
    builder
}

pub fn order_clause(order_by: Option<OrderBy>) -> &'static str {
    match order_by {
        None => "id ASC",
        Some(OrderBy::PriceAsc) => "price_cents ASC, id ASC",
        Some(OrderBy::PriceDesc) => "price_cents DESC, id ASC",
        Some(OrderBy::MileageAsc) => "mileage_km ASC, id ASC",
        Some(OrderBy::YearDesc) => "manufacture_year DESC, id ASC",
    }
}

fn push_predicates(builder: &mut QueryBuilder<'static, Sqlite>, predicates: &[Predicate]) {
    for predicate in predicates {
        builder.push(" AND ");
        builder.push(predicate.column().name());
        match predicate {
            // LIKE folds ASCII case only; Predicate::matches mirrors that.
            Predicate::Contains { needle, .. } => {
                builder.push(" LIKE ");
                builder.push_bind(format!("%{}%", escape_like(needle)));
                builder.push(" ESCAPE '\\'");
            }
            Predicate::StartsWith { prefix, .. } => {
                builder.push(" LIKE ");
                builder.push_bind(format!("{}%", escape_like(prefix)));
                builder.push(" ESCAPE '\\'");
            }
            Predicate::AtLeast { value, .. } => {
                builder.push(" >= ");
                builder.push_bind(*value);
            }
            Predicate::AtMost { value, .. } => {
                builder.push(" <= ");
                builder.push_bind(*value);
            }
            Predicate::Equals { value: PredicateValue::Integer(value), .. } => {
                builder.push(" = ");
                builder.push_bind(*value);
            }
            Predicate::Equals { value: PredicateValue::Text(value), .. } => {
                builder.push(" = ");
                builder.push_bind(value.clone());
            }
        }
    }
}

/// Escapes `LIKE` wildcards so user text only ever matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}
