pub mod filter;
pub mod page;
pub mod predicate;

pub use filter::{canonical_key, Filter, FilterBuilder, FilterLimits, OrderBy};
pub use page::ResultPage;
pub use predicate::{Column, FilterField, Predicate, PredicateValue};
