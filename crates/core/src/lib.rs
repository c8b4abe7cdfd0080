pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod keywords;
pub mod search;
pub mod text;

pub use conversation::{ChatMessage, ConversationHistory, Role, Session};
pub use domain::catalog::{CatalogStatistics, CountBucket, FieldMetadata, PriceRange, YearRange};
pub use domain::vehicle::{BodyStyle, FuelType, Transmission, Vehicle, VehicleId};
pub use errors::{
    ApplicationError, ClassificationError, DomainError, ExtractionError, InterfaceError,
    ValidationError,
};
pub use search::{Filter, FilterBuilder, FilterField, FilterLimits, OrderBy, Predicate, ResultPage};
