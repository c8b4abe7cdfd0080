pub mod catalog;
pub mod vehicle;
