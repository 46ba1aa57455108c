pub mod coerce;
pub mod merge;
pub mod placeholder;
pub mod provider;
pub mod resolver;
