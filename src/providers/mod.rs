//! Quote provider module
//!
//! Defines the Provider trait, the registry the aggregator dispatches
//! from, and the vendor implementations.

mod loader;
mod registry;
mod traits;

// Provider implementations
pub mod amadeus;
pub mod google_flights;
pub mod mock;

pub use amadeus::Amadeus;
pub use google_flights::GoogleFlights;
pub use loader::ProviderLoader;
pub use mock::MockProvider;
pub use registry::{ProviderRegistry, RegistryError};
pub use traits::*;
