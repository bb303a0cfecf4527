//! Keepa API integration
//!
//! Wire types, the rate-limited request gateway, the snapshot repository
//! and the discovery engine.

pub mod client;
pub mod discovery;
pub mod gateway;
pub mod types;

pub use client::{KeepaClient, ProductOptions, ProductQuery, BATCH_SIZE};
pub use discovery::{discover_products, DiscoveredProduct, DiscoveryFilter, SortOrder};
pub use gateway::RequestGateway;
pub use types::{Deal, Domain, Product, Stats};
