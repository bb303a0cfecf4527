//! Read-through analytics over the Keepa marketplace data API
//!
//! A rate-limited client for product/price/sales-rank snapshots plus the
//! derived-metrics engines built on top of them: sales velocity, inventory
//! turnover and stockout risk, category market statistics, deal discovery
//! and opportunity scoring.
//!
//! Every call is stateless with respect to upstream data; the only shared
//! mutable state is the request gateway's last-call timestamp, which
//! enforces the minimum delay between upstream calls.

pub mod analytics;
pub mod config;
pub mod error;
pub mod keepa;

pub use config::KeepaConfig;
pub use error::{KeepaError, Result};
pub use keepa::client::KeepaClient;
pub use keepa::discovery::{discover_products, DiscoveryFilter};
pub use keepa::types::Domain;
