//! Derived business metrics
//!
//! Analytics engines over product snapshots and deals: sales velocity,
//! inventory portfolio classification, category market statistics, deal
//! enrichment and the shared seller-count resolver.

pub mod category;
pub mod deals;
pub mod inventory;
pub mod seller_count;
pub mod types;
pub mod velocity;

pub use category::analyze_category;
pub use deals::{discover_deals, DealDiscoveryQuery, DealSortKey};
pub use inventory::analyze_inventory;
pub use seller_count::{resolve_seller_count, SellerCountInfo, SellerCountWindow};
pub use types::{
    CategoryReport, DealRecord, InventoryReport, StockoutRisk, VelocityRecord, VelocityTrend,
};
pub use velocity::{analyze_velocity, daily_velocity, MarginModel, VelocityQuery};
