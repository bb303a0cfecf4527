//! Sales velocity estimation
//!
//! Rank-to-velocity heuristic plus the derived turnover, stockout-risk and
//! profitability metrics. The power-law approximation is the industry-style
//! fixed model; it is deliberately not configurable.

use std::cmp::Ordering;

use crate::analytics::seller_count::{resolve_seller_count, SellerCountWindow};
use crate::analytics::types::{
    CompetitionLevel, InventoryMetrics, MarketMetrics, Profitability, SalesVelocity,
    StockoutRisk, VelocityRecord, VelocityTrend,
};
use crate::keepa::discovery::SortOrder;
use crate::keepa::types::{CsvType, Product};

/// Numerator of the rank-to-daily-units power law
pub const RANK_VELOCITY_NUMERATOR: f64 = 1_000_000.0;

/// Fixed gross margin used on the plain velocity path, in percent
pub const FIXED_MARGIN_PERCENT: f64 = 25.0;

/// Bounds of the seller-count-sensitive margin model, in percent
pub const MARGIN_FLOOR_PERCENT: f64 = 15.0;
pub const MARGIN_CEILING_PERCENT: f64 = 40.0;
pub const MARGIN_BASE_PERCENT: f64 = 35.0;

/// Out-of-stock percentage cutoffs for stockout-risk classification
const STOCKOUT_HIGH_PCT: i64 = 30;
const STOCKOUT_MEDIUM_PCT: i64 = 15;

/// Estimated units sold per day for a sales rank
///
/// `max(1, floor(1_000_000 / sqrt(rank)))` for a positive rank, else 0.
/// Non-increasing in the rank: a better (lower) rank never sells less.
pub fn daily_velocity(sales_rank: i64) -> i64 {
    if sales_rank > 0 {
        ((RANK_VELOCITY_NUMERATOR / (sales_rank as f64).sqrt()).floor() as i64).max(1)
    } else {
        0
    }
}

/// Gross-margin model applied to a velocity estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarginModel {
    /// Flat margin used on the plain velocity path
    #[default]
    Fixed,
    /// Competition-sensitive margin used on discovery and opportunity paths
    SellerAdjusted { seller_count: i64 },
}

impl MarginModel {
    pub fn margin_percent(self) -> f64 {
        match self {
            MarginModel::Fixed => FIXED_MARGIN_PERCENT,
            MarginModel::SellerAdjusted { seller_count } => {
                (MARGIN_BASE_PERCENT - 2.0 * seller_count as f64)
                    .clamp(MARGIN_FLOOR_PERCENT, MARGIN_CEILING_PERCENT)
            }
        }
    }

    fn competition(self) -> CompetitionLevel {
        match self {
            MarginModel::Fixed => CompetitionLevel::Medium,
            MarginModel::SellerAdjusted { seller_count } => {
                if seller_count > 10 {
                    CompetitionLevel::High
                } else if seller_count < 5 {
                    CompetitionLevel::Low
                } else {
                    CompetitionLevel::Medium
                }
            }
        }
    }
}

/// Builds a velocity record from a product snapshot
///
/// Returns `None` when the snapshot carries no statistics block; every
/// derived metric depends on it.
pub fn estimate_velocity(product: &Product, margin: MarginModel) -> Option<VelocityRecord> {
    let stats = product.stats.as_ref()?;

    let current_rank = stats.current(CsvType::SalesRank).unwrap_or(0);
    let avg_rank = stats.avg(CsvType::SalesRank).unwrap_or(0);

    let daily = daily_velocity(current_rank);
    let weekly = daily * 7;
    let monthly = daily * 30;

    let trend = if avg_rank <= 0 || current_rank <= 0 {
        VelocityTrend::Stable
    } else {
        match avg_rank.cmp(&current_rank) {
            Ordering::Greater => VelocityTrend::Accelerating,
            Ordering::Less => VelocityTrend::Declining,
            Ordering::Equal => VelocityTrend::Stable,
        }
    };
    let change_percent = if avg_rank > 0 {
        (((avg_rank - current_rank) as f64 / avg_rank as f64) * 100.0).round() as i64
    } else {
        0
    };

    let buy_box_price = stats.buy_box_price.filter(|p| *p > 0).unwrap_or(0);
    let out_of_stock_pct = stats.out_of_stock_percentage30.unwrap_or(0);

    let turnover_rate = if out_of_stock_pct < 50 {
        (12.0 - out_of_stock_pct as f64 / 10.0).max(1.0)
    } else {
        1.0
    };
    let days_of_inventory = (30.0 / daily.max(1) as f64).ceil() as i64;
    let stockout_risk = if out_of_stock_pct > STOCKOUT_HIGH_PCT {
        StockoutRisk::High
    } else if out_of_stock_pct > STOCKOUT_MEDIUM_PCT {
        StockoutRisk::Medium
    } else {
        StockoutRisk::Low
    };

    let revenue_velocity = daily as f64 * (buy_box_price as f64 / 100.0);
    let margin_percent = margin.margin_percent();
    let profit_velocity = revenue_velocity * margin_percent / 100.0;

    let mut alerts = Vec::new();
    if daily > 20 {
        alerts.push("High velocity - monitor inventory levels".to_string());
    }
    if daily < 3 {
        alerts.push("Low velocity - consider promotion or markdown".to_string());
    }
    if let MarginModel::SellerAdjusted { seller_count } = margin {
        if seller_count > 8 {
            alerts.push("High competition - monitor pricing".to_string());
        }
    }

    Some(VelocityRecord {
        asin: product.asin.clone(),
        title: product
            .title
            .clone()
            .unwrap_or_else(|| "Unknown Product".to_string()),
        brand: product.brand.clone(),
        price: buy_box_price,
        sales_velocity: SalesVelocity {
            daily,
            weekly,
            monthly,
            trend,
            change_percent,
        },
        inventory_metrics: InventoryMetrics {
            turnover_rate,
            days_of_inventory,
            stockout_risk,
            recommended_order_quantity: daily * 30,
        },
        market_metrics: MarketMetrics {
            rating: stats.rating().unwrap_or(0.0),
            review_count: stats.current(CsvType::CountReviews).unwrap_or(0),
            sales_rank: current_rank,
            competition: margin.competition(),
        },
        profitability: Profitability {
            revenue_velocity: round2(revenue_velocity),
            gross_margin_estimate: margin_percent,
            profit_velocity: round2(profit_velocity),
        },
        alerts,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sort keys for velocity result sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VelocitySortKey {
    #[default]
    Velocity,
    TurnoverRate,
    RevenueVelocity,
    Trend,
}

/// Parameters of a velocity analysis pass
#[derive(Debug, Clone, Default)]
pub struct VelocityQuery {
    /// Optional bound on estimated daily units
    pub min_velocity: Option<i64>,
    pub max_velocity: Option<i64>,
    pub sort_by: VelocitySortKey,
    pub sort_order: SortOrder,
    pub seller_window: SellerCountWindow,
    /// Use the competition-sensitive margin model instead of the flat one
    pub seller_adjusted_margin: bool,
}

/// Runs the estimator over a snapshot list, then filters and sorts
///
/// Snapshots without statistics are skipped. Empty input is a valid
/// degenerate case and yields an empty result.
pub fn analyze_velocity(products: &[Product], query: &VelocityQuery) -> Vec<VelocityRecord> {
    let mut records: Vec<VelocityRecord> = products
        .iter()
        .filter_map(|product| {
            let margin = if query.seller_adjusted_margin {
                let seller_count = resolve_seller_count(product, query.seller_window).count;
                MarginModel::SellerAdjusted { seller_count }
            } else {
                MarginModel::Fixed
            };
            estimate_velocity(product, margin)
        })
        .filter(|record| {
            if let Some(min) = query.min_velocity {
                if record.sales_velocity.daily < min {
                    return false;
                }
            }
            if let Some(max) = query.max_velocity {
                if record.sales_velocity.daily > max {
                    return false;
                }
            }
            true
        })
        .collect();

    records.sort_by(|a, b| {
        let ordering = match query.sort_by {
            VelocitySortKey::Velocity => a.sales_velocity.daily.cmp(&b.sales_velocity.daily),
            VelocitySortKey::TurnoverRate => a
                .inventory_metrics
                .turnover_rate
                .partial_cmp(&b.inventory_metrics.turnover_rate)
                .unwrap_or(Ordering::Equal),
            VelocitySortKey::RevenueVelocity => a
                .profitability
                .revenue_velocity
                .partial_cmp(&b.profitability.revenue_velocity)
                .unwrap_or(Ordering::Equal),
            VelocitySortKey::Trend => a
                .sales_velocity
                .trend
                .weight()
                .cmp(&b.sales_velocity.trend.weight()),
        };
        match query.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    records
}
