//! Inventory portfolio analysis
//!
//! Aggregates velocity records into portfolio-level classification and
//! rule-based recommendations. The seasonal annotations are a static table
//! with fixed multipliers; nothing here is derived from historical input.

use crate::analytics::types::{
    InventoryReport, SeasonalPattern, StockoutRisk, VelocityRecord,
};

/// Monthly-unit cutoffs for mover classification
pub const FAST_MOVER_MONTHLY: i64 = 30;
pub const SLOW_MOVER_MONTHLY: i64 = 10;

/// Static seasonal annotation table
pub const SEASONAL_PATTERNS: &[SeasonalPattern] = &[
    SeasonalPattern {
        period: "Q4 Holiday Season (Oct-Dec)",
        velocity_multiplier: 2.8,
        recommendation: "Increase inventory 60-90 days before Black Friday",
    },
    SeasonalPattern {
        period: "Back-to-School (Jul-Aug)",
        velocity_multiplier: 1.7,
        recommendation: "Stock seasonal products and office supplies",
    },
    SeasonalPattern {
        period: "Summer Peak (May-Jul)",
        velocity_multiplier: 1.4,
        recommendation: "Monitor outdoor and recreational products",
    },
    SeasonalPattern {
        period: "Post-Holiday Slowdown (Jan-Feb)",
        velocity_multiplier: 0.6,
        recommendation: "Reduce inventory and focus on clearance",
    },
];

/// Classifies and aggregates a velocity-record portfolio
///
/// Empty input is a valid degenerate case: zeroed metrics and a single
/// "no products" recommendation.
pub fn analyze_inventory(records: &[VelocityRecord]) -> InventoryReport {
    if records.is_empty() {
        return InventoryReport {
            total_products: 0,
            average_velocity: 0.0,
            average_turnover_rate: 0.0,
            total_revenue_velocity: 0.0,
            average_days_of_inventory: 0,
            risk_percentage: 0,
            slow_movers_ratio: 0,
            fast_movers_ratio: 0,
            portfolio_health: "Unknown - no products to assess".to_string(),
            fast_movers: Vec::new(),
            slow_movers: Vec::new(),
            stockout_risks: Vec::new(),
            seasonal_patterns: SEASONAL_PATTERNS.to_vec(),
            recommendations: vec![
                "No products to analyze - consider expanding product portfolio".to_string(),
            ],
        };
    }

    let total = records.len();

    let fast_movers: Vec<VelocityRecord> = records
        .iter()
        .filter(|r| r.sales_velocity.monthly >= FAST_MOVER_MONTHLY)
        .cloned()
        .collect();
    let slow_movers: Vec<VelocityRecord> = records
        .iter()
        .filter(|r| r.sales_velocity.monthly < SLOW_MOVER_MONTHLY)
        .cloned()
        .collect();
    let stockout_risks: Vec<VelocityRecord> = records
        .iter()
        .filter(|r| r.inventory_metrics.stockout_risk == StockoutRisk::High)
        .cloned()
        .collect();

    let average_velocity = records
        .iter()
        .map(|r| r.sales_velocity.monthly as f64)
        .sum::<f64>()
        / total as f64;
    let average_turnover_rate = records
        .iter()
        .map(|r| r.inventory_metrics.turnover_rate)
        .sum::<f64>()
        / total as f64;
    let total_revenue_velocity = records
        .iter()
        .map(|r| r.profitability.revenue_velocity)
        .sum::<f64>();
    let average_days_of_inventory = (records
        .iter()
        .map(|r| r.inventory_metrics.days_of_inventory as f64)
        .sum::<f64>()
        / total as f64)
        .round() as i64;

    let ratio = |count: usize| ((count as f64 / total as f64) * 100.0).round() as i64;
    let risk_percentage = ratio(stockout_risks.len());
    let slow_movers_ratio = ratio(slow_movers.len());
    let fast_movers_ratio = ratio(fast_movers.len());

    let portfolio_health =
        assess_portfolio_health(fast_movers.len(), slow_movers.len(), total).to_string();
    let recommendations = build_recommendations(
        average_velocity,
        average_days_of_inventory,
        stockout_risks.len(),
        slow_movers.len(),
        fast_movers.len(),
        total,
    );

    InventoryReport {
        total_products: total,
        average_velocity: round1(average_velocity),
        average_turnover_rate: round1(average_turnover_rate),
        total_revenue_velocity: (total_revenue_velocity * 100.0).round() / 100.0,
        average_days_of_inventory,
        risk_percentage,
        slow_movers_ratio,
        fast_movers_ratio,
        portfolio_health,
        fast_movers,
        slow_movers,
        stockout_risks,
        seasonal_patterns: SEASONAL_PATTERNS.to_vec(),
        recommendations,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn assess_portfolio_health(fast: usize, slow: usize, total: usize) -> &'static str {
    let fast_ratio = fast as f64 / total as f64;
    let slow_ratio = slow as f64 / total as f64;

    if fast_ratio > 0.3 && slow_ratio < 0.3 {
        "Excellent - High velocity, low risk portfolio"
    } else if fast_ratio > 0.2 && slow_ratio < 0.4 {
        "Good - Balanced velocity with manageable risk"
    } else if slow_ratio > 0.5 {
        "Poor - Too many slow movers impacting cash flow"
    } else {
        "Fair - Room for improvement in velocity optimization"
    }
}

/// Ordered threshold checks against the aggregates; fixed priority
fn build_recommendations(
    average_velocity: f64,
    average_days_of_inventory: i64,
    high_risk: usize,
    slow: usize,
    fast: usize,
    total: usize,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if average_velocity > 25.0 {
        recommendations
            .push("Strong portfolio velocity - maintain current sourcing strategy".to_string());
    } else if average_velocity < 15.0 {
        recommendations.push(
            "Low portfolio velocity - consider more aggressive pricing and promotion".to_string(),
        );
    } else {
        recommendations
            .push("Moderate velocity - optimize product mix for better performance".to_string());
    }

    if high_risk as f64 > total as f64 * 0.2 {
        recommendations
            .push("High stockout risk exposure - implement automated reorder points".to_string());
    } else if high_risk > 0 {
        recommendations
            .push("Monitor stockout risks - set up velocity alerts for fast movers".to_string());
    }

    if slow as f64 > total as f64 * 0.4 {
        recommendations.push(
            "Too many slow movers - implement liquidation strategy for bottom 20%".to_string(),
        );
    }

    if (fast as f64) < total as f64 * 0.2 {
        recommendations.push(
            "Need more fast movers - research trending products in successful categories"
                .to_string(),
        );
    }

    if average_days_of_inventory > 45 {
        recommendations.push(
            "High inventory levels - optimize reorder quantities to improve cash flow".to_string(),
        );
    } else if average_days_of_inventory < 15 {
        recommendations.push(
            "Low inventory levels - consider increasing safety stock to avoid stockouts"
                .to_string(),
        );
    }

    recommendations
        .push("Monitor velocity weekly and adjust reorder points based on trend changes".to_string());
    recommendations
        .push("Target 20-35 day inventory levels for optimal cash flow balance".to_string());
    recommendations
        .push("Focus marketing budget on products with accelerating velocity trends".to_string());

    recommendations
}
