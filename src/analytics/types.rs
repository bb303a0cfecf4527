//! Derived analytics types
//!
//! Value objects produced by the velocity, inventory, category and deal
//! analyzers. All of them are created once from upstream snapshots and
//! never mutated.

use serde::Serialize;

use crate::keepa::types::Deal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VelocityTrend {
    Accelerating,
    Stable,
    Declining,
}

impl VelocityTrend {
    /// Ordering weight used when sorting by trend
    pub fn weight(self) -> i64 {
        match self {
            VelocityTrend::Accelerating => 3,
            VelocityTrend::Stable => 2,
            VelocityTrend::Declining => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockoutRisk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfitPotential {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DealUrgency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DealType {
    Lightning,
    Coupon,
    Promotion,
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SalesTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Units-per-period estimates derived from sales rank
#[derive(Debug, Clone, Serialize)]
pub struct SalesVelocity {
    pub daily: i64,
    pub weekly: i64,
    pub monthly: i64,
    pub trend: VelocityTrend,
    /// Relative sales-rank change; positive when the rank is improving
    pub change_percent: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryMetrics {
    /// Estimated inventory cycles per year
    pub turnover_rate: f64,
    pub days_of_inventory: i64,
    pub stockout_risk: StockoutRisk,
    pub recommended_order_quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketMetrics {
    pub rating: f64,
    pub review_count: i64,
    pub sales_rank: i64,
    pub competition: CompetitionLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profitability {
    /// Estimated revenue per day in currency units
    pub revenue_velocity: f64,
    /// Estimated gross margin percentage
    pub gross_margin_estimate: f64,
    /// Estimated profit per day in currency units
    pub profit_velocity: f64,
}

/// Per-product velocity analysis; created once by the estimator
#[derive(Debug, Clone, Serialize)]
pub struct VelocityRecord {
    pub asin: String,
    pub title: String,
    pub brand: Option<String>,
    /// Buy box price in integer cents
    pub price: i64,
    pub sales_velocity: SalesVelocity,
    pub inventory_metrics: InventoryMetrics,
    pub market_metrics: MarketMetrics,
    pub profitability: Profitability,
    pub alerts: Vec<String>,
}

/// Static seasonal annotation attached to inventory reports
#[derive(Debug, Clone, Serialize)]
pub struct SeasonalPattern {
    pub period: &'static str,
    pub velocity_multiplier: f64,
    pub recommendation: &'static str,
}

/// Portfolio-level aggregate over a list of velocity records
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub total_products: usize,
    pub average_velocity: f64,
    pub average_turnover_rate: f64,
    /// Sum of modeled daily revenue across the portfolio
    pub total_revenue_velocity: f64,
    pub average_days_of_inventory: i64,
    /// Percentages rounded to whole numbers
    pub risk_percentage: i64,
    pub slow_movers_ratio: i64,
    pub fast_movers_ratio: i64,
    pub portfolio_health: String,
    pub fast_movers: Vec<VelocityRecord>,
    pub slow_movers: Vec<VelocityRecord>,
    pub stockout_risks: Vec<VelocityRecord>,
    pub seasonal_patterns: Vec<SeasonalPattern>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceBand {
    pub label: &'static str,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceStatistics {
    pub average_price: f64,
    /// Midpoint of the sorted sample
    pub median_price: i64,
    pub min_price: i64,
    pub max_price: i64,
    pub distribution: Vec<PriceBand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandShare {
    pub brand: String,
    pub product_count: usize,
    pub market_share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandAnalysis {
    pub total_brands: usize,
    pub top_brands: Vec<BrandShare>,
    /// Combined share of the top three brands, in percent
    pub brand_concentration: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompetitionAnalysis {
    pub competition_level: CompetitionLevel,
    pub average_sales_rank: f64,
    pub market_saturation: CompetitionLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceAnalysis {
    pub average_rating: f64,
    pub total_rated_products: usize,
    pub high_rated_products: usize,
    pub quality_level: QualityLevel,
}

/// Market-intelligence summary over a sampled product list
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category_id: i64,
    pub category_name: Option<&'static str>,
    pub sample_size: usize,
    pub price_analysis: Option<PriceStatistics>,
    pub brand_analysis: BrandAnalysis,
    pub competition_analysis: CompetitionAnalysis,
    pub performance_analysis: PerformanceAnalysis,
    pub market_insights: Vec<String>,
    /// Composite 0-100 heuristic
    pub opportunity_score: u32,
    pub recommendations: Vec<String>,
}

/// Deal enriched with derived magnitudes, tiers and urgency
#[derive(Debug, Clone, Serialize)]
pub struct DealRecord {
    pub deal: Deal,
    /// Non-negative discount magnitude in percent
    pub discount_percent: i64,
    /// Non-negative price change in cents
    pub price_change: i64,
    pub enhanced_score: i64,
    pub urgency: DealUrgency,
    pub profit_potential: ProfitPotential,
    pub competition_level: CompetitionLevel,
    pub deal_type: DealType,
    /// Minutes until a lightning deal ends; `None` without an end time
    pub time_remaining_minutes: Option<i64>,
    pub sales_trend: SalesTrend,
}
