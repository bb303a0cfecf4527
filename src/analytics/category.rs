//! Category market analysis
//!
//! Turns a sampled product list into market statistics: price positioning,
//! brand concentration, competition level, rating performance and a
//! composite opportunity score.

use std::collections::HashMap;

use crate::analytics::types::{
    BrandAnalysis, BrandShare, CategoryReport, CompetitionAnalysis, CompetitionLevel,
    PerformanceAnalysis, PriceBand, PriceStatistics, QualityLevel,
};
use crate::keepa::types::{verified_category_name, CsvType, Product};

/// Price-band boundaries in integer cents
const BAND_BUDGET_MAX: i64 = 2_500;
const BAND_MID_MAX: i64 = 7_500;
const BAND_PREMIUM_MAX: i64 = 20_000;

/// Opportunity-score model
const OPPORTUNITY_BASE: i64 = 50;
const LOW_COMPETITION_RANK: f64 = 50_000.0;
const VERY_LOW_COMPETITION_RANK: f64 = 100_000.0;
const RATING_HEADROOM_CEILING: f64 = 3.8;
const SWEET_SPOT_MIN_CENTS: f64 = 2_000.0;
const SWEET_SPOT_MAX_CENTS: f64 = 15_000.0;

/// Rank fallback when a sample has no usable sales ranks
const NO_RANK_SENTINEL: f64 = 999_999.0;

/// Sample price for category statistics: the current price metric with the
/// buy box as fallback. Non-positive values mean "no listed price".
fn sample_price(product: &Product) -> Option<i64> {
    let stats = product.stats.as_ref()?;
    stats
        .current(CsvType::Amazon)
        .filter(|price| *price > 0)
        .or_else(|| stats.buy_box_price.filter(|price| *price > 0))
}

fn valid_sample(products: &[Product]) -> Vec<&Product> {
    products
        .iter()
        .filter(|p| p.stats.is_some() && sample_price(p).is_some())
        .collect()
}

/// Analyzes a sampled product list for one category
///
/// An empty valid sample produces a degenerate report with zeroed
/// statistics and an opportunity score of 0, never an error.
pub fn analyze_category(products: &[Product], category_id: i64) -> CategoryReport {
    let sample = valid_sample(products);

    let prices: Vec<i64> = sample.iter().filter_map(|p| sample_price(p)).collect();
    let ranks: Vec<i64> = sample
        .iter()
        .filter_map(|p| p.stats.as_ref()?.current(CsvType::SalesRank))
        .filter(|rank| *rank > 0)
        .collect();
    let ratings: Vec<f64> = sample
        .iter()
        .filter_map(|p| p.stats.as_ref()?.rating())
        .collect();

    let average_price = if prices.is_empty() {
        0.0
    } else {
        prices.iter().sum::<i64>() as f64 / prices.len() as f64
    };
    let average_rank = if ranks.is_empty() {
        NO_RANK_SENTINEL
    } else {
        ranks.iter().sum::<i64>() as f64 / ranks.len() as f64
    };
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().sum::<f64>() / ratings.len() as f64
    };

    CategoryReport {
        category_id,
        category_name: verified_category_name(category_id),
        sample_size: sample.len(),
        price_analysis: price_statistics(&prices),
        brand_analysis: brand_analysis(&sample),
        competition_analysis: CompetitionAnalysis {
            competition_level: competition_from_rank(average_rank),
            average_sales_rank: average_rank,
            market_saturation: saturation_from_sample(sample.len()),
        },
        performance_analysis: performance_analysis(&ratings),
        market_insights: market_insights(&sample, average_price, average_rank, average_rating),
        opportunity_score: opportunity_score(&sample, average_price, average_rank, average_rating),
        recommendations: recommendations(&sample, average_price, average_rank, average_rating),
    }
}

/// Price statistics over the sample; median is the sorted midpoint
fn price_statistics(prices: &[i64]) -> Option<PriceStatistics> {
    if prices.is_empty() {
        return None;
    }

    let mut sorted = prices.to_vec();
    sorted.sort_unstable();
    let average = sorted.iter().sum::<i64>() as f64 / sorted.len() as f64;

    Some(PriceStatistics {
        average_price: average,
        median_price: sorted[sorted.len() / 2],
        min_price: sorted[0],
        max_price: sorted[sorted.len() - 1],
        distribution: price_distribution(&sorted),
    })
}

fn price_distribution(prices: &[i64]) -> Vec<PriceBand> {
    let bands = [
        ("Budget", 0, BAND_BUDGET_MAX),
        ("Mid-range", BAND_BUDGET_MAX, BAND_MID_MAX),
        ("Premium", BAND_MID_MAX, BAND_PREMIUM_MAX),
        ("Luxury", BAND_PREMIUM_MAX, i64::MAX),
    ];
    bands
        .iter()
        .map(|(label, min, max)| {
            let count = prices.iter().filter(|p| **p >= *min && **p < *max).count();
            PriceBand {
                label,
                count,
                percentage: round1(count as f64 / prices.len() as f64 * 100.0),
            }
        })
        .collect()
}

fn brand_analysis(sample: &[&Product]) -> BrandAnalysis {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for product in sample {
        let brand = product.brand.as_deref().unwrap_or("Unknown");
        *counts.entry(brand).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.iter().map(|(b, c)| (*b, *c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let top_brands: Vec<BrandShare> = ranked
        .iter()
        .take(10)
        .map(|(brand, count)| BrandShare {
            brand: brand.to_string(),
            product_count: *count,
            market_share: round1(*count as f64 / sample.len().max(1) as f64 * 100.0),
        })
        .collect();

    let brand_concentration = round1(
        top_brands
            .iter()
            .take(3)
            .map(|share| share.market_share)
            .sum(),
    );

    BrandAnalysis {
        total_brands: counts.len(),
        top_brands,
        brand_concentration,
    }
}

fn competition_from_rank(average_rank: f64) -> CompetitionLevel {
    if average_rank < 10_000.0 {
        CompetitionLevel::High
    } else if average_rank < 50_000.0 {
        CompetitionLevel::Medium
    } else {
        CompetitionLevel::Low
    }
}

fn saturation_from_sample(sample_size: usize) -> CompetitionLevel {
    if sample_size > 40 {
        CompetitionLevel::High
    } else if sample_size > 20 {
        CompetitionLevel::Medium
    } else {
        CompetitionLevel::Low
    }
}

fn performance_analysis(ratings: &[f64]) -> PerformanceAnalysis {
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().sum::<f64>() / ratings.len() as f64
    };
    let quality_level = if average_rating >= 4.2 {
        QualityLevel::Excellent
    } else if average_rating >= 3.8 {
        QualityLevel::Good
    } else if average_rating >= 3.0 {
        QualityLevel::Fair
    } else {
        QualityLevel::Poor
    };

    PerformanceAnalysis {
        average_rating: round1(average_rating),
        total_rated_products: ratings.len(),
        high_rated_products: ratings.iter().filter(|r| **r >= 4.0).count(),
        quality_level,
    }
}

/// Composite 0-100 opportunity heuristic: low competition, rating headroom
/// and sweet-spot pricing each add to a base of 50.
fn opportunity_score(
    sample: &[&Product],
    average_price: f64,
    average_rank: f64,
    average_rating: f64,
) -> u32 {
    if sample.is_empty() {
        return 0;
    }

    let mut score = OPPORTUNITY_BASE;
    if average_rank > LOW_COMPETITION_RANK {
        score += 20;
    }
    if average_rank > VERY_LOW_COMPETITION_RANK {
        score += 10;
    }
    if average_rating < RATING_HEADROOM_CEILING {
        score += 15;
    }
    if average_price > SWEET_SPOT_MIN_CENTS && average_price < SWEET_SPOT_MAX_CENTS {
        score += 10;
    }
    score.clamp(0, 100) as u32
}

fn market_insights(
    sample: &[&Product],
    average_price: f64,
    average_rank: f64,
    average_rating: f64,
) -> Vec<String> {
    if sample.is_empty() {
        return vec!["Insufficient data for market insights".to_string()];
    }

    let mut insights = Vec::new();
    if average_price < 2_500.0 {
        insights.push("Budget-friendly category with high volume potential".to_string());
    } else if average_price > 10_000.0 {
        insights.push("Premium category with higher profit margins".to_string());
    }

    if average_rank < 10_000.0 {
        insights.push("Highly competitive market - established players dominate".to_string());
    } else if average_rank > 100_000.0 {
        insights.push("Less competitive niche with growth opportunities".to_string());
    }

    if average_rating >= 4.2 {
        insights.push("High-quality category - customer satisfaction is key".to_string());
    } else if average_rating < 3.5 && average_rating > 0.0 {
        insights
            .push("Quality improvement opportunity - many products underperform".to_string());
    }

    insights
}

fn recommendations(
    sample: &[&Product],
    average_price: f64,
    average_rank: f64,
    average_rating: f64,
) -> Vec<String> {
    if sample.is_empty() {
        return vec!["Need more product data to generate recommendations".to_string()];
    }

    let mut recommendations = Vec::new();
    if average_price < 2_500.0 {
        recommendations
            .push("Consider volume-based strategies for this budget category".to_string());
    } else if average_price > 10_000.0 {
        recommendations.push("Focus on quality and premium positioning".to_string());
    }

    if average_rank < 10_000.0 {
        recommendations
            .push("Highly competitive - differentiation and branding crucial".to_string());
    } else if average_rank > 100_000.0 {
        recommendations.push("Opportunity for market entry with good products".to_string());
    }

    if average_rating < 3.8 && average_rating > 0.0 {
        recommendations.push("Quality improvement opportunity exists".to_string());
    }

    recommendations
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepa::types::Stats;

    fn product(asin: &str, brand: Option<&str>, price: i64, rank: i64, rating: i64) -> Product {
        let size = CsvType::CountReviews.index() + 1;
        let mut current = vec![None; size];
        current[CsvType::Amazon.index()] = Some(price);
        current[CsvType::SalesRank.index()] = Some(rank);
        current[CsvType::Rating.index()] = Some(rating);

        Product {
            asin: asin.into(),
            brand: brand.map(str::to_string),
            stats: Some(Stats {
                current,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_sample_degenerates() {
        let report = analyze_category(&[], 172_282);
        assert_eq!(report.sample_size, 0);
        assert!(report.price_analysis.is_none());
        assert_eq!(report.opportunity_score, 0);
        assert_eq!(
            report.market_insights,
            vec!["Insufficient data for market insights".to_string()]
        );
        assert_eq!(report.category_name, Some("Electronics"));
    }

    #[test]
    fn test_products_without_price_are_excluded() {
        let priced = product("A", None, 1_000, 5_000, 40);
        let unpriced = product("B", None, -1, 5_000, 40);
        let report = analyze_category(&[priced, unpriced], 172_282);
        assert_eq!(report.sample_size, 1);
    }

    #[test]
    fn test_median_is_sorted_midpoint() {
        let products: Vec<Product> = [900, 100, 500, 300, 700]
            .iter()
            .enumerate()
            .map(|(i, price)| product(&format!("P{i}"), None, *price, 5_000, 40))
            .collect();
        let stats = analyze_category(&products, 1).price_analysis.unwrap();
        assert_eq!(stats.median_price, 500);
        assert_eq!(stats.min_price, 100);
        assert_eq!(stats.max_price, 900);
        assert_eq!(stats.average_price, 500.0);
    }

    #[test]
    fn test_price_bands() {
        let products: Vec<Product> = [1_000, 3_000, 8_000, 25_000]
            .iter()
            .enumerate()
            .map(|(i, price)| product(&format!("P{i}"), None, *price, 5_000, 40))
            .collect();
        let stats = analyze_category(&products, 1).price_analysis.unwrap();
        let by_label: HashMap<&str, usize> = stats
            .distribution
            .iter()
            .map(|band| (band.label, band.count))
            .collect();
        assert_eq!(by_label["Budget"], 1);
        assert_eq!(by_label["Mid-range"], 1);
        assert_eq!(by_label["Premium"], 1);
        assert_eq!(by_label["Luxury"], 1);
        assert_eq!(stats.distribution[0].percentage, 25.0);
    }

    #[test]
    fn test_brand_concentration() {
        let products = vec![
            product("A1", Some("Acme"), 1_000, 5_000, 40),
            product("A2", Some("Acme"), 1_000, 5_000, 40),
            product("B1", Some("Bolt"), 1_000, 5_000, 40),
            product("C1", None, 1_000, 5_000, 40),
        ];
        let brands = analyze_category(&products, 1).brand_analysis;
        assert_eq!(brands.total_brands, 3);
        assert_eq!(brands.top_brands[0].brand, "Acme");
        assert_eq!(brands.top_brands[0].product_count, 2);
        assert_eq!(brands.top_brands[0].market_share, 50.0);
        // All three brands are in the top three.
        assert_eq!(brands.brand_concentration, 100.0);
    }

    #[test]
    fn test_competition_levels() {
        let high = analyze_category(&[product("A", None, 1_000, 5_000, 40)], 1);
        assert_eq!(
            high.competition_analysis.competition_level,
            CompetitionLevel::High
        );

        let medium = analyze_category(&[product("A", None, 1_000, 30_000, 40)], 1);
        assert_eq!(
            medium.competition_analysis.competition_level,
            CompetitionLevel::Medium
        );

        let low = analyze_category(&[product("A", None, 1_000, 200_000, 40)], 1);
        assert_eq!(
            low.competition_analysis.competition_level,
            CompetitionLevel::Low
        );
    }

    #[test]
    fn test_opportunity_score_bonuses() {
        // Rank 200_000 (+20 +10), rating 3.0 (+15), price 5_000 (+10)
        let report = analyze_category(&[product("A", None, 5_000, 200_000, 30)], 1);
        assert_eq!(report.opportunity_score, 100);

        // Crowded, well-rated, premium-priced: base score only
        let report = analyze_category(&[product("A", None, 50_000, 5_000, 45)], 1);
        assert_eq!(report.opportunity_score, 50);
    }

    #[test]
    fn test_quality_levels() {
        let excellent = analyze_category(&[product("A", None, 1_000, 5_000, 44)], 1);
        assert_eq!(
            excellent.performance_analysis.quality_level,
            QualityLevel::Excellent
        );
        assert_eq!(excellent.performance_analysis.high_rated_products, 1);

        let poor = analyze_category(&[product("A", None, 1_000, 5_000, 20)], 1);
        assert_eq!(poor.performance_analysis.quality_level, QualityLevel::Poor);
    }

    #[test]
    fn test_insights_for_budget_crowded_category() {
        let products = vec![product("A", None, 1_200, 5_000, 45)];
        let report = analyze_category(&products, 1);
        assert!(report
            .market_insights
            .iter()
            .any(|i| i.contains("Budget-friendly")));
        assert!(report
            .market_insights
            .iter()
            .any(|i| i.contains("Highly competitive")));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("volume-based strategies")));
    }
}
