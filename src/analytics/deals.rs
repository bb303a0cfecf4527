//! Deal discovery and enrichment
//!
//! Fetches raw deals through the repository, normalizes their duck-typed
//! discount fields, derives urgency/score/tier classifications, then
//! applies caller constraints. Upstream failures degrade to an empty list.

use std::cmp::Ordering;

use tracing::warn;

use crate::analytics::types::{
    CompetitionLevel, DealRecord, DealType, DealUrgency, ProfitPotential, SalesTrend,
};
use crate::keepa::client::{DealQuery, KeepaClient};
use crate::keepa::discovery::SortOrder;
use crate::keepa::types::{keepa_now_minutes, Deal, Domain};

/// Enhanced-score bonuses
const PRIME_EXCLUSIVE_BONUS: i64 = 10;
const LIGHTNING_BONUS: i64 = 15;
const DEEP_DISCOUNT_BONUS: i64 = 20;
const DEEP_DISCOUNT_PCT: i64 = 50;

/// Rank treated as "no rank" in tier heuristics
const NO_RANK_SENTINEL: i64 = 999_999;

/// Deal sort keys; the upstream `sortType` codes are in the same order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DealSortKey {
    #[default]
    DealScore,
    Price,
    Discount,
    Rating,
    SalesRank,
}

impl DealSortKey {
    pub fn sort_type(self) -> u8 {
        match self {
            DealSortKey::DealScore => 0,
            DealSortKey::Price => 1,
            DealSortKey::Discount => 2,
            DealSortKey::Rating => 3,
            DealSortKey::SalesRank => 4,
        }
    }
}

/// Caller constraints for deal discovery
#[derive(Debug, Clone, Default)]
pub struct DealDiscoveryQuery {
    pub domain: Domain,
    pub category_id: Option<i64>,
    /// Price bounds in integer cents
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Discount bounds in percent
    pub min_discount: Option<i64>,
    pub max_discount: Option<i64>,
    pub min_rating: Option<i64>,
    pub is_prime: Option<bool>,
    /// Keep only lightning deals
    pub lightning_only: bool,
    /// Floor on the enhanced score, applied after enrichment
    pub min_deal_score: Option<i64>,
    pub sort_by: DealSortKey,
    pub sort_order: SortOrder,
    pub page: u32,
    pub per_page: u32,
}

/// Discovers and enriches deals matching the query
///
/// Always yields a value: any upstream failure is logged and degrades to
/// an empty list.
pub async fn discover_deals(client: &KeepaClient, query: &DealDiscoveryQuery) -> Vec<DealRecord> {
    let deal_query = DealQuery {
        domain: query.domain,
        category_id: query.category_id,
        min_price: query.min_price,
        max_price: query.max_price,
        min_discount: query.min_discount,
        min_rating: query.min_rating,
        is_prime: query.is_prime,
        sort_type: Some(query.sort_by.sort_type()),
        page: query.page,
        per_page: if query.per_page == 0 {
            25
        } else {
            query.per_page
        },
    };

    let deals = match client.get_deals(&deal_query).await {
        Ok(deals) => deals,
        Err(err) => {
            warn!(error = %err, "deal discovery failed");
            return Vec::new();
        }
    };

    let now = keepa_now_minutes();
    let mut records: Vec<DealRecord> = deals
        .into_iter()
        .map(|deal| enrich_deal(deal, now))
        .filter(|record| passes_filters(record, query))
        .collect();
    sort_records(&mut records, query.sort_by, query.sort_order);
    records
}

/// Derives the enriched view of one deal at the given marketplace time
pub fn enrich_deal(deal: Deal, now_keepa_minutes: i64) -> DealRecord {
    let discount_percent = deal.discount_percent();
    let price_change = deal.price_change();

    let urgency = if deal.is_lightning_deal {
        match deal.lightning_end {
            Some(end) if now_keepa_minutes < end => DealUrgency::High,
            _ => DealUrgency::Medium,
        }
    } else {
        DealUrgency::Low
    };

    let mut enhanced_score = deal.deal_score;
    if deal.is_prime_exclusive {
        enhanced_score += PRIME_EXCLUSIVE_BONUS;
    }
    if deal.is_lightning_deal {
        enhanced_score += LIGHTNING_BONUS;
    }
    if discount_percent > DEEP_DISCOUNT_PCT {
        enhanced_score += DEEP_DISCOUNT_BONUS;
    }

    let deal_type = if deal.is_lightning_deal {
        DealType::Lightning
    } else if deal.coupon.is_some() {
        DealType::Coupon
    } else if deal.promotion.is_some() {
        DealType::Promotion
    } else {
        DealType::Regular
    };

    let time_remaining_minutes = deal
        .lightning_end
        .map(|end| (end - now_keepa_minutes).max(0));

    let rank = deal.sales_rank.filter(|r| *r > 0).unwrap_or(NO_RANK_SENTINEL);
    let sales_trend = match (deal.sales_rank_reference, deal.sales_rank) {
        (Some(reference), Some(rank)) if reference > 0 && rank > 0 => {
            if reference > rank {
                SalesTrend::Improving
            } else {
                SalesTrend::Declining
            }
        }
        _ => SalesTrend::Stable,
    };

    DealRecord {
        profit_potential: profit_potential(&deal, discount_percent, rank),
        competition_level: competition_from_rank(rank),
        discount_percent,
        price_change,
        enhanced_score,
        urgency,
        deal_type,
        time_remaining_minutes,
        sales_trend,
        deal,
    }
}

/// Point-based profit-potential tier from discount depth, price position
/// and rank
fn profit_potential(deal: &Deal, discount_percent: i64, rank: i64) -> ProfitPotential {
    let mut score = 0;
    if discount_percent > 30 {
        score += 30;
    }
    if discount_percent > 50 {
        score += 20;
    }
    if deal.price > 2_000 && deal.price < 10_000 {
        score += 20;
    }
    if rank < 10_000 {
        score += 20;
    }
    if deal.is_prime_exclusive {
        score += 10;
    }

    if score > 60 {
        ProfitPotential::High
    } else if score > 30 {
        ProfitPotential::Medium
    } else {
        ProfitPotential::Low
    }
}

fn competition_from_rank(rank: i64) -> CompetitionLevel {
    if rank < 1_000 {
        CompetitionLevel::High
    } else if rank < 10_000 {
        CompetitionLevel::Medium
    } else {
        CompetitionLevel::Low
    }
}

fn passes_filters(record: &DealRecord, query: &DealDiscoveryQuery) -> bool {
    if let Some(min_score) = query.min_deal_score {
        if record.enhanced_score < min_score {
            return false;
        }
    }
    if query.lightning_only && !record.deal.is_lightning_deal {
        return false;
    }
    if let Some(min_discount) = query.min_discount {
        if record.discount_percent < min_discount {
            return false;
        }
    }
    if let Some(max_discount) = query.max_discount {
        if record.discount_percent > max_discount {
            return false;
        }
    }
    true
}

fn sort_records(records: &mut [DealRecord], key: DealSortKey, order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = match key {
            DealSortKey::DealScore => a.enhanced_score.cmp(&b.enhanced_score),
            DealSortKey::Price => a.deal.price.cmp(&b.deal.price),
            DealSortKey::Discount => a.discount_percent.cmp(&b.discount_percent),
            // Deal payloads carry no rating; the upstream sortType already
            // ordered the page, and a stable sort preserves that order.
            DealSortKey::Rating => Ordering::Equal,
            DealSortKey::SalesRank => a
                .deal
                .sales_rank
                .unwrap_or(NO_RANK_SENTINEL)
                .cmp(&b.deal.sales_rank.unwrap_or(NO_RANK_SENTINEL)),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeepaConfig;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NOW: i64 = 7_600_000;

    fn deal(asin: &str) -> Deal {
        Deal {
            asin: asin.into(),
            title: format!("Deal {asin}"),
            price: 4_999,
            deal_score: 40,
            ..Default::default()
        }
    }

    #[test]
    fn test_enhanced_score_bonuses() {
        let mut raw = deal("A");
        raw.is_prime_exclusive = true;
        raw.is_lightning_deal = true;
        raw.delta_percent = json!(-60);
        let record = enrich_deal(raw, NOW);
        // 40 base + 10 prime exclusive + 15 lightning + 20 deep discount
        assert_eq!(record.enhanced_score, 85);
    }

    #[test]
    fn test_urgency_against_lightning_end() {
        let mut active = deal("A");
        active.is_lightning_deal = true;
        active.lightning_end = Some(NOW + 120);
        let record = enrich_deal(active, NOW);
        assert_eq!(record.urgency, DealUrgency::High);
        assert_eq!(record.time_remaining_minutes, Some(120));

        let mut expired = deal("B");
        expired.is_lightning_deal = true;
        expired.lightning_end = Some(NOW - 10);
        let record = enrich_deal(expired, NOW);
        assert_eq!(record.urgency, DealUrgency::Medium);
        assert_eq!(record.time_remaining_minutes, Some(0));

        let record = enrich_deal(deal("C"), NOW);
        assert_eq!(record.urgency, DealUrgency::Low);
        assert_eq!(record.time_remaining_minutes, None);
    }

    #[test]
    fn test_deal_type_classification() {
        let mut lightning = deal("A");
        lightning.is_lightning_deal = true;
        lightning.coupon = Some(500);
        assert_eq!(enrich_deal(lightning, NOW).deal_type, DealType::Lightning);

        let mut coupon = deal("B");
        coupon.coupon = Some(500);
        assert_eq!(enrich_deal(coupon, NOW).deal_type, DealType::Coupon);

        let mut promotion = deal("C");
        promotion.promotion = Some("SAVE10".into());
        assert_eq!(enrich_deal(promotion, NOW).deal_type, DealType::Promotion);

        assert_eq!(enrich_deal(deal("D"), NOW).deal_type, DealType::Regular);
    }

    #[test]
    fn test_profit_potential_tiers() {
        // 55% discount (+30 +20), $49.99 (+20), rank 5000 (+20) = 90
        let mut strong = deal("A");
        strong.delta_percent = json!([-55]);
        strong.sales_rank = Some(5_000);
        let record = enrich_deal(strong, NOW);
        assert_eq!(record.profit_potential, ProfitPotential::High);
        assert_eq!(record.competition_level, CompetitionLevel::Medium);

        // Only sweet-spot price (+20): low tier, no rank means low competition
        let record = enrich_deal(deal("B"), NOW);
        assert_eq!(record.profit_potential, ProfitPotential::Low);
        assert_eq!(record.competition_level, CompetitionLevel::Low);

        // 35% discount (+30) with sweet-spot price (+20) = 50: medium
        let mut medium = deal("C");
        medium.delta_percent = json!(-35);
        let record = enrich_deal(medium, NOW);
        assert_eq!(record.profit_potential, ProfitPotential::Medium);
    }

    #[test]
    fn test_sales_trend() {
        let mut improving = deal("A");
        improving.sales_rank = Some(1_000);
        improving.sales_rank_reference = Some(2_000);
        assert_eq!(enrich_deal(improving, NOW).sales_trend, SalesTrend::Improving);

        let mut declining = deal("B");
        declining.sales_rank = Some(2_000);
        declining.sales_rank_reference = Some(1_000);
        assert_eq!(enrich_deal(declining, NOW).sales_trend, SalesTrend::Declining);

        assert_eq!(enrich_deal(deal("C"), NOW).sales_trend, SalesTrend::Stable);
    }

    #[test]
    fn test_nested_delta_arrays_normalize_to_magnitudes() {
        let mut raw = deal("A");
        raw.delta = json!([[-1250, 3]]);
        raw.delta_percent = json!([[-42], [10]]);
        let record = enrich_deal(raw, NOW);
        assert_eq!(record.price_change, 1_250);
        assert_eq!(record.discount_percent, 42);
    }

    #[test]
    fn test_filters() {
        let mut lightning = deal("A");
        lightning.is_lightning_deal = true;
        lightning.delta_percent = json!(-60);
        let lightning = enrich_deal(lightning, NOW);

        let mut shallow = deal("B");
        shallow.delta_percent = json!(-10);
        let shallow = enrich_deal(shallow, NOW);

        let base = DealDiscoveryQuery::default();
        assert!(passes_filters(&lightning, &base));
        assert!(passes_filters(&shallow, &base));

        let lightning_only = DealDiscoveryQuery {
            lightning_only: true,
            ..Default::default()
        };
        assert!(passes_filters(&lightning, &lightning_only));
        assert!(!passes_filters(&shallow, &lightning_only));

        let deep_only = DealDiscoveryQuery {
            min_discount: Some(30),
            ..Default::default()
        };
        assert!(passes_filters(&lightning, &deep_only));
        assert!(!passes_filters(&shallow, &deep_only));

        let capped = DealDiscoveryQuery {
            max_discount: Some(30),
            ..Default::default()
        };
        assert!(!passes_filters(&lightning, &capped));
        assert!(passes_filters(&shallow, &capped));

        let scored = DealDiscoveryQuery {
            min_deal_score: Some(90),
            ..Default::default()
        };
        assert!(!passes_filters(&lightning, &scored));
    }

    #[test]
    fn test_sort_by_discount_descending() {
        let mut a = deal("A");
        a.delta_percent = json!(-10);
        let mut b = deal("B");
        b.delta_percent = json!(-60);
        let mut records = vec![enrich_deal(a, NOW), enrich_deal(b, NOW)];
        sort_records(&mut records, DealSortKey::Discount, SortOrder::Desc);
        assert_eq!(records[0].deal.asin, "B");

        sort_records(&mut records, DealSortKey::Discount, SortOrder::Asc);
        assert_eq!(records[0].deal.asin, "A");
    }

    #[tokio::test]
    async fn test_discover_deals_maps_sort_type_and_enriches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/deal"))
            .and(query_param("domainId", "1"))
            .and(query_param("sortType", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tokensLeft": 70,
                "deals": [
                    {
                        "asin": "B000DEAL01",
                        "title": "Discounted Widget",
                        "price": 4999,
                        "dealScore": 30,
                        "deltaPercent": [[-55]],
                        "delta": [[-2750]],
                        "isLightningDeal": false,
                        "isPrimeExclusive": true,
                        "salesRank": 800
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = KeepaConfig::new("test-key")
            .with_base_url(server.uri())
            .with_rate_limit_delay(Duration::from_millis(0));
        let client = KeepaClient::new(config).unwrap();

        let query = DealDiscoveryQuery {
            sort_by: DealSortKey::Discount,
            ..Default::default()
        };
        let records = discover_deals(&client, &query).await;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.discount_percent, 55);
        assert_eq!(record.price_change, 2_750);
        // 30 base + 10 prime exclusive + 20 deep discount
        assert_eq!(record.enhanced_score, 60);
        assert_eq!(record.competition_level, CompetitionLevel::High);
        assert_eq!(record.profit_potential, ProfitPotential::High);
    }

    #[tokio::test]
    async fn test_discover_deals_degrades_to_empty_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/deal"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;

        let config = KeepaConfig::new("test-key")
            .with_base_url(server.uri())
            .with_rate_limit_delay(Duration::from_millis(0));
        let client = KeepaClient::new(config).unwrap();

        let records = discover_deals(&client, &DealDiscoveryQuery::default()).await;
        assert!(records.is_empty());
    }
}
