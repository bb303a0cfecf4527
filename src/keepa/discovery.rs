//! Product Discovery Engine
//!
//! Translates a [`DiscoveryFilter`] into Keepa's native selection syntax,
//! submits it to the query endpoint and hydrates full snapshots for the
//! matching ids. When the primary path fails and a category id is known,
//! discovery degrades to the category's best-seller list with a synthetic
//! monthly-sold estimate instead of propagating the error.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::KeepaError;
use crate::keepa::client::{BestSellerQuery, KeepaClient, ProductOptions};
use crate::keepa::types::{verified_category_name, Domain, Product};

/// Floor applied to `lastRatingUpdate` so query results carry reasonably
/// fresh rating data. Keepa-minutes value taken from the upstream API
/// examples; treat as an opaque tunable.
pub const RECENT_RATING_FLOOR: i64 = 7_547_800;

/// Upstream page-size cap on the query endpoint
pub const QUERY_PAGE_LIMIT: u32 = 50;

/// Offer count requested when hydrating discovered snapshots
pub const DISCOVERY_OFFER_COUNT: u32 = 20;

/// Synthetic monthly-sold model for best-seller fallback results:
/// `max(FLOOR, BASE - sales_rank / RANK_DIVISOR)`
pub const BEST_SELLER_MONTHLY_BASE: i64 = 2_000;
pub const BEST_SELLER_MONTHLY_FLOOR: i64 = 100;
pub const BEST_SELLER_RANK_DIVISOR: i64 = 100;

/// Sort keys accepted by the query endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoverySortField {
    #[default]
    MonthlySold,
    Price,
    Rating,
    ReviewCount,
    SalesRank,
}

impl DiscoverySortField {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscoverySortField::MonthlySold => "monthlySold",
            DiscoverySortField::Price => "current_AMAZON",
            DiscoverySortField::Rating => "current_RATING",
            DiscoverySortField::ReviewCount => "current_COUNT_REVIEWS",
            DiscoverySortField::SalesRank => "current_SALES_RANK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Rich product filter, translated to the upstream selection object
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilter {
    pub domain: Domain,
    pub category_id: Option<i64>,
    /// Price bounds in integer cents
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Shipping bounds in integer cents
    pub min_shipping: Option<i64>,
    pub max_shipping: Option<i64>,
    /// Rating bounds on the natural 0-5 scale
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_monthly_sales: Option<i64>,
    pub max_monthly_sales: Option<i64>,
    /// Seller-count bounds on the 90-day average of new-offer counts
    pub min_seller_count: Option<i64>,
    pub max_seller_count: Option<i64>,
    pub min_review_count: Option<i64>,
    pub has_reviews: bool,
    pub min_sales_rank: Option<i64>,
    pub max_sales_rank: Option<i64>,
    pub is_prime: bool,
    /// Apply the data-freshness floor (on unless explicitly disabled)
    pub include_recent_ratings: bool,
    pub sort_by: DiscoverySortField,
    pub sort_order: SortOrder,
    pub page: u32,
    pub per_page: u32,
}

impl DiscoveryFilter {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            include_recent_ratings: true,
            per_page: 25,
            ..Default::default()
        }
    }

    /// Translates the filter to Keepa's native selection object
    pub fn to_selection(&self) -> Value {
        let mut selection = Map::new();

        if let Some(category_id) = self.category_id {
            selection.insert("rootCategory".into(), json!([category_id.to_string()]));
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            let mut range = Map::new();
            if let Some(min) = self.min_price {
                range.insert("gte".into(), json!(min));
            }
            if let Some(max) = self.max_price {
                range.insert("lte".into(), json!(max));
            }
            selection.insert("current_AMAZON".into(), Value::Object(range));
        }

        if let Some(min) = self.min_shipping {
            selection.insert("current_BUY_BOX_SHIPPING_gte".into(), json!(min));
        }
        if let Some(max) = self.max_shipping {
            selection.insert("current_BUY_BOX_SHIPPING_lte".into(), json!(max));
        }

        // Keepa stores ratings on a 10x scale (4.5 stars = 45)
        if let Some(min) = self.min_rating {
            selection.insert(
                "current_RATING_gte".into(),
                json!((min * 10.0).floor() as i64),
            );
        }
        if let Some(max) = self.max_rating {
            selection.insert(
                "current_RATING_lte".into(),
                json!((max * 10.0).floor() as i64),
            );
        }

        if let Some(min) = self.min_monthly_sales {
            selection.insert("monthlySold_gte".into(), json!(min));
        }
        if let Some(max) = self.max_monthly_sales {
            selection.insert("monthlySold_lte".into(), json!(max));
        }

        if let Some(min) = self.min_seller_count {
            selection.insert("avg90_COUNT_NEW_gte".into(), json!(min));
        }
        if let Some(max) = self.max_seller_count {
            selection.insert("avg90_COUNT_NEW_lte".into(), json!(max));
        }

        if self.min_review_count.is_some() || self.has_reviews {
            let floor = self.min_review_count.unwrap_or(1);
            selection.insert("current_COUNT_REVIEWS".into(), json!({"gte": floor}));
        }

        if self.is_prime {
            selection.insert("isPrime".into(), json!(true));
        }

        if self.min_sales_rank.is_some() || self.max_sales_rank.is_some() {
            let mut range = Map::new();
            if let Some(min) = self.min_sales_rank {
                range.insert("gte".into(), json!(min));
            }
            if let Some(max) = self.max_sales_rank {
                range.insert("lte".into(), json!(max));
            }
            selection.insert("current_SALES_RANK".into(), Value::Object(range));
        }

        // Standard products only; excludes variation parents and children
        selection.insert("productType".into(), json!(["0"]));

        if self.include_recent_ratings {
            selection.insert("lastRatingUpdate_gte".into(), json!(RECENT_RATING_FLOOR));
        }

        selection.insert(
            "sort".into(),
            json!([[self.sort_by.as_str(), self.sort_order.as_str()]]),
        );

        Value::Object(selection)
    }

    fn page_size(&self) -> u32 {
        if self.per_page == 0 {
            25
        } else {
            self.per_page.min(QUERY_PAGE_LIMIT)
        }
    }
}

/// Snapshot returned by discovery, tagged with its provenance
#[derive(Debug, Clone)]
pub struct DiscoveredProduct {
    pub product: Product,
    /// Upstream estimate on the primary path, synthetic on the fallback
    pub monthly_sold: i64,
    /// Total result count reported by the query endpoint
    pub total_results: Option<i64>,
    pub from_best_sellers: bool,
    pub best_seller_rank: Option<i64>,
}

fn hydration_options() -> ProductOptions {
    ProductOptions {
        stats: Some(1),
        rating: true,
        offers: Some(DISCOVERY_OFFER_COUNT),
        ..Default::default()
    }
}

/// Discovers products matching the filter
///
/// Always yields a value: the primary query path's failure selects the
/// best-seller fallback (when a category id is available), and a fallback
/// failure yields an empty list.
pub async fn discover_products(
    client: &KeepaClient,
    filter: &DiscoveryFilter,
) -> Vec<DiscoveredProduct> {
    if let Some(category_id) = filter.category_id {
        if verified_category_name(category_id).is_none() {
            warn!(
                category_id,
                "category id not in the verified list; query may return empty pages"
            );
        }
    }

    match query_path(client, filter).await {
        Ok(products) => products,
        Err(err) => {
            warn!(error = %err, "query endpoint failed, falling back to best sellers");
            let Some(category_id) = filter.category_id else {
                return Vec::new();
            };
            match best_seller_path(client, filter, category_id).await {
                Ok(products) => products,
                Err(fallback_err) => {
                    warn!(error = %fallback_err, "best sellers fallback also failed");
                    Vec::new()
                }
            }
        }
    }
}

/// Primary path: native selection query, then snapshot hydration
async fn query_path(
    client: &KeepaClient,
    filter: &DiscoveryFilter,
) -> Result<Vec<DiscoveredProduct>, KeepaError> {
    let selection = filter.to_selection();
    let response = client
        .query(&selection, filter.domain, filter.page, filter.page_size())
        .await?;

    if response.asin_list.is_empty() {
        return Ok(Vec::new());
    }

    let products = client
        .get_products_batch(&response.asin_list, filter.domain, &hydration_options())
        .await?;

    Ok(products
        .into_iter()
        .map(|product| DiscoveredProduct {
            monthly_sold: product.monthly_sold.unwrap_or(0),
            total_results: Some(response.total_results),
            from_best_sellers: false,
            best_seller_rank: None,
            product,
        })
        .collect())
}

/// Fallback path: best-seller list with a synthetic monthly-sold figure
async fn best_seller_path(
    client: &KeepaClient,
    filter: &DiscoveryFilter,
    category_id: i64,
) -> Result<Vec<DiscoveredProduct>, KeepaError> {
    let best_sellers = client
        .get_best_sellers(&BestSellerQuery {
            domain: filter.domain,
            category: category_id,
            page: filter.page,
        })
        .await?;

    if best_sellers.is_empty() {
        return Ok(Vec::new());
    }

    let page: Vec<_> = best_sellers
        .into_iter()
        .take(filter.page_size() as usize)
        .collect();
    let asins: Vec<String> = page.iter().map(|entry| entry.asin.clone()).collect();
    // Batch results do not keep request order; pair ranks back up by asin.
    let rank_by_asin: HashMap<String, i64> = page
        .into_iter()
        .map(|entry| (entry.asin, entry.sales_rank))
        .collect();

    let products = client
        .get_products_batch(&asins, filter.domain, &hydration_options())
        .await?;

    Ok(products
        .into_iter()
        .map(|product| {
            let rank = rank_by_asin.get(&product.asin).copied();
            DiscoveredProduct {
                monthly_sold: synthetic_monthly_sold(rank),
                total_results: None,
                from_best_sellers: true,
                best_seller_rank: rank,
                product,
            }
        })
        .collect())
}

/// Linear-in-inverse-rank monthly-sold approximation for best-seller
/// results, floored so downstream velocity math never sees zero.
fn synthetic_monthly_sold(sales_rank: Option<i64>) -> i64 {
    match sales_rank {
        Some(rank) => {
            (BEST_SELLER_MONTHLY_BASE - rank / BEST_SELLER_RANK_DIVISOR)
                .max(BEST_SELLER_MONTHLY_FLOOR)
        }
        None => BEST_SELLER_MONTHLY_FLOOR,
    }
}
