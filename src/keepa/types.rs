//! Keepa API Type Definitions
//!
//! Type definitions for Keepa API responses and requests, plus the small
//! amount of wire-format arithmetic the API requires (Keepa-minutes time
//! base, statistics-array indexing, magnitude coercion for duck-typed
//! deal fields).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keepa time base: minutes offset between Keepa time and the Unix epoch.
pub const KEEPA_EPOCH_OFFSET_MINUTES: i64 = 21_564_000;

/// Converts Keepa minutes to Unix milliseconds.
pub fn keepa_minutes_to_unix_ms(keepa_minutes: i64) -> i64 {
    (keepa_minutes + KEEPA_EPOCH_OFFSET_MINUTES) * 60_000
}

/// Converts Unix milliseconds to Keepa minutes.
pub fn unix_ms_to_keepa_minutes(unix_ms: i64) -> i64 {
    unix_ms / 60_000 - KEEPA_EPOCH_OFFSET_MINUTES
}

/// Current wall-clock time expressed in Keepa minutes.
pub fn keepa_now_minutes() -> i64 {
    unix_ms_to_keepa_minutes(chrono::Utc::now().timestamp_millis())
}

/// Amazon marketplace identifiers as used by the `domain` request parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Domain {
    #[default]
    Us,
    Uk,
    De,
    Fr,
    Jp,
    Ca,
    Cn,
    It,
    Es,
    In,
    Mx,
}

impl Domain {
    /// Numeric marketplace id sent on the wire
    pub fn id(self) -> u8 {
        match self {
            Domain::Us => 1,
            Domain::Uk => 2,
            Domain::De => 3,
            Domain::Fr => 4,
            Domain::Jp => 5,
            Domain::Ca => 6,
            Domain::Cn => 7,
            Domain::It => 8,
            Domain::Es => 9,
            Domain::In => 10,
            Domain::Mx => 11,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Domain::Us),
            2 => Some(Domain::Uk),
            3 => Some(Domain::De),
            4 => Some(Domain::Fr),
            5 => Some(Domain::Jp),
            6 => Some(Domain::Ca),
            7 => Some(Domain::Cn),
            8 => Some(Domain::It),
            9 => Some(Domain::Es),
            10 => Some(Domain::In),
            11 => Some(Domain::Mx),
            _ => None,
        }
    }

    /// Storefront host for the marketplace
    pub fn host(self) -> &'static str {
        match self {
            Domain::Us => "amazon.com",
            Domain::Uk => "amazon.co.uk",
            Domain::De => "amazon.de",
            Domain::Fr => "amazon.fr",
            Domain::Jp => "amazon.co.jp",
            Domain::Ca => "amazon.ca",
            Domain::Cn => "amazon.cn",
            Domain::It => "amazon.it",
            Domain::Es => "amazon.es",
            Domain::In => "amazon.in",
            Domain::Mx => "amazon.com.mx",
        }
    }

    pub fn currency_symbol(self) -> &'static str {
        match self {
            Domain::Us => "$",
            Domain::Uk => "\u{a3}",
            Domain::De | Domain::Fr | Domain::It | Domain::Es => "\u{20ac}",
            Domain::Jp | Domain::Cn => "\u{a5}",
            Domain::Ca => "C$",
            Domain::In => "\u{20b9}",
            Domain::Mx => "$",
        }
    }
}

/// Formats an upstream integer-cents price; `-1` marks an absent value.
pub fn format_price(price_cents: i64, domain: Domain) -> String {
    if price_cents == -1 {
        return "N/A".to_string();
    }
    format!(
        "{}{:.2}",
        domain.currency_symbol(),
        price_cents as f64 / 100.0
    )
}

/// Indices into the Keepa statistics arrays (`current`, `avg`, `avg30`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvType {
    Amazon = 0,
    New = 1,
    Used = 2,
    SalesRank = 3,
    ListingCount = 4,
    NewFbm = 7,
    LightningDeal = 8,
    NewFba = 10,
    CountNew = 11,
    CountUsed = 12,
    Rating = 16,
    CountReviews = 17,
    BuyBox = 18,
    BuyBoxShipping = 28,
}

impl CsvType {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Statistics block returned when the `stats` parameter is set
///
/// The arrays are sparse: slots are `null` when the metric has never been
/// observed, and Keepa uses `-1` for "currently no value".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub current: Vec<Option<i64>>,
    pub avg: Vec<Option<i64>>,
    pub avg30: Vec<Option<i64>>,
    pub avg90: Vec<Option<i64>>,
    pub avg180: Vec<Option<i64>>,
    pub avg365: Vec<Option<i64>>,
    /// Per-metric `[keepa_minutes, value]` extremes
    pub min: Vec<Option<Vec<i64>>>,
    pub max: Vec<Option<Vec<i64>>>,
    pub retrieved_offer_count: Option<i64>,
    pub buy_box_price: Option<i64>,
    pub buy_box_shipping: Option<i64>,
    pub sales_rank_reference: Option<i64>,
    pub sales_rank_reference_drop: Option<i64>,
    pub out_of_stock_percentage30: Option<i64>,
    pub out_of_stock_percentage90: Option<i64>,
}

impl Stats {
    fn slot(array: &[Option<i64>], csv_type: CsvType) -> Option<i64> {
        array.get(csv_type.index()).copied().flatten()
    }

    pub fn current(&self, csv_type: CsvType) -> Option<i64> {
        Self::slot(&self.current, csv_type)
    }

    pub fn avg(&self, csv_type: CsvType) -> Option<i64> {
        Self::slot(&self.avg, csv_type)
    }

    pub fn avg30(&self, csv_type: CsvType) -> Option<i64> {
        Self::slot(&self.avg30, csv_type)
    }

    pub fn avg90(&self, csv_type: CsvType) -> Option<i64> {
        Self::slot(&self.avg90, csv_type)
    }

    pub fn avg180(&self, csv_type: CsvType) -> Option<i64> {
        Self::slot(&self.avg180, csv_type)
    }

    pub fn avg365(&self, csv_type: CsvType) -> Option<i64> {
        Self::slot(&self.avg365, csv_type)
    }

    fn extreme(array: &[Option<Vec<i64>>], csv_type: CsvType) -> Option<i64> {
        array
            .get(csv_type.index())
            .and_then(|pair| pair.as_ref())
            .and_then(|pair| pair.get(1).copied())
    }

    pub fn min_value(&self, csv_type: CsvType) -> Option<i64> {
        Self::extreme(&self.min, csv_type)
    }

    pub fn max_value(&self, csv_type: CsvType) -> Option<i64> {
        Self::extreme(&self.max, csv_type)
    }

    /// Current rating on the natural 0-5 scale (upstream stores 10x)
    pub fn rating(&self) -> Option<f64> {
        self.current(CsvType::Rating)
            .filter(|r| *r > 0)
            .map(|r| r as f64 / 10.0)
    }
}

/// Marketplace offer attached to a product snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Offer {
    pub offer_id: i64,
    pub last_seen: i64,
    pub seller_id: Option<String>,
    pub condition: i64,
    pub is_prime: bool,
    pub is_fba: bool,
    pub is_amazon: bool,
    pub is_buy_box_winner: bool,
    pub prime_exclusive: bool,
    pub is_used: bool,
    pub is_shipped_by_amazon: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub cat_id: i64,
    pub name: String,
    pub parent: Option<i64>,
}

/// Point-in-time product snapshot from the `/product` endpoint
///
/// Immutable for the lifetime of one call; nothing is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub asin: String,
    pub domain_id: u8,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub product_group: Option<String>,
    pub model: Option<String>,
    pub package_height: Option<i64>,
    pub package_length: Option<i64>,
    pub package_width: Option<i64>,
    pub package_weight: Option<i64>,
    pub package_quantity: Option<i64>,
    pub parent: Option<String>,
    pub variations: Option<Vec<String>>,
    pub category_tree: Option<Vec<Category>>,
    pub root_category: Option<i64>,
    pub offers: Option<Vec<Offer>>,
    pub stats: Option<Stats>,
    /// Historical time-series, one flat `[keepa_minutes, value, ...]` array
    /// per [`CsvType`] slot
    pub csv: Option<Vec<Option<Vec<i64>>>>,
    /// Estimated units sold in the last 30 days, when the marketplace
    /// exposes it
    pub monthly_sold: Option<i64>,
    #[serde(rename = "imagesCSV")]
    pub images_csv: Option<String>,
    pub last_rating_update: Option<i64>,
}

/// One decoded point of a product's historical series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    /// Unix milliseconds
    pub timestamp_ms: i64,
    pub value: i64,
}

impl Product {
    /// Decodes the flat `[time, value, time, value, ...]` history for one
    /// metric into timestamped points. Missing series yield an empty list.
    pub fn series(&self, csv_type: CsvType) -> Vec<SeriesPoint> {
        let Some(data) = self
            .csv
            .as_ref()
            .and_then(|csv| csv.get(csv_type.index()))
            .and_then(|slot| slot.as_ref())
        else {
            return Vec::new();
        };
        data.chunks_exact(2)
            .map(|pair| SeriesPoint {
                timestamp_ms: keepa_minutes_to_unix_ms(pair[0]),
                value: pair[1],
            })
            .collect()
    }
}

/// Deal entry from the `/deal` endpoint
///
/// `delta` and `delta_percent` arrive in several shapes (scalar, array,
/// nested array) depending on the deal window; they stay raw here and are
/// normalized by [`value_magnitude`] at the repository boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deal {
    pub asin: String,
    pub title: String,
    pub brand: Option<String>,
    pub price: i64,
    pub shipping: i64,
    pub sales_rank: Option<i64>,
    pub sales_rank_reference: Option<i64>,
    pub delta: Value,
    pub delta_percent: Value,
    pub avg_price: Option<i64>,
    pub deal_score: i64,
    pub is_lightning_deal: bool,
    pub is_prime_exclusive: bool,
    pub coupon: Option<i64>,
    pub promotion: Option<String>,
    /// Lightning deal end, in Keepa minutes
    pub lightning_end: Option<i64>,
    pub domain_id: u8,
    pub category_tree: Option<Vec<Category>>,
    pub image_url: Option<String>,
}

impl Deal {
    /// Discount magnitude in percent, always non-negative
    pub fn discount_percent(&self) -> i64 {
        value_magnitude(&self.delta_percent)
    }

    /// Absolute price change in cents, always non-negative
    pub fn price_change(&self) -> i64 {
        value_magnitude(&self.delta)
    }
}

/// Seller record from the `/seller` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Seller {
    pub seller_id: String,
    pub seller_name: Option<String>,
    pub is_scammer: bool,
    pub has_fba: bool,
    pub has_fbm: bool,
    pub is_amazon: bool,
    pub total_storefront_asins: Option<i64>,
    pub avg_rating: Option<i64>,
    pub rating_count: Option<i64>,
}

/// Entry from the `/bestsellers` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BestSeller {
    pub asin: String,
    pub title: Option<String>,
    pub sales_rank: i64,
    pub category_id: Option<i64>,
    pub price: Option<i64>,
    pub is_prime: bool,
    pub rating: Option<i64>,
    pub review_count: Option<i64>,
}

/// Fields shared by every Keepa response payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseMeta {
    pub timestamp: Option<i64>,
    pub tokens_left: Option<i64>,
    pub tokens_consumed: Option<i64>,
    pub processing_time_in_ms: Option<i64>,
    pub status_code: Option<i64>,
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub meta: ResponseMeta,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealResponse {
    #[serde(flatten)]
    pub meta: ResponseMeta,
    pub deals: Vec<Deal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerResponse {
    #[serde(flatten)]
    pub meta: ResponseMeta,
    pub sellers: Vec<Seller>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BestSellersResponse {
    #[serde(flatten)]
    pub meta: ResponseMeta,
    pub best_sellers_list: Vec<BestSeller>,
}

/// Response from the free-form `/query` selection endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub meta: ResponseMeta,
    pub asin_list: Vec<String>,
    pub total_results: i64,
    pub refill_in: Option<i64>,
    pub refill_rate: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenResponse {
    pub tokens_left: i64,
    pub refill_in: Option<i64>,
    pub refill_rate: Option<i64>,
}

/// Coerces a duck-typed upstream numeric field to a non-negative magnitude
///
/// A scalar yields `abs(value)`, an array `abs(first)`, a nested array
/// `abs(first of first)` (one level of recursion); anything else yields 0.
pub fn value_magnitude(value: &Value) -> i64 {
    fn scalar(value: &Value) -> Option<i64> {
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.round() as i64))
    }

    match value {
        Value::Number(_) => scalar(value).map(i64::abs).unwrap_or(0),
        Value::Array(items) => match items.first() {
            Some(Value::Array(inner)) => inner
                .first()
                .and_then(scalar)
                .map(i64::abs)
                .unwrap_or(0),
            Some(first) => scalar(first).map(i64::abs).unwrap_or(0),
            None => 0,
        },
        _ => 0,
    }
}

/// Root categories confirmed to return results on the query endpoint.
///
/// Advisory only: an id outside this table still queries normally, it just
/// warns the operator that the id may produce empty pages.
pub const VERIFIED_CATEGORIES: &[(&str, i64)] = &[
    ("Alexa Skills", 96_814),
    ("Amazon Autos", 32_373),
    ("Amazon Devices & Accessories", 402),
    ("Appliances", 2_619_525_011),
    ("Apps & Games", 2_350_149_011),
    ("Arts, Crafts & Sewing", 2_617_941_011),
    ("Audible Books & Originals", 18_145_289_011),
    ("Automotive", 15_684_181),
    ("Baby Products", 165_796_011),
    ("Beauty & Personal Care", 3_760_911),
    ("Books", 283_155),
    ("CDs & Vinyl", 5_174),
    ("Cell Phones & Accessories", 2_335_752_011),
    ("Clothing, Shoes & Jewelry", 7_141_123_011),
    ("Collectibles & Fine Art", 4_991_425_011),
    ("Credit & Payment Cards", 3_561_432_011),
    ("Digital Music", 163_856_011),
    ("Electronics", 172_282),
    ("Everything Else", 10_272_111),
    ("Gift Cards", 2_238_192_011),
    ("Grocery & Gourmet Food", 16_310_101),
    ("Handmade Products", 11_260_432_011),
    ("Health & Household", 3_760_901),
    ("Home & Kitchen", 1_055_398),
    ("Industrial & Scientific", 16_310_091),
    ("Kindle Store", 133_140_011),
    ("Luxury Stores", 18_981_045_011),
    ("Magazine Subscriptions", 599_858),
    ("Movies & TV", 2_625_373_011),
    ("Musical Instruments", 11_091_801),
    ("Office Products", 1_064_954),
    ("Patio, Lawn & Garden", 2_972_638_011),
    ("Pet Supplies", 2_619_533_011),
    ("Prime Video", 2_858_778_011),
    ("Software", 229_534),
    ("Sports & Outdoors", 3_375_251),
    ("Tools & Home Improvement", 228_013),
    ("Toys & Games", 165_793_011),
    ("Video Games", 468_642),
    ("Video Shorts", 9_013_971_011),
];

pub fn verified_category_name(category_id: i64) -> Option<&'static str> {
    VERIFIED_CATEGORIES
        .iter()
        .find(|(_, id)| *id == category_id)
        .map(|(name, _)| *name)
}

pub fn verified_category_id(name: &str) -> Option<i64> {
    VERIFIED_CATEGORIES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, id)| *id)
}
