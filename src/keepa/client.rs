//! Keepa HTTP Client
//!
//! Repository layer over the rate-limited gateway: single and batched
//! product snapshot fetches, deal search, seller lookup, best sellers by
//! category, the free-form query endpoint and the token-balance check.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::config::KeepaConfig;
use crate::error::KeepaError;
use crate::keepa::gateway::RequestGateway;
use crate::keepa::types::{
    BestSeller, BestSellersResponse, Deal, DealResponse, Domain, Product, ProductResponse,
    QueryResponse, Seller, SellerResponse, TokenResponse,
};

/// Maximum number of ids the `/product` endpoint accepts per call
pub const BATCH_SIZE: usize = 100;

/// Options forwarded to the `/product` endpoint
///
/// `stats` is forced to 1 when unset: every downstream analytic depends on
/// the statistics block. Pass `Some(0)` to disable it explicitly.
#[derive(Debug, Clone, Default)]
pub struct ProductOptions {
    pub stats: Option<u32>,
    pub rating: bool,
    /// Number of marketplace offers to retrieve (0 = none)
    pub offers: Option<u32>,
    pub history: Option<bool>,
    pub days: Option<u32>,
    pub update: Option<u32>,
}

impl ProductOptions {
    fn apply(&self, params: &mut Vec<(String, String)>) {
        params.push(("stats".into(), self.stats.unwrap_or(1).to_string()));
        if self.rating {
            params.push(("rating".into(), "1".into()));
        }
        if let Some(offers) = self.offers {
            params.push(("offers".into(), offers.to_string()));
        }
        if let Some(history) = self.history {
            params.push(("history".into(), if history { "1" } else { "0" }.into()));
        }
        if let Some(days) = self.days {
            params.push(("days".into(), days.to_string()));
        }
        if let Some(update) = self.update {
            params.push(("update".into(), update.to_string()));
        }
    }
}

/// Product lookup request: exactly one identifier form must be present
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub asin: Option<String>,
    pub asins: Option<Vec<String>>,
    /// Alternate product code (EAN/UPC/ISBN)
    pub code: Option<String>,
    pub domain: Domain,
    pub options: ProductOptions,
}

/// Parameters for the `/deal` endpoint
#[derive(Debug, Clone, Default)]
pub struct DealQuery {
    pub domain: Domain,
    pub category_id: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_discount: Option<i64>,
    pub min_rating: Option<i64>,
    pub is_prime: Option<bool>,
    pub sort_type: Option<u8>,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, Default)]
pub struct SellerQuery {
    pub seller_id: String,
    pub domain: Domain,
    /// Number of storefront asins to retrieve
    pub storefront: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct BestSellerQuery {
    pub domain: Domain,
    pub category: i64,
    pub page: u32,
}

/// Keepa API client
///
/// Owns the single [`RequestGateway`]; all operations issue strictly
/// sequential upstream calls through it.
#[derive(Debug)]
pub struct KeepaClient {
    gateway: RequestGateway,
}

impl KeepaClient {
    pub fn new(config: KeepaConfig) -> Result<Self, KeepaError> {
        Ok(Self {
            gateway: RequestGateway::new(&config)?,
        })
    }

    /// Builds a client from `KEEPA_API_KEY` with default settings
    pub fn from_env() -> Result<Self, KeepaError> {
        let config = KeepaConfig::from_env().map_err(KeepaError::InvalidArgument)?;
        Self::new(config)
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    /// Fetches product snapshots for the given query
    ///
    /// Fails with [`KeepaError::InvalidArgument`] when neither `asin`,
    /// `asins` nor `code` is supplied. Ids the upstream does not know are
    /// simply absent from the result.
    pub async fn get_products(&self, query: &ProductQuery) -> Result<Vec<Product>, KeepaError> {
        let mut params: Vec<(String, String)> =
            vec![("domain".into(), query.domain.id().to_string())];

        if let Some(asin) = &query.asin {
            params.push(("asin".into(), asin.clone()));
        } else if let Some(asins) = &query.asins {
            if asins.is_empty() {
                return Ok(Vec::new());
            }
            params.push(("asin".into(), asins.join(",")));
        } else if let Some(code) = &query.code {
            params.push(("code".into(), code.clone()));
        } else {
            return Err(KeepaError::InvalidArgument(
                "either asin, asins, or code parameter is required".into(),
            ));
        }

        query.options.apply(&mut params);

        let body = self.gateway.get("/product", &params).await?;
        let response: ProductResponse = serde_json::from_value(body)?;
        Ok(response.products)
    }

    /// Fetches a single product snapshot; `None` when the id is unknown
    pub async fn get_product(
        &self,
        asin: &str,
        domain: Domain,
        options: &ProductOptions,
    ) -> Result<Option<Product>, KeepaError> {
        let query = ProductQuery {
            asin: Some(asin.to_string()),
            domain,
            options: options.clone(),
            ..Default::default()
        };
        Ok(self.get_products(&query).await?.into_iter().next())
    }

    /// Fetches snapshots for many ids, chunking into groups of at most
    /// [`BATCH_SIZE`] and issuing the chunks sequentially through the
    /// gateway. Results concatenate in chunk submission order; intra-chunk
    /// order follows the upstream, so use [`missing_asins`] to detect
    /// not-found ids rather than positions.
    pub async fn get_products_batch(
        &self,
        asins: &[String],
        domain: Domain,
        options: &ProductOptions,
    ) -> Result<Vec<Product>, KeepaError> {
        let mut results = Vec::with_capacity(asins.len());
        for chunk in asins.chunks(BATCH_SIZE) {
            let query = ProductQuery {
                asins: Some(chunk.to_vec()),
                domain,
                options: options.clone(),
                ..Default::default()
            };
            let mut products = self.get_products(&query).await?;
            debug!(
                requested = chunk.len(),
                returned = products.len(),
                "fetched product batch chunk"
            );
            results.append(&mut products);
        }
        Ok(results)
    }

    /// Searches current deals
    pub async fn get_deals(&self, query: &DealQuery) -> Result<Vec<Deal>, KeepaError> {
        let mut params: Vec<(String, String)> = vec![
            ("domainId".into(), query.domain.id().to_string()),
            ("page".into(), query.page.to_string()),
            ("perPage".into(), query.per_page.min(50).to_string()),
        ];
        if let Some(category_id) = query.category_id {
            params.push(("categoryId".into(), category_id.to_string()));
        }
        if let Some(min_price) = query.min_price {
            params.push(("minPrice".into(), min_price.to_string()));
        }
        if let Some(max_price) = query.max_price {
            params.push(("maxPrice".into(), max_price.to_string()));
        }
        if let Some(min_discount) = query.min_discount {
            params.push(("minDiscount".into(), min_discount.to_string()));
        }
        if let Some(min_rating) = query.min_rating {
            params.push(("minRating".into(), min_rating.to_string()));
        }
        if let Some(is_prime) = query.is_prime {
            params.push(("isPrime".into(), is_prime.to_string()));
        }
        if let Some(sort_type) = query.sort_type {
            params.push(("sortType".into(), sort_type.to_string()));
        }

        let body = self.gateway.get("/deal", &params).await?;
        let response: DealResponse = serde_json::from_value(body)?;
        Ok(response.deals)
    }

    /// Looks up seller records
    pub async fn get_seller(&self, query: &SellerQuery) -> Result<Vec<Seller>, KeepaError> {
        if query.seller_id.is_empty() {
            return Err(KeepaError::InvalidArgument(
                "seller parameter is required".into(),
            ));
        }
        let mut params: Vec<(String, String)> = vec![
            ("domain".into(), query.domain.id().to_string()),
            ("seller".into(), query.seller_id.clone()),
        ];
        if let Some(storefront) = query.storefront {
            params.push(("storefront".into(), storefront.to_string()));
        }

        let body = self.gateway.get("/seller", &params).await?;
        let response: SellerResponse = serde_json::from_value(body)?;
        Ok(response.sellers)
    }

    /// Fetches the best-seller list for a category
    pub async fn get_best_sellers(
        &self,
        query: &BestSellerQuery,
    ) -> Result<Vec<BestSeller>, KeepaError> {
        let params: Vec<(String, String)> = vec![
            ("domain".into(), query.domain.id().to_string()),
            ("category".into(), query.category.to_string()),
            ("page".into(), query.page.to_string()),
        ];

        let body = self.gateway.get("/bestsellers", &params).await?;
        let response: BestSellersResponse = serde_json::from_value(body)?;
        Ok(response.best_sellers_list)
    }

    /// Submits a native selection object to the `/query` endpoint
    pub async fn query(
        &self,
        selection: &Value,
        domain: Domain,
        page: u32,
        per_page: u32,
    ) -> Result<QueryResponse, KeepaError> {
        let params: Vec<(String, String)> = vec![
            ("domain".into(), domain.id().to_string()),
            ("selection".into(), serde_json::to_string(selection)?),
            ("page".into(), page.to_string()),
            ("perPage".into(), per_page.min(50).to_string()),
        ];

        let body = self.gateway.get("/query", &params).await?;
        let response: QueryResponse = serde_json::from_value(body)?;
        Ok(response)
    }

    /// Checks the remaining token balance
    pub async fn tokens_left(&self) -> Result<i64, KeepaError> {
        let body = self.gateway.get("/token", &[]).await?;
        let response: TokenResponse = serde_json::from_value(body)?;
        Ok(response.tokens_left)
    }
}

/// Requested ids with no snapshot in the result
///
/// Batch results do not preserve intra-chunk id order, so not-found
/// detection diffs the id sets; request order is kept in the output.
pub fn missing_asins(requested: &[String], returned: &[Product]) -> Vec<String> {
    let found: HashSet<&str> = returned.iter().map(|p| p.asin.as_str()).collect();
    requested
        .iter()
        .filter(|asin| !found.contains(asin.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn test_client(base_url: &str) -> KeepaClient {
        let config = crate::config::KeepaConfig::new("test-key")
            .with_base_url(base_url)
            .with_rate_limit_delay(Duration::from_millis(0));
        KeepaClient::new(config).unwrap()
    }

    fn product_json(asin: &str) -> Value {
        json!({"asin": asin, "domainId": 1, "title": format!("Product {asin}")})
    }

    #[test]
    fn test_missing_asins_diffs_id_sets() {
        let requested: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let returned: Vec<Product> = vec![
            serde_json::from_value(product_json("C")).unwrap(),
            serde_json::from_value(product_json("A")).unwrap(),
        ];
        assert_eq!(missing_asins(&requested, &returned), vec!["B".to_string()]);
    }

    #[tokio::test]
    async fn test_get_products_requires_identifier() {
        let client = test_client("http://localhost:1");
        let err = client
            .get_products(&ProductQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KeepaError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_stats_forced_on_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product"))
            .and(query_param("stats", "1"))
            .and(query_param("asin", "B000TEST01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tokensLeft": 100,
                "products": [product_json("B000TEST01")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let product = client
            .get_product("B000TEST01", Domain::Us, &ProductOptions::default())
            .await
            .unwrap();
        assert_eq!(product.unwrap().asin, "B000TEST01");
    }

    #[tokio::test]
    async fn test_stats_can_be_disabled_explicitly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product"))
            .and(query_param("stats", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tokensLeft": 100,
                "products": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let options = ProductOptions {
            stats: Some(0),
            ..Default::default()
        };
        let product = client
            .get_product("B000TEST01", Domain::Us, &options)
            .await
            .unwrap();
        assert!(product.is_none());
    }

    #[tokio::test]
    async fn test_batch_chunks_sequentially() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product"))
            .respond_with(|request: &Request| {
                let query: std::collections::HashMap<String, String> = request
                    .url
                    .query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                let asins = query.get("asin").cloned().unwrap_or_default();
                let products: Vec<Value> =
                    asins.split(',').map(product_json).collect();
                ResponseTemplate::new(200)
                    .set_body_json(json!({"tokensLeft": 100, "products": products}))
            })
            .expect(3)
            .mount(&server)
            .await;

        let asins: Vec<String> = (0..250).map(|i| format!("ASIN{i:04}")).collect();
        let client = test_client(&server.uri());
        let products = client
            .get_products_batch(&asins, Domain::Us, &ProductOptions::default())
            .await
            .unwrap();

        // ceil(250 / 100) = 3 upstream calls, result never exceeds the request.
        assert_eq!(products.len(), 250);
        assert!(missing_asins(&asins, &products).is_empty());
        // Chunk submission order is preserved.
        assert_eq!(products[0].asin, "ASIN0000");
        assert_eq!(products[100].asin, "ASIN0100");
        assert_eq!(products[249].asin, "ASIN0249");
    }

    #[tokio::test]
    async fn test_batch_with_partial_result_reports_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tokensLeft": 100,
                "products": [product_json("A"), product_json("C")]
            })))
            .mount(&server)
            .await;

        let asins: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let client = test_client(&server.uri());
        let products = client
            .get_products_batch(&asins, Domain::Us, &ProductOptions::default())
            .await
            .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(missing_asins(&asins, &products), vec!["B".to_string()]);
    }

    #[tokio::test]
    async fn test_tokens_left() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"tokensLeft": 276})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert_eq!(client.tokens_left().await.unwrap(), 276);
    }

    #[tokio::test]
    async fn test_query_serializes_selection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("domain", "1"))
            .and(query_param("perPage", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tokensLeft": 90,
                "asinList": ["B000TEST01"],
                "totalResults": 1312
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let selection = json!({"productType": ["0"]});
        // perPage is clamped to the upstream limit of 50
        let response = client.query(&selection, Domain::Us, 0, 80).await.unwrap();
        assert_eq!(response.asin_list, vec!["B000TEST01".to_string()]);
        assert_eq!(response.total_results, 1312);
    }
}
