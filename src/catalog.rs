use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

const CATALOG_QUERY: &str = include_str!("catalog_query.graphql");
const AUTH_TOKEN: &str = "Bearer unauthenticated";

/// Per-product data returned by the catalogue query. Everything except
/// id and name is optional so partial grid payloads still deserialize.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_price: Option<String>,
    #[serde(default)]
    pub display_price_qualifier: Option<String>,
    #[serde(default)]
    pub reviews: Option<Reviews>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub product_tags: Option<Vec<ProductTag>>,
    #[serde(default)]
    pub product_image_urls: Option<ImageUrls>,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviews {
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductTag {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrls {
    #[serde(default)]
    pub extra_large: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    data: Option<CatalogData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogData {
    get_product_list_page: ProductListPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductListPage {
    product_grid_data: ProductGridData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductGridData {
    total_matches: usize,
    #[serde(default)]
    components_and_products: Vec<serde_json::Value>,
}

/// Paged client for the product-listing GraphQL endpoint.
///
/// `totalMatches` is read off the first page response and drives the page
/// count; any request or parse failure aborts the whole fetch.
pub struct CatalogClient {
    http: reqwest::Client,
    endpoint: String,
    category: String,
    page_size: usize,
}

impl CatalogClient {
    pub fn new(
        endpoint: impl Into<String>,
        category: impl Into<String>,
        page_size: usize,
    ) -> Result<Self> {
        anyhow::ensure!(page_size > 0, "catalogue page size must be positive");
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            category: category.into(),
            page_size,
        })
    }

    /// Fetch every product in the category, preserving server order.
    pub async fn fetch_all(&self) -> Result<Vec<ProductSummary>> {
        let first = self
            .fetch_page(0)
            .await
            .context("catalogue page request failed (start 0)")?;
        let total = first.total_matches;
        let pages = total.div_ceil(self.page_size);
        info!("Catalogue: {} products across {} pages", total, pages.max(1));

        let pb = ProgressBar::new(pages.max(1) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} pages")?
                .progress_chars("=> "),
        );

        let mut products = grid_products(first)?;
        pb.inc(1);

        for page in 1..pages {
            let start = page * self.page_size;
            let grid = self
                .fetch_page(start)
                .await
                .with_context(|| format!("catalogue page request failed (start {start})"))?;
            products.extend(grid_products(grid)?);
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!("Fetched {} products from catalogue", products.len());
        Ok(products)
    }

    async fn fetch_page(&self, start: usize) -> Result<ProductGridData> {
        let body = json!({
            "query": CATALOG_QUERY,
            "variables": {
                "start": start,
                "size": self.page_size,
                "sortBy": "MOST_POPULAR",
                "trolleyId": "0",
                "recommendationsSize": 0,
                "withRecommendations": false,
                "withFallback": true,
                "category": self.category,
                "customerId": "-1",
                "filterTags": [],
            },
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, AUTH_TOKEN)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: CatalogResponse = response
            .json()
            .await
            .context("malformed catalogue response")?;
        let data = parsed
            .data
            .context("catalogue response carried no data")?;
        Ok(data.get_product_list_page.product_grid_data)
    }
}

/// Keep only grid entries that are actual products; CMS components and
/// sponsored banners share the grid but carry no searchProduct.
fn grid_products(grid: ProductGridData) -> Result<Vec<ProductSummary>> {
    grid.components_and_products
        .into_iter()
        .filter_map(|mut entry| {
            if entry["__typename"] != "GridProduct" {
                return None;
            }
            Some(entry["searchProduct"].take())
        })
        .map(|value| {
            serde_json::from_value::<ProductSummary>(value).context("malformed product summary")
        })
        .collect()
}
