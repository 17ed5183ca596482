use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::Local;
use regex::Regex;
use scraper::Html;
use thirtyfour::prelude::*;
use tracing::{debug, info, warn};

use crate::catalog::ProductSummary;
use crate::export::{self, ProductRecord};
use crate::parser;

const BASE_URL: &str = "https://www.waitrose.com/ecom/products";

static SEPARATOR_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_\s]+").unwrap());

/// URL-safe form of a product name: lowercased, ampersands stripped, every
/// run of whitespace/hyphens/underscores collapsed to a single hyphen.
fn slugify(name: &str) -> String {
    let normalized = name.to_lowercase().replace('&', "");
    SEPARATOR_RUNS.replace_all(normalized.trim(), "-").into_owned()
}

/// Canonical detail-page URL for a product.
pub fn product_page_url(name: &str, id: &str) -> String {
    format!("{BASE_URL}/{}/{id}", slugify(name))
}

/// Outcome counts for one worker's slice.
#[derive(Debug, Default)]
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

impl ScrapeStats {
    pub fn merge(&mut self, other: &ScrapeStats) {
        self.total += other.total;
        self.ok += other.ok;
        self.errors += other.errors;
    }
}

/// One worker: a contiguous slice of the catalogue bound to a single remote
/// WebDriver endpoint and the shared output path.
pub struct ProductScraper {
    products: Vec<ProductSummary>,
    webdriver_url: String,
    output_path: PathBuf,
}

impl ProductScraper {
    pub fn new(products: Vec<ProductSummary>, webdriver_url: String, output_path: PathBuf) -> Self {
        Self {
            products,
            webdriver_url,
            output_path,
        }
    }

    /// Process the slice sequentially, one fresh browser session per
    /// product. A failed product is logged and skipped, never fatal.
    pub async fn run(self) -> ScrapeStats {
        let mut stats = ScrapeStats {
            total: self.products.len(),
            ..Default::default()
        };
        for product in &self.products {
            match self.scrape_one(product).await {
                Ok(()) => stats.ok += 1,
                Err(e) => {
                    warn!("Skipping {} ({}): {e:#}", product.name, product.id);
                    stats.errors += 1;
                }
            }
        }
        stats
    }

    async fn scrape_one(&self, product: &ProductSummary) -> Result<()> {
        let product_url = product_page_url(&product.name, &product.id);
        let html = self.fetch_page_source(&product_url).await?;
        let doc = Html::parse_document(&html);

        let description = parser::extract_description(&doc);
        let nutrition = parser::extract_nutrition(&doc);

        let record =
            ProductRecord::from_parts(product, &product_url, description, &nutrition, Local::now())?;
        export::append_record(&self.output_path, &record)?;
        info!("Scraped {}", product_url);
        Ok(())
    }

    /// Open a fresh session on the bound endpoint, load the page and return
    /// its rendered source. The session is always quit, even on failure.
    async fn fetch_page_source(&self, url: &str) -> Result<String> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--start-maximized")
            .context("invalid chrome argument")?;

        let driver = WebDriver::new(&self.webdriver_url, caps)
            .await
            .with_context(|| format!("failed to open session on {}", self.webdriver_url))?;

        let page = match driver.goto(url).await {
            Ok(()) => driver.source().await,
            Err(e) => Err(e),
        };
        if let Err(e) = driver.quit().await {
            debug!("Session teardown failed: {e}");
        }

        page.with_context(|| format!("failed to load {url}"))
    }
}
