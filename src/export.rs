use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::catalog::ProductSummary;
use crate::parser::NutritionTable;

pub const SOURCE_NAME: &str = "Waitrose";
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// One CSV row. Field order is header order; written once, never updated.
#[derive(Debug, Serialize)]
pub struct ProductRecord {
    pub source: String,
    pub title: String,
    pub description: String,
    pub item_price: String,
    pub unit_price: String,
    pub average_rating: Option<f64>,
    pub review_count: Option<i64>,
    pub categories: String,
    pub tags: String,
    pub nutrition: String,
    pub product_url: String,
    pub image_url: String,
    pub size: String,
    pub last_updated: String,
}

impl ProductRecord {
    /// Assemble a row from the catalogue summary plus the two page-scraped
    /// fields. Everything optional degrades to an empty cell.
    pub fn from_parts(
        summary: &ProductSummary,
        product_url: &str,
        description: String,
        nutrition: &NutritionTable,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let nutrition = serde_json::to_string(nutrition)
            .context("failed to serialize nutrition table")?;
        Ok(Self {
            source: SOURCE_NAME.to_string(),
            title: summary.name.clone(),
            description,
            item_price: summary.display_price.clone().unwrap_or_default(),
            unit_price: summary.display_price_qualifier.clone().unwrap_or_default(),
            average_rating: summary.reviews.as_ref().and_then(|r| r.average_rating),
            review_count: summary.reviews.as_ref().and_then(|r| r.review_count),
            categories: summary
                .categories
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
            tags: summary
                .product_tags
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
            nutrition,
            product_url: product_url.to_string(),
            image_url: summary
                .product_image_urls
                .as_ref()
                .and_then(|urls| urls.large.clone())
                .unwrap_or_default(),
            size: summary.size.clone().unwrap_or_default(),
            last_updated: now.format(TIMESTAMP_FORMAT).to_string(),
        })
    }
}

/// Delete any previous snapshot so each run starts from an empty file.
pub fn reset_output(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to delete previous snapshot {}", path.display()))?;
    }
    Ok(())
}

/// Append one row, writing the header first only if the file is currently
/// empty. Workers share the path through independent append-mode handles
/// and rely on OS append semantics for whole-row writes.
pub fn append_record(path: &Path, record: &ProductRecord) -> Result<()> {
    let empty = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(empty)
        .from_writer(file);
    writer.serialize(record)?;
    writer.flush().context("failed to flush CSV row")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::catalog::{Category, ImageUrls, ProductTag, Reviews};

    fn sample_summary(name: &str) -> ProductSummary {
        ProductSummary {
            id: "123456".to_string(),
            name: name.to_string(),
            display_price: Some("£3.50".to_string()),
            display_price_qualifier: Some("(87.5p/100g)".to_string()),
            reviews: Some(Reviews {
                average_rating: Some(4.5),
                review_count: Some(12),
            }),
            categories: vec![
                Category { name: "Fresh".to_string() },
                Category { name: "Pies".to_string() },
            ],
            product_tags: Some(vec![ProductTag { name: "Vegetarian".to_string() }]),
            product_image_urls: Some(ImageUrls {
                extra_large: None,
                large: Some("https://img/large.jpg".to_string()),
                medium: None,
                small: None,
            }),
            size: Some("400g".to_string()),
        }
    }

    fn sample_record(name: &str) -> ProductRecord {
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        ProductRecord::from_parts(
            &sample_summary(name),
            "https://www.waitrose.com/ecom/products/pie/123456",
            "A pie.".to_string(),
            &NutritionTable::default(),
            now,
        )
        .unwrap()
    }

    #[test]
    fn record_joins_lists_and_formats_timestamp() {
        let record = sample_record("Pie");
        assert_eq!(record.source, "Waitrose");
        assert_eq!(record.categories, "Fresh,Pies");
        assert_eq!(record.tags, "Vegetarian");
        assert_eq!(record.nutrition, r#"{"values":[]}"#);
        assert_eq!(record.image_url, "https://img/large.jpg");
        assert_eq!(record.last_updated, "02/01/2024 03:04:05");
    }

    #[test]
    fn record_defaults_missing_summary_fields_to_empty() {
        let summary = ProductSummary {
            id: "9".to_string(),
            name: "Plain".to_string(),
            display_price: None,
            display_price_qualifier: None,
            reviews: None,
            categories: Vec::new(),
            product_tags: None,
            product_image_urls: None,
            size: None,
        };
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let record = ProductRecord::from_parts(
            &summary,
            "https://example/plain/9",
            String::new(),
            &NutritionTable::default(),
            now,
        )
        .unwrap();
        assert_eq!(record.item_price, "");
        assert_eq!(record.average_rating, None);
        assert_eq!(record.review_count, None);
        assert_eq!(record.categories, "");
        assert_eq!(record.tags, "");
        assert_eq!(record.size, "");
    }

    #[test]
    fn header_is_written_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        append_record(&path, &sample_record("First")).unwrap();
        append_record(&path, &sample_record("Second")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(
            "source,title,description,item_price,unit_price,average_rating,review_count,"
        ));
        assert!(lines[1].contains("First"));
        assert!(lines[2].contains("Second"));
    }

    #[test]
    fn reset_deletes_the_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        append_record(&path, &sample_record("Stale")).unwrap();
        reset_output(&path).unwrap();
        assert!(!path.exists());

        // A fresh run starts with a header again.
        append_record(&path, &sample_record("Fresh")).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().next().unwrap().starts_with("source,"));
    }

    #[test]
    fn reset_is_a_no_op_when_nothing_exists() {
        let dir = tempfile::tempdir().unwrap();
        assert!(reset_output(&dir.path().join("missing.csv")).is_ok());
    }
}
