use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::collapse_text;

static CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.nutrition___VCHp1").unwrap());
static HEADER_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("thead tr").unwrap());
static BODY_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tbody tr").unwrap());
static CELLS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());
static ROW_LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());

/// Per-unit nutrition breakdown scraped from a product page.
///
/// Serializes as `{"values": [{"unit": "...", "<nutrient>": "<value>", ...}]}`.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct NutritionTable {
    pub values: Vec<UnitColumn>,
}

/// One unit-of-measure column: a flattened map from nutrient name to value.
#[derive(Debug, PartialEq, Serialize)]
pub struct UnitColumn {
    pub unit: String,
    #[serde(flatten)]
    pub nutrients: BTreeMap<String, String>,
}

/// Extract the nutrition table. The header row names the unit columns; each
/// body row maps its leading cell (the nutrient) to the value in every unit
/// column. A body row whose leading `th` carries a class is a section
/// header, not a nutrient, and is skipped. Anything missing or malformed
/// collapses the whole extraction to the empty table.
pub fn extract_nutrition(doc: &Html) -> NutritionTable {
    read_table(doc).unwrap_or_default()
}

fn read_table(doc: &Html) -> Option<NutritionTable> {
    let container = doc.select(&CONTAINER).next()?;
    let header = container.select(&HEADER_ROW).next()?;
    let units: Vec<String> = header.select(&CELLS).map(cell_text).collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in container.select(&BODY_ROWS) {
        let label = row.select(&ROW_LABEL).next()?;
        if label.value().attr("class").is_some() {
            continue;
        }
        rows.push(row.select(&CELLS).map(cell_text).collect());
    }

    // Column 0 holds the nutrient names; every further column is one unit.
    let mut values = Vec::new();
    for (index, unit) in units.iter().enumerate().skip(1) {
        let mut nutrients = BTreeMap::new();
        for cells in &rows {
            let name = cells.first()?.clone();
            let value = cells.get(index)?.clone();
            nutrients.insert(name, value);
        }
        values.push(UnitColumn {
            unit: unit.clone(),
            nutrients,
        });
    }

    Some(NutritionTable { values })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    collapse_text(cell.text())
}
