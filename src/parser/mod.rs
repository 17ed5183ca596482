pub mod description;
pub mod nutrition;

pub use description::extract_description;
pub use nutrition::{extract_nutrition, NutritionTable};

/// Whitespace-normalized text content of an HTML node.
pub(crate) fn collapse_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
