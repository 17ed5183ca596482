use scraper::{Html, Selector};

use super::collapse_text;

/// Candidate sections in priority order: the product description proper,
/// then the summary, then the marketing blurb.
const SECTION_PRIORITY: [&str; 3] = ["productDescription", "summary", "marketingDescription"];

/// Text of the first candidate section that has any. All candidates empty
/// or absent yields an empty string, not an error.
pub fn extract_description(doc: &Html) -> String {
    SECTION_PRIORITY
        .iter()
        .find_map(|id| section_text(doc, id))
        .unwrap_or_default()
}

fn section_text(doc: &Html, id: &str) -> Option<String> {
    let selector = Selector::parse(&format!("section#{id}")).ok()?;
    let section = doc.select(&selector).next()?;
    let text = collapse_text(section.text());
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn product_description_wins_over_later_sections() {
        let doc = doc(
            r#"<section id="productDescription"><p>A proper pie.</p></section>
               <section id="summary">Short summary.</section>
               <section id="marketingDescription">Buy it!</section>"#,
        );
        assert_eq!(extract_description(&doc), "A proper pie.");
    }

    #[test]
    fn empty_primary_section_falls_back_to_summary() {
        let doc = doc(
            r#"<section id="productDescription">   </section>
               <section id="summary">Short summary.</section>"#,
        );
        assert_eq!(extract_description(&doc), "Short summary.");
    }

    #[test]
    fn marketing_description_is_the_last_resort() {
        let doc = doc(r#"<section id="marketingDescription">Buy it!</section>"#);
        assert_eq!(extract_description(&doc), "Buy it!");
    }

    #[test]
    fn no_matching_section_yields_empty_string() {
        let doc = doc(r#"<section id="reviews">Five stars</section>"#);
        assert_eq!(extract_description(&doc), "");
    }

    #[test]
    fn nested_markup_is_flattened() {
        let doc = doc(
            r#"<section id="productDescription"><h2>About</h2><p>Hand <em>made</em>.</p></section>"#,
        );
        assert_eq!(extract_description(&doc), "About Hand made .");
    }
}
