use scraper::{ElementRef, Html, Selector};

/// Anything inside these never counts as page content.
const EXCLUDED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Pages yielding less visible text than this are treated as having no
/// usable content (cookie walls, SPA shells, error pages).
const MIN_TEXT_LEN: usize = 100;

/// Extract visible text from rendered HTML.
///
/// Prefers a `main`/`article` landmark, falling back to the whole document.
/// Whitespace is collapsed to single spaces and the result is capped at
/// `max_len` characters. Returns an empty string when the page has no
/// usable content.
pub fn extract(html: &str, max_len: usize) -> String {
    let doc = Html::parse_document(html);

    let root = content_root(&doc);
    let mut pieces = Vec::new();
    if let Some(el) = root {
        collect_text(el, &mut pieces);
    }

    let text = pieces.join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.trim().len() <= MIN_TEXT_LEN {
        return String::new();
    }
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect()
    } else {
        text
    }
}

fn content_root(doc: &Html) -> Option<ElementRef<'_>> {
    for sel in ["main", "article"] {
        let selector = Selector::parse(sel).ok()?;
        if let Some(el) = doc.select(&selector).next() {
            return Some(el);
        }
    }
    Some(doc.root_element())
}

fn collect_text(el: ElementRef<'_>, out: &mut Vec<String>) {
    if EXCLUDED_TAGS.contains(&el.value().name()) {
        return;
    }
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            let t = text.trim();
            if !t.is_empty() {
                out.push(t.to_string());
            }
        } else if let Some(child_el) = ElementRef::wrap(child) {
            collect_text(child_el, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 10_000;

    fn page(body: &str) -> String {
        format!("<html><head><title>t</title></head><body>{}</body></html>", body)
    }

    fn filler(n: usize) -> String {
        "Sparen bij onze bank is eenvoudig en veilig. ".repeat(n)
    }

    #[test]
    fn prefers_main_over_body() {
        let html = page(&format!(
            "<div>outside text</div><main><p>{}</p></main>",
            filler(5)
        ));
        let text = extract(&html, MAX);
        assert!(text.contains("Sparen bij onze bank"));
        assert!(!text.contains("outside text"));
    }

    #[test]
    fn falls_back_to_article() {
        let html = page(&format!("<article><p>{}</p></article>", filler(5)));
        assert!(extract(&html, MAX).contains("Sparen"));
    }

    #[test]
    fn full_document_fallback_skips_chrome() {
        let html = page(&format!(
            "<nav>MENU ITEMS</nav><div><p>{}</p></div><footer>FOOTER</footer>\
             <script>var x = 1;</script>",
            filler(5)
        ));
        let text = extract(&html, MAX);
        assert!(text.contains("Sparen"));
        assert!(!text.contains("MENU ITEMS"));
        assert!(!text.contains("FOOTER"));
        assert!(!text.contains("var x"));
    }

    #[test]
    fn excluded_inside_main_still_skipped() {
        let html = page(&format!(
            "<main><aside>SIDEBAR</aside><p>{}</p></main>",
            filler(5)
        ));
        let text = extract(&html, MAX);
        assert!(!text.contains("SIDEBAR"));
    }

    #[test]
    fn short_text_is_unusable() {
        let html = page("<main><p>Too short.</p></main>");
        assert_eq!(extract(&html, MAX), "");
    }

    #[test]
    fn empty_document() {
        assert_eq!(extract("", MAX), "");
    }

    #[test]
    fn truncates_to_max_len() {
        let html = page(&format!("<main><p>{}</p></main>", filler(500)));
        let text = extract(&html, 200);
        assert_eq!(text.chars().count(), 200);
    }

    #[test]
    fn collapses_whitespace() {
        let html = page(&format!(
            "<main><p>{}</p>\n\n   <p>twee   woorden</p></main>",
            filler(5)
        ));
        let text = extract(&html, MAX);
        assert!(text.contains("twee woorden"));
        assert!(!text.contains("  "));
    }
}
