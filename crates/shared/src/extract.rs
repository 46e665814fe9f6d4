//! Best-effort extraction of product records from listing-page HTML.
//!
//! Retail listing markup is unstable, so this works in layers: a structural
//! pass keyed on "product" class names, a heuristic fallback keyed on
//! currency symbols and links, and regex sub-extraction of price, brand and
//! age range from each block's raw markup.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::ScrapedToy;

/// Price like "29,99 €" (comma decimal separator).
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+,\d{2})\s*€").unwrap());

/// Brand inside a span whose class mentions "brand".
static BRAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<span[^>]+class="[^"]*brand[^"]*"[^>]*>\s*(.*?)\s*</span>"#).unwrap()
});

/// Recommended age inside a span whose class mentions "age".
static AGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<span[^>]+class="[^"]*age[^"]*"[^>]*>\s*(.*?)\s*</span>"#).unwrap()
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static BLOCK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article, li, div").unwrap());
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// Strip HTML tags and collapse whitespace.
pub fn clean_html_text(text: &str) -> String {
    let text = TAG_RE.replace_all(text, "");
    WS_RE.replace_all(&text, " ").trim().to_string()
}

/// Locate candidate product blocks in a parsed document.
///
/// 1. Structural pass: `article`/`li`/`div` elements with "product" in the
///    class attribute (case-insensitive).
/// 2. Fallback: any `article`/`li`/`div` whose text carries a euro price and
///    which contains at least one link.
pub fn find_product_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    let candidates: Vec<ElementRef> = document
        .select(&BLOCK_SELECTOR)
        .filter(|el| {
            el.value()
                .classes()
                .any(|c| c.to_ascii_lowercase().contains("product"))
        })
        .collect();

    if !candidates.is_empty() {
        return candidates;
    }

    document
        .select(&BLOCK_SELECTOR)
        .filter(|el| {
            let text = el.text().collect::<Vec<_>>().join(" ");
            text.contains('€')
                && PRICE_RE.is_match(&text)
                && el.select(&ANCHOR_SELECTOR).next().is_some()
        })
        .collect()
}

/// Extract a list of toys from a listing page, labelling them all with the
/// category of that page. Blocks without a usable link or price are dropped.
///
/// Nested candidate blocks can emit the same product twice; the store's
/// `(name, price)` dedup absorbs that.
pub fn extract_products_from_html(html: &str, category_label: &str, base: &Url) -> Vec<ScrapedToy> {
    let document = Html::parse_document(html);
    let blocks = find_product_blocks(&document);

    let mut products = Vec::new();

    for block in blocks {
        let block_html = block.html();

        // Name and URL: first link with more than a few characters of text.
        let Some((name, href)) = pick_name_link(&block) else {
            continue;
        };
        let url = absolutize(base, &href);

        // Price from the raw block markup; no price means we don't keep it.
        let Some(price) = extract_price(&block_html) else {
            continue;
        };

        let brand = BRAND_RE
            .captures(&block_html)
            .map(|c| clean_html_text(&c[1]))
            .filter(|s| !s.is_empty());

        let age_range = AGE_RE
            .captures(&block_html)
            .map(|c| clean_html_text(&c[1]))
            .filter(|s| !s.is_empty());

        let image_url = block
            .select(&IMG_SELECTOR)
            .next()
            .and_then(|img| img.value().attr("src"))
            .filter(|src| !src.is_empty())
            .map(|src| absolutize(base, src));

        products.push(ScrapedToy {
            name,
            price,
            category: category_label.to_string(),
            age_range,
            brand,
            url,
            image_url,
        });
    }

    products
}

/// First anchor in the block whose trimmed text is longer than 3 characters.
fn pick_name_link(block: &ElementRef<'_>) -> Option<(String, String)> {
    for link in block.select(&ANCHOR_SELECTOR) {
        let text = clean_html_text(&link.text().collect::<Vec<_>>().join(" "));
        if text.chars().count() > 3 {
            let href = link.value().attr("href")?.to_string();
            return Some((text, href));
        }
    }
    None
}

fn extract_price(block_html: &str) -> Option<f64> {
    let captures = PRICE_RE.captures(block_html)?;
    captures[1].replace(',', ".").parse().ok()
}

/// Resolve relative and scheme-relative references against the store base.
/// A reference that won't resolve is kept as-is rather than discarded.
fn absolutize(base: &Url, reference: &str) -> String {
    match base.join(reference) {
        Ok(url) => url.into(),
        Err(_) => reference.to_string(),
    }
}
