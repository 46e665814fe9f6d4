//! format!-based HTML rendering for the two catalog pages.

use shared::{Recommendation, SortOrder, Toy};

/// Everything the catalog page needs to render itself, with the current
/// filter selections kept sticky in the form.
pub struct CatalogView<'a> {
    pub toys: &'a [Toy],
    pub categories: &'a [String],
    pub ages: &'a [String],
    pub brands: &'a [String],
    pub selected_category: Option<&'a str>,
    pub selected_age: Option<&'a str>,
    pub selected_brand: Option<&'a str>,
    pub min_price: &'a str,
    pub max_price: &'a str,
    pub order_by: SortOrder,
}

/// Render the catalog page: filter form plus result cards.
pub fn render_catalog(view: &CatalogView<'_>) -> String {
    let form = format!(
        r#"<form method="get" action="/" class="filters">
    <label>Category
        <select name="category">{categories}</select>
    </label>
    <label>Age range
        <select name="age_range">{ages}</select>
    </label>
    <label>Brand
        <select name="brand">{brands}</select>
    </label>
    <label>Min price
        <input type="text" name="min_price" value="{min_price}" size="6">
    </label>
    <label>Max price
        <input type="text" name="max_price" value="{max_price}" size="6">
    </label>
    <label>Sort by
        <select name="order_by">{orders}</select>
    </label>
    <button type="submit">Filter</button>
</form>"#,
        categories = render_options(view.categories, view.selected_category),
        ages = render_options(view.ages, view.selected_age),
        brands = render_options(view.brands, view.selected_brand),
        min_price = html_escape(view.min_price),
        max_price = html_escape(view.max_price),
        orders = render_order_options(view.order_by),
    );

    let mut cards = String::new();
    if view.toys.is_empty() {
        cards.push_str(
            r#"<p class="empty">No toys match these filters. Run the crawler to populate the catalog.</p>"#,
        );
    }
    for toy in view.toys {
        cards.push_str(&render_toy_card(
            &toy.name,
            toy.price,
            toy.brand.as_deref(),
            toy.category.as_deref(),
            toy.age_range.as_deref(),
            toy.url.as_deref(),
            toy.image_url.as_deref(),
        ));
    }

    let content = format!(
        r#"<div class="container">
<h2>Toy Catalog</h2>
{form}
<p class="count">{total} toys</p>
{cards}
</div>"#,
        total = view.toys.len(),
    );

    build_page("Catalog", &content)
}

/// Render the recommender page: query form, then results or an error.
pub fn render_recommend(
    query: &str,
    results: &[Recommendation],
    error_message: Option<&str>,
) -> String {
    let form = format!(
        r#"<form method="post" action="/recommend" class="recommend-form">
    <label for="query">Describe the toy you are looking for</label>
    <textarea id="query" name="query" rows="4" placeholder="e.g. a building set for a six year old who loves cars">{query}</textarea>
    <button type="submit">Recommend</button>
</form>"#,
        query = html_escape(query),
    );

    let error = match error_message {
        Some(msg) => format!(r#"<div class="error">{}</div>"#, html_escape(msg)),
        None => String::new(),
    };

    let mut cards = String::new();
    for rec in results {
        cards.push_str(&render_toy_card(
            &rec.name,
            rec.price,
            rec.brand.as_deref(),
            rec.category.as_deref(),
            None,
            rec.url.as_deref(),
            rec.image_url.as_deref(),
        ));
    }

    let count = if results.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="count">{} recommendations</p>"#, results.len())
    };

    let content = format!(
        r#"<div class="container">
<h2>AI Recommender</h2>
{form}
{error}
{count}
{cards}
</div>"#,
    );

    build_page("Recommender", &content)
}

fn render_toy_card(
    name: &str,
    price: f64,
    brand: Option<&str>,
    category: Option<&str>,
    age_range: Option<&str>,
    url: Option<&str>,
    image_url: Option<&str>,
) -> String {
    let image = match image_url {
        Some(src) => format!(r#"<img src="{}" alt="" loading="lazy">"#, html_escape(src)),
        None => r#"<div class="no-image"></div>"#.to_string(),
    };

    let title = match url {
        Some(href) => format!(
            r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
            html_escape(href),
            html_escape(name)
        ),
        None => html_escape(name),
    };

    let mut meta = Vec::new();
    if let Some(brand) = brand {
        meta.push(format!("<span>{}</span>", html_escape(brand)));
    }
    if let Some(category) = category {
        meta.push(format!("<span>{}</span>", html_escape(category)));
    }
    if let Some(age) = age_range {
        meta.push(format!("<span>Ages {}</span>", html_escape(age)));
    }

    format!(
        r#"<div class="toy-card">
    {image}
    <div class="toy-body">
        <h3>{title}</h3>
        <div class="meta-row">{meta}</div>
        <p class="price">{price:.2} €</p>
    </div>
</div>"#,
        meta = meta.join(""),
    )
}

/// `<option>` list with an empty "all" entry first.
fn render_options(values: &[String], selected: Option<&str>) -> String {
    let mut out = String::from(r#"<option value="">(all)</option>"#);
    for value in values {
        let sel = if selected == Some(value.as_str()) {
            " selected"
        } else {
            ""
        };
        out.push_str(&format!(
            r#"<option value="{v}"{sel}>{v}</option>"#,
            v = html_escape(value),
        ));
    }
    out
}

fn render_order_options(current: SortOrder) -> String {
    let orders = [
        (SortOrder::PriceAsc, "Price (low to high)"),
        (SortOrder::PriceDesc, "Price (high to low)"),
        (SortOrder::NameAsc, "Name (A-Z)"),
        (SortOrder::NameDesc, "Name (Z-A)"),
    ];
    orders
        .iter()
        .map(|(order, label)| {
            let sel = if *order == current { " selected" } else { "" };
            format!(
                r#"<option value="{}"{sel}>{label}</option>"#,
                order.as_param(),
            )
        })
        .collect()
}

fn build_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} — Toy Catalog</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box;}}
body{{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;color:#1a1a1a;background:#fafafa;}}
.header{{background:#1a1a1a;color:#fff;padding:12px 24px;display:flex;align-items:center;justify-content:space-between;}}
.header h1{{font-size:18px;font-weight:600;}}
.header nav a{{color:#ccc;text-decoration:none;margin-left:20px;font-size:14px;}}
.header nav a:hover{{color:#fff;}}
.container{{max-width:960px;margin:0 auto;padding:24px;}}
.filters{{display:flex;gap:12px;flex-wrap:wrap;align-items:flex-end;background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:16px;margin:16px 0;}}
.filters label{{display:flex;flex-direction:column;font-size:12px;color:#666;gap:4px;}}
.filters select,.filters input{{padding:6px;border:1px solid #ccc;border-radius:4px;font-size:14px;}}
.filters button{{padding:8px 16px;background:#0066cc;color:#fff;border:none;border-radius:4px;cursor:pointer;}}
.count{{color:#888;font-size:13px;margin-bottom:12px;}}
.toy-card{{display:flex;gap:16px;background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:16px;margin-bottom:12px;}}
.toy-card img,.no-image{{width:96px;height:96px;object-fit:contain;background:#f5f5f5;border-radius:4px;flex-shrink:0;}}
.toy-card h3{{font-size:16px;margin-bottom:4px;}}
.toy-card h3 a{{color:#1a1a1a;text-decoration:none;}}
.toy-card h3 a:hover{{color:#0066cc;}}
.meta-row{{display:flex;gap:12px;font-size:12px;color:#888;}}
.price{{font-size:15px;font-weight:600;color:#2e7d32;margin-top:8px;}}
.recommend-form{{display:flex;flex-direction:column;gap:8px;background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:16px;margin:16px 0;}}
.recommend-form textarea{{padding:8px;border:1px solid #ccc;border-radius:4px;font-size:14px;font-family:inherit;}}
.recommend-form button{{align-self:flex-start;padding:8px 16px;background:#0066cc;color:#fff;border:none;border-radius:4px;cursor:pointer;}}
.error{{background:#fce4ec;border:1px solid #f8bbd0;color:#c62828;padding:8px 12px;border-radius:4px;font-size:13px;margin-bottom:12px;}}
.empty{{color:#888;text-align:center;padding:40px;}}
</style>
</head>
<body>
<div class="header">
    <h1>Toy Catalog</h1>
    <nav>
        <a href="/">Catalog</a>
        <a href="/recommend">AI Recommender</a>
    </nav>
</div>
{content}
</body>
</html>"#
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
