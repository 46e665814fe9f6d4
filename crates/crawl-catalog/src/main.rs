use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shared::{extract_products_from_html, CatalogDb, CatalogFetcher, Config};
use url::Url;

/// Category listing pages to crawl: (stored category label, listing URL).
const CATEGORY_PAGES: [(&str, &str); 5] = [
    ("Juguetes (general)", "https://www.toysrus.es/Juguetes/c/juguetes"),
    (
        "Arte y Manualidades",
        "https://www.toysrus.es/Arte-y-Manualidades/c/Juguetes-Categorias-ArteManualidades",
    ),
    (
        "Juegos y Puzzles",
        "https://www.toysrus.es/Juegos-y-Puzzles/c/Juegos_y_Puzzles",
    ),
    (
        "Vehículos y circuitos",
        "https://www.toysrus.es/Veh%C3%ADculos-y-circuitos/c/Vehiculos_y_circuitos",
    ),
    (
        "Construcciones & Escenarios",
        "https://www.toysrus.es/Construcciones-%26-Escenarios/c/005003",
    ),
];

const STORE_BASE_URL: &str = "https://www.toysrus.es/";

#[derive(Parser)]
#[command(name = "crawl-catalog")]
#[command(about = "Crawl the toy store's category pages into the catalog database")]
struct Args {
    /// Listing pages to fetch per category
    #[arg(short, long, default_value = "2")]
    pages: u32,

    /// Catalog database path (overrides CATALOG_DB)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env();

    let db_path = args.db.unwrap_or(config.db_path);
    let base = Url::parse(STORE_BASE_URL).context("Invalid store base URL")?;

    println!("Initializing database at {}...", db_path.display());
    let db = CatalogDb::new(&db_path);
    db.init()?;

    let fetcher = CatalogFetcher::new()?;
    let mut total_inserted = 0usize;

    for (category_label, base_url) in CATEGORY_PAGES {
        println!("\n=== Category: {category_label} ===");

        for page in 1..=args.pages {
            println!("Crawling {base_url} (page {page})...");

            let Some(html) = fetcher.fetch_listing_page(base_url, page).await? else {
                continue;
            };

            let products = extract_products_from_html(&html, category_label, &base);
            println!("  -> {} products found on this page", products.len());

            for toy in &products {
                if db.insert_toy(toy)? {
                    total_inserted += 1;
                }
            }

            // Pause so we don't hammer the server.
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        }
    }

    println!("\n✓ Crawl finished. Products inserted: {total_inserted}");

    Ok(())
}
