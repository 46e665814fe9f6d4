// Public modules
pub mod config;
pub mod db;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod recommender;

// Re-export commonly used types
pub use config::Config;
pub use db::{CatalogDb, Facet};
pub use extract::{clean_html_text, extract_products_from_html, find_product_blocks};
pub use fetch::CatalogFetcher;
pub use models::{ScrapedToy, SortOrder, Toy, ToyFilter};
pub use recommender::{Recommendation, ToyRecommender};
