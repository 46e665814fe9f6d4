use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shared::{CatalogDb, Config, Facet, SortOrder, Toy, ToyFilter, ToyRecommender};

mod templates;
use templates::CatalogView;

struct AppState {
    db: CatalogDb,
    recommender: Option<ToyRecommender>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("serve_catalog=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let db = CatalogDb::new(&config.db_path);
    db.init()?;

    let recommender = match config.openai_api_key {
        Some(key) => Some(ToyRecommender::new(key)?),
        None => {
            warn!("OPENAI_API_KEY not set; the recommend page will report it");
            None
        }
    };

    let state = Arc::new(AppState { db, recommender });
    let app = router(state);

    info!("Toy catalog server starting on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(catalog_page))
        .route("/recommend", get(recommend_page).post(recommend_submit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// --- Catalog page ---

#[derive(Debug, Default, Deserialize)]
struct CatalogParams {
    category: Option<String>,
    age_range: Option<String>,
    brand: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    order_by: Option<String>,
}

async fn catalog_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogParams>,
) -> impl IntoResponse {
    let filter = ToyFilter {
        category: clean_param(params.category.as_deref()),
        age_range: clean_param(params.age_range.as_deref()),
        brand: clean_param(params.brand.as_deref()),
        min_price: parse_price(params.min_price.as_deref()),
        max_price: parse_price(params.max_price.as_deref()),
    };
    let order = SortOrder::from_param(params.order_by.as_deref().unwrap_or_default());

    let db = state.db.clone();
    let search_filter = filter.clone();
    let loaded = tokio::task::spawn_blocking(
        move || -> Result<(Vec<String>, Vec<String>, Vec<String>, Vec<Toy>)> {
            let categories = db.distinct_values(Facet::Category)?;
            let ages = db.distinct_values(Facet::AgeRange)?;
            let brands = db.distinct_values(Facet::Brand)?;
            let toys = db.search(&search_filter, order)?;
            Ok((categories, ages, brands, toys))
        },
    )
    .await;

    let (categories, ages, brands, toys) = match loaded {
        Ok(Ok(loaded)) => loaded,
        Ok(Err(e)) => {
            warn!(error = %e, "Failed to load catalog");
            return Html("<h1>Error loading catalog</h1>".to_string());
        }
        Err(e) => {
            warn!(error = %e, "Catalog query task failed");
            return Html("<h1>Error loading catalog</h1>".to_string());
        }
    };

    Html(templates::render_catalog(&CatalogView {
        toys: &toys,
        categories: &categories,
        ages: &ages,
        brands: &brands,
        selected_category: filter.category.as_deref(),
        selected_age: filter.age_range.as_deref(),
        selected_brand: filter.brand.as_deref(),
        min_price: params.min_price.as_deref().unwrap_or_default(),
        max_price: params.max_price.as_deref().unwrap_or_default(),
        order_by: order,
    }))
}

/// Empty form values mean "no filter".
fn clean_param(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Unparseable prices are treated as absent, matching the form's behavior.
fn parse_price(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

// --- Recommender page ---

#[derive(Debug, Deserialize)]
struct RecommendForm {
    #[serde(default)]
    query: String,
}

async fn recommend_page() -> impl IntoResponse {
    Html(templates::render_recommend("", &[], None))
}

async fn recommend_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RecommendForm>,
) -> impl IntoResponse {
    let query = form.query.trim().to_string();

    if query.is_empty() {
        return Html(templates::render_recommend("", &[], None));
    }

    let Some(recommender) = &state.recommender else {
        return Html(templates::render_recommend(
            &query,
            &[],
            Some("No API key configured. Add OPENAI_API_KEY to your .env file."),
        ));
    };

    let toys = match load_all_toys(&state.db).await {
        Ok(toys) => toys,
        Err(e) => {
            warn!(error = %e, "Failed to load catalog for recommendation");
            return Html(templates::render_recommend(
                &query,
                &[],
                Some("Could not read the catalog database."),
            ));
        }
    };

    if toys.is_empty() {
        return Html(templates::render_recommend(
            &query,
            &[],
            Some("There are no toys in the database. Make sure you have run the crawler."),
        ));
    }

    match recommender.recommend(&query, &toys).await {
        Ok(results) => Html(templates::render_recommend(&query, &results, None)),
        Err(e) => {
            warn!(error = %e, "Recommendation failed");
            Html(templates::render_recommend(
                &query,
                &[],
                Some(&format!("Error calling the AI: {e}")),
            ))
        }
    }
}

async fn load_all_toys(db: &CatalogDb) -> Result<Vec<Toy>> {
    let db = db.clone();
    tokio::task::spawn_blocking(move || db.all_toys()).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use shared::ScrapedToy;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn seeded_state(dir: &TempDir) -> Arc<AppState> {
        let db = CatalogDb::new(dir.path().join("catalog.db"));
        db.init().unwrap();
        db.insert_toy(&ScrapedToy {
            name: "Tren de madera".to_string(),
            price: 34.99,
            category: "Juguetes (general)".to_string(),
            age_range: Some("3-6".to_string()),
            brand: Some("Brio".to_string()),
            url: "https://www.toysrus.es/p/1".to_string(),
            image_url: None,
        })
        .unwrap();
        db.insert_toy(&ScrapedToy {
            name: "Puzzle del bosque".to_string(),
            price: 12.99,
            category: "Juegos y Puzzles".to_string(),
            age_range: None,
            brand: None,
            url: "https://www.toysrus.es/p/2".to_string(),
            image_url: None,
        })
        .unwrap();
        Arc::new(AppState {
            db,
            recommender: None,
        })
    }

    async fn body_text(request: Request<Body>, state: Arc<AppState>) -> (StatusCode, String) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn catalog_page_lists_stored_toys() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = body_text(request, seeded_state(&dir)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Tren de madera"));
        assert!(body.contains("Puzzle del bosque"));
        assert!(body.contains("2 toys"));
    }

    #[tokio::test]
    async fn catalog_page_applies_query_filters() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder()
            .uri("/?brand=Brio&min_price=20&max_price=not-a-number")
            .body(Body::empty())
            .unwrap();
        let (status, body) = body_text(request, seeded_state(&dir)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Tren de madera"));
        assert!(!body.contains("Puzzle del bosque"));
        assert!(body.contains("1 toys"));
    }

    #[tokio::test]
    async fn recommend_without_api_key_reports_it() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/recommend")
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Body::from("query=un+tren+para+un+bebe"))
            .unwrap();
        let (status, body) = body_text(request, seeded_state(&dir)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No API key configured"));
    }

    #[tokio::test]
    async fn empty_recommend_query_just_shows_the_form() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/recommend")
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Body::from("query=++"))
            .unwrap();
        let (status, body) = body_text(request, seeded_state(&dir)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("class=\"error\""));
    }

    #[test]
    fn price_params_parse_leniently() {
        assert_eq!(parse_price(Some("12.5")), Some(12.5));
        assert_eq!(parse_price(Some(" 3 ")), Some(3.0));
        assert_eq!(parse_price(Some("abc")), None);
        assert_eq!(parse_price(Some("")), None);
        assert_eq!(parse_price(None), None);
    }

    #[test]
    fn empty_filter_params_are_dropped() {
        assert_eq!(clean_param(Some("")), None);
        assert_eq!(clean_param(Some("  ")), None);
        assert_eq!(clean_param(Some("Brio")), Some("Brio".to_string()));
        assert_eq!(clean_param(None), None);
    }
}
