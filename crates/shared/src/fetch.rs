use anyhow::{Context, Result};
use reqwest::Client;
use url::Url;

const FETCH_TIMEOUT_SECS: u64 = 25;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; ToyCatalogCrawler/1.0)";

/// HTTP fetcher for category listing pages.
pub struct CatalogFetcher {
    client: Client,
}

impl CatalogFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch one page of a category listing. Page 1 is the bare URL; later
    /// pages append `?page=N`. Returns `Ok(None)` when the page can't be
    /// fetched so the crawl skips it and moves on.
    pub async fn fetch_listing_page(&self, base_url: &str, page: u32) -> Result<Option<String>> {
        let url = page_url(base_url, page)?;

        for attempt in 0..3 {
            match self.try_fetch(url.as_str()).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if attempt == 2 {
                        eprintln!("Failed to fetch {}: {}", url, e);
                        return Ok(None);
                    }
                    let backoff = std::time::Duration::from_millis(500 * (2_u64.pow(attempt)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Ok(None)
    }

    async fn try_fetch(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send HTTP request")?;

        let status = response.status();
        if !status.is_success() {
            // Listing pages past the end usually answer 404; not worth retrying.
            eprintln!("  -> HTTP {} for {}", status, url);
            return Ok(None);
        }

        let html = response.text().await.context("Failed to read response body")?;
        Ok(Some(html))
    }
}

/// Build the URL for a given listing page number.
fn page_url(base_url: &str, page: u32) -> Result<Url> {
    let mut url = Url::parse(base_url).with_context(|| format!("Invalid URL: {base_url}"))?;
    if page > 1 {
        url.query_pairs_mut().append_pair("page", &page.to_string());
    }
    Ok(url)
}
