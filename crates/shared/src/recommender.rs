//! LLM-backed toy recommender.
//!
//! The whole catalog is serialized into the prompt, one line per toy, and the
//! model is asked to answer with a bare JSON array of the best matches.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::Toy;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const MODEL: &str = "gpt-5.1";
const MAX_OUTPUT_TOKENS: u32 = 1500;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// One recommended toy, as the model reports it back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Serialize)]
struct ResponsesRequest {
    model: String,
    input: Vec<InputMessage>,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct InputMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    #[serde(default)]
    text: String,
}

impl ResponsesReply {
    fn output_text(&self) -> String {
        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .map(|c| c.text.as_str())
            .collect()
    }
}

pub struct ToyRecommender {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ToyRecommender {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Ask the model for the toys in `catalog` that best match `query`.
    pub async fn recommend(&self, query: &str, catalog: &[Toy]) -> Result<Vec<Recommendation>> {
        let request = ResponsesRequest {
            model: MODEL.to_string(),
            input: vec![
                InputMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTIONS.to_string(),
                },
                InputMessage {
                    role: "user".to_string(),
                    content: build_prompt(query, catalog),
                },
            ],
            max_output_tokens: MAX_OUTPUT_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/v1/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("OpenAI API error: {}", error_text);
        }

        let reply = response
            .json::<ResponsesReply>()
            .await
            .context("Failed to parse OpenAI API response")?;

        parse_recommendations(&reply.output_text())
    }
}

const SYSTEM_INSTRUCTIONS: &str = "You are an expert toy recommender for an online store. \
Your job is to read the user's description and pick the most suitable toys \
from the list you are given. Always answer with valid JSON.";

/// One line per toy, in the shape the prompt promises the model.
fn catalog_lines(catalog: &[Toy]) -> String {
    catalog
        .iter()
        .map(|toy| {
            format!(
                "ID: {} | Name: {} | Brand: {} | Category: {} | Price: {} | URL: {} | Image: {}",
                toy.id,
                toy.name,
                toy.brand.as_deref().unwrap_or("null"),
                toy.category.as_deref().unwrap_or("null"),
                toy.price,
                toy.url.as_deref().unwrap_or("null"),
                toy.image_url.as_deref().unwrap_or("null"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(query: &str, catalog: &[Toy]) -> String {
    format!(
        r#"User's description:
"""{query}"""

Here is the catalog of available toys (one per line):
"""{catalog}"""

Pick the 10 toys that best suit the user.
Return them EXACTLY as JSON, with no text outside the JSON, using this structure:

[
  {{
    "id": <numeric_toy_id>,
    "name": "name",
    "brand": "brand or null",
    "category": "category",
    "price": 0.0,
    "url": "url",
    "image_url": "image_url or null"
  }},
  ...
]"#,
        query = query,
        catalog = catalog_lines(catalog),
    )
}

/// Parse the model's reply: slice out the JSON array (models occasionally
/// wrap it in prose) and deserialize it.
fn parse_recommendations(raw: &str) -> Result<Vec<Recommendation>> {
    let raw = raw.trim();
    let json_text = match (raw.find('['), raw.rfind(']')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw,
    };

    let parsed: serde_json::Value = serde_json::from_str(json_text)
        .context("The model's reply could not be parsed as JSON")?;

    if !parsed.is_array() {
        anyhow::bail!("The model did not return a JSON list");
    }

    serde_json::from_value(parsed).context("The model's JSON list had an unexpected shape")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toy(id: i64, name: &str) -> Toy {
        Toy {
            id,
            name: name.to_string(),
            price: 19.99,
            category: Some("Juegos y Puzzles".to_string()),
            age_range: Some("3-6".to_string()),
            brand: None,
            url: Some("https://www.toysrus.es/p/1".to_string()),
            image_url: None,
        }
    }

    #[test]
    fn catalog_lines_render_missing_fields_as_null() {
        let lines = catalog_lines(&[sample_toy(7, "Puzzle del bosque")]);
        assert_eq!(
            lines,
            "ID: 7 | Name: Puzzle del bosque | Brand: null | Category: Juegos y Puzzles \
             | Price: 19.99 | URL: https://www.toysrus.es/p/1 | Image: null"
        );
    }

    #[test]
    fn prompt_contains_query_and_catalog() {
        let prompt = build_prompt("algo para un bebé", &[sample_toy(1, "Sonajero")]);
        assert!(prompt.contains("algo para un bebé"));
        assert!(prompt.contains("ID: 1 | Name: Sonajero"));
        assert!(prompt.contains("10 toys"));
    }

    #[test]
    fn parses_a_bare_json_array() {
        let raw = r#"[{"id": 3, "name": "Tren", "brand": null, "category": "Juguetes",
                       "price": 24.99, "url": "https://x/p/3", "image_url": null}]"#;
        let recs = parse_recommendations(raw).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, 3);
        assert_eq!(recs[0].name, "Tren");
        assert!(recs[0].brand.is_none());
    }

    #[test]
    fn slices_json_out_of_surrounding_prose() {
        let raw = r#"Here are my picks:
[{"id": 1, "name": "A", "brand": "B", "category": "C", "price": 1.0, "url": null, "image_url": null}]
Hope that helps!"#;
        let recs = parse_recommendations(raw).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].brand.as_deref(), Some("B"));
    }

    #[test]
    fn non_list_reply_is_an_error() {
        assert!(parse_recommendations(r#"{"id": 1}"#).is_err());
        assert!(parse_recommendations("I cannot help with that.").is_err());
        assert!(parse_recommendations("").is_err());
    }

    #[tokio::test]
    async fn recommend_round_trips_through_the_api() {
        let mut server = mockito::Server::new_async().await;
        let reply = serde_json::json!({
            "output": [{
                "content": [{
                    "text": r#"[{"id": 1, "name": "Tren de madera", "brand": "Brio",
                                 "category": "Juguetes (general)", "price": 34.99,
                                 "url": "https://www.toysrus.es/p/1", "image_url": null}]"#
                }]
            }]
        });
        let mock = server
            .mock("POST", "/v1/responses")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply.to_string())
            .create_async()
            .await;

        let recommender = ToyRecommender::new("test-key".to_string())
            .unwrap()
            .with_base_url(server.url());
        let recs = recommender
            .recommend("un tren para un niño pequeño", &[sample_toy(1, "Tren de madera")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, 1);
        assert_eq!(recs[0].name, "Tren de madera");
        assert_eq!(recs[0].brand.as_deref(), Some("Brio"));
        assert_eq!(recs[0].price, 34.99);
        assert!(recs[0].image_url.is_none());
    }

    #[tokio::test]
    async fn api_error_status_surfaces_as_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/responses")
            .with_status(500)
            .with_body(r#"{"error": "overloaded"}"#)
            .create_async()
            .await;

        let recommender = ToyRecommender::new("test-key".to_string())
            .unwrap()
            .with_base_url(server.url());
        let err = recommender
            .recommend("un tren", &[sample_toy(1, "Tren")])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("OpenAI API error"));
    }

    #[tokio::test]
    async fn unparseable_model_reply_surfaces_as_an_error() {
        let mut server = mockito::Server::new_async().await;
        let reply = serde_json::json!({
            "output": [{"content": [{"text": "I cannot pick any toys."}]}]
        });
        let _mock = server
            .mock("POST", "/v1/responses")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply.to_string())
            .create_async()
            .await;

        let recommender = ToyRecommender::new("test-key".to_string())
            .unwrap()
            .with_base_url(server.url());
        let err = recommender
            .recommend("un tren", &[sample_toy(1, "Tren")])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn reply_text_is_joined_across_output_items() {
        let reply: ResponsesReply = serde_json::from_str(
            r#"{"output": [
                {"content": [{"text": "[{\"id\": 1, \"name\": \"A\", \"price\": 2.5}"}]},
                {"content": [{"text": "]"}]}
            ]}"#,
        )
        .unwrap();
        let recs = parse_recommendations(&reply.output_text()).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].price, 2.5);
    }
}
