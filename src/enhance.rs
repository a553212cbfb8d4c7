//! Description enhancement via an external text-generation service.
//!
//! The service is an opaque collaborator: it receives the recipe name and
//! its ingredient names and answers with a short descriptive string. Every
//! failure mode (unconfigured, unreachable, bad status, undecodable body,
//! empty text) resolves to a fixed fallback description; callers never see
//! an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Used whenever the service cannot produce a description.
pub const FALLBACK_DESCRIPTION: &str = "A classic recipe from the old world scrolls.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct EnhanceRequest<'a> {
    name: &'a str,
    ingredients: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EnhanceResponse {
    #[serde(default)]
    text: String,
}

/// Asks the configured service for a description of the named recipe.
pub async fn enhance_description(
    api_url: Option<&str>,
    name: &str,
    ingredients: &[String],
) -> String {
    let Some(api_url) = api_url else {
        return FALLBACK_DESCRIPTION.to_string();
    };

    let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!("enhancement client unavailable: {}", e);
            return FALLBACK_DESCRIPTION.to_string();
        }
    };

    let body = EnhanceRequest { name, ingredients };
    let response = match client.post(api_url).json(&body).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            warn!("enhancement service returned status {}", response.status());
            return FALLBACK_DESCRIPTION.to_string();
        }
        Err(e) => {
            warn!("enhancement request failed: {}", e);
            return FALLBACK_DESCRIPTION.to_string();
        }
    };

    match response.json::<EnhanceResponse>().await {
        Ok(parsed) if !parsed.text.trim().is_empty() => parsed.text,
        Ok(_) => FALLBACK_DESCRIPTION.to_string(),
        Err(e) => {
            warn!("enhancement response undecodable: {}", e);
            FALLBACK_DESCRIPTION.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};

    async fn spawn_service(text: &'static str) -> String {
        let app = Router::new().route(
            "/enhance",
            post(move |Json(body): Json<serde_json::Value>| async move {
                assert!(body["name"].is_string());
                assert!(body["ingredients"].is_array());
                Json(serde_json::json!({ "text": text }))
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/enhance", addr)
    }

    #[tokio::test]
    async fn test_unconfigured_returns_fallback() {
        let text = enhance_description(None, "Moon Milk", &[]).await;
        assert_eq!(text, FALLBACK_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_service_text_is_used() {
        let url = spawn_service("A mystical brew whose secrets are known only to the wise.").await;
        let text = enhance_description(
            Some(&url),
            "Moon Milk",
            &["Milk".to_string(), "Stardust".to_string()],
        )
        .await;
        assert_eq!(
            text,
            "A mystical brew whose secrets are known only to the wise."
        );
    }

    #[tokio::test]
    async fn test_empty_text_falls_back() {
        let url = spawn_service("  ").await;
        let text = enhance_description(Some(&url), "Moon Milk", &[]).await;
        assert_eq!(text, FALLBACK_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/enhance", addr);
        let text = enhance_description(Some(&url), "Moon Milk", &[]).await;
        assert_eq!(text, FALLBACK_DESCRIPTION);
    }
}
