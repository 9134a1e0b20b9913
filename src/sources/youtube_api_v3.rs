use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";
const VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
}

/// Cliente mínimo de YouTube Data API v3 (búsqueda y títulos)
pub struct YouTubeApiClient {
    api_key: String,
    client: reqwest::Client,
}

impl YouTubeApiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { api_key, client })
    }

    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }

    /// Busca un video y devuelve la URL del primer resultado
    pub async fn search_first(&self, query: &str) -> Result<Option<String>> {
        debug!("🔍 Búsqueda YouTube API v3: {}", query);

        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", "1"),
                ("key", &self.api_key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("❌ YouTube API error: {} - {}", status, error_text);
            anyhow::bail!("YouTube API error: {}", status);
        }

        let body: SearchResponse = response.json().await?;
        let url = first_video_url(body);

        if let Some(url) = &url {
            info!("✅ YouTube API encontró: {}", url);
        }
        Ok(url)
    }

    /// Obtiene el título de un video por su ID
    pub async fn video_title(&self, video_id: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(VIDEOS_ENDPOINT)
            .query(&[("part", "snippet"), ("id", video_id), ("key", &self.api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("YouTube API error: {}", response.status());
        }

        let body: VideosResponse = response.json().await?;
        Ok(body.items.into_iter().next().map(|item| item.snippet.title))
    }
}

fn first_video_url(body: SearchResponse) -> Option<String> {
    body.items
        .into_iter()
        .find_map(|item| item.id.video_id)
        .map(|id| YouTubeApiClient::watch_url(&id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_video_url_skips_non_video_items() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"items":[{"id":{"kind":"youtube#channel"}},{"id":{"videoId":"dQw4w9WgXcQ"}}]}"#,
        )
        .unwrap();

        assert_eq!(
            first_video_url(body).as_deref(),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_empty_search_has_no_result() {
        let body: SearchResponse = serde_json::from_str(r#"{"kind":"youtube#searchListResponse"}"#).unwrap();
        assert!(first_video_url(body).is_none());
    }
}
