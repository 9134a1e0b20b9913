use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::LazyLock, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

use super::{youtube_api_v3::YouTubeApiClient, ytdlp::YtDlp, ResolvedSong, Resolver};
use crate::config::Config;

static YOUTUBE_WATCH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:(?:www|m|music)\.)?(?:youtube\.com/watch\?(?:\S*?&)?v=|youtu\.be/)(?P<id>[a-zA-Z0-9_-]{11})",
    )
    .expect("patrón de URL de YouTube válido")
});

/// Estrategia para convertir texto libre en algo que yt-dlp pueda extraer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Búsqueda estructurada con YouTube Data API v3
    Api,
    /// Búsqueda genérica `ytsearch1:` de yt-dlp
    YtDlp,
}

impl FromStr for SearchStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "ytdlp" | "yt-dlp" => Ok(Self::YtDlp),
            other => anyhow::bail!("Estrategia de búsqueda desconocida: '{}'", other),
        }
    }
}

/// Parses a comma separated strategy list such as `api,ytdlp`.
pub fn parse_search_order(raw: &str) -> Result<Vec<SearchStrategy>> {
    let order = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(SearchStrategy::from_str)
        .collect::<Result<Vec<_>>>()?;

    if order.is_empty() {
        anyhow::bail!("El orden de búsqueda no puede estar vacío");
    }
    Ok(order)
}

/// Devuelve el ID de video si la consulta es una URL de YouTube
pub fn youtube_video_id(query: &str) -> Option<&str> {
    YOUTUBE_WATCH_URL
        .captures(query.trim())
        .and_then(|captures| captures.name("id"))
        .map(|id| id.as_str())
}

/// Cualquier URL http(s) se entrega directamente al extractor
pub fn is_direct_locator(query: &str) -> bool {
    Url::parse(query.trim())
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Resolver por defecto: YouTube Data API + yt-dlp
pub struct YouTubeResolver {
    api: Option<YouTubeApiClient>,
    ytdlp: YtDlp,
    order: Vec<SearchStrategy>,
}

impl YouTubeResolver {
    pub fn new(api: Option<YouTubeApiClient>, ytdlp: YtDlp, order: Vec<SearchStrategy>) -> Self {
        Self { api, ytdlp, order }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api = match &config.youtube_api_key {
            Some(key) => Some(YouTubeApiClient::new(key.clone())?),
            None => {
                warn!("🔑 YOUTUBE_API_KEY no configurada, la búsqueda usará solo yt-dlp");
                None
            }
        };

        Ok(Self::new(
            api,
            YtDlp::new(Duration::from_secs(config.resolve_timeout_secs)),
            config.search_order.clone(),
        ))
    }

    /// Decide qué entregar a yt-dlp para una consulta
    async fn locate(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if is_direct_locator(query) {
            return Some(query.to_string());
        }

        for strategy in &self.order {
            match strategy {
                SearchStrategy::Api => {
                    let Some(api) = &self.api else {
                        debug!("YouTube API no disponible, siguiente estrategia");
                        continue;
                    };
                    match api.search_first(query).await {
                        Ok(Some(url)) => return Some(url),
                        Ok(None) => debug!("YouTube API sin resultados para '{}'", query),
                        Err(e) => warn!("❌ Búsqueda en YouTube API falló: {}", e),
                    }
                }
                SearchStrategy::YtDlp => return Some(format!("ytsearch1:{}", query)),
            }
        }

        None
    }
}

#[async_trait]
impl Resolver for YouTubeResolver {
    async fn resolve(&self, query: &str) -> Option<ResolvedSong> {
        let Some(target) = self.locate(query).await else {
            warn!("🔍 Ninguna estrategia encontró '{}'", query);
            return None;
        };

        match self.ytdlp.extract(&target).await {
            Ok(song) => {
                info!("✅ Resuelto '{}' -> {}", query, song.title);
                Some(song)
            }
            Err(e) => {
                warn!("❌ yt-dlp no pudo extraer '{}': {}", target, e);
                None
            }
        }
    }

    async fn lookup_title(&self, query: &str) -> Option<String> {
        let video_id = youtube_video_id(query)?;
        let api = self.api.as_ref()?;

        match api.video_title(video_id).await {
            Ok(title) => title,
            Err(e) => {
                debug!("No se pudo obtener el título de {}: {}", video_id, e);
                None
            }
        }
    }
}
