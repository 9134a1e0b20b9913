use anyhow::{anyhow, Context, Result};
use async_process::Command;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::ResolvedSong;

/// Formato de audio preferido: mejor audio disponible, o el mejor formato completo.
const AUDIO_FORMAT: &str = "bestaudio/best";

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    url: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
    #[serde(default)]
    entries: Vec<YtDlpInfo>,
}

/// Extractor de streams basado en el binario `yt-dlp`
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
    timeout: Duration,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl YtDlp {
    pub fn new(timeout: Duration) -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            timeout,
        }
    }

    /// Verifica que yt-dlp esté disponible y devuelve su versión
    pub async fn verify(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .context("yt-dlp no encontrado. Instala con: pip install yt-dlp")?;

        if !output.status.success() {
            anyhow::bail!("yt-dlp no disponible");
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("✅ yt-dlp versión: {}", version);
        Ok(version)
    }

    /// Extrae URL de stream, título y duración de una URL o búsqueda `ytsearch`
    pub async fn extract(&self, target: &str) -> Result<ResolvedSong> {
        debug!("🔧 Extrayendo con yt-dlp: {}", target);

        let mut cmd = Command::new(&self.binary);
        cmd.args([
            "-j",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "-f",
            AUDIO_FORMAT,
            "--default-search",
            "auto",
        ])
        .arg(target)
        .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| anyhow!("yt-dlp excedió {}s para '{}'", self.timeout.as_secs(), target))??;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp falló para '{}': {}", target, error.trim());
        }

        parse_info(&output.stdout, target)
    }
}

/// Interpreta la salida JSON de `yt-dlp -j`.
///
/// Search and playlist targets may come back wrapped in `entries`; the first entry wins.
fn parse_info(raw: &[u8], target: &str) -> Result<ResolvedSong> {
    let line = raw
        .split(|byte| *byte == b'\n')
        .find(|line| !line.iter().all(u8::is_ascii_whitespace))
        .ok_or_else(|| anyhow!("yt-dlp no devolvió información para '{}'", target))?;

    let mut info: YtDlpInfo = serde_json::from_slice(line)?;
    if !info.entries.is_empty() {
        info = info.entries.swap_remove(0);
    }

    let stream_url = info
        .url
        .ok_or_else(|| anyhow!("yt-dlp no devolvió URL de stream para '{}'", target))?;

    // f64 -> u64 satura; valores negativos o NaN quedan en 0
    let duration_secs = info.duration.map(|secs| secs as u64).unwrap_or(0);

    Ok(ResolvedSong::new(
        stream_url,
        info.title.unwrap_or_else(|| "Unknown Title".to_string()),
        duration_secs,
        info.webpage_url.unwrap_or_else(|| target.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_single_video() {
        let raw = br#"{"url":"https://rr1.googlevideo.com/a","title":"Song","duration":212.4,"webpage_url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ"}"#;
        let song = parse_info(raw, "https://youtu.be/dQw4w9WgXcQ").unwrap();

        assert_eq!(
            song,
            ResolvedSong::new(
                "https://rr1.googlevideo.com/a".to_string(),
                "Song".to_string(),
                212,
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            )
        );
    }

    #[test]
    fn test_parse_search_takes_first_entry_and_defaults() {
        let raw = b"\n{\"entries\":[{\"url\":\"https://stream/1\"},{\"url\":\"https://stream/2\"}]}\n";
        let song = parse_info(raw, "ytsearch1:lofi").unwrap();

        assert_eq!(song.stream_url, "https://stream/1");
        assert_eq!(song.title, "Unknown Title");
        assert_eq!(song.duration_secs, 0);
        assert!(song.is_live());
        assert_eq!(song.webpage_url, "ytsearch1:lofi");
    }

    #[test]
    fn test_parse_without_stream_url_fails() {
        assert!(parse_info(br#"{"title":"No stream"}"#, "x").is_err());
        assert!(parse_info(b"  \n", "x").is_err());
    }
}
