use anyhow::Result;
use serenity::{http::Http, model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

mod audio;
mod bot;
mod config;
mod sources;
mod ui;

use crate::audio::{SessionRegistry, SongbirdTransport};
use crate::bot::MusicBot;
use crate::config::Config;
use crate::sources::{ytdlp::YtDlp, Resolver, YouTubeResolver};
use crate::ui::DiscordNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("open_music_engine=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    // El health check no necesita token ni conexión a Discord
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    info!("🎵 Iniciando Open Music Bot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("{}", config.summary());

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    // Colaboradores del motor de reproducción
    let http = Arc::new(Http::new(&config.discord_token));
    let voice = Songbird::serenity();
    let transport = Arc::new(SongbirdTransport::new(voice.clone(), config.default_volume));
    let notifier = Arc::new(DiscordNotifier::new(http));
    let resolver: Arc<dyn Resolver> = Arc::new(YouTubeResolver::from_config(&config)?);

    let registry = SessionRegistry::new(
        config.session_settings(),
        transport,
        notifier,
        resolver.clone(),
    );

    let handler = MusicBot::new(config.clone(), registry.clone(), resolver);

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(voice)
        .await?;

    // Manejar shutdown graceful: cerrar sesiones antes de cortar el gateway
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Error al registrar Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Señal de shutdown recibida, cerrando {} sesiones...", registry.len());
        registry.shutdown().await;
        shard_manager.shutdown_all().await;
    });

    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check() -> Result<()> {
    let version = YtDlp::default().verify().await?;
    println!("OK (yt-dlp {})", version);
    Ok(())
}
