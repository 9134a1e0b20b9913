//! # Bot Module
//!
//! Discord command surface for Open Music Bot.
//!
//! [`MusicBot`] implements Serenity's [`EventHandler`]: prefix text commands arrive through
//! `message`, now-playing buttons through `interaction_create`. Every command maps onto a
//! single operation of the [`SessionRegistry`] or of a [`crate::audio::PlaybackSession`];
//! the playback itself runs on the per-guild player loops.

use serenity::{
    all::{ChannelId, Context, EventHandler, GuildId, Interaction, Message, Ready, UserId},
    async_trait,
};
use std::sync::Arc;
use tracing::{error, info};

pub mod commands;
pub mod handlers;

use crate::{audio::SessionRegistry, config::Config, sources::Resolver};

/// Main Discord handler: owns the session registry and the resolver used for enqueue-time
/// title lookups.
pub struct MusicBot {
    config: Arc<Config>,
    registry: SessionRegistry,
    resolver: Arc<dyn Resolver>,
}

impl MusicBot {
    pub fn new(config: Config, registry: SessionRegistry, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            resolver,
        }
    }
}

#[async_trait]
impl EventHandler for MusicBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());
        info!("💡 Prefijo de comandos: {}", self.config.command_prefix);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(command) = commands::parse(&msg.content, &self.config.command_prefix) else {
            return;
        };

        if let Err(e) = commands::handle(&ctx, &msg, command, self).await {
            error!("Error manejando comando: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            if let Err(e) = handlers::handle_component(&ctx, component, self).await {
                error!("Error manejando componente: {:?}", e);
            }
        }
    }
}

/// Canal de voz del usuario según la caché de la guild
pub(crate) fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let guild = guild_id.to_guild_cached(&ctx.cache)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
}
