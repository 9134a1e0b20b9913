use anyhow::Result;
use serenity::{
    all::{ComponentInteraction, Context},
    builder::{CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage},
};
use tracing::{debug, info};

use super::{user_voice_channel, MusicBot};
use crate::{
    audio::{ControlAction, ControlOutcome, PlaybackSession},
    ui::{buttons, embeds},
};
use std::sync::Arc;

/// Maneja los botones del mensaje "reproduciendo ahora"
pub async fn handle_component(
    ctx: &Context,
    component: ComponentInteraction,
    bot: &MusicBot,
) -> Result<()> {
    let Some(action) = buttons::action_for(&component.data.custom_id) else {
        debug!("Componente desconocido: {}", component.data.custom_id);
        return Ok(());
    };

    let guild_id = component
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Componente usado fuera de un servidor"))?;

    info!(
        "🔘 Botón {:?} presionado por {} en guild {}",
        action, component.user.name, guild_id
    );

    let Some(session) = bot.registry.get(guild_id) else {
        return ephemeral(ctx, &component, embeds::error("No hay ninguna sesión de música activa.")).await;
    };

    // Solo quien está escuchando puede controlar la reproducción
    let user_channel = user_voice_channel(ctx, guild_id, component.user.id);
    if user_channel.is_none() || user_channel != session.voice_channel() {
        return ephemeral(
            ctx,
            &component,
            embeds::warning("Debes estar en mi canal de voz para usar los controles."),
        )
        .await;
    }

    if action == ControlAction::Leave {
        // Responder antes: el cierre retira los botones de este mensaje
        ephemeral(ctx, &component, embeds::success("Hasta luego", "Cola vaciada y canal de voz abandonado.")).await?;
        session.leave().await;
        return Ok(());
    }

    match session.perform(action).await {
        Ok(ControlOutcome::Paused) | Ok(ControlOutcome::Resumed) => refresh_controls(ctx, &component, &session).await,
        Ok(ControlOutcome::Skipped) => {
            ephemeral(ctx, &component, embeds::success("Saltada", "Canción saltada.")).await
        }
        Ok(ControlOutcome::Queue(snapshot)) => ephemeral(ctx, &component, embeds::queue(&snapshot)).await,
        Ok(ControlOutcome::Left) => Ok(()),
        Err(e) => ephemeral(ctx, &component, embeds::error(&e.to_string())).await,
    }
}

/// Actualiza la etiqueta de pausa/reanudar en el propio mensaje
async fn refresh_controls(
    ctx: &Context,
    component: &ComponentInteraction,
    session: &Arc<PlaybackSession>,
) -> Result<()> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .components(buttons::player_controls(session.is_paused())),
            ),
        )
        .await?;
    Ok(())
}

async fn ephemeral(ctx: &Context, component: &ComponentInteraction, embed: CreateEmbed) -> Result<()> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}
