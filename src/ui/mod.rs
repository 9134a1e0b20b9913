//! Discord-facing presentation: embeds, interactive buttons and the
//! [`crate::audio::NotificationSink`] implementation used by the player loop.

pub mod buttons;
pub mod discord;
pub mod embeds;

pub use discord::DiscordNotifier;
