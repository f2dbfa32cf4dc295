//! Telegram transport for streamify.
//!
//! Decodes inbound bot updates into relay events, answers the command
//! surface, and implements [`streamify_relay::TransportGateway`] on top of
//! the Bot API via teloxide.

pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod outbound;

pub use {
    bot::start_polling,
    config::TelegramConfig,
    error::{Error, Result},
    handlers::UpdateHandler,
    outbound::TelegramGateway,
};
