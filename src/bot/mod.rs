pub mod handlers;

use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{DefaultKey, Dispatcher as TgDispatcher},
    error_handlers::LoggingErrorHandler,
    prelude::*,
    Bot,
};

use self::handlers::build_handler;
use crate::logic::dispatcher::Dispatcher;

/// Long-polling loop feeding every message into `dispatcher`.
pub fn build_tg_bot(
    bot: Bot,
    dispatcher: Arc<Dispatcher>,
) -> TgDispatcher<Bot, Box<dyn Error + Send + Sync>, DefaultKey> {
    TgDispatcher::builder(bot, build_handler())
        .dependencies(dptree::deps![dispatcher])
        .default_handler(|upd| async move {
            tracing::warn!("Unhandled update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
}

/// Publishes the public commands so clients can autocomplete them.
pub async fn publish_commands(bot: &Bot, dispatcher: &Dispatcher) {
    if let Err(err) = bot.set_my_commands(dispatcher.bot_commands()).await {
        tracing::warn!("Failed to publish bot commands: {err}");
    }
}
