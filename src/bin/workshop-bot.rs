use std::sync::Arc;

use secrecy::ExposeSecret;
use teloxide::Bot;
use tracing::info;

use workshop_bot::{
    abilities::workshop::WorkshopBot,
    bot::{build_tg_bot, publish_commands},
    configuration::get_config,
    db::Store,
    logic::{
        dispatcher::Dispatcher,
        message_senders::{SilentSender, TgTransport},
    },
    set_env,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    set_env()?;
    let settings = get_config()?;
    init_tracing();

    info!("Starting workshop bot @{}", settings.bot.username);
    let bot = Bot::new(settings.bot.token.expose_secret());
    let store = Store::new(&settings.store).await?;
    let silent = SilentSender::new(Arc::new(TgTransport::new(bot.clone())));

    let workshop = WorkshopBot::new(silent.clone(), store.clone(), settings.assets.clone());
    let dispatcher = Arc::new(Dispatcher::build(
        &workshop,
        &store,
        silent,
        &settings.bot,
    )?);

    publish_commands(&bot, &dispatcher).await;
    build_tg_bot(bot, dispatcher).dispatch().await;

    info!("Workshop bot shut down");
    Ok(())
}
