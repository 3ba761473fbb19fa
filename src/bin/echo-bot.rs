use std::sync::Arc;

use secrecy::ExposeSecret;
use teloxide::Bot;
use tracing::info;

use workshop_bot::{
    abilities::echo::EchoBot,
    bot::build_tg_bot,
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

    info!("Starting echo bot @{}", settings.bot.username);
    let bot = Bot::new(settings.bot.token.expose_secret());
    // Nothing worth keeping, user tracking included.
    let store = Store::offline().await?;
    let silent = SilentSender::new(Arc::new(TgTransport::new(bot.clone())));

    let echo = EchoBot::new(silent.clone());
    let dispatcher = Arc::new(Dispatcher::build(&echo, &store, silent, &settings.bot)?);

    build_tg_bot(bot, dispatcher).dispatch().await;

    info!("Echo bot shut down");
    Ok(())
}
