use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{DpHandlerDescription, UpdateFilterExt},
    dptree,
    prelude::{DependencyMap, Handler},
    types::{Message, Update as TgUpdate},
};

use crate::logic::{dispatcher::Dispatcher, update::Update};

pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

pub fn build_handler(
) -> Handler<'static, DependencyMap, HandlerResult, DpHandlerDescription> {
    let messages_handler = TgUpdate::filter_message().endpoint(handle_message);

    dptree::entry().branch(messages_handler)
}

async fn handle_message(msg: Message, dispatcher: Arc<Dispatcher>) -> HandlerResult {
    tracing::debug!(
        "Handling message. chat_id={} from={:?}",
        msg.chat.id,
        msg.from().map(|f| f.id)
    );

    let outcome = dispatcher.handle(Update::from(&msg)).await;
    tracing::debug!("Message handled: {outcome:?}");
    Ok(())
}
