use std::sync::Arc;

use anyhow::Result;

use super::Abilities;
use crate::logic::{
    commands::{bind, Command, DEFAULT},
    dispatcher::InvocationContext,
    message_senders::SilentSender,
};

/// Repeats every text message back to its chat.
pub struct EchoBot {
    silent: SilentSender,
}

impl EchoBot {
    pub fn new(silent: SilentSender) -> Arc<Self> {
        Arc::new(EchoBot { silent })
    }

    async fn echo(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        if let Some(text) = ctx.update.text() {
            self.silent.send(text, ctx.chat_id).await;
        }
        Ok(())
    }
}

impl Abilities for EchoBot {
    fn commands(self: &Arc<Self>) -> Vec<Command> {
        vec![Command::public(
            DEFAULT,
            "echoes the message",
            bind(self, Self::echo),
        )]
    }
}
