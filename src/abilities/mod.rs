pub mod echo;
pub mod workshop;

use std::sync::Arc;

use crate::logic::{commands::Command, replies::ReplySpec};

/// A bot's declared behaviour. Called once at startup to fill the registries.
pub trait Abilities: Send + Sync + 'static {
    fn commands(self: &Arc<Self>) -> Vec<Command>;

    /// Replies not bound to any command.
    fn replies(self: &Arc<Self>) -> Vec<ReplySpec> {
        Vec::new()
    }
}
