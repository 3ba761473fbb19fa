use std::{collections::HashMap, fmt, future::Future, pin::Pin, sync::Arc};

use itertools::Itertools;
use teloxide::types::{BotCommand, UserId};
use thiserror::Error;

use super::{
    dispatcher::InvocationContext,
    replies::ReplySpec,
    update::ChatKind,
};

/// Name of the command that runs when nothing else matches.
pub const DEFAULT: &str = "default";

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
pub type Action<T> = Arc<dyn Fn(T) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

pub fn action<T, F, Fut>(f: F) -> Action<T>
where
    T: 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |input: T| -> BoxFuture<anyhow::Result<()>> { Box::pin(f(input)) })
}

/// Turns a method taking `Arc<S>` into an [`Action`] bound to `state`.
pub fn bind<S, T, F, Fut>(state: &Arc<S>, f: F) -> Action<T>
where
    S: Send + Sync + 'static,
    T: 'static,
    F: Fn(Arc<S>, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let state = Arc::clone(state);
    action(move |input| f(Arc::clone(&state), input))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessPolicy {
    Public,
    CreatorOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locality {
    Private,
    Group,
    Any,
}

impl Locality {
    pub fn allows(&self, kind: ChatKind) -> bool {
        matches!(
            (self, kind),
            (Locality::Any, _)
                | (Locality::Private, ChatKind::Private)
                | (Locality::Group, ChatKind::Group)
        )
    }
}

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub access: AccessPolicy,
    pub locality: Locality,
    pub required_args: usize,
    pub action: Action<InvocationContext>,
    pub reply: Option<ReplySpec>,
}

impl Command {
    /// Usable by anyone, anywhere, without arguments. Tweak with struct update syntax.
    pub fn public(
        name: impl Into<String>,
        description: impl Into<String>,
        action: Action<InvocationContext>,
    ) -> Self {
        Command {
            name: name.into(),
            description: description.into(),
            access: AccessPolicy::Public,
            locality: Locality::Any,
            required_args: 0,
            action,
            reply: None,
        }
    }

    /// Whether `user_id` may run this command in a chat of `chat_kind`.
    pub fn permits(&self, user_id: UserId, creator_id: UserId, chat_kind: ChatKind) -> bool {
        let authorized = match self.access {
            AccessPolicy::Public => true,
            AccessPolicy::CreatorOnly => user_id == creator_id,
        };
        authorized && self.locality.allows(chat_kind)
    }

    pub fn creator_only(
        name: impl Into<String>,
        description: impl Into<String>,
        action: Action<InvocationContext>,
    ) -> Self {
        Command {
            access: AccessPolicy::CreatorOnly,
            ..Command::public(name, description, action)
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("access", &self.access)
            .field("locality", &self.locality)
            .field("required_args", &self.required_args)
            .field("has_reply", &self.reply.is_some())
            .finish()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command `{0}` is already registered")]
    DuplicateCommand(String),

    #[error("Command name `{0}` must be a single token without the leading slash")]
    InvalidName(String),
}

#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commands(
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for command in commands {
            registry.register(command)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, command: Command) -> Result<(), RegistryError> {
        if command.name.is_empty()
            || command.name.starts_with('/')
            || command.name.contains(char::is_whitespace)
        {
            return Err(RegistryError::InvalidName(command.name));
        }
        if self.index.contains_key(&command.name) {
            return Err(RegistryError::DuplicateCommand(command.name));
        }
        self.index.insert(command.name.clone(), self.commands.len());
        self.commands.push(command);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.index.get(name).map(|&idx| &self.commands[idx])
    }

    pub fn fallback(&self) -> Option<&Command> {
        self.lookup(DEFAULT)
    }

    /// Registration order.
    pub fn all(&self) -> &[Command] {
        &self.commands
    }

    /// Everything a user can type, i.e. all but the fallback.
    pub fn invocable(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|command| command.name != DEFAULT)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// `name - description` for each invocable command `visible` keeps.
    pub fn help(&self, visible: impl Fn(&Command) -> bool) -> String {
        self.invocable()
            .filter(|command| visible(command))
            .map(|command| format!("{} - {}", command.name, command.description))
            .join("\n")
    }

    pub fn bot_commands(&self) -> Vec<BotCommand> {
        self.invocable()
            .filter(|command| command.access == AccessPolicy::Public)
            .map(|command| BotCommand::new(&command.name, &command.description))
            .collect()
    }
}
