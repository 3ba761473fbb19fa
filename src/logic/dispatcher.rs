use std::sync::Arc;

use teloxide::types::{BotCommand, ChatId, UserId};
use thiserror::Error;
use tracing::{debug, error};

use super::{
    commands::{action, BoxFuture, Command, CommandRegistry, RegistryError},
    message_senders::SilentSender,
    replies::{ReplyRegistry, ReplySpec},
    update::{Update, User},
    users::UsersService,
};
use crate::{abilities::Abilities, configuration::BotSettings, db::Store};

pub const COMMAND_PREFIX: char = '/';
/// Built-in command listing every other command.
pub const HELP: &str = "commands";

/// What an action gets to see. Lives for one invocation.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    pub chat_id: ChatId,
    pub user: User,
    pub args: Vec<String>,
    pub update: Update,
}

impl InvocationContext {
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn second_arg(&self) -> Option<&str> {
        self.args.get(1).map(String::as_str)
    }
}

/// Bad input from the user. The `Display` text is what the user gets to read.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("Sorry, this feature requires {missing} additional inputs.")]
    InsufficientArguments { missing: usize },

    #[error("Sorry, \"{argument}\" is not a whole number.")]
    UnparseableArgument { argument: String },

    #[error("Sorry, that number is too big for me.")]
    OutOfRange,
}

#[derive(Error, Debug)]
pub enum ActionFailure {
    #[error("Action failed: {0:#}")]
    Failed(anyhow::Error),

    #[error("Action panicked")]
    Panicked(#[from] tokio::task::JoinError),
}

/// Which branch an update took. The transport ignores it; it is there for logs and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Reply,
    Command(String),
    Fallback,
    InsufficientArguments,
    Ignored,
}

enum Invocation<'a> {
    Command { name: &'a str, args: Vec<String> },
    Plain { args: Vec<String> },
    OtherBot,
}

pub struct Dispatcher {
    commands: CommandRegistry,
    replies: ReplyRegistry,
    users: UsersService,
    silent: SilentSender,
    creator_id: UserId,
    username: String,
}

impl Dispatcher {
    /// Replies bound to commands are armed first, in command order, then `replies`.
    pub fn new(
        commands: Vec<Command>,
        replies: Vec<ReplySpec>,
        store: &Store,
        silent: SilentSender,
        settings: &BotSettings,
    ) -> Result<Self, RegistryError> {
        let mut registry = CommandRegistry::from_commands(commands)?;
        if registry.lookup(HELP).is_none() {
            let help = help_command(&registry, silent.clone(), UserId(settings.creator_id));
            registry.register(help)?;
        }

        let mut reply_registry = ReplyRegistry::new();
        registry
            .all()
            .iter()
            .filter_map(|command| command.reply.clone())
            .chain(replies)
            .for_each(|reply| reply_registry.register(reply));

        tracing::info!(
            commands = registry.len(),
            replies = reply_registry.len(),
            "Abilities registered"
        );

        Ok(Dispatcher {
            commands: registry,
            replies: reply_registry,
            users: UsersService::new(store),
            silent,
            creator_id: UserId(settings.creator_id),
            username: settings.username.clone(),
        })
    }

    pub fn build<A: Abilities>(
        abilities: &Arc<A>,
        store: &Store,
        silent: SilentSender,
        settings: &BotSettings,
    ) -> Result<Self, RegistryError> {
        Self::new(
            abilities.commands(),
            abilities.replies(),
            store,
            silent,
            settings,
        )
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn replies(&self) -> &ReplyRegistry {
        &self.replies
    }

    pub fn bot_commands(&self) -> Vec<BotCommand> {
        self.commands.bot_commands()
    }

    #[tracing::instrument(name = "dispatch", skip_all, fields(chat_id = update.chat_id.0))]
    pub async fn handle(&self, update: Update) -> Outcome {
        if let Some(user) = &update.from {
            if let Err(err) = self.users.track(user).await {
                error!("Failed to track user {}: {err}", user.id.0);
            }
        }

        if let Some(reply) = self.replies.find_match(&update) {
            debug!("Reply matched");
            if let Err(err) = Self::execute((reply.action)(update)).await {
                error!("Reply failed: {err}");
            }
            return Outcome::Reply;
        }

        let (Some(user), Some(text)) = (update.from.clone(), update.text.clone()) else {
            debug!("No sender or no text, nothing to match");
            return Outcome::Ignored;
        };

        let (command, args) = match self.parse(&text) {
            Invocation::Command { name, args } => (self.commands.lookup(name), args),
            Invocation::Plain { args } => (None, args),
            Invocation::OtherBot => {
                debug!("Command is addressed to another bot");
                return Outcome::Ignored;
            }
        };

        let Some(command) = command else {
            return self.fallback(user, args, update).await;
        };

        if !command.permits(user.id, self.creator_id, update.chat_kind) {
            debug!(command = %command.name, user = user.id.0, "Access denied");
            return self.fallback(user, args, update).await;
        }

        if args.len() < command.required_args {
            let failure = ValidationFailure::InsufficientArguments {
                missing: command.required_args - args.len(),
            };
            debug!(command = %command.name, "{failure:?}");
            self.silent.send(failure.to_string(), update.chat_id).await;
            return Outcome::InsufficientArguments;
        }

        debug!(command = %command.name, "Command matched");
        self.invoke(command, user, args, update).await;
        Outcome::Command(command.name.clone())
    }

    fn parse<'a>(&self, text: &'a str) -> Invocation<'a> {
        // Only text that itself starts with the prefix is a command.
        let Some(body) = text.strip_prefix(COMMAND_PREFIX) else {
            return Invocation::Plain {
                args: text.split_whitespace().map(str::to_owned).collect(),
            };
        };

        let (name, rest) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
        let args = rest.split_whitespace().map(str::to_owned).collect();
        match name.split_once('@') {
            Some((name, bot)) if bot.eq_ignore_ascii_case(&self.username) => {
                Invocation::Command { name, args }
            }
            Some(_) => Invocation::OtherBot,
            None => Invocation::Command { name, args },
        }
    }

    async fn fallback(&self, user: User, args: Vec<String>, update: Update) -> Outcome {
        match self.commands.fallback() {
            Some(fallback) => {
                debug!("No command matched, falling back");
                self.invoke(fallback, user, args, update).await;
                Outcome::Fallback
            }
            None => Outcome::Ignored,
        }
    }

    async fn invoke(&self, command: &Command, user: User, args: Vec<String>, update: Update) {
        let ctx = InvocationContext {
            chat_id: update.chat_id,
            user,
            args,
            update,
        };
        if let Err(err) = Self::execute((command.action)(ctx)).await {
            error!(command = %command.name, "{err}");
        }
    }

    /// Runs the action on its own task so neither an `Err` nor a panic escapes.
    async fn execute(action: BoxFuture<anyhow::Result<()>>) -> Result<(), ActionFailure> {
        tokio::spawn(action).await?.map_err(ActionFailure::Failed)
    }
}

/// Lists only the commands the caller could run from this chat.
fn help_command(registry: &CommandRegistry, silent: SilentSender, creator_id: UserId) -> Command {
    const DESCRIPTION: &str = "lists all commands";

    let registry = registry.clone();
    Command::public(
        HELP,
        DESCRIPTION,
        action(move |ctx: InvocationContext| {
            let silent = silent.clone();
            let mut help = registry
                .help(|command| command.permits(ctx.user.id, creator_id, ctx.update.chat_kind));
            async move {
                if !help.is_empty() {
                    help.push('\n');
                }
                help.push_str(&format!("{HELP} - {DESCRIPTION}"));
                silent.send(help, ctx.chat_id).await;
                Ok(())
            }
        }),
    )
}
