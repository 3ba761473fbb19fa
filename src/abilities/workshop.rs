use std::sync::Arc;

use anyhow::{Context, Result};
use itertools::Itertools;

use super::Abilities;
use crate::{
    configuration::AssetSettings,
    db::{
        models::{user_key, COUNTERS},
        Store,
    },
    logic::{
        commands::{bind, Command, DEFAULT},
        dispatcher::{InvocationContext, ValidationFailure},
        message_senders::{PhotoSource, SilentSender},
        replies::{first_name_is, has_photo, has_text, text_starts_with, ReplySpec},
        update::Update,
        users::UsersService,
    },
};

pub struct WorkshopBot {
    silent: SilentSender,
    store: Store,
    users: UsersService,
    assets: AssetSettings,
}

impl WorkshopBot {
    pub fn new(silent: SilentSender, store: Store, assets: AssetSettings) -> Arc<Self> {
        Arc::new(WorkshopBot {
            silent,
            users: UsersService::new(&store),
            store,
            assets,
        })
    }

    async fn say_hello_world(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        self.silent.send("Hello world", ctx.chat_id).await;
        Ok(())
    }

    async fn say_hi(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        self.silent
            .send(format!("Hi, {}", ctx.user.first_name), ctx.chat_id)
            .await;
        Ok(())
    }

    async fn nice_name(self: Arc<Self>, update: Update) -> Result<()> {
        self.silent.send("Wow, nice name!", update.chat_id).await;
        Ok(())
    }

    async fn count(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        let count = self
            .store
            .map::<i64>(COUNTERS)
            .compute(&user_key(ctx.user.id), |count| {
                count.map_or(1, |count| count.saturating_add(1))
            })
            .await
            .context("Failed to bump counter")?;
        self.silent
            .send(
                format!("{}, your count is now {}!", ctx.user.handle(), count),
                ctx.chat_id,
            )
            .await;
        Ok(())
    }

    async fn contacts(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        let users = self.users.all().await.context("Failed to list users")?;
        let message = format!(
            "The following users already contacted me: {}",
            users.iter().map(|user| user.handle()).join(", ")
        );
        self.silent.send(message, ctx.chat_id).await;
        Ok(())
    }

    async fn send_logo(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        let url = self
            .assets
            .logo_url
            .parse()
            .with_context(|| format!("Invalid logo URL {}", self.assets.logo_url))?;
        self.silent.send_photo(PhotoSource::Url(url), ctx.chat_id).await;
        Ok(())
    }

    async fn send_icon(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        self.silent
            .send_photo(PhotoSource::Upload(self.assets.icon_path.clone()), ctx.chat_id)
            .await;
        Ok(())
    }

    async fn send_keyboard(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        let rows: Vec<Vec<String>> = [
            ["/hello", "/hi", "/count"],
            ["/contacts", "/logo", "/icon"],
        ]
        .iter()
        .map(|row| row.iter().map(|button| button.to_string()).collect())
        .collect();
        self.silent
            .send_keyboard("Enjoy this wonderful keyboard!", rows, ctx.chat_id)
            .await;
        Ok(())
    }

    async fn format(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        self.silent
            .send_md("You can make text *bold* or _italic_\\.", ctx.chat_id)
            .await;
        self.silent.send_md("`This is code.`", ctx.chat_id).await;
        self.silent
            .send_md("```\nThis\nis\nmulti\nline\ncode.\n```", ctx.chat_id)
            .await;
        Ok(())
    }

    async fn add(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        let message = match sum(&ctx.args) {
            Ok((a, b, sum)) => format!("The sum of {a} and {b} is {sum}"),
            Err(failure) => {
                tracing::debug!("Refusing to add {:?}: {failure:?}", ctx.args);
                failure.to_string()
            }
        };
        self.silent.send(message, ctx.chat_id).await;
        Ok(())
    }

    async fn backup(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        let dump = self.store.export().await.context("Failed to export store")?;
        self.silent
            .send(serde_json::to_string_pretty(&dump)?, ctx.chat_id)
            .await;
        Ok(())
    }

    async fn say_no(self: Arc<Self>, ctx: InvocationContext) -> Result<()> {
        self.silent
            .send("Sorry, I have no answer for you today.", ctx.chat_id)
            .await;
        Ok(())
    }

    async fn save_photo(self: Arc<Self>, update: Update) -> Result<()> {
        self.silent.send("Nice pic!", update.chat_id).await;
        let Some(photo) = update.biggest_photo() else {
            self.silent
                .send("Houston, we have a problem!", update.chat_id)
                .await;
            return Ok(());
        };

        if let Some(path) = self.silent.download(&photo.file_id).await {
            tracing::info!("Temporary file: {}", path.display());
        }
        self.silent.send("Yeah, I got it!", update.chat_id).await;
        self.silent
            .send_photo(PhotoSource::FileId(photo.file_id.clone()), update.chat_id)
            .await;
        Ok(())
    }
}

/// Adds the first two arguments, ignoring any extra ones.
fn sum(args: &[String]) -> Result<(i64, i64, i64), ValidationFailure> {
    let parse = |argument: &String| {
        argument
            .parse::<i64>()
            .map_err(|_| ValidationFailure::UnparseableArgument {
                argument: argument.clone(),
            })
    };
    let (Some(a), Some(b)) = (args.first(), args.get(1)) else {
        return Err(ValidationFailure::InsufficientArguments {
            missing: 2 - args.len().min(2),
        });
    };
    let (a, b) = (parse(a)?, parse(b)?);
    let sum = a.checked_add(b).ok_or(ValidationFailure::OutOfRange)?;
    Ok((a, b, sum))
}

impl Abilities for WorkshopBot {
    fn commands(self: &Arc<Self>) -> Vec<Command> {
        vec![
            Command::public("hello", "says hello world", bind(self, Self::say_hello_world)),
            Command {
                reply: Some(ReplySpec::new(
                    bind(self, Self::nice_name),
                    vec![has_text(), text_starts_with("/hi"), first_name_is("Marcus")],
                )),
                ..Command::public("hi", "says hi", bind(self, Self::say_hi))
            },
            Command::public(
                "count",
                "increments a counter per user",
                bind(self, Self::count),
            ),
            Command::public(
                "contacts",
                "lists all users who contacted this bot",
                bind(self, Self::contacts),
            ),
            Command::public("logo", "send the logo", bind(self, Self::send_logo)),
            Command::public("icon", "send the icon", bind(self, Self::send_icon)),
            Command::public(
                "keyboard",
                "send a custom keyboard",
                bind(self, Self::send_keyboard),
            ),
            Command::public("format", "formats the message", bind(self, Self::format)),
            Command {
                required_args: 2,
                ..Command::public("add", "adds two numbers", bind(self, Self::add))
            },
            Command::creator_only(
                "backup",
                "dumps the bot's storage",
                bind(self, Self::backup),
            ),
            Command::public(DEFAULT, "answers everything else", bind(self, Self::say_no)),
        ]
    }

    fn replies(self: &Arc<Self>) -> Vec<ReplySpec> {
        vec![ReplySpec::new(bind(self, Self::save_photo), vec![has_photo()])]
    }
}
