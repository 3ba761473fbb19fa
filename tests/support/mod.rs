#![allow(dead_code)]

pub mod transport;

use std::sync::Arc;

use secrecy::SecretString;
use teloxide::types::{ChatId, UserId};
use workshop_bot::{
    abilities::workshop::WorkshopBot,
    configuration::{AssetSettings, BotSettings},
    db::Store,
    logic::{
        commands::{action, Action, Command},
        dispatcher::{Dispatcher, InvocationContext},
        message_senders::SilentSender,
        replies::ReplySpec,
        update::{ChatKind, PhotoSize, Update, User},
    },
};

use self::transport::RecordingTransport;

pub const CREATOR_ID: u64 = 1234567890;
pub const USER_ID: u64 = 1337;
pub const GROUP_CHAT_ID: i64 = -100123;
pub const BOT_USERNAME: &str = "MyWorkshopBot";
pub const LOGO_URL: &str = "https://example.com/logo.png";
pub const ICON_PATH: &str = "assets/chatbot.jpg";

pub struct TestBot {
    pub store: Store,
    pub transport: Arc<RecordingTransport>,
    pub silent: SilentSender,
    pub dispatcher: Dispatcher,
}

pub fn bot_settings() -> BotSettings {
    BotSettings {
        token: SecretString::new("1234567890:ABCDEFGHIJKLMNOPQRSTUVWXYZ".into()),
        username: BOT_USERNAME.into(),
        creator_id: CREATOR_ID,
    }
}

pub fn asset_settings() -> AssetSettings {
    AssetSettings {
        logo_url: LOGO_URL.into(),
        icon_path: ICON_PATH.into(),
    }
}

pub async fn workshop_bot() -> TestBot {
    workshop_bot_with(RecordingTransport::new()).await
}

pub async fn workshop_bot_with(transport: Arc<RecordingTransport>) -> TestBot {
    let store = Store::offline().await.expect("Failed to open store");
    let silent = SilentSender::new(transport.clone());
    let workshop = WorkshopBot::new(silent.clone(), store.clone(), asset_settings());
    let dispatcher = Dispatcher::build(&workshop, &store, silent.clone(), &bot_settings())
        .expect("Workshop abilities must register");
    TestBot {
        store,
        transport,
        silent,
        dispatcher,
    }
}

/// A dispatcher over hand-made abilities. `abilities` gets the sender the dispatcher uses.
pub async fn custom_bot(
    abilities: impl FnOnce(&SilentSender) -> (Vec<Command>, Vec<ReplySpec>),
) -> TestBot {
    let store = Store::offline().await.expect("Failed to open store");
    let transport = RecordingTransport::new();
    let silent = SilentSender::new(transport.clone());
    let (commands, replies) = abilities(&silent);
    let dispatcher = Dispatcher::new(commands, replies, &store, silent.clone(), &bot_settings())
        .expect("Test abilities must register");
    TestBot {
        store,
        transport,
        silent,
        dispatcher,
    }
}

/// Action answering `text` in the invoking chat.
pub fn answer(silent: &SilentSender, text: &'static str) -> Action<InvocationContext> {
    let silent = silent.clone();
    action(move |ctx: InvocationContext| {
        let silent = silent.clone();
        async move {
            silent.send(text, ctx.chat_id).await;
            Ok(())
        }
    })
}

pub fn answer_update(silent: &SilentSender, text: &'static str) -> Action<Update> {
    let silent = silent.clone();
    action(move |update: Update| {
        let silent = silent.clone();
        async move {
            silent.send(text, update.chat_id).await;
            Ok(())
        }
    })
}

pub fn fallback(silent: &SilentSender) -> Command {
    Command::public(
        workshop_bot::logic::commands::DEFAULT,
        "fallback",
        answer(silent, "no idea"),
    )
}

pub fn user(id: u64, first_name: &str, username: Option<&str>) -> User {
    User {
        id: UserId(id),
        first_name: first_name.into(),
        last_name: None,
        username: username.map(str::to_owned),
    }
}

pub fn foo() -> User {
    User {
        last_name: Some("Bar".into()),
        ..user(USER_ID, "Foo", Some("foobar42"))
    }
}

pub fn creator() -> User {
    user(CREATOR_ID, "Boss", Some("the_creator"))
}

pub fn private_chat(user: &User) -> ChatId {
    ChatId(user.id.0 as i64)
}

pub fn text_update(from: &User, text: &str) -> Update {
    Update {
        chat_id: private_chat(from),
        chat_kind: ChatKind::Private,
        from: Some(from.clone()),
        text: Some(text.into()),
        photos: Vec::new(),
    }
}

pub fn group_text_update(from: &User, text: &str) -> Update {
    Update {
        chat_id: ChatId(GROUP_CHAT_ID),
        chat_kind: ChatKind::Group,
        ..text_update(from, text)
    }
}

pub fn photo_update(from: &User) -> Update {
    Update {
        text: None,
        photos: vec![
            PhotoSize {
                file_id: "small".into(),
                file_size: 1_000,
                width: 90,
                height: 90,
            },
            PhotoSize {
                file_id: "large".into(),
                file_size: 80_000,
                width: 1280,
                height: 1280,
            },
            PhotoSize {
                file_id: "medium".into(),
                file_size: 20_000,
                width: 320,
                height: 320,
            },
        ],
        ..text_update(from, "")
    }
}
