use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use teloxide::{
    net::Download,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, InputFile, KeyboardButton, KeyboardMarkup, ParseMode},
    Bot,
};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Telegram request failed")]
    RequestError(#[from] teloxide::RequestError),

    #[error("File download failed")]
    DownloadError(#[from] teloxide::DownloadError),

    #[error("Local file error")]
    IoError(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhotoSource {
    Url(Url),
    /// A file already on Telegram's servers.
    FileId(String),
    /// A local file to upload.
    Upload(PathBuf),
}

/// Outbound side of the messaging platform.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<(), TransportError>;

    /// `text` is MarkdownV2.
    async fn send_markdown(&self, chat_id: ChatId, text: String) -> Result<(), TransportError>;

    async fn send_photo(&self, chat_id: ChatId, photo: PhotoSource)
        -> Result<(), TransportError>;

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: String,
        rows: Vec<Vec<String>>,
    ) -> Result<(), TransportError>;

    /// Downloads a file into a fresh temporary file that outlives the call.
    async fn download_file(&self, file_id: &str) -> Result<PathBuf, TransportError>;
}

pub struct TgTransport {
    bot: Bot,
}

impl TgTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TgTransport {
    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<(), TransportError> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn send_markdown(&self, chat_id: ChatId, text: String) -> Result<(), TransportError> {
        self.bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: PhotoSource,
    ) -> Result<(), TransportError> {
        let file = match photo {
            PhotoSource::Url(url) => InputFile::url(url),
            PhotoSource::FileId(file_id) => InputFile::file_id(file_id),
            PhotoSource::Upload(path) => InputFile::file(path),
        };
        self.bot.send_photo(chat_id, file).await?;
        Ok(())
    }

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: String,
        rows: Vec<Vec<String>>,
    ) -> Result<(), TransportError> {
        let keyboard = KeyboardMarkup::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        );
        self.bot
            .send_message(chat_id, text)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<PathBuf, TransportError> {
        let file = self.bot.get_file(file_id).await?;
        let (target, path) = tempfile::Builder::new()
            .prefix("photo-")
            .tempfile()?
            .keep()
            .map_err(|err| err.error)?;

        let mut target = tokio::fs::File::from_std(target);
        self.bot.download_file(&file.path, &mut target).await?;
        target.flush().await?;
        Ok(path)
    }
}

/// Best-effort delivery: failures are logged and reported as `false`/`None`,
/// never returned to the caller.
#[derive(Clone)]
pub struct SilentSender {
    transport: Arc<dyn Transport>,
}

impl SilentSender {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn send(&self, text: impl Into<String>, chat_id: ChatId) -> bool {
        Self::delivered(chat_id, self.transport.send_text(chat_id, text.into()).await)
    }

    pub async fn send_md(&self, text: impl Into<String>, chat_id: ChatId) -> bool {
        Self::delivered(
            chat_id,
            self.transport.send_markdown(chat_id, text.into()).await,
        )
    }

    pub async fn send_photo(&self, photo: PhotoSource, chat_id: ChatId) -> bool {
        Self::delivered(chat_id, self.transport.send_photo(chat_id, photo).await)
    }

    pub async fn send_keyboard(
        &self,
        text: impl Into<String>,
        rows: Vec<Vec<String>>,
        chat_id: ChatId,
    ) -> bool {
        Self::delivered(
            chat_id,
            self.transport
                .send_keyboard(chat_id, text.into(), rows)
                .await,
        )
    }

    pub async fn download(&self, file_id: &str) -> Option<PathBuf> {
        match self.transport.download_file(file_id).await {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::error!("Failed to download file {file_id}: {err}");
                None
            }
        }
    }

    fn delivered(chat_id: ChatId, result: Result<(), TransportError>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::error!("Failed to send to chat {}: {err}", chat_id.0);
                false
            }
        }
    }
}
