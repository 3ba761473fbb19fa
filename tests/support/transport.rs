use std::{path::PathBuf, sync::Arc};

use async_cell::sync::AsyncCell;
use async_trait::async_trait;
use teloxide::types::ChatId;
use workshop_bot::logic::message_senders::{PhotoSource, Transport, TransportError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text(ChatId, String),
    Markdown(ChatId, String),
    Photo(ChatId, PhotoSource),
    Keyboard(ChatId, String, Vec<Vec<String>>),
    Download(String),
}

/// Remembers every call. An offline transport remembers them too, then fails.
pub struct RecordingTransport {
    sent: Arc<AsyncCell<Vec<Sent>>>,
    offline: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Self::build(false)
    }

    pub fn offline() -> Arc<Self> {
        Self::build(true)
    }

    fn build(offline: bool) -> Arc<Self> {
        let sent = AsyncCell::<Vec<Sent>>::new().into_shared();
        sent.set(Vec::new());
        Arc::new(RecordingTransport { sent, offline })
    }

    async fn record(&self, call: Sent) -> Result<(), TransportError> {
        let mut sent = self.sent.take().await;
        sent.push(call);
        self.sent.set(sent);

        if self.offline {
            return Err(std::io::Error::other("transport is offline").into());
        }
        Ok(())
    }

    pub fn sent(&self) -> Vec<Sent> {
        let sent = self.sent.try_take().unwrap_or_default();
        self.sent.set(sent.clone());
        sent
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|call| match call {
                Sent::Text(_, text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<(), TransportError> {
        self.record(Sent::Text(chat_id, text)).await
    }

    async fn send_markdown(&self, chat_id: ChatId, text: String) -> Result<(), TransportError> {
        self.record(Sent::Markdown(chat_id, text)).await
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: PhotoSource,
    ) -> Result<(), TransportError> {
        self.record(Sent::Photo(chat_id, photo)).await
    }

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: String,
        rows: Vec<Vec<String>>,
    ) -> Result<(), TransportError> {
        self.record(Sent::Keyboard(chat_id, text, rows)).await
    }

    async fn download_file(&self, file_id: &str) -> Result<PathBuf, TransportError> {
        self.record(Sent::Download(file_id.to_owned())).await?;
        Ok(std::env::temp_dir().join(file_id))
    }
}
