use teloxide::types::{ChatId, Message, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    /// Groups, supergroups and channels.
    Group,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last_name) => format!("{} {}", self.first_name, last_name),
            None => self.first_name.clone(),
        }
    }

    pub fn handle(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }
}

impl From<&teloxide::types::User> for User {
    fn from(user: &teloxide::types::User) -> Self {
        User {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_size: u32,
    pub width: u32,
    pub height: u32,
}

/// One inbound message, stripped down to what abilities look at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub from: Option<User>,
    pub text: Option<String>,
    pub photos: Vec<PhotoSize>,
}

impl Update {
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn has_photo(&self) -> bool {
        !self.photos.is_empty()
    }

    pub fn biggest_photo(&self) -> Option<&PhotoSize> {
        self.photos.iter().max_by_key(|photo| photo.file_size)
    }
}

impl From<&Message> for Update {
    fn from(msg: &Message) -> Self {
        Update {
            chat_id: msg.chat.id,
            chat_kind: if msg.chat.is_private() {
                ChatKind::Private
            } else {
                ChatKind::Group
            },
            from: msg.from().map(User::from),
            text: msg.text().map(str::to_owned),
            photos: msg
                .photo()
                .unwrap_or_default()
                .iter()
                .map(|photo| PhotoSize {
                    file_id: photo.file.id.clone(),
                    file_size: photo.file.size,
                    width: photo.width,
                    height: photo.height,
                })
                .collect(),
        }
    }
}
