use teloxide::types::UserId;
use thiserror::Error;

use crate::db::{
    models::{user_key, UserRecord, USERS},
    Store, StoreError, StoreMap,
};

use super::update::User;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("Store error")]
    StoreError(#[from] StoreError),
}

/// Registry of everyone who ever wrote to the bot.
#[derive(Clone)]
pub struct UsersService {
    users: StoreMap<UserRecord>,
}

impl UsersService {
    pub fn new(store: &Store) -> Self {
        UsersService {
            users: store.map(USERS),
        }
    }

    /// Upserts the record, so name changes are picked up on the next message.
    pub async fn track(&self, user: &User) -> Result<(), UserError> {
        self.users
            .insert(&user_key(user.id), &UserRecord::from(user))
            .await?;
        Ok(())
    }

    pub async fn get(&self, id: UserId) -> Result<Option<UserRecord>, UserError> {
        Ok(self.users.get(&user_key(id)).await?)
    }

    pub async fn all(&self) -> Result<Vec<UserRecord>, UserError> {
        Ok(self.users.values().await?)
    }
}
