pub mod commands;
pub mod dispatcher;
pub mod message_senders;
pub mod replies;
pub mod update;
pub mod users;
