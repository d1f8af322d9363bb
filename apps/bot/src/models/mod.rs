pub mod chat;
pub mod reminder;
pub mod user;
