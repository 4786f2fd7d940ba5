pub mod chat;
pub mod providers;
