//! Terminal front end: the chat screen and its components

pub mod app;
pub mod conversation;

pub use app::run;
