//! BookWise: a terminal chat client for a remote book recommendation service.

pub mod client;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod events;
pub mod logging;
pub mod session;
pub mod ui;
