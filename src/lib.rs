pub mod config;
pub mod error;
pub mod game;
pub mod session;
pub mod ui;
