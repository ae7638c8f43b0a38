pub mod classify;
pub mod config;
pub mod events;
pub mod scene;
