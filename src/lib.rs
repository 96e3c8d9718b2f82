//! ArcUnpack - migrates a packed rhythm-game archive into a level catalog
//!
//! The pipeline runs four stages in order:
//! - Extract every `*.pack` into a staging tree using its JSON index
//! - Convert the song and pack lists into catalog records with their assets
//! - Move assets into a SHA-1 content-addressed store, deduplicating content
//! - Rewrite record references and insert levels, packs and files

pub const APP_VERSION: &str = "0.1.0";

pub mod app;
pub mod catalog;
pub mod config;
pub mod convert;
pub mod db;
pub mod error;
pub mod extract;
pub mod store;

pub use app::App;
pub use config::Config;
pub use error::{MigrateError, Result};
