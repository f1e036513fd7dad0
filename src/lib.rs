//! Pitkit - a mod installer for MX Bikes
//!
//! This crate provides:
//! - Archive and folder unpacking for zip, 7z and rar mods
//! - Signature-based classification of mod content
//! - Guided installation into the game's mods folder
//! - Install manifests for clean, whitelist-aware uninstalls

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod config;
pub mod db;
pub mod mods;

pub use app::App;
pub use config::Config;
