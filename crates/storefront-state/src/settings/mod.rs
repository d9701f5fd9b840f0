//! Type-safe settings repository for storing application state.
//!
//! This module provides a type-safe key-value API for storing settings, backed by
//! the SDK's repository pattern.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use storefront_state::{
//!     DatabaseConfiguration, SdkManagedState, Setting, register_setting_key,
//! };
//!
//! register_setting_key!(const THEME: String = "theme");
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let state = SdkManagedState::initialize(DatabaseConfiguration::InMemory).await?;
//! let setting = Setting::new(state.settings(), THEME);
//!
//! setting.update("dark".to_string()).await?;
//! assert_eq!(setting.get().await?, Some("dark".to_string()));
//!
//! setting.delete().await?;
//! assert_eq!(setting.get().await?, None);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

mod key;
mod setting;

pub use key::Key;
pub use setting::{Setting, SettingItem, SettingsError};
