#![doc = include_str!("../README.md")]

/// This module provides a generic repository interface for storing and retrieving items.
pub mod repository;

/// Type-safe settings repository for storing application state.
pub mod settings;

mod sdk_managed;

pub use sdk_managed::{DatabaseConfiguration, DatabaseError, SdkManagedState};
pub use settings::{Key, Setting, SettingItem, SettingsError};
