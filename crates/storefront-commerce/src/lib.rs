#![doc = include_str!("../README.md")]

mod cart;
mod commerce_client;
mod error;
mod favorites;
pub mod item;
mod manager;
pub mod merge;
mod resource;
mod unload;

pub use cart::{Cart, CartManager};
pub use commerce_client::CommerceClient;
pub use error::ResourceError;
pub use favorites::{Favorites, FavoritesManager};
pub use item::{ItemKey, ItemKind, ResourceItem};
pub use manager::ResourceStateManager;
pub use merge::{MergeReconciler, merge_collections};
pub use resource::{Resource, UnauthenticatedPolicy};
pub use unload::UnloadSync;
