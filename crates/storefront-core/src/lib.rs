#![doc = include_str!("../README.md")]

pub mod auth;
pub mod client;
mod error;
pub mod http;

pub use client::{Client, ClientSettings};
pub use error::NotAuthenticatedError;
