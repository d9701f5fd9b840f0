#![doc = include_str!("../README.md")]

mod configuration;
mod error;
mod util;

pub use configuration::Configuration;
pub use error::Error;
pub use util::{AuthRequired, encode_path_segment};
