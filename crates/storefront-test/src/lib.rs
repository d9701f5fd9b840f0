#![doc = include_str!("../README.md")]

mod api;
pub use api::start_api_mock;

mod repository;
pub use repository::MemoryRepository;
