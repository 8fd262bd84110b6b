// Library crate exposing modules for integration tests

pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod model;
pub mod repository;
pub mod scanner;
pub mod util;

pub use error::TrackError;
