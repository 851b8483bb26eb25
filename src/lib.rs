pub mod ace;
pub mod clean;
pub mod error;
pub mod fetch;
pub mod gtfs;
pub mod loader;
pub mod map;
pub mod output;
pub mod pipeline;
pub mod stats;
