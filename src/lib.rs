pub mod config;
pub mod error;
pub mod interpret;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod server;
pub mod store;
