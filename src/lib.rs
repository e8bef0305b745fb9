pub mod record;
pub mod store;
pub mod memory_store;
pub mod backend;

#[cfg(feature = "mongodb")]
pub mod mongo;

#[cfg(feature = "opensearch")]
pub mod opensearch;

pub mod env;
pub mod config;
pub mod init;
pub mod scheduler;
pub mod writer;
pub mod http;
pub mod app;
