//! Adapters for the domain ports: object storage, HTTP and stage handlers.

pub mod http;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
