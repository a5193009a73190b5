//! Adapters behind the domain ports: in-memory and RocksDB session stores,
//! plus scripted collaborator doubles for the CLI driver and tests.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod scripted;
