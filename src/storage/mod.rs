//! Shared RocksDB storage utilities.

mod rocksdb;

pub use self::rocksdb::{RocksDbConfig, RocksDbHandle};
