//! RocksDB storage utilities.
//!
//! Generic helpers for RocksDB-backed storage with no domain logic:
//! configurable database setup, serialized key-value operations, and
//! whole-column-family scans used to rebuild in-memory state at startup.

use crate::error::{Result, VeriGeekError};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Configuration for RocksDB storage.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Maximum number of open files.
    pub max_open_files: i32,
    /// Number of log files to keep.
    pub keep_log_file_num: usize,
    /// Maximum WAL size in bytes.
    pub max_wal_size: u64,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// Maximum number of write buffers.
    pub max_write_buffer_number: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            max_open_files: 128,
            keep_log_file_num: 2,
            max_wal_size: 32 * 1024 * 1024,      // 32MB
            write_buffer_size: 32 * 1024 * 1024, // 32MB
            max_write_buffer_number: 2,
        }
    }
}

impl RocksDbConfig {
    /// Creates a configuration sized for server workloads.
    pub fn for_server() -> Self {
        Self {
            max_open_files: 256,
            keep_log_file_num: 3,
            max_wal_size: 64 * 1024 * 1024,      // 64MB
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            max_write_buffer_number: 3,
        }
    }

    /// Builds RocksDB Options from this configuration.
    pub fn build_options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(self.max_open_files);
        opts.set_keep_log_file_num(self.keep_log_file_num);
        opts.set_max_total_wal_size(self.max_wal_size);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_max_write_buffer_number(self.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }
}

/// A wrapper around RocksDB that provides common operations.
///
/// Designed to be embedded in storage structs: values are serialized with
/// bincode, column families provide logical separation between document
/// types.
pub struct RocksDbHandle {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksDbHandle {
    /// Opens a RocksDB database with the given column families.
    pub fn open(
        db_path: impl AsRef<Path>,
        config: &RocksDbConfig,
        column_families: &[&str],
    ) -> Result<Self> {
        let opts = config.build_options();
        let cf_opts = Options::default();

        let cf_descriptors: Vec<_> = column_families
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(*cf, cf_opts.clone()))
            .collect();

        let db = DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(
            &opts,
            db_path.as_ref(),
            cf_descriptors,
        )
        .map_err(|e| VeriGeekError::storage(format!("Failed to open RocksDB: {}", e)))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Gets a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| VeriGeekError::storage(format!("Column family '{}' not found", name)))
    }

    /// Stores a serializable value at the given key.
    pub fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = bincode::serialize(value)
            .map_err(|e| VeriGeekError::serialization(format!("Failed to serialize: {}", e)))?;

        trace!(
            cf = cf_name,
            key_len = key.len(),
            value_bytes = bytes.len(),
            "db_put: storing serialized value"
        );

        self.db
            .put_cf(&cf, key, &bytes)
            .map_err(|e| VeriGeekError::storage(format!("Failed to write: {}", e)))?;

        Ok(())
    }

    /// Loads and deserializes a value from the given key.
    pub fn get<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;

        match self.db.get_cf(&cf, key) {
            Ok(Some(bytes)) => {
                trace!(
                    cf = cf_name,
                    key_len = key.len(),
                    value_bytes = bytes.len(),
                    "db_get: found record"
                );
                let value: T = bincode::deserialize(&bytes).map_err(|e| {
                    VeriGeekError::serialization(format!("Failed to deserialize: {}", e))
                })?;
                Ok(Some(value))
            }
            Ok(None) => {
                trace!(cf = cf_name, key_len = key.len(), "db_get: key not found");
                Ok(None)
            }
            Err(e) => Err(VeriGeekError::storage(format!("Failed to read: {}", e))),
        }
    }

    /// Deletes a key.
    pub fn delete(&self, cf_name: &str, key: &[u8]) -> Result<()> {
        let cf = self.cf(cf_name)?;

        trace!(cf = cf_name, key_len = key.len(), "db_delete: deleting key");

        self.db
            .delete_cf(&cf, key)
            .map_err(|e| VeriGeekError::storage(format!("Failed to delete: {}", e)))?;
        Ok(())
    }

    /// Collects every value in a column family, deserializing each.
    ///
    /// Records that fail to deserialize are skipped with a warning so one
    /// corrupt entry cannot prevent the rest of the store from loading.
    pub fn scan_collect<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut results = Vec::new();
        let mut errors: usize = 0;

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            match item {
                Ok((_, value)) => match bincode::deserialize(&value) {
                    Ok(record) => results.push(record),
                    Err(e) => {
                        errors += 1;
                        warn!("Skipping undecodable record in '{}': {}", cf_name, e);
                    }
                },
                Err(e) => {
                    warn!("Iterator error in '{}': {}", cf_name, e);
                }
            }
        }

        debug!(
            cf = cf_name,
            records_collected = results.len(),
            deserialization_errors = errors,
            "db_scan_collect: collected records"
        );

        Ok(results)
    }
}
