//! Loughran–McDonald lexicon cache.
//!
//! The lexicon is loaded once per process: first access reads the gzipped
//! JSON snapshot if it is present and fresh, otherwise rebuilds it from
//! the external master table and writes snapshot plus metadata atomically.
//! After initialization the map is immutable and shared behind an `Arc`;
//! readers only clone the handle. A failed rebuild degrades to an empty
//! map so sentiment scores become zero instead of failing the request.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use advisor_core::LexiconConfig;
use advisor_data::models::LexiconRow;
use advisor_data::repositories::LexiconSourceRepository;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Gzipped JSON snapshot of the word map.
pub const SNAPSHOT_FILE: &str = "mcdonald_dict.json.gz";
/// Snapshot metadata sidecar.
pub const METADATA_FILE: &str = "cache_metadata.json";

/// Per-word lexicon weights. Keys in the map are uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub positive: f64,
    pub negative: f64,
    pub uncertainty: f64,
    pub litigious: f64,
    pub constraining: f64,
}

impl From<&LexiconRow> for LexiconEntry {
    fn from(row: &LexiconRow) -> Self {
        Self {
            positive: row.positive,
            negative: row.negative,
            uncertainty: row.uncertainty,
            litigious: row.litigious,
            constraining: row.constraining,
        }
    }
}

/// Snapshot metadata written next to the gzipped dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub created_at: DateTime<Utc>,
    pub word_count: usize,
    pub db_query_time: DateTime<Utc>,
}

impl CacheMetadata {
    /// A snapshot is valid while its age does not exceed the TTL.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>, ttl_hours: i64) -> bool {
        now - self.created_at <= Duration::hours(ttl_hours)
    }
}

/// Cache introspection for operators.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub word_count: usize,
    pub file_size_bytes: u64,
    pub valid: bool,
}

type LexiconMap = Arc<HashMap<String, LexiconEntry>>;

/// Process-wide lexicon cache.
pub struct LexiconCache {
    cache_dir: PathBuf,
    ttl_hours: i64,
    source: LexiconSourceRepository,
    map: RwLock<Option<LexiconMap>>,
}

impl LexiconCache {
    /// Creates an uninitialized cache. The map is populated on first access.
    #[must_use]
    pub fn new(config: &LexiconConfig, source: LexiconSourceRepository) -> Self {
        Self {
            cache_dir: PathBuf::from(&config.cache_dir),
            ttl_hours: config.ttl_hours,
            source,
            map: RwLock::new(None),
        }
    }

    /// Returns the shared word map, initializing it on first access.
    ///
    /// Concurrent first access is tolerated: losers of the write race
    /// observe the winner's map, and a double load produces an identical
    /// result.
    pub async fn entries(&self) -> LexiconMap {
        if let Some(map) = self.map.read().await.as_ref() {
            return Arc::clone(map);
        }

        let mut guard = self.map.write().await;
        if let Some(map) = guard.as_ref() {
            return Arc::clone(map);
        }

        let map = Arc::new(self.load_or_rebuild().await);
        *guard = Some(Arc::clone(&map));
        map
    }

    /// Looks up a word, case-insensitively.
    pub async fn lookup(&self, word: &str) -> Option<LexiconEntry> {
        self.entries().await.get(&word.to_uppercase()).copied()
    }

    /// Forces a rebuild from the master table, replacing snapshot and map.
    ///
    /// # Errors
    /// Returns an error if the master table cannot be read or the
    /// snapshot cannot be written.
    pub async fn refresh(&self) -> Result<usize> {
        let (map, query_time) = self.rebuild_from_source().await?;
        write_snapshot(&self.cache_dir, &map, query_time)?;

        let word_count = map.len();
        let mut guard = self.map.write().await;
        *guard = Some(Arc::new(map));
        info!(word_count, "lexicon cache refreshed");
        Ok(word_count)
    }

    /// Reports cache size, snapshot file size, and validity.
    pub async fn info(&self) -> CacheInfo {
        let word_count = self.entries().await.len();
        let snapshot_path = self.cache_dir.join(SNAPSHOT_FILE);
        let file_size_bytes = fs::metadata(&snapshot_path).map(|m| m.len()).unwrap_or(0);
        let valid = read_metadata(&self.cache_dir)
            .map(|m| m.is_valid(Utc::now(), self.ttl_hours))
            .unwrap_or(false);

        CacheInfo {
            word_count,
            file_size_bytes,
            valid,
        }
    }

    async fn load_or_rebuild(&self) -> HashMap<String, LexiconEntry> {
        match read_snapshot(&self.cache_dir, self.ttl_hours, Utc::now()) {
            Ok(map) => {
                info!(word_count = map.len(), "lexicon snapshot loaded");
                return map;
            }
            Err(err) => {
                info!(%err, "lexicon snapshot unusable, rebuilding from source");
            }
        }

        match self.rebuild_from_source().await {
            Ok((map, query_time)) => {
                if let Err(err) = write_snapshot(&self.cache_dir, &map, query_time) {
                    warn!(%err, "failed to persist lexicon snapshot");
                }
                map
            }
            Err(err) => {
                error!(%err, "lexicon rebuild failed, serving empty lexicon");
                HashMap::new()
            }
        }
    }

    async fn rebuild_from_source(&self) -> Result<(HashMap<String, LexiconEntry>, DateTime<Utc>)> {
        let query_time = Utc::now();
        let rows = self.source.fetch_all().await?;

        let mut map = HashMap::with_capacity(rows.len());
        for row in &rows {
            map.insert(row.word.to_uppercase(), LexiconEntry::from(row));
        }
        Ok((map, query_time))
    }
}

/// Reads a fresh snapshot from `dir`.
///
/// # Errors
/// Returns an error when either file is missing, unreadable, malformed,
/// or the metadata says the snapshot has expired.
pub fn read_snapshot(
    dir: &Path,
    ttl_hours: i64,
    now: DateTime<Utc>,
) -> Result<HashMap<String, LexiconEntry>> {
    let metadata = read_metadata(dir)?;
    anyhow::ensure!(
        metadata.is_valid(now, ttl_hours),
        "snapshot expired at age {} h",
        (now - metadata.created_at).num_hours()
    );

    let file = fs::File::open(dir.join(SNAPSHOT_FILE)).context("opening snapshot")?;
    let mut decoder = GzDecoder::new(file);
    let mut json = String::new();
    decoder
        .read_to_string(&mut json)
        .context("decompressing snapshot")?;

    let map: HashMap<String, LexiconEntry> =
        serde_json::from_str(&json).context("parsing snapshot JSON")?;
    Ok(map)
}

/// Writes snapshot and metadata atomically (temp file + rename).
///
/// # Errors
/// Returns an error if the cache directory cannot be created or either
/// file cannot be written.
pub fn write_snapshot(
    dir: &Path,
    map: &HashMap<String, LexiconEntry>,
    db_query_time: DateTime<Utc>,
) -> Result<()> {
    fs::create_dir_all(dir).context("creating cache directory")?;

    let json = serde_json::to_vec(map).context("serializing snapshot")?;
    let mut snapshot = NamedTempFile::new_in(dir).context("creating snapshot temp file")?;
    {
        let mut encoder = GzEncoder::new(&mut snapshot, Compression::default());
        encoder.write_all(&json).context("compressing snapshot")?;
        encoder.finish().context("finishing gzip stream")?;
    }
    snapshot
        .persist(dir.join(SNAPSHOT_FILE))
        .context("persisting snapshot")?;

    let metadata = CacheMetadata {
        created_at: Utc::now(),
        word_count: map.len(),
        db_query_time,
    };
    let mut sidecar = NamedTempFile::new_in(dir).context("creating metadata temp file")?;
    sidecar
        .write_all(&serde_json::to_vec_pretty(&metadata).context("serializing metadata")?)
        .context("writing metadata")?;
    sidecar
        .persist(dir.join(METADATA_FILE))
        .context("persisting metadata")?;

    Ok(())
}

fn read_metadata(dir: &Path) -> Result<CacheMetadata> {
    let raw = fs::read_to_string(dir.join(METADATA_FILE)).context("reading metadata")?;
    serde_json::from_str(&raw).context("parsing metadata")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_map() -> HashMap<String, LexiconEntry> {
        let mut map = HashMap::new();
        map.insert(
            "GAIN".to_string(),
            LexiconEntry {
                positive: 1.0,
                negative: 0.0,
                uncertainty: 0.0,
                litigious: 0.0,
                constraining: 0.0,
            },
        );
        map.insert(
            "LOSS".to_string(),
            LexiconEntry {
                positive: 0.0,
                negative: 1.0,
                uncertainty: 0.0,
                litigious: 0.0,
                constraining: 0.0,
            },
        );
        map
    }

    #[test]
    fn snapshot_roundtrips_through_gzip() {
        let dir = TempDir::new().unwrap();
        let map = sample_map();

        write_snapshot(dir.path(), &map, Utc::now()).unwrap();
        let back = read_snapshot(dir.path(), 168, Utc::now()).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back["GAIN"], map["GAIN"]);
        assert_eq!(back["LOSS"], map["LOSS"]);
    }

    #[test]
    fn snapshot_files_exist_after_write() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), &sample_map(), Utc::now()).unwrap();

        assert!(dir.path().join(SNAPSHOT_FILE).exists());
        assert!(dir.path().join(METADATA_FILE).exists());
        // No temp-file leftovers.
        let extras = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(extras, 2);
    }

    #[test]
    fn expired_snapshot_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), &sample_map(), Utc::now()).unwrap();

        let future = Utc::now() + Duration::hours(169);
        assert!(read_snapshot(dir.path(), 168, future).is_err());
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_snapshot(dir.path(), 168, Utc::now()).is_err());
    }

    #[test]
    fn validity_boundary_is_exactly_ttl() {
        let created = Utc::now();
        let metadata = CacheMetadata {
            created_at: created,
            word_count: 2,
            db_query_time: created,
        };

        assert!(metadata.is_valid(created + Duration::hours(168), 168));
        assert!(!metadata.is_valid(created + Duration::hours(168) + Duration::seconds(1), 168));
    }

    #[test]
    fn metadata_roundtrips_through_serde() {
        let metadata = CacheMetadata {
            created_at: Utc::now(),
            word_count: 42,
            db_query_time: Utc::now(),
        };

        let json = serde_json::to_string(&metadata).unwrap();
        let back: CacheMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back.word_count, 42);
        assert_eq!(back.created_at, metadata.created_at);
    }
}
