use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

const FILES: &str = "files";
const CHECKPOINTS: &str = "checkpoints";
const NEXT_IDS: &str = "next_ids.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub id: u64,
    pub path: String,
    pub content: String,
    pub hash: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub file_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CheckpointFile {
    file_id: u64,
    path: String,
    content: String,
    hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CheckpointRecord {
    #[serde(flatten)]
    checkpoint: Checkpoint,
    files: Vec<CheckpointFile>,
}

/// Persistence capability handed to the tools that need it.
pub trait ProjectStore: Send + Sync {
    /// Create the file, or bump the version of the active file at `path`.
    fn save_file(&self, path: &str, content: &str) -> Result<ProjectFile>;

    fn get_file(&self, path: &str) -> Result<Option<ProjectFile>>;

    /// Active files ordered by path
    fn list_files(&self) -> Result<Vec<ProjectFile>>;

    /// Snapshot every active file
    fn create_checkpoint(&self, name: &str, description: &str) -> Result<Checkpoint>;

    /// Newest first
    fn list_checkpoints(&self) -> Result<Vec<Checkpoint>>;

    fn restore_checkpoint(&self, id: u64) -> Result<Checkpoint>;
}

/// JSON records under one directory: `files/<id>.json`, `checkpoints/<id>.json`
/// and the id counters in `next_ids.json`.
pub struct FileProjectStore {
    root: PathBuf,
    next_ids: Mutex<HashMap<String, u64>>,
}

pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

impl FileProjectStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(FILES))
            .with_context(|| format!("Failed to create project dir {}", root.display()))?;
        fs::create_dir_all(root.join(CHECKPOINTS))?;

        let next_ids = match fs::read_to_string(root.join(NEXT_IDS)) {
            Ok(data) => serde_json::from_str(&data).context("Corrupt next_ids.json")?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(root = %root.display(), "opened project store");
        Ok(Self {
            root,
            next_ids: Mutex::new(next_ids),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Held for the whole of every operation, so records and counters move together.
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, u64>>> {
        self.next_ids
            .lock()
            .map_err(|_| anyhow!("project store lock poisoned"))
    }

    fn next_id(&self, ids: &mut HashMap<String, u64>, table: &str) -> Result<u64> {
        let id = ids.entry(table.to_string()).or_insert(0);
        *id += 1;
        let next = *id;
        write_json(&self.root.join(NEXT_IDS), &*ids)?;
        Ok(next)
    }

    fn record_path(&self, table: &str, id: u64) -> PathBuf {
        self.root.join(table).join(format!("{}.json", id))
    }

    fn save_file_record(&self, file: &ProjectFile) -> Result<()> {
        write_json(&self.record_path(FILES, file.id), file)
    }

    fn all_files(&self) -> Result<Vec<ProjectFile>> {
        read_table(&self.root.join(FILES))
    }

    fn active_file(&self, path: &str) -> Result<Option<ProjectFile>> {
        Ok(self
            .all_files()?
            .into_iter()
            .find(|file| file.is_active && file.path == path))
    }

    fn active_files(&self) -> Result<Vec<ProjectFile>> {
        let mut files: Vec<ProjectFile> = self
            .all_files()?
            .into_iter()
            .filter(|file| file.is_active)
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

impl ProjectStore for FileProjectStore {
    fn save_file(&self, path: &str, content: &str) -> Result<ProjectFile> {
        let mut ids = self.lock()?;
        let now = Utc::now();
        let hash = content_hash(content);

        let file = match self.active_file(path)? {
            Some(mut existing) => {
                existing.content = content.to_string();
                existing.hash = hash;
                existing.version += 1;
                existing.modified_at = now;
                existing
            }
            None => ProjectFile {
                id: self.next_id(&mut ids, FILES)?,
                path: path.to_string(),
                content: content.to_string(),
                hash,
                version: 1,
                created_at: now,
                modified_at: now,
                is_active: true,
            },
        };

        self.save_file_record(&file)?;
        debug!(path, version = file.version, "saved project file");
        Ok(file)
    }

    fn get_file(&self, path: &str) -> Result<Option<ProjectFile>> {
        let _ids = self.lock()?;
        self.active_file(path)
    }

    fn list_files(&self) -> Result<Vec<ProjectFile>> {
        let _ids = self.lock()?;
        self.active_files()
    }

    fn create_checkpoint(&self, name: &str, description: &str) -> Result<Checkpoint> {
        let mut ids = self.lock()?;
        let files = self.active_files()?;

        let checkpoint = Checkpoint {
            id: self.next_id(&mut ids, CHECKPOINTS)?,
            name: name.to_string(),
            description: description.to_string(),
            timestamp: Utc::now(),
            file_count: files.len(),
        };
        let record = CheckpointRecord {
            checkpoint: checkpoint.clone(),
            files: files
                .into_iter()
                .map(|file| CheckpointFile {
                    file_id: file.id,
                    path: file.path,
                    content: file.content,
                    hash: file.hash,
                })
                .collect(),
        };

        write_json(&self.record_path(CHECKPOINTS, checkpoint.id), &record)?;
        debug!(id = checkpoint.id, files = checkpoint.file_count, "created checkpoint");
        Ok(checkpoint)
    }

    fn list_checkpoints(&self) -> Result<Vec<Checkpoint>> {
        let _ids = self.lock()?;
        let records: Vec<CheckpointRecord> = read_table(&self.root.join(CHECKPOINTS))?;
        let mut checkpoints: Vec<Checkpoint> =
            records.into_iter().map(|record| record.checkpoint).collect();
        checkpoints.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(checkpoints)
    }

    fn restore_checkpoint(&self, id: u64) -> Result<Checkpoint> {
        let _ids = self.lock()?;
        let record_path = self.record_path(CHECKPOINTS, id);
        if !record_path.exists() {
            return Err(anyhow!("checkpoint {} not found", id));
        }
        let record: CheckpointRecord = read_json(&record_path)?;
        let now = Utc::now();

        let snapshot: HashMap<u64, &CheckpointFile> =
            record.files.iter().map(|file| (file.file_id, file)).collect();
        let mut restored = HashSet::new();

        for mut file in self.all_files()? {
            match snapshot.get(&file.id) {
                Some(saved) => {
                    if file.hash != saved.hash || !file.is_active {
                        file.content = saved.content.clone();
                        file.hash = saved.hash.clone();
                        file.version += 1;
                        file.modified_at = now;
                        file.is_active = true;
                        self.save_file_record(&file)?;
                    }
                    restored.insert(file.id);
                }
                None if file.is_active => {
                    file.is_active = false;
                    file.modified_at = now;
                    self.save_file_record(&file)?;
                }
                None => {}
            }
        }

        // snapshot entries whose record was removed from disk
        for saved in record.files.iter().filter(|f| !restored.contains(&f.file_id)) {
            warn!(path = %saved.path, "recreating missing file record from checkpoint");
            self.save_file_record(&ProjectFile {
                id: saved.file_id,
                path: saved.path.clone(),
                content: saved.content.clone(),
                hash: saved.hash.clone(),
                version: 1,
                created_at: now,
                modified_at: now,
                is_active: true,
            })?;
        }

        debug!(id, "restored checkpoint");
        Ok(record.checkpoint)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Corrupt record {}", path.display()))
}

/// Every `*.json` record in a table directory. Unreadable records are skipped.
fn read_table<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match read_json(&path) {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping record: {:#}", e),
        }
    }
    Ok(records)
}
