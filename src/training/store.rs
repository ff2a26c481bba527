//! Training data store scanning and statistics
//!
//! Files are selected by name only. Record counts are best effort: a file
//! that does not parse is reported with an unknown count.

use crate::errors::Result;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Name-based selection of training files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingFilePattern {
    pub name_contains: String,
    pub extensions: Vec<String>,
}

impl TrainingFilePattern {
    pub fn new(name_contains: impl Into<String>, extensions: Vec<String>) -> Self {
        Self {
            name_contains: name_contains.into(),
            extensions,
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            return false;
        };

        stem.to_lowercase().contains(&self.name_contains.to_lowercase())
            && self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Container format, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// `.json`: an array of records, or an object with a `training_data` array
    RecordArray,
    /// `.jsonl`: one record per line
    LineDelimited,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => DataFormat::LineDelimited,
            _ => DataFormat::RecordArray,
        }
    }
}

/// A matching file in the store
#[derive(Debug, Clone)]
pub struct TrainingFile {
    pub path: PathBuf,
    pub format: DataFormat,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

impl TrainingFile {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCount {
    Known(usize),
    Unknown,
}

impl fmt::Display for RecordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordCount::Known(n) => write!(f, "{}", n),
            RecordCount::Unknown => f.write_str("unknown"),
        }
    }
}

/// Per-file statistics
#[derive(Debug, Clone)]
pub struct FileStats {
    pub file: TrainingFile,
    pub records: RecordCount,
}

/// Aggregate statistics over the store
#[derive(Debug, Clone, Default)]
pub struct DatasetStats {
    pub files: Vec<FileStats>,
}

impl DatasetStats {
    /// Sum of all known record counts
    pub fn total_records(&self) -> usize {
        self.files
            .iter()
            .filter_map(|f| match f.records {
                RecordCount::Known(n) => Some(n),
                RecordCount::Unknown => None,
            })
            .sum()
    }

    pub fn unknown_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.records == RecordCount::Unknown)
            .count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.file.size_bytes).sum()
    }
}

/// List matching files, sorted by name. Fails if the directory cannot be read.
pub fn list_training_files(dir: &Path, pattern: &TrainingFilePattern) -> Result<Vec<TrainingFile>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !pattern.matches(&path) {
            continue;
        }

        let metadata = entry.metadata()?;
        files.push(TrainingFile {
            format: DataFormat::from_path(&path),
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
            path,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Count records in one file; unreadable or unparseable ⇒ `Unknown`
pub fn count_records(path: &Path, format: DataFormat) -> RecordCount {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "cannot read training file");
            return RecordCount::Unknown;
        }
    };

    match format {
        DataFormat::RecordArray => match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(items)) => RecordCount::Known(items.len()),
            Ok(Value::Object(map)) => match map.get("training_data") {
                Some(Value::Array(items)) => RecordCount::Known(items.len()),
                _ => RecordCount::Unknown,
            },
            _ => RecordCount::Unknown,
        },
        DataFormat::LineDelimited => {
            let mut count = 0;
            for line in contents.lines().filter(|l| !l.trim().is_empty()) {
                if serde_json::from_str::<Value>(line).is_err() {
                    return RecordCount::Unknown;
                }
                count += 1;
            }
            RecordCount::Known(count)
        }
    }
}

/// Scan the store and count records in every matching file
pub fn collect_stats(dir: &Path, pattern: &TrainingFilePattern) -> Result<DatasetStats> {
    let files = list_training_files(dir, pattern)?
        .into_iter()
        .map(|file| {
            let records = count_records(&file.path, file.format);
            FileStats { file, records }
        })
        .collect();

    Ok(DatasetStats { files })
}
