use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::types::ResultRecord;

/// Ordered results of one run, mirrored to a single JSON file.
///
/// Every append rewrites the whole file, so after an interruption the file
/// holds every record appended before it.
pub struct ResultStore {
    path: PathBuf,
    records: Vec<ResultRecord>,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), records: Vec::new() }
    }

    pub fn append(&mut self, record: ResultRecord) -> Result<()> {
        self.records.push(record);
        self.flush()
    }

    pub fn flush(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.records)?;
        debug!(path = %self.path.display(), records = self.records.len(), "results written");
        Ok(())
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }

    pub fn load(path: &Path) -> Result<Vec<ResultRecord>> {
        let content = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid results file {}", path.display()))
    }
}

/// Writes `value` as indented JSON next to `path`, then renames it into place.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
    }
    let content = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &content).with_context(|| format!("Cannot write to {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Cannot rename {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confidence, ModelResponse};
    use std::collections::BTreeMap;

    fn record(i: usize) -> ResultRecord {
        ResultRecord {
            id: format!("item-{i}"),
            question_version: (i % 2 == 0).then(|| "augmented_1".to_string()),
            question: format!("{i} + {i} = ?"),
            expected_answer: "A".into(),
            model_response: ModelResponse {
                reasoning: "step by step".into(),
                predicted_answer: Some("A".into()),
                confidence: Confidence {
                    self_eval_confidence: 0.9,
                    logit_based_confidence: 0.25,
                    internal_based_confidence: 0.333,
                },
                confidence_distribution: BTreeMap::from([("A".to_string(), 0.25), ("B".to_string(), 0.75)]),
                parse_error: None,
            },
            raw_text: "{\"predicted_answer\": \"A\"}".into(),
            timestamp: 1_700_000_000.125 + i as f64,
        }
    }

    #[test]
    fn appends_are_visible_in_order_after_each_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/results.json");
        let mut store = ResultStore::new(&path);

        for i in 0..5 {
            store.append(record(i)).unwrap();
            let on_disk = ResultStore::load(&path).unwrap();
            assert_eq!(on_disk.len(), i + 1);
            assert_eq!(on_disk, store.records());
        }
        let ids: Vec<_> = ResultStore::load(&path).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["item-0", "item-1", "item-2", "item-3", "item-4"]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn flush_of_empty_store_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("empty.json"));
        store.flush().unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap().trim(), "[]");
        assert!(store.is_empty());
    }

    #[test]
    fn output_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::new(dir.path().join("r.json"));
        store.append(record(1)).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": \"item-1\""));
    }
}
