//! # 로컬 저장소 어댑터
//!
//! 브라우저 localStorage에 해당하는 키-값 저장소 추상화(`KeyValueStore`)와
//! 그 위에서 동작하는 "실패해도 조용히 넘어가는" 초안 읽기/쓰기/삭제 함수들입니다.
//!
//! 로컬 캐시는 입력·제출 경로를 절대 막으면 안 됩니다.
//! 그래서 저장소 연산은 모두 `Result`를 돌려주지만, `guarded_*` 함수들은
//! 그 결과를 로그로만 남기고 제어 흐름에는 쓰지 않습니다.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::codec::{deserialize_draft, serialize_draft};
use crate::models::DraftRecord;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded while writing {key} ({needed} bytes needed, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// 저장소 자체를 쓸 수 없음 (브라우저 비공개 모드에 해당)
    #[error("storage is unavailable")]
    Unavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// localStorage의 `getItem` / `setItem` / `removeItem`에 대응하는 최소 인터페이스
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// 메모리 저장소. 선택적으로 용량 제한(바이트)을 걸 수 있습니다.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    disabled: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 키 + 값의 총 바이트가 `quota_bytes`를 넘는 쓰기는 `QuotaExceeded`로 실패합니다.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// 모든 연산이 `Unavailable`로 실패하는 저장소
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable);
        }
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable);
        }
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            if used + needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available: quota.saturating_sub(used),
                });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable);
        }
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

/// 디렉토리 기반 저장소. 키 하나당 파일 하나.
///
/// 키에는 `:` 같은 파일명에 쓰기 곤란한 문자가 들어가므로
/// 파일명은 키 바이트의 16진수 표현입니다. 16진수가 `MAX_HEX_NAME_LEN`을 넘는 긴 키는
/// 파일명 길이 제한(보통 255바이트)에 걸리므로 `h-{sha256}` 형식으로 대신 저장합니다.
const MAX_HEX_NAME_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let hex: String = key.bytes().map(|b| format!("{b:02x}")).collect();
        let name = if hex.len() <= MAX_HEX_NAME_LEN {
            hex
        } else {
            let mut hasher = Sha256::new();
            hasher.update(key.as_bytes());
            format!("h-{:x}", hasher.finalize())
        };
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // 임시 파일에 쓴 뒤 rename합니다.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

pub(crate) fn guarded_get(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get_item(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(key, error = %e, "local storage read failed; treating as miss");
            None
        }
    }
}

pub(crate) fn guarded_set(store: &dyn KeyValueStore, key: &str, value: &str) -> bool {
    match store.set_item(key, value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "local storage write failed; continuing without cache");
            false
        }
    }
}

pub(crate) fn guarded_remove(store: &dyn KeyValueStore, key: &str) -> bool {
    match store.remove_item(key) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(key, error = %e, "local storage remove failed");
            false
        }
    }
}

/// 초안을 읽습니다. 저장소 오류나 해석 실패는 모두 `None`.
pub fn load_draft(store: &dyn KeyValueStore, key: &str) -> Option<DraftRecord> {
    guarded_get(store, key).and_then(|raw| deserialize_draft(&raw))
}

/// 초안을 저장합니다. 용량 초과 등 실패는 로그만 남깁니다.
pub fn save_draft(store: &dyn KeyValueStore, key: &str, record: &DraftRecord) {
    guarded_set(store, key, &serialize_draft(record));
}

pub fn clear_draft(store: &dyn KeyValueStore, key: &str) {
    guarded_remove(store, key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::codec::create_draft;

    #[test]
    fn draft_round_trips_through_memory_store() {
        let store = MemoryStore::new();
        let draft = create_draft("attempt-1", 1_000);

        save_draft(&store, "autosave:writing:attempt-1", &draft);
        assert_eq!(load_draft(&store, "autosave:writing:attempt-1"), Some(draft));

        clear_draft(&store, "autosave:writing:attempt-1");
        assert_eq!(load_draft(&store, "autosave:writing:attempt-1"), None);
    }

    #[test]
    fn disabled_store_degrades_to_no_cache() {
        let store = MemoryStore::disabled();
        let draft = create_draft("attempt-1", 1_000);

        save_draft(&store, "k", &draft);
        clear_draft(&store, "k");
        assert_eq!(load_draft(&store, "k"), None);
    }

    #[test]
    fn quota_exceeded_is_swallowed_and_keeps_previous_value() {
        let store = MemoryStore::with_quota(200);
        let small = create_draft("a", 0);
        save_draft(&store, "k", &small);
        assert!(store.raw("k").is_some());

        let mut big = small.clone();
        big.content.task1 = "word ".repeat(100);
        save_draft(&store, "k", &big);

        assert_eq!(load_draft(&store, "k"), Some(small));
        assert!(matches!(
            store.set_item("k", &"x".repeat(500)),
            Err(StorageError::QuotaExceeded { .. })
        ));
    }

    #[test]
    fn corrupt_payload_reads_as_miss() {
        let store = MemoryStore::new();
        store.set_item("k", "not-json").unwrap();
        assert_eq!(load_draft(&store, "k"), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let draft = create_draft("attempt-9", 42);

        {
            let store = FileStore::open(dir.path()).unwrap();
            save_draft(&store, "autosave:writing:attempt-9", &draft);
        }

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(load_draft(&reopened, "autosave:writing:attempt-9"), Some(draft));

        reopened.remove_item("autosave:writing:attempt-9").unwrap();
        reopened.remove_item("autosave:writing:attempt-9").unwrap();
        assert_eq!(reopened.get_item("autosave:writing:attempt-9").unwrap(), None);
    }

    #[test]
    fn file_store_handles_keys_longer_than_file_name_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let long_a = format!("autosave:writing:{}", "a".repeat(300));
        let long_b = format!("autosave:writing:{}", "b".repeat(300));

        store.set_item(&long_a, "first").unwrap();
        store.set_item(&long_b, "second").unwrap();

        assert_eq!(store.get_item(&long_a).unwrap().as_deref(), Some("first"));
        assert_eq!(store.get_item(&long_b).unwrap().as_deref(), Some("second"));

        store.remove_item(&long_a).unwrap();
        assert_eq!(store.get_item(&long_a).unwrap(), None);
        assert_eq!(store.get_item(&long_b).unwrap().as_deref(), Some("second"));
    }
}
