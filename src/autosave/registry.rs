//! # 자동저장 레지스트리
//!
//! 애플리케이션 시작 시 한 번 만들어 필요한 곳에 넘겨주는 컨텍스트 객체입니다.
//! 저장소와 시계, 구독자 목록을 공유하며, 여기서 만들어진 세션은 모두 키로 등록되어
//! 원래 세션 객체 없이도 `keys` / `snapshot` / `clear`로 들여다볼 수 있습니다.
//!
//! 레지스트리는 영속화되지 않습니다. 재시작하면 비어 있고, 세션이 다시 만들어지면서 채워집니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::clock::{Clock, SystemClock};
use super::session::{
    AutosaveSession, AutosaveSnapshot, EnvelopeCodec, ErasedSession, ListenerHub, SessionOptions,
    SnapshotCodec,
};
use super::storage::{KeyValueStore, MemoryStore};

struct RegistryInner {
    sessions: Mutex<HashMap<String, Arc<dyn ErasedSession>>>,
    hub: Arc<ListenerHub>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct AutosaveRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for AutosaveRegistry {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }
}

impl AutosaveRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: Mutex::new(HashMap::new()),
                hub: Arc::new(ListenerHub::default()),
                store,
                clock,
            }),
        }
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.inner.clock)
    }

    /// 기본 봉투 형식(`{data, updatedAt, version}`) 세션
    pub fn create_session<T>(&self, options: SessionOptions) -> AutosaveSession<T>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        self.create_session_with_codec(options, EnvelopeCodec)
    }

    pub fn create_session_with_codec<T, C>(
        &self,
        options: SessionOptions,
        codec: C,
    ) -> AutosaveSession<T, C>
    where
        T: Serialize + DeserializeOwned + 'static,
        C: SnapshotCodec<T>,
    {
        let session = AutosaveSession::new(
            options,
            codec,
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.hub),
            Arc::clone(&self.inner.clock),
        );
        let erased: Arc<dyn ErasedSession> = Arc::new(session.clone());
        let mut sessions = self
            .inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.key().to_string(), erased);
        tracing::debug!(key = session.key(), "registered autosave session");
        session
    }

    fn get(&self, key: &str) -> Option<Arc<dyn ErasedSession>> {
        let sessions = self
            .inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.get(key).cloned()
    }

    /// 등록된 저장 키 목록 (정렬됨)
    pub fn keys(&self) -> Vec<String> {
        let sessions = self
            .inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = sessions.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 키에 저장된 스냅샷. 데이터는 JSON 값으로 돌려줍니다.
    pub fn snapshot(&self, key: &str) -> Option<AutosaveSnapshot<Value>> {
        // 세션 호출 중에는 레지스트리 잠금을 잡고 있지 않습니다.
        self.get(key)?.snapshot_json()
    }

    /// 등록된 세션이 있으면 비우고 `true`
    pub fn clear(&self, key: &str) -> bool {
        match self.get(key) {
            Some(session) => {
                session.clear();
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self, key: &str) -> usize {
        self.inner.hub.count(key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::autosave::clock::ManualClock;
    use crate::autosave::session::{autosave_storage_key, AutosaveError};
    use crate::autosave::codec::{create_draft, update_draft_content, DraftCodec};
    use crate::models::{DraftContent, DraftRecord};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct QuizProgress {
        #[serde(default)]
        page: u32,
        #[serde(default)]
        answers: Vec<String>,
        #[serde(default)]
        flagged: bool,
    }

    fn registry() -> (AutosaveRegistry, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_000));
        (AutosaveRegistry::new(store.clone(), clock.clone()), store, clock)
    }

    #[test]
    fn save_then_load_uses_scoped_key() {
        let (registry, store, clock) = registry();
        let session = registry.create_session::<QuizProgress>(SessionOptions::new("quiz", "q1"));
        assert_eq!(session.key(), "autosave:quiz:q1");

        clock.set(5_000);
        let saved = session.save(QuizProgress { page: 2, ..Default::default() });
        assert_eq!(saved.updated_at, 5_000);
        assert_eq!(saved.version, 1);

        assert_eq!(session.load(), Some(saved));
        assert!(store.raw("autosave:quiz:q1").is_some());
    }

    #[test]
    fn version_mismatch_is_discarded() {
        let (registry, store, _) = registry();
        store
            .set_item(
                "autosave:quiz:q1",
                r#"{"data":{"page":3},"updatedAt":10,"version":1}"#,
            )
            .unwrap();

        let v2 = registry
            .create_session::<QuizProgress>(SessionOptions::new("quiz", "q1").version(2));
        assert_eq!(v2.load(), None);
    }

    #[test]
    fn legacy_key_is_migrated_once() {
        let (registry, store, _) = registry();
        store
            .set_item("quiz-progress-q1", r#"{"page":4,"answers":["A"]}"#)
            .unwrap();

        let session = registry.create_session::<QuizProgress>(
            SessionOptions::new("quiz", "q1").legacy_key("quiz-progress-q1"),
        );
        let loaded = session.load().unwrap();

        assert_eq!(loaded.data.page, 4);
        assert_eq!(loaded.updated_at, 1_000);
        assert_eq!(store.raw("quiz-progress-q1"), None);
        assert!(store.raw("autosave:quiz:q1").is_some());

        // 두 번째 로드는 표준 키에서 읽힙니다.
        assert_eq!(session.load().map(|s| s.data), Some(loaded.data));
    }

    #[test]
    fn iso_updated_at_from_older_payloads_is_understood() {
        let (registry, store, _) = registry();
        store
            .set_item(
                "autosave:quiz:q1",
                r#"{"data":{"page":1},"updatedAt":"1970-01-01T00:00:02.500Z","version":1}"#,
            )
            .unwrap();

        let session = registry.create_session::<QuizProgress>(SessionOptions::new("quiz", "q1"));
        assert_eq!(session.load().unwrap().updated_at, 2_500);
    }

    #[test]
    fn patch_is_shallow_and_keeps_missing_fields() {
        let (registry, _, _) = registry();
        let session = registry.create_session::<QuizProgress>(SessionOptions::new("quiz", "q1"));
        session.save(QuizProgress {
            page: 1,
            answers: vec!["A".into(), "B".into()],
            flagged: false,
        });

        let patched = session.patch(&json!({ "flagged": true })).unwrap();
        assert_eq!(
            patched.data,
            QuizProgress { page: 1, answers: vec!["A".into(), "B".into()], flagged: true }
        );

        // 배열은 통째로 교체됩니다 (깊은 병합 아님).
        let patched = session.patch(&json!({ "answers": ["C"] })).unwrap();
        assert_eq!(patched.data.answers, vec!["C".to_string()]);
        assert_eq!(patched.data.page, 1);
    }

    #[test]
    fn patch_without_existing_data_starts_from_empty_object() {
        let (registry, _, _) = registry();
        let session = registry.create_session::<QuizProgress>(SessionOptions::new("quiz", "fresh"));

        let patched = session.patch(&json!({ "page": 7 })).unwrap();
        assert_eq!(patched.data, QuizProgress { page: 7, ..Default::default() });
        assert!(matches!(session.patch(&json!([1, 2])), Err(AutosaveError::NotAnObject)));
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let (registry, _, _) = registry();
        let session = registry.create_session::<QuizProgress>(SessionOptions::new("quiz", "q1"));
        let delivered = Arc::new(AtomicUsize::new(0));

        let _bad = session.subscribe(|_| panic!("observer bug"));
        let seen = delivered.clone();
        let _good = session.subscribe(move |snapshot| {
            if snapshot.is_some() {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        session.save(QuizProgress::default());
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listeners_are_shared_by_key_and_cleaned_up() {
        let (registry, _, _) = registry();
        let first = registry.create_session::<QuizProgress>(SessionOptions::new("quiz", "q1"));
        let second = registry.create_session::<QuizProgress>(SessionOptions::new("quiz", "q1"));
        let events = Arc::new(Mutex::new(Vec::new()));

        let log = events.clone();
        let sub_a = first.subscribe(move |s| log.lock().unwrap().push(s.map(|s| s.data.page)));
        let log = events.clone();
        let sub_b = first.subscribe(move |s| log.lock().unwrap().push(s.map(|s| s.data.page + 100)));
        assert_eq!(registry.listener_count("autosave:quiz:q1"), 2);

        second.save(QuizProgress { page: 3, ..Default::default() });
        sub_a.unsubscribe();
        second.clear();

        assert_eq!(*events.lock().unwrap(), vec![Some(3), Some(103), None]);
        assert_eq!(registry.listener_count("autosave:quiz:q1"), 1);

        drop(sub_b);
        assert_eq!(registry.listener_count("autosave:quiz:q1"), 0);
    }

    #[test]
    fn observers_of_other_types_hear_every_change() {
        let (registry, _, _) = registry();
        let writer = registry.create_session_with_codec::<DraftRecord, _>(
            SessionOptions::new("writing", "a1"),
            DraftCodec,
        );
        let observer = registry.create_session::<Value>(SessionOptions::new("writing", "a1"));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        let _sub = observer.subscribe(move |s| {
            log.lock()
                .unwrap()
                .push(s.map(|s| (s.updated_at, s.data["attemptId"].clone())))
        });

        writer.save(create_draft("a1", 500));
        writer.clear();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some((500, json!("a1"))), None]
        );
        assert_eq!(registry.listener_count("autosave:writing:a1"), 1);
    }

    #[test]
    fn draft_sessions_stamp_snapshots_with_the_edit_time() {
        let (registry, store, clock) = registry();
        let session = registry.create_session_with_codec::<DraftRecord, _>(
            SessionOptions::new("writing", "a1"),
            DraftCodec,
        );
        let notified = Arc::new(Mutex::new(Vec::new()));
        let log = notified.clone();
        let _sub = session.subscribe(move |s| log.lock().unwrap().extend(s.map(|s| s.updated_at)));

        let draft = update_draft_content(
            &create_draft("a1", 0),
            DraftContent::new("typed at five seconds", ""),
            5_000,
        );
        clock.set(7_000);
        let saved = session.save(draft);

        assert_eq!(saved.updated_at, 5_000);
        assert_eq!(*notified.lock().unwrap(), vec![5_000]);
        assert_eq!(session.load().unwrap().updated_at, 5_000);
        assert_eq!(registry.snapshot(session.key()).unwrap().updated_at, 5_000);
        assert!(store.raw(session.key()).unwrap().contains("\"updatedAt\":5000"));
    }

    #[test]
    fn registry_introspection_without_session_handle() {
        let (registry, _, _) = registry();
        {
            let session = registry.create_session::<QuizProgress>(SessionOptions::new("quiz", "q2"));
            session.save(QuizProgress { page: 9, ..Default::default() });
        }
        registry.create_session::<QuizProgress>(SessionOptions::new("quiz", "q1"));

        let key = autosave_storage_key("quiz", "q2");
        assert_eq!(registry.keys(), vec!["autosave:quiz:q1", "autosave:quiz:q2"]);
        assert_eq!(registry.snapshot(&key).unwrap().data["page"], json!(9));

        assert!(registry.clear(&key));
        assert_eq!(registry.snapshot(&key), None);
        assert!(!registry.clear("autosave:missing:x"));
    }
}
