//! # 자동저장 세션
//!
//! 기능 하나(작문 초안, 퀴즈 진행 상황 등)에 키가 붙은 버전 관리형 로컬 자동저장 채널을 줍니다.
//!
//! - 저장 키: `autosave:{scope}:{id}`
//! - `load`: 표준 키 → 레거시 키 순서로 시도. 레거시에서 읽히면 표준 키로 옮기고 레거시 키는 지웁니다.
//! - `save` / `clear`: 저장 후 같은 키의 구독자 전원에게 동기적으로 알립니다.
//!   구독자 목록은 데이터 타입과 무관하게 키 단위로 공유되며, 알림은 JSON 스냅샷으로 전달된 뒤
//!   각 구독자의 타입으로 다시 해석됩니다. 해석되지 않는 구독자는 건너뜁니다.
//! - `patch`: 현재 데이터 위에 최상위 필드만 얕게 덮어씁니다.
//!
//! 세션은 `AutosaveRegistry`를 통해서만 만들어지며, 만들어지는 즉시 레지스트리에 등록됩니다.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::clock::Clock;
use super::storage::{guarded_get, guarded_remove, guarded_set, KeyValueStore};

const KEY_PREFIX: &str = "autosave:";

pub fn autosave_storage_key(scope: &str, id: &str) -> String {
    format!("{KEY_PREFIX}{scope}:{id}")
}

/// 저장 단위: 데이터 + 저장 시각 + 세션 버전
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveSnapshot<T> {
    pub data: T,
    pub updated_at: i64,
    pub version: u32,
}

#[derive(Debug, Error)]
pub enum AutosaveError {
    #[error("autosave patch and current data must both be JSON objects")]
    NotAnObject,

    #[error("autosave data could not be converted: {0}")]
    Json(#[from] serde_json::Error),
}

/// 스냅샷을 저장소 문자열로 바꾸는 방법
pub trait SnapshotCodec<T>: Send + Sync + 'static {
    fn encode(&self, snapshot: &AutosaveSnapshot<T>) -> Result<String, serde_json::Error>;

    /// 세션 버전과 맞지 않거나 해석할 수 없으면 `None`
    fn decode(&self, raw: &str, version: u32, now: i64) -> Option<AutosaveSnapshot<T>>;

    /// `save`가 스냅샷에 찍을 `updatedAt`. 데이터가 자기 시각을 들고 있으면 그 값을 씁니다.
    fn stamp(&self, _data: &T, now: i64) -> i64 {
        now
    }
}

/// 기본 형식: `{ "data": ..., "updatedAt": ..., "version": ... }`
///
/// - 저장된 `version`이 세션 버전과 다르면 버립니다 (마이그레이션하지 않음).
/// - `data` 필드가 없으면 페이로드 전체를 데이터로 봅니다 (봉투 없는 옛 형식).
/// - `updatedAt`이 없으면 지금 시각, RFC 3339 문자열이면 변환해서 씁니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCodec;

impl<T> SnapshotCodec<T> for EnvelopeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, snapshot: &AutosaveSnapshot<T>) -> Result<String, serde_json::Error> {
        serde_json::to_string(snapshot)
    }

    fn decode(&self, raw: &str, version: u32, now: i64) -> Option<AutosaveSnapshot<T>> {
        let parsed: Value = serde_json::from_str(raw).ok()?;
        let obj = parsed.as_object()?;

        if let Some(stored) = obj.get("version").and_then(Value::as_u64) {
            if stored != u64::from(version) {
                return None;
            }
        }

        let updated_at = obj
            .get("updatedAt")
            .and_then(|v| {
                v.as_i64().or_else(|| {
                    v.as_str()
                        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                        .map(|dt| dt.timestamp_millis())
                })
            })
            .unwrap_or(now);

        let data_value = match obj.get("data") {
            Some(data) if data.is_object() || data.is_array() => data.clone(),
            _ => parsed.clone(),
        };
        let data = serde_json::from_value(data_value).ok()?;

        Some(AutosaveSnapshot {
            data,
            updated_at,
            version,
        })
    }
}

/// 구독 콜백
pub type Listener<T> = Arc<dyn Fn(Option<&AutosaveSnapshot<T>>) + Send + Sync>;

type Bucket = Vec<(u64, Listener<Value>)>;

/// 키별 구독자 목록. 같은 키를 쓰는 모든 세션이 공유합니다.
#[derive(Default)]
pub(crate) struct ListenerHub {
    next_id: AtomicU64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl ListenerHub {
    fn add(&self, key: &str, listener: Listener<Value>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets
            .entry(key.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    fn remove(&self, key: &str, id: u64) {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bucket) = buckets.get_mut(key) {
            bucket.retain(|(listener_id, _)| *listener_id != id);
            if bucket.is_empty() {
                buckets.remove(key);
            }
        }
    }

    pub(crate) fn count(&self, key: &str) -> usize {
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets.get(key).map_or(0, Vec::len)
    }

    fn notify(&self, key: &str, snapshot: Option<&AutosaveSnapshot<Value>>) {
        // 콜백 안에서 구독/해제가 일어날 수 있으므로 잠금을 풀고 호출합니다.
        let listeners: Vec<Listener<Value>> = {
            let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
            match buckets.get(key) {
                Some(bucket) => bucket.iter().map(|(_, l)| Arc::clone(l)).collect(),
                None => return,
            }
        };

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
                tracing::warn!(key, "autosave listener panicked; ignoring");
            }
        }
    }
}

/// `subscribe`가 돌려주는 해제 핸들. drop되거나 `unsubscribe`가 호출되면
/// 해당 콜백 하나만 제거됩니다.
#[must_use = "dropping a Subscription removes the listener immediately"]
pub struct Subscription {
    hub: Weak<ListenerHub>,
    key: String,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(&self.key, self.id);
        }
    }
}

/// 세션 생성 옵션
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub scope: String,
    pub id: String,
    pub version: u32,
    pub legacy_keys: Vec<String>,
}

impl SessionOptions {
    pub fn new(scope: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            id: id.into(),
            version: 1,
            legacy_keys: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn legacy_key(mut self, key: impl Into<String>) -> Self {
        self.legacy_keys.push(key.into());
        self
    }
}

pub struct AutosaveSession<T, C = EnvelopeCodec> {
    key: String,
    version: u32,
    legacy_keys: Vec<String>,
    store: Arc<dyn KeyValueStore>,
    hub: Arc<ListenerHub>,
    clock: Arc<dyn Clock>,
    codec: Arc<C>,
    _data: PhantomData<fn() -> T>,
}

impl<T, C> Clone for AutosaveSession<T, C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            version: self.version,
            legacy_keys: self.legacy_keys.clone(),
            store: Arc::clone(&self.store),
            hub: Arc::clone(&self.hub),
            clock: Arc::clone(&self.clock),
            codec: Arc::clone(&self.codec),
            _data: PhantomData,
        }
    }
}

impl<T, C> AutosaveSession<T, C>
where
    T: 'static,
    C: SnapshotCodec<T>,
{
    pub(crate) fn new(
        options: SessionOptions,
        codec: C,
        store: Arc<dyn KeyValueStore>,
        hub: Arc<ListenerHub>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            key: autosave_storage_key(&options.scope, &options.id),
            version: options.version,
            legacy_keys: options.legacy_keys,
            store,
            hub,
            clock,
            codec: Arc::new(codec),
            _data: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn load_from(&self, storage_key: &str) -> Option<AutosaveSnapshot<T>> {
        let raw = guarded_get(self.store.as_ref(), storage_key)?;
        let snapshot = self
            .codec
            .decode(&raw, self.version, self.clock.now_ms())?;

        if storage_key != self.key {
            match self.codec.encode(&snapshot) {
                Ok(encoded) => {
                    if guarded_set(self.store.as_ref(), &self.key, &encoded) {
                        guarded_remove(self.store.as_ref(), storage_key);
                        tracing::debug!(from = storage_key, to = %self.key, "migrated legacy autosave key");
                    }
                }
                Err(e) => tracing::warn!(key = storage_key, error = %e, "failed to re-encode legacy autosave"),
            }
        }
        Some(snapshot)
    }

    pub fn load(&self) -> Option<AutosaveSnapshot<T>> {
        if let Some(primary) = self.load_from(&self.key) {
            return Some(primary);
        }
        self.legacy_keys.iter().find_map(|legacy| self.load_from(legacy))
    }
}

impl<T, C> AutosaveSession<T, C>
where
    T: Serialize + DeserializeOwned + 'static,
    C: SnapshotCodec<T>,
{
    pub fn save(&self, data: T) -> AutosaveSnapshot<T> {
        let snapshot = AutosaveSnapshot {
            updated_at: self.codec.stamp(&data, self.clock.now_ms()),
            data,
            version: self.version,
        };
        match self.codec.encode(&snapshot) {
            Ok(encoded) => {
                guarded_set(self.store.as_ref(), &self.key, &encoded);
            }
            Err(e) => tracing::warn!(key = %self.key, error = %e, "failed to encode autosave snapshot"),
        }
        match to_json_snapshot(&snapshot) {
            Ok(json) => self.hub.notify(&self.key, Some(&json)),
            Err(e) => tracing::warn!(key = %self.key, error = %e, "autosave listeners not notified"),
        }
        snapshot
    }

    pub fn clear(&self) {
        guarded_remove(self.store.as_ref(), &self.key);
        self.hub.notify(&self.key, None);
    }

    /// 이 키의 저장/삭제를 구독합니다. 다른 타입의 세션이 저장한 데이터도
    /// `T`로 해석되면 전달됩니다.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<&AutosaveSnapshot<T>>) + Send + Sync + 'static,
    {
        let key = self.key.clone();
        let adapter = move |snapshot: Option<&AutosaveSnapshot<Value>>| match snapshot {
            None => listener(None),
            Some(json) => match serde_json::from_value::<T>(json.data.clone()) {
                Ok(data) => listener(Some(&AutosaveSnapshot {
                    data,
                    updated_at: json.updated_at,
                    version: json.version,
                })),
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "autosave listener skipped; data shape differs")
                }
            },
        };
        let id = self.hub.add(&self.key, Arc::new(adapter));
        Subscription {
            hub: Arc::downgrade(&self.hub),
            key: self.key.clone(),
            id,
        }
    }

    /// 현재 데이터(없으면 빈 객체)에 `partial`의 최상위 필드를 덮어쓰고 저장합니다.
    /// `partial`에 없는 필드는 그대로 남습니다.
    pub fn patch<P: Serialize>(&self, partial: &P) -> Result<AutosaveSnapshot<T>, AutosaveError> {
        let current = match self.load() {
            Some(snapshot) => serde_json::to_value(&snapshot.data)?,
            None => Value::Object(Map::new()),
        };
        let (Value::Object(mut merged), Value::Object(partial)) =
            (current, serde_json::to_value(partial)?)
        else {
            return Err(AutosaveError::NotAnObject);
        };
        merged.extend(partial);
        let next: T = serde_json::from_value(Value::Object(merged))?;
        Ok(self.save(next))
    }
}

fn to_json_snapshot<T: Serialize>(
    snapshot: &AutosaveSnapshot<T>,
) -> Result<AutosaveSnapshot<Value>, serde_json::Error> {
    Ok(AutosaveSnapshot {
        data: serde_json::to_value(&snapshot.data)?,
        updated_at: snapshot.updated_at,
        version: snapshot.version,
    })
}

/// 레지스트리가 타입을 모른 채 세션을 들여다보기 위한 인터페이스
pub(crate) trait ErasedSession: Send + Sync {
    fn snapshot_json(&self) -> Option<AutosaveSnapshot<Value>>;
    fn clear(&self);
}

impl<T, C> ErasedSession for AutosaveSession<T, C>
where
    T: Serialize + DeserializeOwned + 'static,
    C: SnapshotCodec<T>,
{
    fn snapshot_json(&self) -> Option<AutosaveSnapshot<Value>> {
        to_json_snapshot(&self.load()?).ok()
    }

    fn clear(&self) {
        AutosaveSession::clear(self);
    }
}
