//! # 클라이언트 측 자동저장
//!
//! - `codec`: 초안 직렬화 형식
//! - `storage`: 로컬 키-값 저장소와 실패를 삼키는 초안 읽기/쓰기
//! - `session` / `registry`: 기능별 버전 관리 자동저장 채널과 그 레지스트리
//! - `sync`: 서버 푸시 여부 판단
//! - `clock`: 주입 가능한 시계

pub mod clock;
pub mod codec;
pub mod registry;
pub mod session;
pub mod storage;
pub mod sync;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{
    create_draft, deserialize_draft, mark_draft_synced, serialize_draft, update_draft_content,
    DraftCodec, STORAGE_VERSION,
};
pub use registry::AutosaveRegistry;
pub use session::{
    autosave_storage_key, AutosaveError, AutosaveSession, AutosaveSnapshot, EnvelopeCodec,
    Listener, SessionOptions, SnapshotCodec, Subscription,
};
pub use storage::{clear_draft, load_draft, save_draft, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use sync::{should_sync_server, DEFAULT_MIN_SYNC_ELAPSED_MS};
