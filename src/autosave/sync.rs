//! 서버 동기화 판단.
//!
//! 로컬 자동저장은 자주 일어나지만 서버 푸시는 드물어야 합니다.
//! 시도 시작 후 최소 경과 시간이 지나야 하고, 마지막 동기화 이후 편집이 있어야 합니다.

use crate::models::DraftRecord;

/// 시도 시작 후 첫 서버 푸시까지의 최소 경과 시간 (3분)
pub const DEFAULT_MIN_SYNC_ELAPSED_MS: i64 = 180_000;

pub fn should_sync_server(draft: &DraftRecord, now: i64, minimum_elapsed_ms: i64) -> bool {
    if draft.attempt_id.is_empty() {
        return false;
    }
    if now.saturating_sub(draft.started_at) < minimum_elapsed_ms {
        return false;
    }
    match draft.synced_at {
        Some(synced_at) => draft.updated_at > synced_at,
        None => true,
    }
}
