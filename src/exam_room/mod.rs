//! # 작문 시험실
//!
//! 한 번의 시험 시도(attempt) 동안 초안 편집, 로컬 자동저장, 서버 동기화, 타이머,
//! 탭 이탈 감지, 제출을 묶어서 관리합니다.
//!
//! 흐름:
//! 1. `open` - 로컬에 남은 같은 시도의 초안이 있으면 복원, 없으면 빈 초안으로 시작
//! 2. `edit` - 본문 변경, 단어 수 재계산, dirty 표시
//! 3. `tick` - 주기적으로 호출. 디바운스/주기 자동저장, 동기화 정책에 따른 서버 푸시,
//!    시간이 다 되면 자동 제출 (한 번만)
//! 4. `submit` - 성공하면 로컬 초안 삭제, 실패하면 초안을 남기고 재시도 가능한 에러
//!
//! 로컬 캐시 실패는 절대 편집/제출을 막지 않습니다. 서버 동기화 실패도 로그만 남깁니다.

pub mod api;
pub mod timer;

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use serde_json::json;
use thiserror::Error;

use crate::autosave::{
    create_draft, mark_draft_synced, should_sync_server, update_draft_content, AutosaveRegistry,
    AutosaveSession, Clock, DraftCodec, SessionOptions, DEFAULT_MIN_SYNC_ELAPSED_MS,
};
use crate::models::{
    CreateEventRequest, DraftRecord, SubmissionTasks, SubmitRequest, SubmitResponse,
    TaskSubmission, WritingTask,
};

pub use api::{ApiError, HttpWritingApi, WritingApi};
pub use timer::ExamTimer;

/// 자동 제출이 실패했을 때 보여주는 문구
pub const AUTO_SUBMIT_FAILED: &str =
    "Time elapsed. We attempted to auto-submit but encountered an error. Please try again.";

pub const FOCUS_WARNING: &str =
    "You switched tabs during the test. The timer was paused while you were away.";

const SESSION_SCOPE: &str = "writing";

#[derive(Debug, Clone)]
pub struct ExamRoomConfig {
    pub attempt_id: String,
    pub duration_secs: u32,
    pub task1_prompt_id: Option<String>,
    pub task2_prompt_id: Option<String>,
    /// 마지막 입력 후 이만큼 조용하면 저장
    pub autosave_debounce_ms: i64,
    /// 계속 입력 중이어도 이 주기로는 저장
    pub autosave_interval_ms: i64,
    pub min_sync_elapsed_ms: i64,
}

impl ExamRoomConfig {
    pub fn new(attempt_id: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            duration_secs,
            task1_prompt_id: None,
            task2_prompt_id: None,
            autosave_debounce_ms: 2_000,
            autosave_interval_ms: 10_000,
            min_sync_elapsed_ms: DEFAULT_MIN_SYNC_ELAPSED_MS,
        }
    }

    pub fn with_prompt(mut self, task: WritingTask, prompt_id: impl Into<String>) -> Self {
        let prompt_id = Some(prompt_id.into());
        match task {
            WritingTask::Task1 => self.task1_prompt_id = prompt_id,
            WritingTask::Task2 => self.task2_prompt_id = prompt_id,
        }
        self
    }

    fn prompt_id(&self, task: WritingTask) -> Option<String> {
        match task {
            WritingTask::Task1 => self.task1_prompt_id.clone(),
            WritingTask::Task2 => self.task2_prompt_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomStatus {
    Active,
    Submitted,
    /// 제출 실패. 초안은 남아 있고 다시 제출할 수 있습니다.
    Failed { message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("{message}")]
    Submission { message: String, auto: bool },

    #[error("attempt already submitted")]
    AlreadySubmitted,
}

impl RoomError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RoomError::Submission { .. })
    }
}

/// 최소 단어 수에 못 미칠 때의 안내
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordNudge {
    pub task: WritingTask,
    pub minimum: u32,
    pub current: u32,
}

impl WordNudge {
    pub fn missing(&self) -> u32 {
        self.minimum.saturating_sub(self.current)
    }
}

/// `tick` 한 번의 결과
#[derive(Debug, Default)]
pub struct TickReport {
    pub saved: bool,
    pub synced: bool,
    pub sync_error: Option<String>,
    /// 이번 tick에서 자동 제출을 시도했다면 그 결과
    pub auto_submit: Option<Result<SubmitResponse, RoomError>>,
    pub time_left_secs: i64,
}

type SubmitCallback = Box<dyn FnMut(&SubmitResponse) + Send>;

pub struct ExamRoom<A> {
    config: ExamRoomConfig,
    api: A,
    session: AutosaveSession<DraftRecord, DraftCodec>,
    clock: Arc<dyn Clock>,
    draft: DraftRecord,
    timer: ExamTimer,
    resumed_from: Option<i64>,
    status: RoomStatus,
    dirty: bool,
    last_edit_at: Option<i64>,
    last_saved_at: Option<i64>,
    focus_lost: bool,
    tab_switches: u32,
    auto_submit_attempted: bool,
    on_submit: Option<SubmitCallback>,
}

impl<A: WritingApi> ExamRoom<A> {
    pub fn open(config: ExamRoomConfig, api: A, registry: &AutosaveRegistry) -> Self {
        let clock = registry.clock();
        let now = clock.now_ms();
        let attempt_id = config.attempt_id.clone();

        let session = registry.create_session_with_codec::<DraftRecord, _>(
            SessionOptions::new(SESSION_SCOPE, attempt_id.as_str())
                .legacy_key(format!("writing-draft:{attempt_id}")),
            DraftCodec,
        );

        let restored = session
            .load()
            .map(|snapshot| snapshot.data)
            .filter(|draft| draft.attempt_id == attempt_id);
        let resumed_from = restored.as_ref().map(|draft| draft.updated_at);
        match resumed_from {
            Some(at) => tracing::info!(attempt_id = %attempt_id, updated_at = at, "restored local writing draft"),
            None => tracing::debug!(attempt_id = %attempt_id, "starting blank writing draft"),
        }
        let draft = restored.unwrap_or_else(|| create_draft(attempt_id, now));

        let mut timer = ExamTimer::new(config.duration_secs);
        timer.start(now);

        Self {
            config,
            api,
            session,
            clock,
            draft,
            timer,
            resumed_from,
            status: RoomStatus::Active,
            dirty: false,
            last_edit_at: None,
            last_saved_at: None,
            focus_lost: false,
            tab_switches: 0,
            auto_submit_attempted: false,
            on_submit: None,
        }
    }

    /// 제출 성공 시 호출될 콜백
    pub fn on_submit<F>(&mut self, callback: F)
    where
        F: FnMut(&SubmitResponse) + Send + 'static,
    {
        self.on_submit = Some(Box::new(callback));
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn draft(&self) -> &DraftRecord {
        &self.draft
    }

    pub fn status(&self) -> &RoomStatus {
        &self.status
    }

    pub fn session_key(&self) -> &str {
        self.session.key()
    }

    /// 복원된 초안의 마지막 수정 시각
    pub fn resumed_from(&self) -> Option<i64> {
        self.resumed_from
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_saved_at(&self) -> Option<i64> {
        self.last_saved_at
    }

    pub fn tab_switches(&self) -> u32 {
        self.tab_switches
    }

    pub fn timer(&self) -> &ExamTimer {
        &self.timer
    }

    pub fn time_left_secs(&self) -> i64 {
        self.timer.time_left_secs(self.clock.now_ms())
    }

    pub fn edit(&mut self, task: WritingTask, text: impl Into<String>) -> Result<(), RoomError> {
        if self.status == RoomStatus::Submitted {
            return Err(RoomError::AlreadySubmitted);
        }
        let now = self.clock.now_ms();
        let mut content = self.draft.content.clone();
        content.set_text(task, text);
        self.draft = update_draft_content(&self.draft, content, now);
        self.dirty = true;
        self.last_edit_at = Some(now);
        Ok(())
    }

    pub fn word_count(&self, task: WritingTask) -> u32 {
        self.draft.content.word_count(task)
    }

    pub fn total_word_count(&self) -> u32 {
        WritingTask::ALL.iter().map(|task| self.word_count(*task)).sum()
    }

    pub fn word_nudge(&self, task: WritingTask) -> Option<WordNudge> {
        let current = self.word_count(task);
        let minimum = task.min_words();
        (current < minimum).then_some(WordNudge {
            task,
            minimum,
            current,
        })
    }

    /// 저장되지 않은 편집이 있으면 지금 로컬에 저장합니다.
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.persist_local();
        true
    }

    fn persist_local(&mut self) {
        self.session.save(self.draft.clone());
        self.dirty = false;
        self.last_saved_at = Some(self.clock.now_ms());
    }

    fn autosave_due(&self, now: i64) -> bool {
        if !self.dirty {
            return false;
        }
        let quiet_for = self.last_edit_at.map_or(i64::MAX, |at| now.saturating_sub(at));
        let since_save = now.saturating_sub(self.last_saved_at.unwrap_or(self.draft.started_at));
        quiet_for >= self.config.autosave_debounce_ms || since_save >= self.config.autosave_interval_ms
    }

    pub async fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let mut report = TickReport {
            time_left_secs: self.timer.time_left_secs(now),
            ..TickReport::default()
        };
        if self.status == RoomStatus::Submitted {
            return report;
        }

        if self.autosave_due(now) {
            self.persist_local();
            report.saved = true;
        }

        if should_sync_server(&self.draft, now, self.config.min_sync_elapsed_ms) {
            match self.api.push_draft(&self.draft).await {
                Ok(()) => {
                    self.draft = mark_draft_synced(&self.draft, self.clock.now_ms());
                    self.persist_local();
                    report.synced = true;
                    tracing::debug!(attempt_id = %self.draft.attempt_id, "draft synced to server");
                }
                Err(e) => {
                    tracing::warn!(attempt_id = %self.draft.attempt_id, error = %e, "draft sync failed; will retry");
                    report.sync_error = Some(e.to_string());
                }
            }
        }

        if self.timer.expired(now) && !self.auto_submit_attempted {
            self.auto_submit_attempted = true;
            tracing::info!(attempt_id = %self.draft.attempt_id, "time elapsed; auto-submitting");
            report.auto_submit = Some(self.submit_inner(true).await);
        }

        report
    }

    pub async fn submit(&mut self) -> Result<SubmitResponse, RoomError> {
        self.submit_inner(false).await
    }

    fn build_request(&self) -> SubmitRequest {
        let mut tasks = SubmissionTasks::default();
        for task in WritingTask::ALL {
            let essay = self.draft.content.text(task);
            if essay.trim().is_empty() {
                continue;
            }
            let submission = TaskSubmission {
                essay: essay.to_string(),
                prompt_id: self.config.prompt_id(task),
            };
            match task {
                WritingTask::Task1 => tasks.task1 = Some(submission),
                WritingTask::Task2 => tasks.task2 = Some(submission),
            }
        }
        SubmitRequest {
            attempt_id: self.draft.attempt_id.clone(),
            duration_seconds: Some(i64::from(self.config.duration_secs)),
            tasks,
        }
    }

    async fn submit_inner(&mut self, auto: bool) -> Result<SubmitResponse, RoomError> {
        if self.status == RoomStatus::Submitted {
            return Err(RoomError::AlreadySubmitted);
        }
        self.flush();

        let request = self.build_request();
        match self.api.submit(&request).await {
            Ok(response) => {
                self.status = RoomStatus::Submitted;
                self.dirty = false;
                self.session.clear();
                if let Some(callback) = self.on_submit.as_mut() {
                    callback(&response);
                }
                tracing::info!(attempt_id = %request.attempt_id, auto, "writing attempt submitted");
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(attempt_id = %request.attempt_id, auto, error = %e, "writing submission failed");
                let message = if auto {
                    AUTO_SUBMIT_FAILED.to_string()
                } else {
                    e.to_string()
                };
                self.status = RoomStatus::Failed {
                    message: message.clone(),
                };
                Err(RoomError::Submission { message, auto })
            }
        }
    }

    /// 탭/창을 벗어남. 이미 벗어난 상태면 아무것도 하지 않고 `false`.
    pub async fn focus_lost(&mut self) -> bool {
        if self.focus_lost || self.status == RoomStatus::Submitted {
            return false;
        }
        let now = self.clock.now_ms();
        self.focus_lost = true;
        self.tab_switches += 1;
        self.timer.pause(now);
        self.flush();
        self.record_event(
            "blur",
            json!({ "tabSwitches": self.tab_switches, "occurredAt": iso_timestamp(now) }),
        )
        .await;
        true
    }

    /// 돌아옴. 타이머를 다시 돌리고 경고 문구를 돌려줍니다.
    pub async fn focus_gained(&mut self) -> Option<&'static str> {
        if !self.focus_lost {
            return None;
        }
        let now = self.clock.now_ms();
        self.focus_lost = false;
        self.timer.resume(now);
        self.record_event(
            "focus",
            json!({ "tabSwitches": self.tab_switches, "resumedAt": iso_timestamp(now) }),
        )
        .await;
        Some(FOCUS_WARNING)
    }

    async fn record_event(&self, event_type: &str, payload: serde_json::Value) {
        let event = CreateEventRequest {
            attempt_id: self.draft.attempt_id.clone(),
            event_type: event_type.to_string(),
            payload: Some(payload),
        };
        if let Err(e) = self.api.record_event(&event).await {
            tracing::debug!(event_type, error = %e, "exam event not recorded");
        }
    }

    /// 시도를 포기하고 로컬 초안을 지웁니다.
    pub fn abandon(self) {
        self.session.clear();
        tracing::info!(attempt_id = %self.draft.attempt_id, "writing attempt abandoned");
    }
}

fn iso_timestamp(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::autosave::{serialize_draft, KeyValueStore, ManualClock, MemoryStore};
    use crate::models::{DraftContent, TaskResults};

    #[derive(Default)]
    struct FakeApi {
        fail_submit: AtomicBool,
        fail_events: AtomicBool,
        submits: Mutex<Vec<SubmitRequest>>,
        pushes: Mutex<Vec<DraftRecord>>,
        events: Mutex<Vec<CreateEventRequest>>,
    }

    #[async_trait]
    impl WritingApi for Arc<FakeApi> {
        async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, ApiError> {
            self.submits.lock().unwrap().push(request.clone());
            if self.fail_submit.load(Ordering::SeqCst) {
                return Err(ApiError::Rejected {
                    status: 500,
                    message: "Submission failed".into(),
                });
            }
            Ok(SubmitResponse {
                attempt_id: request.attempt_id.clone(),
                results: TaskResults::default(),
            })
        }

        async fn push_draft(&self, draft: &DraftRecord) -> Result<(), ApiError> {
            self.pushes.lock().unwrap().push(draft.clone());
            Ok(())
        }

        async fn record_event(&self, event: &CreateEventRequest) -> Result<(), ApiError> {
            if self.fail_events.load(Ordering::SeqCst) {
                return Err(ApiError::Rejected {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Harness {
        registry: AutosaveRegistry,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        api: Arc<FakeApi>,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let clock = Arc::new(ManualClock::new(0));
            Self {
                registry: AutosaveRegistry::new(store.clone(), clock.clone()),
                store,
                clock,
                api: Arc::new(FakeApi::default()),
            }
        }

        fn open(&self, duration_secs: u32) -> ExamRoom<Arc<FakeApi>> {
            let config = ExamRoomConfig::new("attempt-1", duration_secs)
                .with_prompt(WritingTask::Task1, "prompt-t1")
                .with_prompt(WritingTask::Task2, "prompt-t2");
            ExamRoom::open(config, self.api.clone(), &self.registry)
        }
    }

    #[tokio::test]
    async fn restores_draft_from_legacy_key() {
        let h = Harness::new();
        let previous = DraftRecord {
            attempt_id: "attempt-1".into(),
            started_at: 0,
            updated_at: 4_000,
            synced_at: None,
            content: DraftContent::new("kept text", ""),
        };
        h.store
            .set_item("writing-draft:attempt-1", &serialize_draft(&previous))
            .unwrap();

        h.clock.set(10_000);
        let room = h.open(3600);

        assert_eq!(room.draft(), &previous);
        assert_eq!(room.resumed_from(), Some(4_000));
        assert!(h.store.raw("autosave:writing:attempt-1").is_some());
        assert_eq!(h.store.raw("writing-draft:attempt-1"), None);
    }

    #[tokio::test]
    async fn draft_of_another_attempt_is_not_restored() {
        let h = Harness::new();
        let other = create_draft("attempt-2", 0);
        h.store
            .set_item("autosave:writing:attempt-1", &serialize_draft(&other))
            .unwrap();

        let room = h.open(3600);
        assert_eq!(room.draft().attempt_id, "attempt-1");
        assert_eq!(room.resumed_from(), None);
    }

    #[tokio::test]
    async fn autosave_waits_for_debounce_or_interval() {
        let h = Harness::new();
        let mut room = h.open(3600);

        h.clock.set(1_000);
        room.edit(WritingTask::Task1, "The graph shows").unwrap();
        h.clock.set(2_000);
        assert!(!room.tick().await.saved);
        h.clock.set(3_000);
        assert!(room.tick().await.saved);
        assert!(!room.is_dirty());

        // 쉬지 않고 입력해도 주기마다 저장됩니다.
        for t in (4_000..=13_000).step_by(1_000) {
            h.clock.set(t);
            room.edit(WritingTask::Task1, format!("words at {t}")).unwrap();
            let report = room.tick().await;
            assert_eq!(report.saved, t == 13_000, "t={t}");
        }
    }

    #[tokio::test]
    async fn pushes_draft_once_minimum_elapsed_and_only_after_new_edits() {
        let h = Harness::new();
        let mut room = h.open(3600);

        h.clock.set(5_000);
        room.edit(WritingTask::Task2, "Some people believe").unwrap();
        h.clock.set(179_999);
        assert!(!room.tick().await.synced);

        h.clock.set(181_000);
        let report = room.tick().await;
        assert!(report.synced);
        assert_eq!(room.draft().synced_at, Some(181_000));

        h.clock.set(182_000);
        assert!(!room.tick().await.synced);
        assert_eq!(h.api.pushes.lock().unwrap().len(), 1);

        h.clock.set(190_000);
        room.edit(WritingTask::Task2, "Some people believe that").unwrap();
        assert!(room.tick().await.synced);
        assert_eq!(h.api.pushes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn successful_submit_sends_only_written_tasks_and_clears_local_draft() {
        let h = Harness::new();
        let mut room = h.open(3600);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        room.on_submit(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        room.edit(WritingTask::Task1, "The chart compares").unwrap();
        room.edit(WritingTask::Task2, "   ").unwrap();
        room.submit().await.unwrap();

        let request = h.api.submits.lock().unwrap()[0].clone();
        assert_eq!(request.duration_seconds, Some(3600));
        assert_eq!(request.tasks.task1.unwrap().prompt_id.as_deref(), Some("prompt-t1"));
        assert!(request.tasks.task2.is_none());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(room.status(), &RoomStatus::Submitted);
        assert_eq!(h.store.raw("autosave:writing:attempt-1"), None);
        assert_eq!(room.submit().await, Err(RoomError::AlreadySubmitted));
        assert_eq!(room.edit(WritingTask::Task1, "late"), Err(RoomError::AlreadySubmitted));
    }

    #[tokio::test]
    async fn failed_auto_submit_keeps_draft_and_allows_manual_retry() {
        let h = Harness::new();
        h.api.fail_submit.store(true, Ordering::SeqCst);
        let mut room = h.open(60);
        room.edit(WritingTask::Task1, "Unfinished essay").unwrap();

        h.clock.set(60_000);
        let report = room.tick().await;
        let err = report.auto_submit.unwrap().unwrap_err();
        assert_eq!(err.to_string(), AUTO_SUBMIT_FAILED);
        assert!(err.is_retryable());
        assert!(h.store.raw("autosave:writing:attempt-1").is_some());

        h.clock.set(61_000);
        assert!(room.tick().await.auto_submit.is_none());

        h.api.fail_submit.store(false, Ordering::SeqCst);
        room.submit().await.unwrap();
        assert_eq!(h.api.submits.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn leaving_the_tab_pauses_timer_and_records_events() {
        let h = Harness::new();
        let mut room = h.open(600);
        room.edit(WritingTask::Task1, "draft before leaving").unwrap();

        h.clock.set(10_000);
        assert!(room.focus_lost().await);
        assert!(!room.focus_lost().await);
        assert!(!room.is_dirty());

        h.clock.set(70_000);
        assert_eq!(room.focus_gained().await, Some(FOCUS_WARNING));
        assert_eq!(room.focus_gained().await, None);
        assert_eq!(room.time_left_secs(), 590);
        assert_eq!(room.tab_switches(), 1);

        let events = h.api.events.lock().unwrap();
        let kinds: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["blur", "focus"]);
        assert_eq!(events[0].payload.as_ref().unwrap()["tabSwitches"], json!(1));
    }

    #[tokio::test]
    async fn event_failures_do_not_interrupt_the_exam() {
        let h = Harness::new();
        h.api.fail_events.store(true, Ordering::SeqCst);
        let mut room = h.open(600);

        assert!(room.focus_lost().await);
        assert!(room.focus_gained().await.is_some());
        assert_eq!(room.tab_switches(), 1);
    }

    #[tokio::test]
    async fn word_nudge_uses_task_minimums() {
        let h = Harness::new();
        let mut room = h.open(3600);
        room.edit(WritingTask::Task1, "one two three").unwrap();

        let nudge = room.word_nudge(WritingTask::Task1).unwrap();
        assert_eq!((nudge.minimum, nudge.current, nudge.missing()), (150, 3, 147));
        assert_eq!(room.word_nudge(WritingTask::Task2).unwrap().minimum, 250);
        assert_eq!(room.total_word_count(), 3);
    }

    #[tokio::test]
    async fn abandon_clears_local_draft() {
        let h = Harness::new();
        let mut room = h.open(3600);
        room.edit(WritingTask::Task1, "text").unwrap();
        room.flush();
        assert!(h.store.raw("autosave:writing:attempt-1").is_some());

        room.abandon();
        assert_eq!(h.store.raw("autosave:writing:attempt-1"), None);
    }
}
