//! 일시정지 가능한 시험 카운트다운.
//!
//! 벽시계가 아니라 "실제로 흐른 시험 시간"을 셉니다. 탭을 떠나 있는 동안(`pause`)은
//! 시간이 흐르지 않습니다. 모든 시각은 epoch 밀리초로 외부에서 주입됩니다.

#[derive(Debug, Clone)]
pub struct ExamTimer {
    duration_ms: i64,
    /// 마지막 일시정지까지 누적된 경과 시간
    banked_ms: i64,
    running_since: Option<i64>,
    started: bool,
}

impl ExamTimer {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_ms: i64::from(duration_secs) * 1000,
            banked_ms: 0,
            running_since: None,
            started: false,
        }
    }

    pub fn duration_secs(&self) -> u32 {
        u32::try_from(self.duration_ms / 1000).unwrap_or(u32::MAX)
    }

    /// 처음 한 번만 효과가 있습니다.
    pub fn start(&mut self, now: i64) {
        if !self.started {
            self.started = true;
            self.running_since = Some(now);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// 실행 중이었으면 멈추고 `true`
    pub fn pause(&mut self, now: i64) -> bool {
        match self.running_since.take() {
            Some(since) => {
                self.banked_ms += (now - since).max(0);
                true
            }
            None => false,
        }
    }

    /// 시작된 뒤 멈춰 있었으면 다시 돌리고 `true`
    pub fn resume(&mut self, now: i64) -> bool {
        if !self.started || self.running_since.is_some() {
            return false;
        }
        self.running_since = Some(now);
        true
    }

    pub fn elapsed_ms(&self, now: i64) -> i64 {
        let running = self.running_since.map_or(0, |since| (now - since).max(0));
        (self.banked_ms + running).min(self.duration_ms)
    }

    pub fn elapsed_secs(&self, now: i64) -> i64 {
        self.elapsed_ms(now) / 1000
    }

    /// 남은 시간(초). 1초 미만이 남아 있으면 올림해서 1입니다.
    pub fn time_left_secs(&self, now: i64) -> i64 {
        let left_ms = self.duration_ms - self.elapsed_ms(now);
        (left_ms + 999) / 1000
    }

    pub fn expired(&self, now: i64) -> bool {
        self.started && self.elapsed_ms(now) >= self.duration_ms
    }
}
