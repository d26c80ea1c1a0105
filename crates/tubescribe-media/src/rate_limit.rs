//! In-process usage accounting for the hosted transcription API.
//!
//! Four fixed windows: requests per minute and per day, audio seconds per
//! hour and per day. A window resets lazily the first time it is checked
//! after its deadline. A request is recorded only if every window admits it.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tubescribe_settings::UsageLimitSettings;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(86_400);

/// Which quota rejected a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitKind {
    /// Requests in the current minute.
    RequestsPerMinute,
    /// Requests in the current day.
    RequestsPerDay,
    /// Audio seconds in the current hour.
    AudioSecondsPerHour,
    /// Audio seconds in the current day.
    AudioSecondsPerDay,
}

impl LimitKind {
    /// Snake-case name, used as a metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestsPerMinute => "requests_per_minute",
            Self::RequestsPerDay => "requests_per_day",
            Self::AudioSecondsPerHour => "audio_seconds_per_hour",
            Self::AudioSecondsPerDay => "audio_seconds_per_day",
        }
    }
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} limit reached", self.as_str().replace('_', " "))
    }
}

#[derive(Debug)]
struct Window {
    used: f64,
    resets_at: Instant,
    length: Duration,
}

impl Window {
    fn new(now: Instant, length: Duration) -> Self {
        Self {
            used: 0.0,
            resets_at: now + length,
            length,
        }
    }

    fn roll(&mut self, now: Instant) {
        if now > self.resets_at {
            self.used = 0.0;
            self.resets_at = now + self.length;
        }
    }
}

#[derive(Debug)]
struct Windows {
    minute_requests: Window,
    day_requests: Window,
    hour_audio: Window,
    day_audio: Window,
}

/// Thread-safe quota tracker shared by all requests to one engine.
#[derive(Debug)]
pub struct UsageLimiter {
    limits: UsageLimitSettings,
    windows: Mutex<Windows>,
}

impl UsageLimiter {
    /// Fresh windows starting now.
    pub fn new(limits: UsageLimitSettings) -> Self {
        let now = Instant::now();
        Self {
            limits,
            windows: Mutex::new(Windows {
                minute_requests: Window::new(now, MINUTE),
                day_requests: Window::new(now, DAY),
                hour_audio: Window::new(now, HOUR),
                day_audio: Window::new(now, DAY),
            }),
        }
    }

    /// Admit one request carrying `audio_seconds` of audio, or say which
    /// limit it would exceed.
    pub fn check_and_record(&self, audio_seconds: f64) -> Result<(), LimitKind> {
        self.check_and_record_at(Instant::now(), audio_seconds)
    }

    pub(crate) fn check_and_record_at(
        &self,
        now: Instant,
        audio_seconds: f64,
    ) -> Result<(), LimitKind> {
        let mut w = self.windows.lock();
        w.minute_requests.roll(now);
        w.day_requests.roll(now);
        w.hour_audio.roll(now);
        w.day_audio.roll(now);

        if w.minute_requests.used >= f64::from(self.limits.requests_per_minute) {
            return Err(LimitKind::RequestsPerMinute);
        }
        if w.day_requests.used >= f64::from(self.limits.requests_per_day) {
            return Err(LimitKind::RequestsPerDay);
        }
        if w.hour_audio.used + audio_seconds > self.limits.audio_seconds_per_hour as f64 {
            return Err(LimitKind::AudioSecondsPerHour);
        }
        if w.day_audio.used + audio_seconds > self.limits.audio_seconds_per_day as f64 {
            return Err(LimitKind::AudioSecondsPerDay);
        }

        w.minute_requests.used += 1.0;
        w.day_requests.used += 1.0;
        w.hour_audio.used += audio_seconds;
        w.day_audio.used += audio_seconds;
        Ok(())
    }
}
