//! In-process OTP store for mobile-number verification.
//!
//! Entries are keyed by `country_code + mobile_number` and expire after five
//! minutes. Verification is capped at three attempts per entry; the
//! read-increment-write of the attempt counter happens under the map lock so
//! concurrent verification attempts cannot lose updates. A sweeper task owned
//! by an explicit handle purges expired entries every ten minutes.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long an issued code stays valid.
pub const OTP_TTL_MINUTES: i64 = 5;
/// Verification attempts allowed before the entry is discarded.
pub const MAX_OTP_ATTEMPTS: u32 = 3;
/// Default sweeper cadence.
pub const SWEEP_INTERVAL_SECS: u64 = 600;

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: DateTime<Utc>,
    attempts: u32,
}

/// Outcome of a verification attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum OtpVerification {
    Verified,
    NotFound,
    Expired,
    TooManyAttempts,
    Mismatch { attempts_remaining: u32 },
}

/// Process-wide OTP store. Cloning is cheap; all clones share one map.
#[derive(Clone, Default)]
pub struct OtpStore {
    entries: Arc<Mutex<HashMap<String, OtpEntry>>>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(country_code: &str, mobile_number: &str) -> String {
        format!("{country_code}{mobile_number}")
    }

    /// Issues a fresh four-digit code, replacing any previous entry for the
    /// same number.
    pub fn issue(&self, country_code: &str, mobile_number: &str) -> String {
        let code = rand::thread_rng().gen_range(1000..10000).to_string();
        let entry = OtpEntry {
            code: code.clone(),
            expires_at: Utc::now() + ChronoDuration::minutes(OTP_TTL_MINUTES),
            attempts: 0,
        };
        let mut entries = self.entries.lock().expect("otp store lock poisoned");
        entries.insert(Self::key(country_code, mobile_number), entry);
        code
    }

    /// Verifies a code. Successful and terminal failures (expiry, attempt
    /// exhaustion) consume the entry; a plain mismatch leaves it in place
    /// with its attempt counter bumped.
    pub fn verify(&self, country_code: &str, mobile_number: &str, code: &str) -> OtpVerification {
        let key = Self::key(country_code, mobile_number);
        let mut entries = self.entries.lock().expect("otp store lock poisoned");

        let Some(entry) = entries.get_mut(&key) else {
            return OtpVerification::NotFound;
        };

        if Utc::now() > entry.expires_at {
            entries.remove(&key);
            return OtpVerification::Expired;
        }

        if entry.attempts >= MAX_OTP_ATTEMPTS {
            entries.remove(&key);
            return OtpVerification::TooManyAttempts;
        }

        entry.attempts += 1;

        if entry.code == code {
            entries.remove(&key);
            OtpVerification::Verified
        } else {
            let remaining = MAX_OTP_ATTEMPTS - entry.attempts;
            OtpVerification::Mismatch {
                attempts_remaining: remaining,
            }
        }
    }

    /// Drops the entry for a number, if any.
    pub fn remove(&self, country_code: &str, mobile_number: &str) {
        let mut entries = self.entries.lock().expect("otp store lock poisoned");
        entries.remove(&Self::key(country_code, mobile_number));
    }

    /// Returns the live code for a number, if present and unexpired.
    /// Exposed so non-production environments can echo the code back.
    pub fn peek(&self, country_code: &str, mobile_number: &str) -> Option<String> {
        let entries = self.entries.lock().expect("otp store lock poisoned");
        entries
            .get(&Self::key(country_code, mobile_number))
            .filter(|e| Utc::now() <= e.expires_at)
            .map(|e| e.code.clone())
    }

    /// Removes every expired entry.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        let mut entries = self.entries.lock().expect("otp store lock poisoned");
        entries.retain(|_, e| e.expires_at >= now);
    }

    /// Spawns the periodic purge task. The returned handle owns the task;
    /// dropping or stopping it ends the sweep.
    pub fn spawn_sweeper(&self, interval: Duration) -> OtpSweeper {
        let store = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                store.purge_expired();
                tracing::debug!("otp sweeper pass complete");
            }
        });
        OtpSweeper { handle }
    }
}

/// Handle owning the background sweep task.
pub struct OtpSweeper {
    handle: JoinHandle<()>,
}

impl OtpSweeper {
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for OtpSweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
