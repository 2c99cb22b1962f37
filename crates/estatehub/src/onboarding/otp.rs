//! One-time email verification codes.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const OTP_TTL_MINUTES: i64 = 5;
pub const MAX_OTP_ATTEMPTS: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpId(pub String);

impl OtpId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub id: OtpId,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub attempts: u8,
    pub created_at: DateTime<Utc>,
}

/// Result of comparing a submitted code against a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Verified,
    Expired,
    Exhausted,
    Mismatch { remaining: u8 },
}

impl OtpRecord {
    /// Fresh unverified record for `email` expiring after [`OTP_TTL_MINUTES`].
    pub fn issue(email: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: OtpId::generate(),
            email: email.to_string(),
            code: generate_code(),
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
            verified: false,
            attempts: 0,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Applies one verification attempt, mutating `attempts`/`verified` in place.
    ///
    /// Expiry is checked before the attempt budget, and the budget before the code, so an
    /// exhausted record never reveals whether the submitted code was right.
    pub fn check(&mut self, submitted: &str, now: DateTime<Utc>) -> OtpCheck {
        if self.is_expired(now) {
            return OtpCheck::Expired;
        }
        if self.attempts >= MAX_OTP_ATTEMPTS {
            return OtpCheck::Exhausted;
        }
        if self.code != submitted.trim() {
            self.attempts = self.attempts.saturating_add(1);
            return OtpCheck::Mismatch {
                remaining: MAX_OTP_ATTEMPTS.saturating_sub(self.attempts),
            };
        }
        self.verified = true;
        OtpCheck::Verified
    }
}

/// Six-digit code in `100000..=999999`.
pub fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999u32).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).single().expect("valid time")
    }

    #[test]
    fn codes_have_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().expect("numeric code");
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn issue_expires_after_ttl() {
        let record = OtpRecord::issue("b@acme.in", now());
        assert_eq!(record.expires_at - record.created_at, Duration::minutes(5));
        assert!(!record.is_expired(now() + Duration::minutes(5)));
        assert!(record.is_expired(now() + Duration::minutes(5) + Duration::seconds(1)));
    }

    #[test]
    fn mismatches_count_down_then_exhaust() {
        let mut record = OtpRecord::issue("b@acme.in", now());
        record.code = "123456".to_string();

        assert_eq!(record.check("000000", now()), OtpCheck::Mismatch { remaining: 2 });
        assert_eq!(record.check("000000", now()), OtpCheck::Mismatch { remaining: 1 });
        assert_eq!(record.check("000000", now()), OtpCheck::Mismatch { remaining: 0 });
        assert_eq!(record.check("123456", now()), OtpCheck::Exhausted);
        assert!(!record.verified);
    }

    #[test]
    fn expiry_wins_over_correct_code() {
        let mut record = OtpRecord::issue("b@acme.in", now());
        let code = record.code.clone();
        assert_eq!(record.check(&code, now() + Duration::minutes(6)), OtpCheck::Expired);

        let mut fresh = OtpRecord::issue("b@acme.in", now());
        let code = fresh.code.clone();
        assert_eq!(fresh.check(&code, now()), OtpCheck::Verified);
        assert!(fresh.verified);
    }
}
