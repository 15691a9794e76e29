use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Codes stay valid for ten minutes; expiry is checked lazily at verification
/// time, there is no timer.
const VALIDITY_SECONDS: i64 = 600;

/// A 6-digit one-time code issued for the WhatsApp verification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpChallenge {
    pub code: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpOutcome {
    Verified,
    Expired,
    Mismatch,
}

impl OtpChallenge {
    pub fn issue(now: DateTime<Utc>) -> Self {
        let code = rand::rng().random_range(100_000..=999_999u32);
        Self {
            code: code.to_string(),
            issued_at: now,
        }
    }

    pub fn verify(&self, submitted: &str, now: DateTime<Utc>) -> OtpOutcome {
        if now - self.issued_at > Duration::seconds(VALIDITY_SECONDS) {
            return OtpOutcome::Expired;
        }
        if self.code != submitted.trim() {
            return OtpOutcome::Mismatch;
        }
        OtpOutcome::Verified
    }
}

/// Build a WhatsApp click-to-chat link. Local numbers starting with `0` are
/// rewritten to the international `92` prefix.
pub fn whatsapp_link(phone: &str, message: &str) -> String {
    let cleaned = phone.replace('+', "");
    let cleaned = cleaned.trim();
    let number = if let Some(rest) = cleaned.strip_prefix('0') {
        format!("92{rest}")
    } else {
        cleaned.to_string()
    };

    format!("https://wa.me/{number}?text={}", encode_component(message))
}

fn encode_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => {
                encoded.push('%');
                encoded.push_str(&format!("{other:02X}"));
            }
        }
    }
    encoded
}
