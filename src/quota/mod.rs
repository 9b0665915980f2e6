//! Per-identity daily usage quotas
//!
//! Counters live only in process memory: a restart clears them, and
//! multiple gateway instances do not share admission state. Day rollover is
//! lazy: the stored date is compared with the current UTC date on every
//! admission check, never by a background timer.

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// Usage counters for one identity on one UTC day
#[derive(Debug, Clone, Serialize)]
pub struct UsageRecord {
    /// UTC calendar day the counters belong to
    pub date: NaiveDate,
    /// Admitted and recorded requests today
    pub requests: u32,
    /// Input tokens consumed today
    pub input_tokens: u64,
    /// Output tokens produced today
    pub output_tokens: u64,
}

impl UsageRecord {
    fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            requests: 0,
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    fn roll_over(&mut self, today: NaiveDate) {
        if self.date != today {
            *self = Self::fresh(today);
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone)]
pub enum Admission {
    /// The turn may proceed upstream
    Allowed,
    /// The daily limit is reached; the caller must answer with `message`
    /// and not forward the turn upstream
    Denied { message: String },
}

impl Admission {
    /// Whether the turn was admitted
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Tracks per-identity request and token counters against a daily limit
///
/// Each read-modify-write happens under the identity's map entry guard, so
/// concurrent requests for the same identity serialize; distinct identities
/// live on independent shards and never block one another.
pub struct QuotaLedger {
    records: DashMap<String, UsageRecord>,
    daily_limit: u32,
    denied_message: String,
}

impl QuotaLedger {
    /// Create a ledger with a daily request limit per identity
    pub fn new(daily_limit: u32) -> Self {
        Self {
            records: DashMap::new(),
            daily_limit,
            denied_message: "Aww, I'm all chatted out for today! I've hit my daily limit, \
                             so let's pick this up after midnight UTC when I get my energy back."
                .to_string(),
        }
    }

    /// Configured daily limit
    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Admission check for the current UTC day
    pub fn admit(&self, identity: &str) -> Admission {
        self.admit_on(identity, Utc::now().date_naive())
    }

    /// Admission check against an explicit date
    pub(crate) fn admit_on(&self, identity: &str, today: NaiveDate) -> Admission {
        let mut record = self
            .records
            .entry(identity.to_string())
            .or_insert_with(|| UsageRecord::fresh(today));
        record.roll_over(today);

        if record.requests >= self.daily_limit {
            tracing::info!("Quota denied for '{}' ({} requests today)", identity, record.requests);
            Admission::Denied {
                message: self.denied_message.clone(),
            }
        } else {
            Admission::Allowed
        }
    }

    /// Record one answered turn
    ///
    /// Called exactly once per admitted, successfully answered turn. Denied
    /// turns and failed upstream calls are never recorded.
    pub fn record(&self, identity: &str, input_tokens: u64, output_tokens: u64) {
        self.record_on(identity, Utc::now().date_naive(), input_tokens, output_tokens);
    }

    /// Record against an explicit date
    pub(crate) fn record_on(
        &self,
        identity: &str,
        today: NaiveDate,
        input_tokens: u64,
        output_tokens: u64,
    ) {
        let mut record = self
            .records
            .entry(identity.to_string())
            .or_insert_with(|| UsageRecord::fresh(today));
        record.roll_over(today);
        record.requests += 1;
        record.input_tokens += input_tokens;
        record.output_tokens += output_tokens;
    }

    /// Snapshot of an identity's counters, if any exist
    pub fn usage(&self, identity: &str) -> Option<UsageRecord> {
        self.records.get(identity).map(|r| r.clone())
    }
}
