//! Request log: one record per fetch attempt.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::request::Method;

/// Outcome of one fetch attempt as seen by the request log.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    /// Credential-free URL.
    pub url: String,
    pub method: Method,
    /// Status of the HTTP response, if one was received.
    pub status_code: Option<u16>,
    /// Body size of a successful response.
    pub body_len: Option<usize>,
    /// From just before dispatch to just after the outcome was known.
    pub duration: Duration,
    /// Full error detail (URL and reason) when the fetch failed.
    pub error: Option<String>,
}

impl fmt::Display for RequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)?;
        match self.status_code {
            Some(code) => write!(f, " {code}")?,
            None => f.write_str(" -")?,
        }
        match self.body_len {
            Some(len) => write!(f, " {len}")?,
            None => f.write_str(" -")?,
        }
        write!(f, " {}ms", self.duration.as_millis())?;
        if let Some(error) = &self.error {
            write!(f, " ({error})")?;
        }
        Ok(())
    }
}

/// Sink notified once per fetch attempt, success or failure.
pub trait RequestLog: Send + Sync {
    fn record(&self, record: &RequestRecord);
}

impl<L: RequestLog + ?Sized> RequestLog for Arc<L> {
    fn record(&self, record: &RequestRecord) {
        (**self).record(record)
    }
}

/// Writes each record as an `info` event on target `tilefetch::request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRequestLog;

impl RequestLog for TracingRequestLog {
    fn record(&self, record: &RequestRecord) {
        tracing::info!(target: "tilefetch::request", "{}", record);
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryRequestLog {
    records: Mutex<Vec<RequestRecord>>,
}

impl MemoryRequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RequestRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RequestLog for MemoryRequestLog {
    fn record(&self, record: &RequestRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

/// Hands `record` to `log`. A panicking sink is logged and otherwise ignored.
pub(crate) fn notify<L: RequestLog + ?Sized>(log: &L, record: &RequestRecord) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| log.record(record)));
    if result.is_err() {
        tracing::warn!(url = %record.url, "request log panicked; record dropped");
    }
}
