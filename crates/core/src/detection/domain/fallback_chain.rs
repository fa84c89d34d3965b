use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use super::face_model::BoxError;

#[derive(Error, Debug)]
pub enum FallbackError {
    #[error("no {0} candidates to try")]
    Empty(&'static str),
    #[error("all {what} candidates failed, last was {label}: {source}")]
    Exhausted {
        what: &'static str,
        label: String,
        #[source]
        source: BoxError,
    },
    #[error("{0} acquisition was cancelled")]
    Cancelled(&'static str),
}

/// Ordered retry: tries candidates in sequence until one succeeds.
///
/// Each failure is logged and the next candidate tried. The first success
/// short-circuits; if every candidate fails, the last error propagates.
/// An optional cancellation flag is checked before each attempt.
pub struct FallbackChain<'a> {
    what: &'static str,
    cancelled: Option<&'a AtomicBool>,
}

impl<'a> FallbackChain<'a> {
    pub fn new(what: &'static str) -> Self {
        Self {
            what,
            cancelled: None,
        }
    }

    pub fn cancel_on(mut self, flag: &'a AtomicBool) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn run<C, T, F>(
        &self,
        candidates: impl IntoIterator<Item = C>,
        mut attempt: F,
    ) -> Result<T, FallbackError>
    where
        C: Display,
        F: FnMut(&C) -> Result<T, BoxError>,
    {
        let mut last: Option<(String, BoxError)> = None;
        for candidate in candidates {
            if self.is_cancelled() {
                return Err(FallbackError::Cancelled(self.what));
            }
            match attempt(&candidate) {
                Ok(value) => {
                    if self.is_cancelled() {
                        return Err(FallbackError::Cancelled(self.what));
                    }
                    log::info!("Acquired {} via {candidate}", self.what);
                    return Ok(value);
                }
                Err(e) => {
                    log::warn!("{} candidate {candidate} failed: {e}", self.what);
                    last = Some((candidate.to_string(), e));
                }
            }
        }
        match last {
            Some((label, source)) => Err(FallbackError::Exhausted {
                what: self.what,
                label,
                source,
            }),
            None => Err(FallbackError::Empty(self.what)),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
