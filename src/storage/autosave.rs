//! Save scheduling.
//!
//! [`AutoSave`] turns a stream of "model changed" notifications into save
//! requests: at most one per quiet window, never for content identical to
//! the last successful save. Callers drive it with explicit instants and
//! perform the actual writes themselves, reporting back through
//! [`AutoSave::complete`].

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::domain::{Config, Model};

/// How long a `Saved` status is shown before returning to `Idle`.
const SAVED_LINGER: Duration = Duration::from_secs(2);
/// How long an `Error` status is shown before returning to `Idle`.
const ERROR_LINGER: Duration = Duration::from_secs(3);

/// The state of the most recent save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing in progress.
    Idle,
    /// A save has been requested and not yet completed.
    Saving,
    /// The last save succeeded.
    Saved,
    /// The last save failed.
    Error(String),
}

/// A request to durably write a model.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// Identifies this request when reporting completion.
    pub generation: u64,
    /// The model to write.
    pub model: Model,
    /// Content fingerprint of `model`.
    pub fingerprint: String,
}

#[derive(Debug)]
struct Pending {
    changed_at: Instant,
    model: Model,
}

/// A debouncing save scheduler with periodic snapshots.
#[derive(Debug)]
pub struct AutoSave {
    debounce: Duration,
    snapshot_interval: Duration,
    pending: Option<Pending>,
    generation: u64,
    in_flight: Option<(u64, String)>,
    last_saved: Option<String>,
    status: SaveStatus,
    status_since: Instant,
    last_snapshot: Instant,
}

impl AutoSave {
    /// Creates a scheduler using the configured timings, starting at `now`.
    #[must_use]
    pub const fn new(config: &Config, now: Instant) -> Self {
        Self::with_timing(config.autosave_debounce(), config.snapshot_interval(), now)
    }

    /// Creates a scheduler with explicit timings, starting at `now`.
    #[must_use]
    pub const fn with_timing(debounce: Duration, snapshot_interval: Duration, now: Instant) -> Self {
        Self {
            debounce,
            snapshot_interval,
            pending: None,
            generation: 0,
            in_flight: None,
            last_saved: None,
            status: SaveStatus::Idle,
            status_since: now,
            last_snapshot: now,
        }
    }

    /// The current save status.
    #[must_use]
    pub const fn status(&self) -> &SaveStatus {
        &self.status
    }

    /// Whether a change is waiting for its quiet window to elapse.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Records that the model changed at `at`, superseding any pending
    /// change.
    pub fn notify(&mut self, model: &Model, at: Instant) {
        self.pending = Some(Pending {
            changed_at: at,
            model: model.clone(),
        });
    }

    /// Forgets the last saved content, so the next change is saved even if
    /// identical. Used when switching to a different model.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_saved = None;
    }

    /// Advances the clock to `now`, returning a save request if the quiet
    /// window after the latest change has elapsed.
    ///
    /// Content identical to the last successful save is dropped without a
    /// request.
    pub fn poll(&mut self, now: Instant) -> Option<SaveRequest> {
        self.settle(now);

        let ready = self
            .pending
            .as_ref()
            .is_some_and(|pending| now.saturating_duration_since(pending.changed_at) >= self.debounce);
        if !ready {
            return None;
        }
        let pending = self.pending.take()?;

        let fingerprint = fingerprint(&pending.model);
        if self.last_saved.as_deref() == Some(fingerprint.as_str()) {
            tracing::debug!("content unchanged since last save, skipping");
            return None;
        }

        self.generation += 1;
        self.in_flight = Some((self.generation, fingerprint.clone()));
        self.set_status(SaveStatus::Saving, now);
        tracing::debug!(generation = self.generation, "requesting save");

        Some(SaveRequest {
            generation: self.generation,
            model: pending.model,
            fingerprint,
        })
    }

    /// Reports the outcome of the save with `generation`.
    ///
    /// Completions of superseded requests are ignored; returns whether the
    /// outcome was applied.
    pub fn complete(&mut self, generation: u64, outcome: Result<(), String>, now: Instant) -> bool {
        let Some((_, fingerprint)) = self.in_flight.take_if(|(g, _)| *g == generation) else {
            tracing::debug!(generation, "ignoring stale save completion");
            return false;
        };

        match outcome {
            Ok(()) => {
                self.last_saved = Some(fingerprint);
                self.set_status(SaveStatus::Saved, now);
            }
            Err(message) => {
                tracing::warn!(%message, "save failed");
                self.set_status(SaveStatus::Error(message), now);
            }
        }
        true
    }

    /// Whether a periodic snapshot of `model` should be taken at `now`.
    ///
    /// Snapshots are due once per interval, and only for models with at
    /// least one element that is not a shadow.
    #[must_use]
    pub fn snapshot_due(&self, model: &Model, now: Instant) -> bool {
        model.has_content()
            && now.saturating_duration_since(self.last_snapshot) >= self.snapshot_interval
    }

    /// Records that a snapshot was taken at `now`.
    pub const fn record_snapshot(&mut self, now: Instant) {
        self.last_snapshot = now;
    }

    fn set_status(&mut self, status: SaveStatus, now: Instant) {
        self.status = status;
        self.status_since = now;
    }

    /// Returns a lingering `Saved` or `Error` status to `Idle`.
    fn settle(&mut self, now: Instant) {
        let linger = match self.status {
            SaveStatus::Saved => SAVED_LINGER,
            SaveStatus::Error(_) => ERROR_LINGER,
            SaveStatus::Idle | SaveStatus::Saving => return,
        };
        if now.saturating_duration_since(self.status_since) >= linger {
            self.set_status(SaveStatus::Idle, now);
        }
    }
}

/// The SHA-256 fingerprint of a model's JSON serialization, as lowercase
/// hex.
///
/// # Panics
///
/// Panics if the model cannot be serialized to JSON, which cannot happen
/// for a [`Model`].
#[must_use]
pub fn fingerprint(model: &Model) -> String {
    let encoded = serde_json::to_vec(model).expect("this should never fail");
    let hash = Sha256::digest(encoded);
    format!("{hash:x}")
}
