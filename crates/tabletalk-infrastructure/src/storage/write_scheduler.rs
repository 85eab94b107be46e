//! Debounced, per-key write coalescing.
//!
//! Rapid saves of the same logical entity collapse into one physical write of
//! the latest content. `flush_all` drains everything and must be awaited
//! before the process exits.

use futures::future::join_all;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tabletalk_core::error::{Result, TabletalkError};
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::atomic_json::write_atomic;

/// Default debounce interval.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// What caused a physical write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTrigger {
    /// The debounce window elapsed
    Timer,
    /// `flush_all` drained the entry
    Flush,
}

/// Outcome of one physical write, delivered on the optional event channel.
///
/// Timer-fired failures are otherwise only logged, so this channel is where a
/// host observes them.
#[derive(Debug, Clone)]
pub struct WriteEvent {
    pub key: String,
    pub path: PathBuf,
    pub trigger: WriteTrigger,
    pub outcome: Result<()>,
}

struct PendingWrite {
    path: PathBuf,
    contents: Vec<u8>,
    generation: u64,
}

#[derive(Default)]
struct SchedulerState {
    pending: HashMap<String, PendingWrite>,
    timers: HashMap<String, JoinHandle<()>>,
    /// One lane per key; holding it means a physical write for that key is in flight
    lanes: HashMap<String, Arc<AsyncMutex<()>>>,
    next_generation: u64,
}

impl SchedulerState {
    fn lane(&mut self, key: &str) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.lanes.entry(key.to_string()).or_default())
    }
}

struct Shared {
    state: Mutex<SchedulerState>,
    events: Option<UnboundedSender<WriteEvent>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the pending entry if it still belongs to the timer that fired.
    fn take_due(&self, key: &str, generation: u64) -> Option<PendingWrite> {
        let mut state = self.lock();
        if state.pending.get(key)?.generation != generation {
            return None;
        }
        state.timers.remove(key);
        state.pending.remove(key)
    }

    /// Performs the write while the caller holds the key's lane.
    async fn write(
        &self,
        key: String,
        pending: PendingWrite,
        trigger: WriteTrigger,
    ) -> Result<()> {
        let outcome = write_atomic(&pending.path, &pending.contents).await;
        match &outcome {
            Ok(()) => tracing::debug!(
                key = %key,
                path = %pending.path.display(),
                bytes = pending.contents.len(),
                ?trigger,
                "Wrote pending state"
            ),
            Err(e) => tracing::warn!(
                key = %key,
                path = %pending.path.display(),
                ?trigger,
                "Write failed: {}",
                e
            ),
        }

        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is listening
            let _ = events.send(WriteEvent {
                key,
                path: pending.path,
                trigger,
                outcome: outcome.clone(),
            });
        }
        outcome
    }
}

/// Coalesces repeated writes per key into one deferred atomic write.
///
/// Callers only see [`schedule_write`](Self::schedule_write) and
/// [`flush_all`](Self::flush_all); the timer and payload maps stay private.
/// Must be used from within a tokio runtime.
///
/// # Example
///
/// ```ignore
/// let scheduler = WriteScheduler::new(Duration::from_millis(500));
/// scheduler.schedule_write("app-state", path.clone(), b"{}".to_vec());
/// scheduler.schedule_write("app-state", path, b"{\"v\":2}".to_vec()); // replaces the first
/// scheduler.flush_all().await?; // before exit
/// ```
#[derive(Clone)]
pub struct WriteScheduler {
    shared: Arc<Shared>,
    delay: Duration,
}

impl WriteScheduler {
    pub fn new(delay: Duration) -> Self {
        Self::build(delay, None)
    }

    /// Creates a scheduler that reports every physical write on `events`.
    pub fn with_events(delay: Duration, events: UnboundedSender<WriteEvent>) -> Self {
        Self::build(delay, Some(events))
    }

    fn build(delay: Duration, events: Option<UnboundedSender<WriteEvent>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SchedulerState::default()),
                events,
            }),
            delay,
        }
    }

    /// Number of keys waiting for their debounce window.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Schedules `contents` to be written to `path` after the debounce window.
    ///
    /// A pending write for the same key is replaced (last write wins) and its
    /// window restarts. Failures of the eventual write are logged and sent on
    /// the event channel, never returned.
    pub fn schedule_write(&self, key: impl Into<String>, path: PathBuf, contents: Vec<u8>) {
        let key = key.into();
        let mut state = self.shared.lock();

        state.next_generation += 1;
        let generation = state.next_generation;

        if let Some(previous) = state.timers.remove(&key) {
            previous.abort();
            tracing::debug!(key = %key, "Coalesced pending write");
        }

        state.pending.insert(
            key.clone(),
            PendingWrite {
                path,
                contents,
                generation,
            },
        );

        let lane = state.lane(&key);
        let shared = Arc::clone(&self.shared);
        let delay = self.delay;
        let task_key = key.clone();

        // Spawned under the state lock, so the handle is registered before the task can run
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _in_flight = lane.lock_owned().await;
            if let Some(pending) = shared.take_due(&task_key, generation) {
                let _ = shared.write(task_key, pending, WriteTrigger::Timer).await;
            }
        });
        state.timers.insert(key, handle);
    }

    /// Drops the pending write for `key` and waits out any write in flight.
    ///
    /// Used before the key's file is deleted, so a late timer cannot
    /// recreate it. Returns `true` if a pending write was discarded.
    pub async fn cancel(&self, key: &str) -> bool {
        let (discarded, lane) = {
            let mut state = self.shared.lock();
            if let Some(timer) = state.timers.remove(key) {
                timer.abort();
            }
            let discarded = state.pending.remove(key).is_some();
            (discarded, state.lanes.get(key).cloned())
        };
        if let Some(lane) = lane {
            let _ = lane.lock().await;
        }
        if discarded {
            tracing::debug!(key = %key, "Cancelled pending write");
        }
        discarded
    }

    /// Writes every pending entry now and waits for in-flight writes.
    ///
    /// Pending state is cleared before any write starts, so no timer can
    /// write the same entry again. Resolves once every write has completed or
    /// failed.
    ///
    /// # Errors
    ///
    /// Returns the write failure, or `TabletalkError::Multiple` when several
    /// keys failed.
    pub async fn flush_all(&self) -> Result<()> {
        let (drained, lanes) = {
            let mut state = self.shared.lock();
            for (_, timer) in state.timers.drain() {
                timer.abort();
            }
            let pending: Vec<(String, PendingWrite)> = state.pending.drain().collect();
            let drained: Vec<_> = pending
                .into_iter()
                .map(|(key, write)| {
                    let lane = state.lane(&key);
                    (key, write, lane)
                })
                .collect();
            let lanes: Vec<_> = state.lanes.values().cloned().collect();
            (drained, lanes)
        };

        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "Flushing pending writes");
        }

        let writes = drained.into_iter().map(|(key, write, lane)| {
            let shared = Arc::clone(&self.shared);
            async move {
                let _in_flight = lane.lock_owned().await;
                shared.write(key, write, WriteTrigger::Flush).await
            }
        });
        let errors: Vec<TabletalkError> = join_all(writes)
            .await
            .into_iter()
            .filter_map(|outcome| outcome.err())
            .collect();

        // Timer writes that already left the pending map finish before we return
        for lane in lanes {
            let _ = lane.lock().await;
        }

        TabletalkError::collect(errors)
    }
}
