//! Debounced measurement writes.
//!
//! A [`MeasurementField`] wraps one measurement. Every edit restarts a timer;
//! only when the timer runs out without another edit is the current value
//! written. Superseded edits resolve as [`WriteOutcome::Cancelled`].
//!
//! Once the timer has fired the write is in flight and later edits schedule
//! a fresh write instead of cancelling it.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use gma_core::Measurement;

use crate::client::GmaClient;
use crate::error::GmaError;

/// Successful result of a scheduled write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value reached the server.
    Saved,
    /// A newer edit superseded this one before it was written.
    Cancelled,
}

type WriteResult = Result<WriteOutcome, GmaError>;

// ============================================================================
// Pending Write
// ============================================================================

/// Resolves once a scheduled write was saved, failed, or was superseded.
#[derive(Debug)]
#[must_use = "a pending write reports whether the value was saved"]
pub struct PendingWrite {
    rx: oneshot::Receiver<WriteResult>,
}

impl Future for PendingWrite {
    type Output = WriteResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Timer task went away without answering.
            Poll::Ready(Err(_)) => Poll::Ready(Ok(WriteOutcome::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ============================================================================
// Measurement Field
// ============================================================================

#[derive(Debug, Default)]
struct DebounceSlot {
    generation: u64,
    timer: Option<JoinHandle<()>>,
    pending: Option<oneshot::Sender<WriteResult>>,
}

impl DebounceSlot {
    /// Resolves the pending write as cancelled and stops its timer.
    fn cancel(&mut self) -> bool {
        let had_pending = self.pending.is_some();
        if let Some(previous) = self.pending.take() {
            let _ = previous.send(Ok(WriteOutcome::Cancelled));
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
        had_pending
    }
}

#[derive(Debug)]
struct FieldInner {
    client: GmaClient,
    delay: Duration,
    measurement: Mutex<Measurement>,
    slot: Mutex<DebounceSlot>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FieldInner {
    async fn fire(self: Arc<Self>, generation: u64) {
        let sender = {
            let mut slot = lock(&self.slot);
            if slot.generation != generation {
                return;
            }
            // Detach rather than abort: this task is the timer.
            slot.timer = None;
            slot.pending.take()
        };
        let Some(sender) = sender else {
            return;
        };

        let measurement = lock(&self.measurement).clone();
        let result = self
            .client
            .save_measurement(&measurement)
            .await
            .map(|()| WriteOutcome::Saved);
        if let Err(e) = &result {
            warn!(measurement_id = measurement.measurement_id, error = %e, "Autosave failed");
        }
        let _ = sender.send(result);
    }
}

/// A measurement with debounced autosave.
///
/// Clones share the same value and timer.
#[derive(Debug, Clone)]
pub struct MeasurementField {
    inner: Arc<FieldInner>,
}

impl MeasurementField {
    /// Creates a field writing through `client` after `delay` of quiet.
    pub fn new(client: GmaClient, measurement: Measurement, delay: Duration) -> Self {
        Self {
            inner: Arc::new(FieldInner {
                client,
                delay,
                measurement: Mutex::new(measurement),
                slot: Mutex::new(DebounceSlot::default()),
            }),
        }
    }

    /// A copy of the measurement with its current value.
    pub fn measurement(&self) -> Measurement {
        lock(&self.inner.measurement).clone()
    }

    /// The current value.
    pub fn value(&self) -> String {
        lock(&self.inner.measurement).value.clone()
    }

    /// Changes the value without scheduling a write.
    pub fn set_value(&self, value: impl Into<String>) {
        lock(&self.inner.measurement).value = value.into();
    }

    /// The debounce delay.
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Changes the value and schedules a debounced write.
    ///
    /// Must be called within a tokio runtime.
    pub fn update(&self, value: impl Into<String>) -> PendingWrite {
        self.set_value(value);
        self.schedule()
    }

    /// Schedules a debounced write of the current value.
    ///
    /// Any earlier write that has not fired yet resolves as cancelled.
    /// Must be called within a tokio runtime.
    pub fn schedule(&self) -> PendingWrite {
        let (tx, rx) = oneshot::channel();
        let mut slot = lock(&self.inner.slot);
        if slot.cancel() {
            debug!("Superseded pending autosave");
        }
        slot.pending = Some(tx);

        let generation = slot.generation;
        let inner = Arc::clone(&self.inner);
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            inner.fire(generation).await;
        }));

        PendingWrite { rx }
    }

    /// Writes the current value immediately, superseding a pending write.
    ///
    /// # Errors
    ///
    /// Propagates the write's error.
    pub async fn save_now(&self) -> WriteResult {
        lock(&self.inner.slot).cancel();
        let measurement = self.measurement();
        self.inner.client.save_measurement(&measurement).await?;
        Ok(WriteOutcome::Saved)
    }

    /// Cancels the pending write, if any. Returns true if one was pending.
    pub fn cancel(&self) -> bool {
        lock(&self.inner.slot).cancel()
    }

    /// Returns true while a write is scheduled but has not fired.
    pub fn has_pending(&self) -> bool {
        lock(&self.inner.slot).pending.is_some()
    }
}
