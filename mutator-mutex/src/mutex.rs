//! Mutual exclusion with priority-based preemption.
//!
//! [`MutatorMutex`] serializes mutations of a shared piece of state while
//! letting a new mutation take over from a running one instead of queueing
//! behind it. Arbitration happens on a single atomically swapped slot holding
//! the active mutator; actual bodies are serialized by an inner async mutex.

use std::{fmt, future::Future, sync::Arc};

use arc_swap::ArcSwapOption;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::MutatePriority;

/// The mutation was cancelled in favor of a competing mutation.
///
/// Covers both outcomes of losing the priority race: being preempted while
/// running and being rejected before starting. Callers that want to retry
/// must do so themselves; the mutex never re-runs work on its own.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("mutation cancelled by a competing mutation")]
pub struct MutationCancelled;

/// One in-flight request to mutate shared state.
struct Mutator {
    priority: MutatePriority,
    cancel: CancellationToken,
}

impl Mutator {
    fn new(priority: MutatePriority) -> Self {
        Self {
            priority,
            cancel: CancellationToken::new(),
        }
    }

    /// Equal priority interrupts: the newest request wins a tie.
    fn can_interrupt(&self, other: &Mutator) -> bool {
        self.priority >= other.priority
    }

    fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Clears the mutator slot on every exit path, but only while the slot still
/// holds this call's mutator. A successor that already claimed the slot must
/// not be evicted by a stale cleanup.
struct SlotReset<'a> {
    slot: &'a ArcSwapOption<Mutator>,
    mutator: &'a Arc<Mutator>,
}

impl Drop for SlotReset<'_> {
    fn drop(&mut self) {
        let current = self.slot.load();
        if current
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, self.mutator))
        {
            self.slot.compare_and_swap(&current, None);
            trace!("mutator slot cleared");
        }
    }
}

fn same_occupant(a: &Option<Arc<Mutator>>, b: &Option<Arc<Mutator>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Mutual exclusion for concurrent mutation of shared state, with
/// priority-based preemption instead of queueing.
///
/// At most one mutation body runs at a time. When a new mutation arrives
/// while another is active, their [`MutatePriority`] values decide the
/// conflict: the newcomer wins ties and strictly higher priorities (the
/// incumbent's work is cancelled at its next suspension point), while a
/// strictly higher-priority incumbent rejects the newcomer synchronously,
/// before any of its work runs. Both losing outcomes surface as
/// [`MutationCancelled`].
///
/// The mutex owns no scheduler and imposes no timeouts; cancellation is
/// cooperative through future drop, and a caller that wants a deadline must
/// cancel its own work from outside.
pub struct MutatorMutex {
    current: ArcSwapOption<Mutator>,
    lock: tokio::sync::Mutex<()>,
}

impl Default for MutatorMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MutatorMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current.load();
        f.debug_struct("MutatorMutex")
            .field("active", &current.as_ref().map(|mutator| mutator.priority))
            .finish()
    }
}

impl MutatorMutex {
    /// Creates an unoccupied mutex.
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Runs `work` exclusively, arbitrating against any active mutation by
    /// `priority`.
    ///
    /// If an active mutation holds a strictly higher priority, this call
    /// returns `Err(MutationCancelled)` immediately and `work` is never
    /// polled. Otherwise any active mutation is cancelled, and `work` runs
    /// once the previous body has wound down. A mutation that is itself
    /// preempted later resolves to `Err(MutationCancelled)`, dropping `work`
    /// at its next suspension point; `work`'s own output, including any
    /// caller-level `Result`, passes through untouched in the `Ok` arm.
    pub async fn mutate<R>(
        &self,
        priority: MutatePriority,
        work: impl Future<Output = R>,
    ) -> Result<R, MutationCancelled> {
        let mutator = Arc::new(Mutator::new(priority));
        self.claim_or_cancel(&mutator)?;
        let _slot = SlotReset {
            slot: &self.current,
            mutator: &mutator,
        };
        tokio::select! {
            result = async {
                let _exclusion = self.lock.lock().await;
                work.await
            } => Ok(result),
            _ = mutator.cancel.cancelled() => Err(MutationCancelled),
        }
    }

    /// Like [`mutate`](Self::mutate), with `receiver` bound as the argument
    /// of the work closure. A convenience for mutations that operate on one
    /// exclusive borrow; the concurrency semantics are identical.
    pub async fn mutate_with<T, R, F>(
        &self,
        receiver: &mut T,
        priority: MutatePriority,
        work: F,
    ) -> Result<R, MutationCancelled>
    where
        T: ?Sized,
        F: for<'a> FnOnce(&'a mut T) -> BoxFuture<'a, R>,
    {
        self.mutate(priority, work(receiver)).await
    }

    /// Runs a synchronous block only if no mutation body is currently
    /// executing, without installing a mutator or cancelling anyone.
    ///
    /// Returns `None` when a mutation is in progress. Useful for opportunistic
    /// adjustments that should simply be skipped while a mutation owns the
    /// state.
    pub fn try_mutate<R>(&self, work: impl FnOnce() -> R) -> Option<R> {
        let _exclusion = self.lock.try_lock().ok()?;
        Some(work())
    }

    /// Installs `mutator` as the active mutator, cancelling the displaced
    /// occupant, or fails if the occupant outranks it.
    ///
    /// The slot is only ever updated by compare-and-swap; losing an install
    /// race re-reads the slot and re-arbitrates from scratch.
    fn claim_or_cancel(&self, mutator: &Arc<Mutator>) -> Result<(), MutationCancelled> {
        loop {
            let current = self.current.load();
            if let Some(active) = current.as_ref() {
                if !mutator.can_interrupt(active) {
                    trace!(
                        incoming = ?mutator.priority,
                        active = ?active.priority,
                        "mutation rejected by higher-priority occupant"
                    );
                    return Err(MutationCancelled);
                }
            }
            let previous = self
                .current
                .compare_and_swap(&current, Some(Arc::clone(mutator)));
            if same_occupant(&previous, &current) {
                if let Some(displaced) = previous.as_ref() {
                    debug!(
                        incoming = ?mutator.priority,
                        displaced = ?displaced.priority,
                        "preempting active mutation"
                    );
                    displaced.cancel();
                } else {
                    trace!(priority = ?mutator.priority, "mutator slot claimed");
                }
                return Ok(());
            }
        }
    }
}
