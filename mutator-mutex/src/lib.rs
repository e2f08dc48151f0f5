//! Priority-preempting mutual exclusion for shared state mutation.
//!
//! UI state is often mutated by several competing sources at once: an
//! ongoing fling animation, the user's finger, a scroll-to-position request.
//! A plain mutex queues them; that is the wrong behavior, because a stale
//! animation finishing its wait would overwrite the gesture that interrupted
//! it. [`MutatorMutex`] instead arbitrates by [`MutatePriority`]: a new
//! mutation at equal or higher priority cancels the active one and takes
//! over, while a lower-priority request is rejected before it starts.
//!
//! # Example
//!
//! ```
//! use mutator_mutex::{MutatePriority, MutatorMutex};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mutex = MutatorMutex::new();
//!
//! let result = mutex
//!     .mutate(MutatePriority::UserInput, async { 21 * 2 })
//!     .await;
//! assert_eq!(result, Ok(42));
//! # }
//! ```
//!
//! # Arbitration rules
//!
//! - At most one mutation body runs at a time.
//! - A newcomer with priority **greater than or equal to** the active
//!   mutation's priority preempts it: the incumbent's work is cancelled at
//!   its next suspension point and the newcomer runs once the incumbent has
//!   wound down.
//! - A newcomer with **strictly lower** priority than the active mutation is
//!   rejected synchronously; its work is never polled.
//! - Both losing outcomes surface as [`MutationCancelled`]. There is no
//!   fair queueing and no automatic retry; at equal priority the newest
//!   request always wins.
//!
//! Cancellation is cooperative: a preempted mutation's future is dropped at
//! its next `.await`, so cleanup belongs in drop guards, and work that must
//! not be abandoned mid-step should avoid suspension points inside that
//! step.

pub mod mutex;
pub mod priority;

pub use mutex::{MutationCancelled, MutatorMutex};
pub use priority::MutatePriority;
