//! Priority tiers for competing mutations.

/// Priority of a mutation against other mutations sharing one
/// [`MutatorMutex`](crate::MutatorMutex).
///
/// Priorities form a total order: `Default < UserInput < PreventUserInput`.
/// A new mutation preempts the active one when its priority is greater than
/// **or equal to** the active priority; only a strictly higher active
/// priority blocks a newcomer. Equal-priority preemption is deliberate: for
/// rapid repeated gestures at the same tier, the latest request should win
/// over a stale one.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MutatePriority {
    /// The baseline tier for programmatic mutations such as animations.
    /// Preempted by any other mutation, including another `Default` one.
    #[default]
    Default,
    /// Mutations driven directly by user input. Preempts `Default` and other
    /// `UserInput` mutations.
    UserInput,
    /// The highest tier. While active, user-input mutations are rejected;
    /// only another `PreventUserInput` mutation can take over.
    PreventUserInput,
}
