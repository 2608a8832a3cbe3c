//! Bounded queue of player moves.

use carrot_hop_core::{QueuedStep, Rejection, SlotId, Step};

/// Moves queued by the player, each bound to a placeholder slot.
///
/// Slots follow a stack discipline: the n-th queued move always occupies slot
/// `n`, and undoing a move frees the highest occupied slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandQueue {
    capacity: usize,
    steps: Vec<QueuedStep>,
}

impl CommandQueue {
    /// Creates an empty queue that accepts up to `capacity` moves.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            steps: Vec::with_capacity(capacity),
        }
    }

    /// Maximum number of moves the queue accepts.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether no move is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Reports whether another move would exceed the capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.steps.len() >= self.capacity
    }

    /// Slot the next queued move will occupy, if any remains.
    #[must_use]
    pub fn next_slot(&self) -> Option<SlotId> {
        (!self.is_full()).then(|| SlotId::new(self.steps.len()))
    }

    /// Appends `step` to the queue.
    pub fn push(&mut self, step: Step) -> Result<QueuedStep, Rejection> {
        let slot = self.next_slot().ok_or(Rejection::QueueFull {
            capacity: self.capacity,
        })?;
        let queued = QueuedStep { step, slot };
        self.steps.push(queued);
        Ok(queued)
    }

    /// Removes and returns the most recently queued move.
    pub fn pop(&mut self) -> Option<QueuedStep> {
        self.steps.pop()
    }

    /// Queued moves in execution order.
    #[must_use]
    pub fn steps(&self) -> &[QueuedStep] {
        &self.steps
    }

    /// Discards every queued move, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let discarded = self.steps.len();
        self.steps.clear();
        discarded
    }
}
