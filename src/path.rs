//! Pending motion deltas, merged per gesture run.

/// Signed motion delta. Positive `Move` is forward, positive `Rotate` is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuedAction {
    Move(i32),
    Rotate(i32),
}

impl QueuedAction {
    pub fn delta(&self) -> i32 {
        match *self {
            Self::Move(d) | Self::Rotate(d) => d,
        }
    }

    fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// A new entry was added at the tail.
    Appended(QueuedAction),
    /// The tail absorbed the delta; carries the updated tail.
    Merged(QueuedAction),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathQueue {
    entries: Vec<QueuedAction>,
}

impl PathQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `action` into the tail when the tail has the same kind,
    /// otherwise appends it.
    pub fn push(&mut self, action: QueuedAction) -> PushOutcome {
        if let Some(tail) = self.entries.last_mut() {
            if tail.same_kind(&action) {
                *tail = match *tail {
                    QueuedAction::Move(d) => QueuedAction::Move(d + action.delta()),
                    QueuedAction::Rotate(d) => QueuedAction::Rotate(d + action.delta()),
                };
                return PushOutcome::Merged(*tail);
            }
        }
        self.entries.push(action);
        PushOutcome::Appended(action)
    }

    pub fn tail(&self) -> Option<&QueuedAction> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedAction> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[QueuedAction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
