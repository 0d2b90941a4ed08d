//! Child diff - Keyed two-pointer reconciliation plan.
//!
//! [`diff_children`] compares the identities of a parent's old kids with the
//! new child descriptions and returns a [`DiffPlan`]: which old fiber each new
//! child reuses, which are fresh, and which old fibers are detached. It never
//! touches the tree, so the work loop applies the plan separately.
//!
//! # Algorithm
//!
//! ```text
//! old:  [ head-matched | middle ........ | tail-matched ]
//! new:  [ head-matched | middle .... | tail-matched ]
//! ```
//!
//! 1. Trim matching tails (classified Update as they are found).
//! 2. Trim matching heads (classified Update at the very end).
//! 3. If the old side ran out, every remaining new child is an Insert.
//! 4. If the new side ran out, every remaining old child is detached.
//! 5. Otherwise map remaining old children by key and walk the remaining new
//!    children from tail to head, reusing keyed matches as Moves.
//!
//! Two children match when their keys are equal and their kinds are equal.

use std::collections::HashMap;

use crate::primitives::ElementKind;
use crate::types::{Key, Lane};

/// Identity of one child: its key and kind.
#[derive(Debug, Clone, Copy)]
pub struct Slot<'a> {
    pub key: Option<&'a Key>,
    pub kind: &'a ElementKind,
}

impl Slot<'_> {
    fn matches(&self, other: &Slot<'_>) -> bool {
        self.key == other.key && self.kind == other.kind
    }
}

/// What happens to one new child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Reuses old child `old` in place.
    Update { old: usize },
    /// Reuses old child `old` at a new position.
    Move { old: usize },
    /// Fresh fiber.
    Insert,
}

impl Placement {
    /// Lane the placed fiber carries into commit.
    pub fn lane(self) -> Lane {
        match self {
            Self::Update { .. } => Lane::UPDATE,
            Self::Move { .. } | Self::Insert => Lane::INSERT,
        }
    }

    /// Old index reused, if any.
    pub fn reused(self) -> Option<usize> {
        match self {
            Self::Update { old } | Self::Move { old } => Some(old),
            Self::Insert => None,
        }
    }
}

/// Result of diffing one parent's children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffPlan {
    /// One placement per new child, in document order.
    pub kids: Vec<Placement>,
    /// Old indices that are no longer used, in detach order.
    pub detached: Vec<usize>,
}

impl DiffPlan {
    pub fn inserted(&self) -> usize {
        self.count(|p| matches!(p, Placement::Insert))
    }

    pub fn moved(&self) -> usize {
        self.count(|p| matches!(p, Placement::Move { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|p| matches!(p, Placement::Update { .. }))
    }

    fn count(&self, predicate: impl Fn(&Placement) -> bool) -> usize {
        self.kids.iter().filter(|p| predicate(p)).count()
    }
}

/// Diff old kid identities against new child identities.
pub fn diff_children(old: &[Slot<'_>], new: &[Slot<'_>]) -> DiffPlan {
    let mut kids = vec![Placement::Insert; new.len()];
    let mut detached = Vec::new();

    let (mut a_head, mut b_head) = (0, 0);
    let (mut a_tail, mut b_tail) = (old.len(), new.len());

    // Tails
    while a_head < a_tail && b_head < b_tail && old[a_tail - 1].matches(&new[b_tail - 1]) {
        a_tail -= 1;
        b_tail -= 1;
        kids[b_tail] = Placement::Update { old: a_tail };
    }

    // Heads
    while a_head < a_tail && b_head < b_tail && old[a_head].matches(&new[b_head]) {
        a_head += 1;
        b_head += 1;
    }

    if a_head == a_tail {
        // Old exhausted: remaining new children stay Insert
    } else if b_head == b_tail {
        detached.extend((a_head..a_tail).rev());
    } else {
        // Only keyed old kids can be matched out of position
        let mut by_key: HashMap<&Key, usize> = HashMap::with_capacity(a_tail - a_head);
        for (i, slot) in old.iter().enumerate().take(a_tail).skip(a_head) {
            if let Some(key) = author_key(slot) {
                by_key.insert(key, i);
            }
        }

        let mut reused = vec![false; old.len()];
        for b in (b_head..b_tail).rev() {
            let slot = &new[b];
            let hit = author_key(slot).and_then(|key| {
                let &index = by_key.get(key)?;
                (old[index].kind == slot.kind).then(|| {
                    by_key.remove(key);
                    index
                })
            });
            if let Some(index) = hit {
                reused[index] = true;
                kids[b] = Placement::Move { old: index };
            }
        }

        detached.extend((a_head..a_tail).filter(|&i| !reused[i]));
    }

    // Head carryover
    for i in (0..b_head).rev() {
        kids[i] = Placement::Update { old: i };
    }

    DiffPlan { kids, detached }
}

fn author_key<'a>(slot: &Slot<'a>) -> Option<&'a Key> {
    slot.key.filter(|key| !key.as_str().is_empty())
}
