//! Position allocation within an ordering scope.
//!
//! Positions are non-negative integers that only need to be strictly
//! increasing in display order; gaps are allowed. Inserting between two
//! adjacent positions is impossible without moving neighbours, so the
//! allocator reports [`Placement::RenumberRequired`] instead of colliding.

/// Result of asking for a slot in an ordered position list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    At(u64),
    RenumberRequired,
}

/// Compute the position for an item inserted at `target_index`.
///
/// `existing` must be sorted ascending and exclude the item being placed.
pub fn compute_insert_position(existing: &[u64], target_index: usize) -> Placement {
    let (first, last) = match (existing.first(), existing.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Placement::At(0),
    };

    if target_index == 0 {
        return match first.checked_sub(1) {
            Some(position) => Placement::At(position),
            None => Placement::RenumberRequired,
        };
    }

    if target_index >= existing.len() {
        return match last.checked_add(1) {
            Some(position) => Placement::At(position),
            None => Placement::RenumberRequired,
        };
    }

    let before = existing[target_index - 1];
    let after = existing[target_index];
    if after <= before || after - before < 2 {
        return Placement::RenumberRequired;
    }
    Placement::At(before + (after - before) / 2)
}

/// Position for appending to the end of a scope: `max + 1`, or 0 when empty.
pub fn next_position(existing: &[u64]) -> u64 {
    existing.iter().max().map_or(0, |max| max + 1)
}

/// Largest spacing accepted for renumbering; leaves room for 2^32 items.
pub const MAX_RENUMBER_STEP: u64 = u64::MAX >> 32;

/// Evenly spaced positions for `count` items: `step, 2*step, ...`.
///
/// The sequence starts at `step` so an insert in front of the first item
/// always has room. Returns `None` when the last position would not fit
/// in a `u64`.
pub fn renumbered(count: usize, step: u64) -> Option<Vec<u64>> {
    (1..=count as u64)
        .map(|rank| rank.checked_mul(step))
        .collect()
}
