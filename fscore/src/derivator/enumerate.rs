//! Input-set enumeration.
//!
//! For one relation and one output, every input variable has a *slot*: the
//! list of candidate records holding that variable. A valid input set picks
//! one record per slot such that the `used_relations` of the picked records
//! are pairwise disjoint.
//!
//! This is the Cartesian product of the slots, filtered. The product is walked
//! depth-first while carrying the union of the relations used so far; a branch
//! is cut as soon as the next record overlaps that union. Pairwise
//! disjointness is equivalent to each record being disjoint from the union of
//! the records before it, so the walk yields exactly the filtered product, in
//! lexicographic slot order.
//!
//! The cost is bounded by the product of the slot sizes. Slots stay small in
//! practice (one record per independent derivation of a variable), and the
//! pruning removes most of the product as soon as records start sharing
//! ancestry.
use smallvec::SmallVec;

use crate::{
    magic::INLINE_INPUTS,
    record::{RecordArena, RecordId, RelationSet},
};

pub(crate) type InputSet = SmallVec<RecordId, INLINE_INPUTS>;

/// Every pick of one record per slot with pairwise disjoint `used_relations`.
///
/// With no slot at all the product holds a single empty input set.
pub(crate) fn disjoint_product(arena: &RecordArena, slots: &[&[RecordId]]) -> Vec<InputSet> {
    let mut out = Vec::new();
    if slots.iter().any(|slot| slot.is_empty()) {
        return out;
    }

    let mut chosen = InputSet::new();
    walk(arena, slots, &RelationSet::new(), &mut chosen, &mut out);
    out
}

fn walk(
    arena: &RecordArena,
    slots: &[&[RecordId]],
    used: &RelationSet,
    chosen: &mut InputSet,
    out: &mut Vec<InputSet>,
) {
    let Some((slot, rest)) = slots.split_first() else {
        out.push(chosen.clone());
        return;
    };

    for &id in slot.iter() {
        let record_used = arena[id].used_relations();
        if !used.is_disjoint(record_used) {
            continue;
        }

        let mut union = used.clone();
        union.union_with(record_used);
        chosen.push(id);
        walk(arena, rest, &union, chosen, out);
        chosen.pop();
    }
}
