// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The normaliser: turns a `RawInstance` into the canonical typed `Instance`.
//! Participant names are case-folded, items whose declared owner is not a
//! known participant end up in the sentinel `unknown` bucket, and wishlists
//! are pruned of anything that could never be honoured (unknown ids,
//! self-owned items). All of it non-fatally, with one diagnostic per oddity.

use fxhash::FxHashMap;

use crate::{Diagnostic, Instance, Item, ItemIdx, Offer, Participant, RawInstance, UserIdx};

/// The case-folded name of the sentinel participant gathering the items whose
/// declared owner is unknown.
pub const UNKNOWN_OWNER: &str = "unknown";

/// Normalises a raw instance into the canonical typed form. This stage never
/// fails: every oddity of the input is reported as a diagnostic and worked
/// around, so the returned instance always upholds its invariants.
pub fn normalise(raw: &RawInstance) -> (Instance, Vec<Diagnostic>) {
    let mut diags = Vec::new();

    // participants, in stable (lexicographic) order; colliding case-folded
    // names keep the first spelling
    let mut participants: Vec<Participant> = Vec::new();
    let mut user_index: FxHashMap<String, UserIdx> = FxHashMap::default();
    for display in raw.users.keys() {
        let folded = display.to_lowercase();
        if user_index.contains_key(&folded) {
            Diagnostic::emit(
                &mut diags,
                format!(
                    "participant '{}' collides with an already known name once case-folded; \
                     keeping the first spelling",
                    display
                ),
            );
            continue;
        }
        user_index.insert(folded.clone(), UserIdx(participants.len()));
        participants.push(Participant {
            display: display.clone(),
            folded,
            offers: Vec::new(),
        });
    }

    // items, attaching unknown owners to the sentinel bucket
    let mut sentinel: Option<UserIdx> = None;
    let mut items: Vec<Item> = Vec::new();
    let mut item_index: FxHashMap<String, ItemIdx> = FxHashMap::default();
    for (id, raw_item) in &raw.items {
        let owner_folded = raw_item.owner.to_lowercase();
        let owner = match user_index.get(&owner_folded) {
            Some(idx) => *idx,
            None => {
                Diagnostic::emit(
                    &mut diags,
                    format!(
                        "owner '{}' of item '{}' is not a known participant",
                        raw_item.owner, id
                    ),
                );
                *sentinel.get_or_insert_with(|| {
                    let idx = UserIdx(participants.len());
                    participants.push(Participant {
                        display: UNKNOWN_OWNER.to_string(),
                        folded: UNKNOWN_OWNER.to_string(),
                        offers: Vec::new(),
                    });
                    idx
                })
            }
        };
        item_index.insert(id.clone(), ItemIdx(items.len()));
        items.push(Item {
            id: id.clone(),
            name: raw_item.name.clone(),
            owner,
        });
    }

    // offers, with per-offer wishlist pruning
    for (display, raw_user) in &raw.users {
        let folded = display.to_lowercase();
        let user = match user_index.get(&folded) {
            Some(idx) => *idx,
            None => continue,
        };
        // skip the offers of a user whose folded name lost the collision
        if participants[user.id()].display != *display {
            continue;
        }
        for (offer_id, wishlist) in &raw_user.offers {
            let item = match item_index.get(offer_id) {
                Some(idx) => *idx,
                None => {
                    Diagnostic::emit(
                        &mut diags,
                        format!(
                            "offer '{}' of user '{}' references an unknown item; offer dropped",
                            offer_id, display
                        ),
                    );
                    continue;
                }
            };
            if items[item.id()].owner != user {
                Diagnostic::emit(
                    &mut diags,
                    format!(
                        "offer '{}' of user '{}' is not owned by them; offer dropped",
                        offer_id, display
                    ),
                );
                continue;
            }

            let mut kept = Vec::new();
            let mut pruned = Vec::new();
            for wish in wishlist {
                match item_index.get(wish) {
                    None => pruned.push(wish.as_str()),
                    Some(idx) if items[idx.id()].owner == user => pruned.push(wish.as_str()),
                    Some(idx) => kept.push(*idx),
                }
            }
            if !pruned.is_empty() {
                Diagnostic::emit(
                    &mut diags,
                    format!(
                        "pruned unavailable items from the wishlist of offer '{}' of user '{}': {:?}",
                        offer_id, display, pruned
                    ),
                );
            }
            participants[user.id()].offers.push(Offer {
                item,
                wishlist: kept,
            });
        }
    }

    (Instance::assemble(participants, items, sentinel), diags)
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_normalise {
    use super::*;
    use crate::{RawItem, RawUser};

    fn raw(users: &[(&str, &[(&str, &[&str])])], items: &[(&str, &str, &str)]) -> RawInstance {
        let mut out = RawInstance::default();
        for (name, offers) in users {
            let mut user = RawUser::default();
            for (item, wishlist) in *offers {
                user.offers.insert(
                    item.to_string(),
                    wishlist.iter().map(|w| w.to_string()).collect(),
                );
            }
            out.users.insert(name.to_string(), user);
        }
        for (id, owner, name) in items {
            out.items.insert(
                id.to_string(),
                RawItem {
                    owner: owner.to_string(),
                    name: name.to_string(),
                },
            );
        }
        out
    }

    #[test]
    fn folds_participant_names() {
        let raw = raw(
            &[("Alice", &[("item1", &[] as &[&str])])],
            &[("item1", "ALICE", "Chess Set")],
        );
        let (instance, diags) = normalise(&raw);
        assert!(diags.is_empty());
        assert_eq!(1, instance.nb_participants());
        assert_eq!("Alice", instance.participants[0].display);
        assert_eq!("alice", instance.participants[0].folded);
        assert_eq!(UserIdx(0), instance.owner_of(ItemIdx(0)));
    }

    #[test]
    fn unknown_owner_goes_to_the_sentinel_bucket() {
        let raw = raw(
            &[("Alice", &[("item1", &[] as &[&str])])],
            &[("item1", "Alice", "A"), ("x", "Ghost", "Spooky")],
        );
        let (instance, diags) = normalise(&raw);
        assert_eq!(1, diags.len());
        assert_eq!(1, instance.nb_participants());
        let x = instance.item_idx("x").unwrap();
        assert!(instance.has_unknown_owner(x));
    }

    #[test]
    fn prunes_unknown_and_self_owned_wishes() {
        let raw = raw(
            &[
                ("Alice", &[("item1", &["item2", "missing", "item3"])]),
                ("Bob", &[("item2", &["item1"])]),
            ],
            &[
                ("item1", "Alice", "A"),
                ("item2", "Bob", "B"),
                ("item3", "Alice", "C"),
            ],
        );
        let (instance, diags) = normalise(&raw);
        // one pruning diagnostic, listing both dropped references
        assert_eq!(1, diags.len());
        let alice = instance.user_idx("alice").unwrap();
        let offer = &instance.participant(alice).offers[0];
        assert_eq!(vec![instance.item_idx("item2").unwrap()], offer.wishlist);
    }

    #[test]
    fn drops_offers_for_items_owned_by_someone_else() {
        let raw = raw(
            &[
                ("Alice", &[("item2", &[] as &[&str])]),
                ("Bob", &[] as &[(&str, &[&str])]),
            ],
            &[("item2", "Bob", "B")],
        );
        let (instance, diags) = normalise(&raw);
        assert_eq!(1, diags.len());
        let alice = instance.user_idx("alice").unwrap();
        assert!(instance.participant(alice).offers.is_empty());
    }
}
