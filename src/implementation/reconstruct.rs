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

//! The reconstructor: turns a solver's selection (cycles or matching pairs)
//! into the flat list of planned exchanges, and derives the per-participant
//! give/receive summary the reporter feeds on.

use crate::{Diagnostic, Exchange, Instance, ItemIdx, Selection, UserIdx};

/// What one participant offered, gave and received over a solution.
#[derive(Debug, Clone)]
pub struct UserSummary {
    pub user: UserIdx,
    /// The display form of the participant's name
    pub display: String,
    /// How many items they put on the table
    pub items_offered: usize,
    pub items_given: Vec<ItemIdx>,
    pub items_received: Vec<ItemIdx>,
}

impl UserSummary {
    /// True iff this participant gives or receives at least once.
    pub fn participates(&self) -> bool {
        !self.items_given.is_empty() || !self.items_received.is_empty()
    }
}

/// Derives the exchange records realised by a selection. Every cycle of
/// length k yields k records; a matching yields one record per non-self
/// pair. A record whose giver and receiver coincide cannot be honoured and
/// is filtered out with a warning (the solvers never produce one, this is a
/// safety net).
pub fn exchanges(
    instance: &Instance,
    selection: &Selection,
    diags: &mut Vec<Diagnostic>,
) -> Vec<Exchange> {
    let mut out = Vec::new();
    let mut record = |given: ItemIdx, received: ItemIdx, out: &mut Vec<Exchange>| {
        let giver = instance.owner_of(given);
        let receiver = instance.owner_of(received);
        if giver == receiver {
            Diagnostic::emit(
                diags,
                format!(
                    "participant '{}' would trade '{}' for their own '{}'; exchange skipped",
                    instance.participant(giver).display,
                    instance.item(given).id,
                    instance.item(received).id
                ),
            );
            return;
        }
        out.push(Exchange {
            giver,
            receiver,
            given,
            received,
        });
    };

    match selection {
        Selection::Cycles(cycles) => {
            for cycle in cycles {
                for (given, received) in cycle.steps() {
                    record(given, received, &mut out);
                }
            }
        }
        Selection::Matching(pairs) => {
            for pair in pairs {
                if pair.item == pair.receives {
                    continue;
                }
                record(pair.item, pair.receives, &mut out);
            }
        }
    }
    out
}

/// Derives the per-participant summary of a solution. Every actual
/// participant gets an entry (the sentinel bucket does not); the entry of a
/// participant with no exchange simply stays empty.
pub fn summarise(instance: &Instance, exchanges: &[Exchange]) -> Vec<UserSummary> {
    let mut summaries: Vec<UserSummary> = (0..instance.nb_participants())
        .map(|u| {
            let participant = &instance.participants[u];
            UserSummary {
                user: UserIdx(u),
                display: participant.display.clone(),
                items_offered: participant.offers.len(),
                items_given: Vec::new(),
                items_received: Vec::new(),
            }
        })
        .collect();
    for exchange in exchanges {
        if exchange.giver.id() < summaries.len() {
            summaries[exchange.giver.id()].items_given.push(exchange.given);
            summaries[exchange.giver.id()]
                .items_received
                .push(exchange.received);
        }
    }
    summaries
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_reconstruct {
    use super::*;
    use crate::{normalise, Cycle, RawInstance, RawItem, RawUser, TradePair};

    fn three_cycle_instance() -> Instance {
        let mut raw = RawInstance::default();
        let owners = [("item1", "Alice"), ("item2", "Bob"), ("item3", "Charlie")];
        let wants = [
            ("Alice", "item1", "item2"),
            ("Bob", "item2", "item3"),
            ("Charlie", "item3", "item1"),
        ];
        for (id, owner) in owners {
            raw.items.insert(
                id.to_string(),
                RawItem {
                    owner: owner.to_string(),
                    name: id.to_string(),
                },
            );
        }
        for (user, item, wish) in wants {
            let mut u = RawUser::default();
            u.offers.insert(item.to_string(), vec![wish.to_string()]);
            raw.users.insert(user.to_string(), u);
        }
        normalise(&raw).0
    }

    #[test]
    fn a_cycle_of_three_yields_three_exchanges() {
        let instance = three_cycle_instance();
        let cycle = Cycle::new(vec![
            instance.item_idx("item1").unwrap(),
            instance.item_idx("item2").unwrap(),
            instance.item_idx("item3").unwrap(),
        ]);
        let mut diags = Vec::new();
        let records = exchanges(&instance, &Selection::Cycles(vec![cycle]), &mut diags);
        assert!(diags.is_empty());
        assert_eq!(3, records.len());

        // every giver owns what they give and receives what they asked for
        for record in &records {
            assert_eq!(record.giver, instance.owner_of(record.given));
            assert_ne!(record.giver, record.receiver);
        }
    }

    #[test]
    fn matching_pairs_reconstruct_like_cycle_steps() {
        let instance = three_cycle_instance();
        let i1 = instance.item_idx("item1").unwrap();
        let i2 = instance.item_idx("item2").unwrap();
        let i3 = instance.item_idx("item3").unwrap();
        let pairs = vec![
            TradePair { item: i1, receives: i2 },
            TradePair { item: i2, receives: i3 },
            TradePair { item: i3, receives: i1 },
        ];
        let mut diags = Vec::new();
        let records = exchanges(&instance, &Selection::Matching(pairs), &mut diags);
        assert_eq!(3, records.len());
    }

    #[test]
    fn summaries_stay_balanced() {
        let instance = three_cycle_instance();
        let cycle = Cycle::new(vec![
            instance.item_idx("item1").unwrap(),
            instance.item_idx("item2").unwrap(),
            instance.item_idx("item3").unwrap(),
        ]);
        let mut diags = Vec::new();
        let records = exchanges(&instance, &Selection::Cycles(vec![cycle]), &mut diags);
        let summaries = summarise(&instance, &records);
        assert_eq!(3, summaries.len());
        for summary in &summaries {
            assert_eq!(summary.items_given.len(), summary.items_received.len());
            assert!(summary.participates());
        }
    }

    #[test]
    fn self_trades_are_filtered_with_a_warning() {
        let mut raw = RawInstance::default();
        for id in ["item1", "item2"] {
            raw.items.insert(
                id.to_string(),
                RawItem {
                    owner: "Alice".to_string(),
                    name: id.to_string(),
                },
            );
        }
        raw.users.insert("Alice".to_string(), RawUser::default());
        let (instance, _) = normalise(&raw);

        let cycle = Cycle::new(vec![
            instance.item_idx("item1").unwrap(),
            instance.item_idx("item2").unwrap(),
        ]);
        let mut diags = Vec::new();
        let records = exchanges(&instance, &Selection::Cycles(vec![cycle]), &mut diags);
        assert!(records.is_empty());
        assert_eq!(2, diags.len());
    }
}
