use proptest::prelude::*;
use tandem_crdt::{CausalOrder, Lseq, Op, VectorClock};
use tandem_types::PeerId;

/// A scripted local edit, interpreted against the current visible length.
#[derive(Debug, Clone)]
enum Edit {
    Insert { at: usize, text: String },
    Remove { at: usize, len: usize },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), "[a-z]{1,8}").prop_map(|(at, text)| Edit::Insert { at, text }),
        (any::<usize>(), 1..4usize).prop_map(|(at, len)| Edit::Remove { at, len }),
    ]
}

/// Runs an edit against both the sequence and a plain char vector used
/// as the reference model, returning the ops the sequence planned.
fn run_edit(seq: &mut Lseq, model: &mut Vec<char>, edit: &Edit) -> Vec<Op> {
    let ops = match edit {
        Edit::Insert { at, text } => {
            let at = at % (model.len() + 1);
            model.splice(at..at, text.chars());
            seq.insert_ops(at, text).unwrap()
        }
        Edit::Remove { at, len } => {
            if model.is_empty() {
                return Vec::new();
            }
            let at = at % model.len();
            let len = (*len).min(model.len() - at);
            model.splice(at..at + len, std::iter::empty());
            seq.remove_ops(at, len).unwrap()
        }
    };
    for op in &ops {
        seq.apply(op).unwrap();
    }
    ops
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn edits_match_a_plain_vector_model(edits in prop::collection::vec(edit_strategy(), 1..40)) {
        let mut seq = Lseq::new(PeerId::new(1));
        let mut model: Vec<char> = Vec::new();

        for edit in &edits {
            run_edit(&mut seq, &mut model, edit);
            prop_assert_eq!(seq.text(), model.iter().collect::<String>());
            prop_assert_eq!(seq.len(), model.len());
        }

        let entries = seq.entries();
        for pair in entries.windows(2) {
            prop_assert!(pair[0].key() < pair[1].key());
        }
    }

    #[test]
    fn replicas_converge_under_any_delivery_order(
        edits_a in prop::collection::vec(edit_strategy(), 1..15),
        edits_b in prop::collection::vec(edit_strategy(), 1..15),
    ) {
        let mut a = Lseq::new(PeerId::new(1));
        let mut b = Lseq::new(PeerId::new(2));
        let mut model_a: Vec<char> = "shared base".chars().collect();
        let mut model_b = model_a.clone();

        let base = a.insert_ops(0, "shared base").unwrap();
        for op in &base {
            a.apply(op).unwrap();
            b.apply(op).unwrap();
        }

        // Each side edits independently against the shared base.
        let mut from_a = Vec::new();
        for edit in &edits_a {
            from_a.extend(run_edit(&mut a, &mut model_a, edit));
        }
        let mut from_b = Vec::new();
        for edit in &edits_b {
            from_b.extend(run_edit(&mut b, &mut model_b, edit));
        }

        for op in &from_b {
            a.apply(op).unwrap();
        }
        for op in &from_a {
            b.apply(op).unwrap();
        }

        prop_assert_eq!(a.text(), b.text());
        prop_assert_eq!(a.entries(), b.entries());
    }

    #[test]
    fn keys_stay_strictly_between_their_bounds(
        edits in prop::collection::vec(edit_strategy(), 1..30),
    ) {
        let mut seq = Lseq::new(PeerId::new(1));
        let mut model: Vec<char> = Vec::new();

        for edit in &edits {
            for op in run_edit(&mut seq, &mut model, edit) {
                if let Op::Insert { key, .. } = op {
                    prop_assert!(key > tandem_crdt::FractionalIndex::min());
                    prop_assert!(key < tandem_crdt::FractionalIndex::max());
                }
            }
        }
    }

    #[test]
    fn clock_merge_is_an_upper_bound(
        left in prop::collection::btree_map(0u8..8, 1u64..50, 0..6),
        right in prop::collection::btree_map(0u8..8, 1u64..50, 0..6),
    ) {
        let mut a = VectorClock::new();
        for (peer, n) in &left {
            for _ in 0..*n {
                a.increment(PeerId::new(*peer));
            }
        }
        let mut b = VectorClock::new();
        for (peer, n) in &right {
            for _ in 0..*n {
                b.increment(PeerId::new(*peer));
            }
        }

        let mut merged = a.clone();
        merged.merge(&b);

        for side in [&a, &b] {
            let order = side.compare(&merged);
            prop_assert!(
                matches!(order, CausalOrder::Before | CausalOrder::Equal),
                "merge must dominate both inputs, got {order:?}"
            );
        }
    }
}
