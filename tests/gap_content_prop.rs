//! GapContent public API property tests
//!
//! Exercise only the exposed methods against a plain `Vec<char>` model.

use gapcontent::{GapContent, GapContentOptions};
use proptest::test_runner::Config as ProptestConfig;
use proptest::{prelude::*, prop_oneof};

#[derive(Debug, Clone)]
enum Operation {
    Insert { pos: usize, text: String },
    Delete { pos: usize, len: usize },
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    let insert = (0u16..256u16, proptest::collection::vec(any::<char>(), 0..24))
        .prop_map(|(pos, chars)| Operation::Insert {
            pos: pos as usize,
            text: chars.into_iter().collect(),
        });
    let delete = (0u16..256u16, 0u16..16u16).prop_map(|(pos, len)| Operation::Delete {
        pos: pos as usize,
        len: len as usize,
    });

    prop_oneof![insert, delete]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn gap_content_matches_char_model(
        capacity in 1usize..16,
        ops in proptest::collection::vec(operation_strategy(), 0..40)
    ) {
        let content = GapContent::with_options(GapContentOptions::default().with_initial_capacity(capacity));
        let mut model: Vec<char> = Vec::new();
        let mut inserted = 0usize;
        let mut deleted = 0usize;

        for op in ops {
            match op {
                Operation::Insert { pos, text } => {
                    let pos = pos.min(model.len());
                    content.insert(pos, &text).unwrap();
                    let chars: Vec<char> = text.chars().collect();
                    inserted += chars.len();
                    model.splice(pos..pos, chars);
                }
                Operation::Delete { pos, len } => {
                    let pos = pos.min(model.len());
                    let len = len.min(model.len() - pos);
                    let edit = content.delete(pos, len).unwrap();
                    let removed: String = model.drain(pos..pos + len).collect();
                    deleted += len;
                    match edit.record() {
                        gapcontent::UndoRecord::Delete { removed_text, .. } => {
                            prop_assert_eq!(removed_text, &removed);
                        }
                        other => prop_assert!(false, "unexpected record {:?}", other),
                    }
                }
            }
            prop_assert_eq!(content.length(), inserted - deleted);
        }

        let expected: String = model.iter().collect();
        prop_assert_eq!(content.read(0, content.length()).unwrap(), expected);
    }

    #[test]
    fn undo_restores_previous_content(
        initial in "[a-z ]{0,32}",
        op in operation_strategy()
    ) {
        let content = GapContent::from_str(&initial);
        let before = content.text();
        let length = content.length();

        let mut edit = match op {
            Operation::Insert { pos, text } => content.insert(pos.min(length), &text).unwrap(),
            Operation::Delete { pos, len } => {
                let pos = pos.min(length);
                content.delete(pos, len.min(length - pos)).unwrap()
            }
        };
        let after = content.text();

        edit.undo().unwrap();
        prop_assert_eq!(content.text(), before.clone());
        prop_assert_eq!(content.length(), length);

        edit.redo().unwrap();
        prop_assert_eq!(content.text(), after.clone());

        edit.undo().unwrap();
        edit.redo().unwrap();
        prop_assert_eq!(content.text(), after);
    }
}
