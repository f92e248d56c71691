//! Property tests: lookups terminate and stay inside the devices matrix,
//! rendering never exceeds the buffer it is given.

mod common;

use common::*;
use proptest::prelude::*;
use uatrie::{encode_csv, Dataset, DatasetWriter, TrieError};

fn browser_dataset() -> Dataset {
    Dataset::from_bytes(browser_bytes()).unwrap()
}

/// A chain of nodes that links back to the root on every byte, so a walk
/// can only stop at the end of input
fn cyclic_dataset() -> Dataset {
    let mut w = DatasetWriter::new("");
    w.add_property("Id").unwrap();
    w.add_property("Name").unwrap();
    w.add_device(&["0", "Root"]).unwrap();
    w.add_device(&["1", "Child"]).unwrap();
    let root = w.root();
    let child = w.add_node(1);
    for byte in 0..=254u8 {
        w.link(root, byte, child);
        w.link(child, byte, root);
    }
    Dataset::from_bytes(w.build().unwrap()).unwrap()
}

proptest! {
    #[test]
    fn lookup_row_is_in_matrix(input in proptest::collection::vec(any::<u8>(), 0..512)) {
        let dataset = browser_dataset();
        let row = dataset.row_offset_of(dataset.resolve_device(&input));
        prop_assert!(row % dataset.property_count() == 0);
        prop_assert!(row + dataset.property_count() <= dataset.device_cells().len());
    }

    #[test]
    fn known_prefixes_survive_any_suffix(suffix in "[ -~]{0,200}") {
        let dataset = browser_dataset();
        let ua = format!("Opera{}", suffix);
        // "Opera" reaches a leaf with no children, whatever follows
        prop_assert_eq!(dataset.resolve_device(ua.as_bytes()), OPERA);
    }

    #[test]
    fn cyclic_walk_ends_with_input(input in proptest::collection::vec(0u8..255, 0..2048)) {
        let dataset = cyclic_dataset();
        let expected = if input.len() % 2 == 0 { 0 } else { 1 };
        prop_assert_eq!(dataset.resolve_device(&input), expected);
    }

    #[test]
    fn render_respects_capacity(
        input in proptest::collection::vec(any::<u8>(), 0..128),
        capacity in 0usize..160,
    ) {
        let dataset = browser_dataset();
        let required = dataset.properties().resolve_all();
        let row = dataset.device_row_offset(&String::from_utf8_lossy(&input));

        let mut buf = vec![0x5Au8; capacity + 16];
        match encode_csv(&dataset, row, &required, &mut buf[..capacity]) {
            Ok(written) => {
                prop_assert!(written <= capacity);
                prop_assert_eq!(buf[written - 1], b'\n');
            }
            Err(TrieError::BufferTooSmall { required: needed, capacity: cap }) => {
                prop_assert_eq!(cap, capacity);
                prop_assert!(needed > capacity);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
        prop_assert!(buf[capacity..].iter().all(|&b| b == 0x5A));
    }
}
