//! Concrete end-to-end scenarios for [`slicetable::SliceTable`].

use slicetable::SliceTable;
use std::io::Write;

fn dump_string(t: &SliceTable) -> String {
    let mut out = Vec::new();
    t.dump(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

/// Scenario 1: build up "hello, world" from three inserts into an empty
/// table; every insert is plain ASCII so the returned newline counts must
/// all be zero.
#[test]
fn scenario_build_hello_world() {
    let mut t = SliceTable::new();
    assert_eq!(t.insert(0, b"hello"), 0);
    assert_eq!(t.insert(5, b" world"), 0);
    assert_eq!(t.insert(5, b","), 0);

    assert_eq!(dump_string(&t), "hello, world");
    assert_eq!(t.len(), 12);
    assert_eq!(t.depth(), 0);
    assert!(t.check_invariants());
}

/// Scenario 2: a single small slice, deleting an interior span.
#[test]
fn scenario_delete_from_a_single_slice() {
    let mut t = SliceTable::new();
    t.insert(0, b"abcdefghij");
    t.delete(3, 4);

    assert_eq!(dump_string(&t), "abcij");
    assert_eq!(t.len(), 5);
    assert!(t.check_invariants());
}

/// Scenario 3: a large file-backed slice, deleted from and inserted into
/// near its front. Grounded on a `Block::from_file` open, not an
/// in-memory insert.
#[test]
fn scenario_file_backed_delete_then_insert() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ropetest.bin");

    let pattern = b"ab\n";
    let mut content = Vec::with_capacity(10240);
    while content.len() < 10240 {
        let take = (10240 - content.len()).min(pattern.len());
        content.extend_from_slice(&pattern[..take]);
    }
    assert_eq!(content.len(), 10240);
    let total_newlines = content.iter().filter(|&&b| b == b'\n').count();

    {
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&content).unwrap();
    }

    let mut t = SliceTable::open(&path).unwrap();
    assert_eq!(t.len(), 10240);

    let removed_newlines = t.delete(0, 3000);
    assert_eq!(removed_newlines, 1000);

    let added_newlines = t.insert(0, b"X\n");
    assert_eq!(added_newlines, 1);

    assert_eq!(t.len(), 10240 - 3000 + 2);
    let final_newlines = dump_string(&t).bytes().filter(|&b| b == b'\n').count();
    assert_eq!(
        final_newlines as i64 - total_newlines as i64,
        -1000 + 1
    );
    assert!(t.check_invariants());
}

/// Scenario 4: clone isolation. Edits on either side after a clone must
/// never be visible on the other.
#[test]
fn scenario_clone_isolation() {
    let mut original = SliceTable::new();
    original.insert(0, b"abcdefghij");

    let mut clone = original.clone();
    original.delete(0, 10);
    clone.insert(5, b"Z");

    assert_eq!(dump_string(&original), "");
    assert_eq!(dump_string(&clone), "abcdeZfghij");
    assert!(original.check_invariants());
    assert!(clone.check_invariants());
}

/// Scenario 5: a long randomized trace against a 100 KiB starting string,
/// checked against a plain `Vec<u8>` model after every step.
#[test]
fn scenario_randomized_trace_matches_model() {
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    let mut rng = StdRng::seed_from_u64(0xA11CE);

    let mut model: Vec<u8> = (0..100 * 1024).map(|_| rng.gen_range(b'a'..=b'z')).collect();
    let mut t = SliceTable::new();
    t.insert(0, &model);
    assert_eq!(t.len(), model.len() as u64);

    for _ in 0..10_000 {
        if model.is_empty() || rng.gen_bool(0.5) {
            let len = rng.gen_range(1..=64);
            let pos = rng.gen_range(0..=model.len());
            let data: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect();
            model.splice(pos..pos, data.iter().copied());
            t.insert(pos as u64, &data);
        } else {
            let pos = rng.gen_range(0..model.len());
            let len = rng.gen_range(1..=64).min(model.len() - pos);
            model.drain(pos..pos + len);
            t.delete(pos as u64, len as u64);
        }
        assert!(t.check_invariants());
    }

    assert_eq!(dump_string(&t).into_bytes(), model);
}

/// Scenario 6: append-only growth followed by front-deletion shrinkage;
/// the tree must grow past a single leaf and then demote back to one.
#[test]
fn scenario_append_then_pop_front_grows_and_shrinks() {
    let mut t = SliceTable::new();
    for _ in 0..200 {
        let pos = t.len();
        t.insert(pos, b"x");
    }
    assert!(t.depth() > 0, "200 single-byte appends should grow past a leaf");

    for _ in 0..200 {
        t.delete(0, 1);
    }

    assert_eq!(t.len(), 0);
    assert_eq!(t.depth(), 0, "root should demote back down to a single empty leaf");
    assert!(t.check_invariants());
}
