//! The invariant/property checks from the testable-properties list, run
//! against randomized traces via `quickcheck` plus a hand-rolled harness.

use quickcheck_macros::quickcheck;
use slicetable::SliceTable;

fn dump_bytes(t: &SliceTable) -> Vec<u8> {
    let mut out = Vec::new();
    t.dump(&mut out).unwrap();
    out
}

fn count_newlines(data: &[u8]) -> usize {
    data.iter().filter(|&&b| b == b'\n').count()
}

/// One step of a randomized edit trace, generated by quickcheck from plain
/// tuples so no custom `Arbitrary` impl is needed: `(is_insert, pos_byte,
/// len_or_data_byte)`. Positions and lengths are taken modulo the current
/// size, so every generated step is valid by construction.
type Step = (bool, u8, u8);

fn apply_steps(steps: &[Step]) -> (SliceTable, Vec<u8>, usize, usize) {
    let mut t = SliceTable::new();
    let mut model: Vec<u8> = Vec::new();
    let mut inserted_newlines = 0usize;
    let mut deleted_newlines = 0usize;

    for &(is_insert, pos_byte, extra) in steps {
        if is_insert || model.is_empty() {
            let pos = if model.is_empty() { 0 } else { pos_byte as usize % (model.len() + 1) };
            let len = (extra as usize % 8) + 1;
            let data: Vec<u8> = (0..len)
                .map(|i| if (pos_byte as usize + i) % 11 == 0 { b'\n' } else { b'm' })
                .collect();
            inserted_newlines += t.insert(pos as u64, &data);
            model.splice(pos..pos, data.iter().copied());
        } else {
            let pos = pos_byte as usize % model.len();
            let len = (extra as usize % 8 + 1).min(model.len() - pos);
            deleted_newlines += t.delete(pos as u64, len as u64);
            model.drain(pos..pos + len);
        }
    }

    (t, model, inserted_newlines, deleted_newlines)
}

/// Property 1 + 2 + 3: after any trace, invariants hold, the dump matches
/// the model byte-for-byte, and the reported size matches the dump's
/// length.
#[quickcheck]
fn invariants_roundtrip_and_size_hold(steps: Vec<Step>) -> bool {
    let (t, model, _, _) = apply_steps(&steps);
    t.check_invariants() && dump_bytes(&t) == model && t.len() == dump_bytes(&t).len() as u64
}

/// Property 5: the sum of newline counts returned across a trace equals
/// the net newline delta between an empty starting point and the final
/// dump.
#[quickcheck]
fn newline_counts_match_net_delta(steps: Vec<Step>) -> bool {
    let (t, model, inserted, deleted) = apply_steps(&steps);
    let final_newlines = count_newlines(&dump_bytes(&t));
    debug_assert_eq!(model, dump_bytes(&t));
    (inserted as i64 - deleted as i64) == final_newlines as i64
}

/// Property 6: walking the iterator from the start and concatenating
/// every chunk reproduces the dump exactly.
#[quickcheck]
fn iterator_concatenation_matches_dump(steps: Vec<Step>) -> bool {
    let (t, _, _, _) = apply_steps(&steps);
    let mut out = Vec::new();
    let mut it = t.iter_at(0);
    loop {
        match it.chunk() {
            Some(c) => out.extend_from_slice(c),
            None => break,
        }
        if !it.next_chunk() {
            break;
        }
    }
    out == dump_bytes(&t)
}

/// Property 7: a zero-length insert or delete is a no-op, byte for byte.
#[quickcheck]
fn zero_length_edits_are_idempotent(steps: Vec<Step>, probe_pos: u8) -> bool {
    let (mut t, _, _, _) = apply_steps(&steps);
    let before = dump_bytes(&t);
    let pos = if before.is_empty() { 0 } else { probe_pos as u64 % (before.len() as u64 + 1) };

    let lf_insert = t.insert(pos, b"");
    let after_insert = dump_bytes(&t);

    let delete_pos = if after_insert.is_empty() { 0 } else { probe_pos as u64 % after_insert.len() as u64 };
    let lf_delete = t.delete(delete_pos, 0);
    let after_delete = dump_bytes(&t);

    lf_insert == 0 && lf_delete == 0 && after_insert == before && after_delete == before
}

/// Property 8: an out-of-range delete clamps to exactly what remains from
/// `pos` onward, never panicking and never deleting less than requested
/// when the request itself was in range.
#[quickcheck]
fn out_of_range_delete_clamps(steps: Vec<Step>, pos_byte: u8, overshoot: u8) -> bool {
    let (mut t, model, _, _) = apply_steps(&steps);
    if model.is_empty() {
        return true;
    }
    let pos = pos_byte as u64 % model.len() as u64;
    let remaining = model.len() as u64 - pos;
    let requested = remaining + overshoot as u64 + 1;

    t.delete(pos, requested);
    t.len() == pos
}

#[test]
fn deep_randomized_trace_holds_every_invariant() {
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    let mut rng = StdRng::seed_from_u64(0xFACADE);
    let mut t = SliceTable::new();
    let mut model: Vec<u8> = Vec::new();
    let mut inserted_newlines = 0i64;
    let mut deleted_newlines = 0i64;

    for _ in 0..5_000 {
        if model.is_empty() || rng.gen_bool(0.55) {
            let pos = rng.gen_range(0..=model.len());
            let len = rng.gen_range(1..=32);
            let data: Vec<u8> = (0..len)
                .map(|_| if rng.gen_bool(0.1) { b'\n' } else { rng.gen_range(b'a'..=b'z') })
                .collect();
            inserted_newlines += t.insert(pos as u64, &data) as i64;
            model.splice(pos..pos, data.iter().copied());
        } else {
            let pos = rng.gen_range(0..model.len());
            let len = rng.gen_range(1..=32).min(model.len() - pos);
            deleted_newlines += t.delete(pos as u64, len as u64) as i64;
            model.drain(pos..pos + len);
        }
        assert!(t.check_invariants());
        assert_eq!(t.len(), model.len() as u64);
    }

    assert_eq!(dump_bytes(&t), model);
    assert_eq!(inserted_newlines - deleted_newlines, count_newlines(&model) as i64);
}
