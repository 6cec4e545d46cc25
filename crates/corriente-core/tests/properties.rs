//! Property tests for buffer invariants, constraint parsing, and pool
//! namespace rules.

use std::collections::VecDeque;

use proptest::prelude::*;

use corriente_core::{BufferUsage, Constraint, ParamValue, Pool, Real, StreamBuffer};

proptest! {
    /// Whatever interleaving of pushes and consumes happens, a reader sees
    /// exactly the pushed sequence, in order, with no gaps or repeats.
    #[test]
    fn buffer_is_fifo_under_arbitrary_interleaving(
        ops in proptest::collection::vec((any::<bool>(), 1_usize..8), 1..200)
    ) {
        let mut buf: StreamBuffer<u32> = StreamBuffer::new(BufferUsage::SingleFrame);
        let reader = buf.add_reader();
        let mut expected: VecDeque<u32> = VecDeque::new();
        let mut next = 0_u32;

        for (push, count) in ops {
            if push {
                for _ in 0..count {
                    if buf.try_push(next, "out").unwrap() {
                        expected.push_back(next);
                        next += 1;
                    }
                }
            } else {
                let n = count.min(buf.available(reader));
                if n > 0 {
                    let got = buf.read_slice(reader, n).unwrap().to_vec();
                    for v in &got {
                        prop_assert_eq!(*v, expected.pop_front().unwrap());
                    }
                    buf.consume(reader, n);
                }
            }
            // the unconsumed window never exceeds the configured maximum
            prop_assert!(buf.available(reader) <= buf.max_len());
        }
    }

    /// Two readers over one buffer each see the identical full sequence.
    #[test]
    fn readers_are_independent(
        values in proptest::collection::vec(any::<u32>(), 1..16)
    ) {
        let mut buf: StreamBuffer<u32> = StreamBuffer::new(BufferUsage::SingleFrame);
        let a = buf.add_reader();
        let b = buf.add_reader();
        for &v in &values {
            prop_assert!(buf.try_push(v, "out").unwrap());
        }
        let seen_a = buf.read_slice(a, values.len()).unwrap().to_vec();
        buf.consume(a, values.len());
        let seen_b = buf.read_slice(b, values.len()).unwrap().to_vec();
        buf.consume(b, values.len());
        prop_assert_eq!(&seen_a, &values);
        prop_assert_eq!(&seen_b, &values);
    }

    /// Closed-range containment matches plain comparisons for any bounds.
    #[test]
    fn closed_range_agrees_with_comparison(
        lo in -1000.0_f64..1000.0,
        span in 0.0_f64..500.0,
        probe in -2000.0_f32..2000.0,
    ) {
        let hi = lo + span;
        let text = format!("[{lo},{hi}]");
        let constraint = Constraint::parse(&text).unwrap();
        let inside = f64::from(probe) >= lo && f64::from(probe) <= hi;
        prop_assert_eq!(constraint.permits(&ParamValue::Real(probe)), inside);
    }

    /// Descriptors added under distinct namespaces always pass integrity.
    #[test]
    fn disjoint_namespaces_stay_consistent(
        names in proptest::collection::btree_set("[a-z]{1,6}", 1..12)
    ) {
        let pool = Pool::new();
        for (i, name) in names.iter().enumerate() {
            pool.add(&format!("ns{i}.{name}"), i as Real).unwrap();
        }
        pool.check_integrity().unwrap();
        prop_assert_eq!(pool.descriptor_names().len(), names.len());
    }
}
