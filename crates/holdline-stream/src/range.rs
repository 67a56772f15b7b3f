//! Range views: borrowed snapshots of a contiguous span of a sequence
//!
//! A view is computed once from (offset, until, covering) and records
//! only index bounds plus the resolved offset and duration. Covering
//! views always contain the run in effect at each requested boundary,
//! possibly extending past the requested span; exact views never extend
//! past it, possibly falling short. The borrow rules make it impossible
//! to hold a view across a mutation of its owner.

use std::fmt;

use holdline_core::{report_fatal, Duration, Fault, Tuple};

use crate::sequence::Sequence;

fn resolve<T>(
    seq: &Sequence<T>,
    offset: Duration,
    until: Duration,
    covering: bool,
) -> (usize, usize, Duration, Duration) {
    if until < offset {
        report_fatal(Fault::contract("range until precedes offset"));
    }
    let runs = seq.runs();
    let len = runs.len();
    if offset >= seq.duration() {
        return (len, len, offset, Duration::ZERO);
    }

    // locate start
    let mut begin = 0;
    let mut reached = Duration::ZERO;
    while begin < len && reached < offset {
        let d = runs[begin].duration();
        if covering && reached + d > offset {
            break;
        }
        reached += d;
        begin += 1;
    }
    if begin == len {
        return (len, len, reached, Duration::ZERO);
    }

    // locate end; the non-covering start scan may already sit past
    // `until`, in which case the remaining span saturates at zero
    let target = if until.is_infinite() {
        Duration::INFINITE
    } else {
        until.checked_sub(reached).unwrap_or(Duration::ZERO)
    };
    let mut end = begin;
    let mut duration = Duration::ZERO;
    while end < len && duration < target {
        let d = runs[end].duration();
        if !covering && duration + d > target {
            break;
        }
        duration += d;
        end += 1;
    }

    (begin, end, reached, duration)
}

/// Read-only snapshot of a contiguous span of a [`Sequence`].
pub struct RangeView<'a, T> {
    seq: &'a Sequence<T>,
    begin: usize,
    end: usize,
    offset: Duration,
    duration: Duration,
}

impl<'a, T> RangeView<'a, T> {
    pub(crate) fn new(seq: &'a Sequence<T>, offset: Duration, until: Duration, covering: bool) -> Self {
        let (begin, end, offset, duration) = resolve(seq, offset, until, covering);
        RangeView {
            seq,
            begin,
            end,
            offset,
            duration,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Resolved start of the view, as consumed duration from the
    /// sequence head.
    #[inline]
    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Resolved duration actually covered by the view.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tuple<T>> {
        self.seq.runs()[self.begin..self.end].iter()
    }

    pub fn front(&self) -> Option<&Tuple<T>> {
        self.seq.runs()[self.begin..self.end].first()
    }
}

impl<T: Clone + PartialEq> RangeView<'_, T> {
    /// Materialize the viewed runs into an owned sequence.
    pub fn to_sequence(&self) -> Sequence<T> {
        self.iter().cloned().collect()
    }
}

impl<T: fmt::Display> fmt::Display for RangeView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}; ", self.offset, self.duration)?;
        if self.is_empty() {
            write!(f, "- ")?;
        } else {
            for run in self.iter() {
                write!(f, "{run}")?;
            }
            write!(f, " ")?;
        }
        write!(f, "}}")
    }
}

/// Mutable snapshot of a contiguous span of a [`Sequence`].
///
/// Adds first-run rewriting and whole-span replacement on top of the
/// read-only surface; every mutation conserves or explicitly propagates
/// duration into the owning sequence's total.
pub struct RangeViewMut<'a, T> {
    seq: &'a mut Sequence<T>,
    begin: usize,
    end: usize,
    offset: Duration,
    duration: Duration,
}

impl<'a, T> RangeViewMut<'a, T> {
    pub(crate) fn new(
        seq: &'a mut Sequence<T>,
        offset: Duration,
        until: Duration,
        covering: bool,
    ) -> Self {
        let (begin, end, offset, duration) = resolve(seq, offset, until, covering);
        RangeViewMut {
            seq,
            begin,
            end,
            offset,
            duration,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    #[inline]
    pub fn offset(&self) -> Duration {
        self.offset
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tuple<T>> {
        self.seq.runs()[self.begin..self.end].iter()
    }

    pub fn front(&self) -> Option<&Tuple<T>> {
        self.seq.runs()[self.begin..self.end].first()
    }

    /// Rewrite the first run's value, keeping its duration.
    pub fn set_front_value(&mut self, value: T) {
        if self.is_empty() {
            report_fatal(Fault::contract("set_front on an empty range"));
        }
        self.seq.run_mut(self.begin).set_value(value);
    }

    /// Replace the first run wholesale.
    ///
    /// The new duration must preserve the finite or infinite nature of
    /// the run; the delta propagates into the owning sequence's total and
    /// this view's resolved duration.
    pub fn set_front_tuple(&mut self, tuple: Tuple<T>) {
        if self.is_empty() {
            report_fatal(Fault::contract("set_front on an empty range"));
        }
        if tuple.is_empty() {
            report_fatal(Fault::contract("set_front duration must be positive"));
        }
        let old = self.seq.runs()[self.begin].duration();
        let new = tuple.duration();
        if old.is_infinite() != new.is_infinite() {
            report_fatal(Fault::contract(
                "set_front must preserve the finite or infinite nature of the run",
            ));
        }
        *self.seq.run_mut(self.begin) = tuple;
        if old.is_infinite() {
            return;
        }
        if new > old {
            let delta = new - old;
            self.seq.grow_total(delta);
            self.duration += delta;
        } else if old > new {
            let delta = old - new;
            self.seq.shrink_total(delta);
            self.duration = self.duration.remaining_after(delta);
        }
    }

    /// Replace the first run's value and duration.
    pub fn set_front(&mut self, value: T, duration: Duration) {
        self.set_front_tuple(Tuple::new(value, duration));
    }

    /// Splice `replacement` over the viewed span.
    ///
    /// The replacement must cover exactly the view's resolved duration;
    /// the view's bounds move onto the new runs.
    pub fn replace(&mut self, replacement: Sequence<T>) {
        if replacement.duration() != self.duration {
            report_fatal(Fault::contract(
                "replacement duration must equal the viewed span",
            ));
        }
        let runs = replacement.into_runs();
        let count = runs.len();
        self.seq.splice_span(self.begin, self.end, runs);
        self.end = self.begin + count;
    }
}

impl<T: fmt::Display> fmt::Display for RangeViewMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}; ", self.offset, self.duration)?;
        if self.is_empty() {
            write!(f, "- ")?;
        } else {
            for run in self.iter() {
                write!(f, "{run}")?;
            }
            write!(f, " ")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn us(micros: u64) -> Duration {
        Duration::from_micros(micros)
    }

    fn seq(runs: &[(char, u64)]) -> Sequence<char> {
        runs.iter().map(|&(v, d)| Tuple::new(v, us(d))).collect()
    }

    #[test]
    fn test_covering_includes_run_active_at_offset() {
        // [(a,3),(b,2)]; covering [2,4) starts inside a
        let s = seq(&[('a', 3), ('b', 2)]);
        let view = s.covering_range(us(2), us(4));
        assert_eq!(view.offset(), us(0));
        assert!(view.duration() >= us(2));
        assert_eq!(*view.front().unwrap().value(), 'a');
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_exact_skips_partially_consumed_run() {
        // [(a,3),(b,2)]; exact [2,4): a starts before 2, so the view
        // begins at b and nothing fits inside the remaining single unit
        let s = seq(&[('a', 3), ('b', 2)]);
        let view = s.range(us(2), us(4));
        assert_eq!(view.offset(), us(3));
        assert!(view.duration() <= us(1));
        assert!(view.is_empty());
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let s = seq(&[('a', 3)]);
        let view = s.covering_range(us(5), us(9));
        assert!(view.is_empty());
        assert_eq!(view.offset(), us(5));
        assert_eq!(view.duration(), Duration::ZERO);
    }

    #[test]
    fn test_aligned_window_is_identical_in_both_modes() {
        let s = seq(&[('a', 3), ('b', 2), ('c', 4)]);
        for view in [s.range(us(3), us(5)), s.covering_range(us(3), us(5))] {
            assert_eq!(view.offset(), us(3));
            assert_eq!(view.duration(), us(2));
            assert_eq!(view.len(), 1);
            assert_eq!(*view.front().unwrap().value(), 'b');
        }
    }

    #[test]
    fn test_covering_overshoots_misaligned_end() {
        let s = seq(&[('a', 3), ('b', 2), ('c', 4)]);
        let view = s.covering_range(us(3), us(6));
        assert_eq!(view.offset(), us(3));
        assert_eq!(view.duration(), us(6));
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_exact_stops_short_of_misaligned_end() {
        let s = seq(&[('a', 3), ('b', 2), ('c', 4)]);
        let view = s.range(us(3), us(6));
        assert_eq!(view.duration(), us(2));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_until_infinite_reads_to_the_end() {
        let s = seq(&[('a', 3), ('b', 2)]);
        let view = s.covering_range(us(0), Duration::INFINITE);
        assert_eq!(view.len(), 2);
        assert_eq!(view.duration(), us(5));
    }

    #[test]
    fn test_covering_includes_infinite_straddler() {
        let mut s = seq(&[('a', 3)]);
        s.push(Tuple::hold('b'));
        let view = s.covering_range(us(1), us(10));
        assert_eq!(view.len(), 2);
        assert!(view.duration().is_infinite());
        let view = s.range(us(3), us(10));
        assert_eq!(view.len(), 0);
        assert_eq!(view.offset(), us(3));
    }

    #[test]
    #[should_panic(expected = "until precedes offset")]
    fn test_until_before_offset_faults() {
        let s = seq(&[('a', 3)]);
        let _ = s.range(us(2), us(1));
    }

    #[test]
    fn test_set_front_value_keeps_duration() {
        let mut s = seq(&[('a', 3), ('b', 2)]);
        let mut view = s.range_mut(us(0), us(3));
        view.set_front_value('z');
        assert_eq!(view.duration(), us(3));
        drop(view);
        assert_eq!(*s.front().unwrap().value(), 'z');
        assert_eq!(s.duration(), us(5));
    }

    #[test]
    fn test_set_front_propagates_growth() {
        // front run of duration 4 rewritten to 6: owner grows by exactly 2
        let mut s = seq(&[('a', 4), ('b', 2)]);
        let mut view = s.range_mut(us(0), us(4));
        view.set_front('z', us(6));
        assert_eq!(view.duration(), us(6));
        drop(view);
        assert_eq!(s.duration(), us(8));
        assert_eq!(s.front().unwrap().duration(), us(6));
    }

    #[test]
    fn test_set_front_propagates_shrink() {
        let mut s = seq(&[('a', 4), ('b', 2)]);
        let mut view = s.range_mut(us(0), us(4));
        view.set_front('z', us(1));
        assert_eq!(view.duration(), us(1));
        drop(view);
        assert_eq!(s.duration(), us(3));
    }

    #[test]
    fn test_set_front_shrink_under_infinite_view() {
        // the view's resolved duration is infinite because of the tail
        // run; shrinking the finite front must leave it infinite
        let mut s = seq(&[('a', 4)]);
        s.push(Tuple::hold('b'));
        let mut view = s.covering_range_mut(us(0), us(10));
        view.set_front('z', us(2));
        assert!(view.duration().is_infinite());
        drop(view);
        assert!(s.duration().is_infinite());
        assert_eq!(s.front().unwrap().duration(), us(2));
    }

    #[test]
    #[should_panic(expected = "finite or infinite nature")]
    fn test_set_front_kind_mismatch_faults() {
        let mut s = seq(&[('a', 4)]);
        let mut view = s.range_mut(us(0), us(4));
        view.set_front_tuple(Tuple::hold('z'));
    }

    #[test]
    fn test_replace_splices_equal_duration() {
        let mut s = seq(&[('a', 3), ('b', 2), ('c', 4)]);
        let mut view = s.range_mut(us(3), us(5));
        let replacement = seq(&[('x', 1), ('y', 1)]);
        view.replace(replacement);
        assert_eq!(view.len(), 2);
        drop(view);
        assert_eq!(s.duration(), us(9));
        let requeried = s.range(us(3), us(5));
        assert_eq!(requeried.duration(), us(2));
        assert_eq!(requeried.len(), 2);
        assert_eq!(*requeried.front().unwrap().value(), 'x');
    }

    #[test]
    #[should_panic(expected = "replacement duration")]
    fn test_replace_duration_mismatch_faults() {
        let mut s = seq(&[('a', 3)]);
        let mut view = s.range_mut(us(0), us(3));
        view.replace(seq(&[('x', 2)]));
    }

    #[test]
    fn test_display() {
        let s = seq(&[('a', 3), ('b', 2)]);
        let view = s.covering_range(us(0), us(5));
        assert_eq!(view.to_string(), "{0us, 5us; (a, 3us)(b, 2us) }");
        let empty = s.range(us(5), us(9));
        assert_eq!(empty.to_string(), "{5us, 0us; - }");
    }

    fn arb_runs() -> impl Strategy<Value = Vec<(u8, u64)>> {
        prop::collection::vec((0u8..4, 1u64..10), 1..12)
    }

    proptest! {
        // covering over [offset, offset+d) resolves at least d whenever
        // the sequence holds at least offset+d
        #[test]
        fn prop_covering_never_undershoots(runs in arb_runs(), offset in 0u64..40, d in 0u64..40) {
            let seq: Sequence<u8> = runs
                .iter()
                .enumerate()
                .map(|(i, &(v, dur))| Tuple::new(if i % 2 == 0 { v } else { v.wrapping_add(17) }, us(dur)))
                .collect();
            let total: u64 = seq.iter().map(|r| r.duration().as_micros()).sum();
            prop_assume!(offset + d <= total);
            let view = seq.covering_range(us(offset), us(offset + d));
            prop_assert!(view.duration() >= us(d));
            // the view starts at or before the requested offset
            prop_assert!(view.offset() <= us(offset));
        }

        // exact views never extend past the request
        #[test]
        fn prop_exact_never_overshoots(runs in arb_runs(), offset in 0u64..40, d in 0u64..40) {
            let seq: Sequence<u8> = runs
                .iter()
                .enumerate()
                .map(|(i, &(v, dur))| Tuple::new(if i % 2 == 0 { v } else { v.wrapping_add(17) }, us(dur)))
                .collect();
            let view = seq.range(us(offset), us(offset + d));
            prop_assert!(view.duration() <= us(d));
            // and never start before it
            prop_assert!(view.offset() >= us(offset));
        }

        // at exact run boundaries the two modes agree: both start at the
        // run whose own start equals the requested offset
        #[test]
        fn prop_modes_agree_on_exact_boundaries(runs in arb_runs(), pick in 0usize..12) {
            let seq: Sequence<u8> = runs
                .iter()
                .enumerate()
                .map(|(i, &(v, dur))| Tuple::new(if i % 2 == 0 { v } else { v.wrapping_add(17) }, us(dur)))
                .collect();
            let mut boundary = 0u64;
            for run in seq.iter().take(pick % (seq.len() + 1)) {
                boundary += run.duration().as_micros();
            }
            let until = boundary + 3;
            let exact = seq.range(us(boundary), us(until));
            let covering = seq.covering_range(us(boundary), us(until));
            prop_assert_eq!(exact.offset(), covering.offset());
            prop_assert_eq!(exact.offset(), us(boundary));
        }
    }
}
