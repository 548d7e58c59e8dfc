/// Receiver for coarse render progress.
///
/// The renderer reports an integer percentage in `[0, 100]` plus a short
/// status string. Emissions are bounded (at most one per percent step) and
/// the percentage never decreases, so callers can poll or forward the
/// signal without smoothing it themselves.
pub trait ProgressSink {
    fn emit(&mut self, percent: u8, status: &str);
}

/// Discards all progress updates.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn emit(&mut self, _percent: u8, _status: &str) {}
}

/// Adapter turning a closure into a [`ProgressSink`].
pub struct ProgressFn<F: FnMut(u8, &str)>(pub F);

impl<F: FnMut(u8, &str)> ProgressSink for ProgressFn<F> {
    fn emit(&mut self, percent: u8, status: &str) {
        (self.0)(percent, status);
    }
}

/// Enforces the monotonic, bounded-rate contract on top of a raw sink:
/// repeated or regressing percentages are dropped before they reach it.
pub(crate) struct MonotonicProgress<'a> {
    inner: &'a mut dyn ProgressSink,
    last: i16,
}

impl<'a> MonotonicProgress<'a> {
    pub(crate) fn new(inner: &'a mut dyn ProgressSink) -> Self {
        Self { inner, last: -1 }
    }

    pub(crate) fn emit(&mut self, percent: u8, status: &str) {
        let percent = percent.min(100);
        if i16::from(percent) <= self.last {
            return;
        }
        self.last = i16::from(percent);
        self.inner.emit(percent, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_filter_drops_repeats_and_regressions() {
        let mut seen = Vec::new();
        let mut sink = ProgressFn(|p, _s: &str| seen.push(p));
        let mut mono = MonotonicProgress::new(&mut sink);

        mono.emit(5, "a");
        mono.emit(5, "a");
        mono.emit(3, "b");
        mono.emit(42, "c");
        mono.emit(42, "c");
        mono.emit(100, "done");
        mono.emit(100, "done");

        assert_eq!(seen, vec![5, 42, 100]);
    }

    #[test]
    fn percent_is_capped_at_100() {
        let mut seen = Vec::new();
        let mut sink = ProgressFn(|p, _s: &str| seen.push(p));
        let mut mono = MonotonicProgress::new(&mut sink);
        mono.emit(250, "late");
        assert_eq!(seen, vec![100]);
    }
}
