//! Streaming application of a [`Filter`] to a candidate sequence.

use serde::Serialize;

use crate::filter::Filter;

/// What happened during one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScanStats {
    /// Candidates examined for inclusion.
    pub processed: u64,
    /// Candidates that passed the filter, inside the page window or not.
    pub matched: u64,
    /// The filter's early-stop predicate ended the scan.
    pub stopped_early: bool,
    /// The scan budget ended the scan while the page was still open and
    /// candidates remained.
    pub lookup_limit_reached: bool,
}

/// Collects the items of a candidate sequence that a filter selects.
///
/// For each candidate, in order:
///
/// 1. stop if the page is full or the scan budget is spent;
/// 2. stop if [`Filter::should_stop`] fires (the candidate is not counted);
/// 3. count the candidate as processed and test inclusion;
/// 4. keep it if its match index falls in the page window.
pub struct FilterItemProcessor<'f, T, F: ?Sized> {
    filter: &'f F,
    items: Vec<T>,
    stats: ScanStats,
}

impl<'f, T, F> FilterItemProcessor<'f, T, F>
where
    F: Filter<T> + ?Sized,
{
    /// Creates a processor for one scan.
    pub fn new(filter: &'f F) -> Self {
        Self {
            filter,
            items: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Feeds one candidate. Returns `false` once the scan is over; later
    /// candidates must not be fed.
    pub fn process_item(&mut self, item: T) -> bool {
        if !self.can_continue() {
            // A candidate is pending, so a spent budget cut the scan.
            if self.budget_cut() {
                self.stats.lookup_limit_reached = true;
            }
            return false;
        }
        if self.filter.should_stop(&item) {
            self.stats.stopped_early = true;
            return false;
        }
        self.stats.processed += 1;
        if self.filter.is_included(&item) {
            if self.filter.is_included_by_range(self.stats.matched) {
                self.items.push(item);
            }
            self.stats.matched += 1;
        }
        true
    }

    fn can_continue(&self) -> bool {
        self.filter
            .is_below_upper_range_limit(self.stats.matched, self.stats.processed)
    }

    /// The budget is spent with the page still open.
    fn budget_cut(&self) -> bool {
        let limits = self.filter.limits();
        limits.is_page_open(self.stats.matched)
            && limits
                .lookup_limit
                .is_some_and(|limit| self.stats.processed >= limit)
    }

    /// Scan statistics so far.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Ends the scan, returning the collected items.
    pub fn finish(self) -> (Vec<T>, ScanStats) {
        (self.items, self.stats)
    }
}

/// Runs a whole scan over `candidates`.
///
/// Candidates past the stopping point are not pulled from the iterator,
/// except one past a spent scan budget to tell whether it cut the scan.
///
/// # Example
///
/// ```
/// use waypoint_finder::{apply, CheckerFilter, RangeLimits};
///
/// let filter = CheckerFilter::new(RangeLimits::unbounded().start(1).count(2))
///     .check(|n: &u32| n % 2 == 0);
/// let (items, stats) = apply(&filter, 1..=10);
/// assert_eq!(items, vec![4, 6]);
/// assert_eq!(stats.processed, 6);
/// ```
pub fn apply<T, F, I>(filter: &F, candidates: I) -> (Vec<T>, ScanStats)
where
    F: Filter<T> + ?Sized,
    I: IntoIterator<Item = T>,
{
    let mut processor = FilterItemProcessor::new(filter);
    let mut candidates = candidates.into_iter();
    // Check the bounds before pulling, so a full page pulls nothing more.
    loop {
        if !processor.can_continue() {
            if processor.budget_cut() && candidates.next().is_some() {
                processor.stats.lookup_limit_reached = true;
            }
            break;
        }
        let Some(item) = candidates.next() else {
            break;
        };
        if !processor.process_item(item) {
            break;
        }
    }
    processor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{CheckerFilter, RangeLimits};
    use std::cell::Cell;

    #[test]
    fn page_window() {
        let filter = CheckerFilter::new(RangeLimits::unbounded().start(3).count(2));
        let (items, stats) = apply(&filter, 1..=10);
        assert_eq!(items, vec![4, 5]);
        assert_eq!(stats.matched, 5);
        assert!(!stats.lookup_limit_reached);
    }

    #[test]
    fn lookup_limit_cuts_scan() {
        let filter = CheckerFilter::new(RangeLimits::unbounded().count(10).lookup_limit(5))
            .check(|n: &u32| *n >= 8);
        let pulled = Cell::new(0);
        let source = (1..=10u32).inspect(|_| pulled.set(pulled.get() + 1));
        let (items, stats) = apply(&filter, source);
        assert!(items.is_empty());
        assert_eq!(stats.processed, 5);
        assert_eq!(pulled.get(), 6);
        assert!(stats.lookup_limit_reached);
    }

    #[test]
    fn budget_matching_the_source_is_not_a_cut() {
        let filter: CheckerFilter<u32> =
            CheckerFilter::new(RangeLimits::unbounded().lookup_limit(5));
        let (items, stats) = apply(&filter, 1..=5);
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert!(!stats.lookup_limit_reached);
    }

    #[test]
    fn page_filled_on_the_last_budgeted_candidate_is_not_a_cut() {
        let filter: CheckerFilter<u32> =
            CheckerFilter::new(RangeLimits::unbounded().count(2).lookup_limit(2));
        let (items, stats) = apply(&filter, 1..=10);
        assert_eq!(items, vec![1, 2]);
        assert!(!stats.lookup_limit_reached);
    }

    #[test]
    fn should_stop_excludes_boundary_item() {
        let filter = CheckerFilter::new(RangeLimits::unbounded()).stop_when(|n: &u32| *n == 4);
        let (items, stats) = apply(&filter, 1..=10);
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(stats.processed, 3);
        assert!(stats.stopped_early);
    }

    #[test]
    fn zero_count_pulls_nothing() {
        let filter: CheckerFilter<u32> = CheckerFilter::new(RangeLimits::unbounded().count(0));
        let pulled = Cell::new(0);
        let source = (1..=10u32).inspect(|_| pulled.set(pulled.get() + 1));
        let (items, stats) = apply(&filter, source);
        assert!(items.is_empty());
        assert_eq!(stats.processed, 0);
        assert_eq!(pulled.get(), 0);
    }

    #[test]
    fn full_page_stops_pulling() {
        let filter: CheckerFilter<u32> = CheckerFilter::new(RangeLimits::unbounded().count(2));
        let pulled = Cell::new(0);
        let source = (1..=10u32).inspect(|_| pulled.set(pulled.get() + 1));
        let (items, _) = apply(&filter, source);
        assert_eq!(items, vec![1, 2]);
        assert_eq!(pulled.get(), 2);
    }

    #[test]
    fn processor_reports_end_of_scan() {
        let filter: CheckerFilter<u32> = CheckerFilter::new(RangeLimits::unbounded().count(1));
        let mut processor = FilterItemProcessor::new(&filter);
        assert!(processor.process_item(1));
        assert!(!processor.process_item(2));
        assert_eq!(processor.finish().0, vec![1]);
    }
}
