//! The filter primitive: per-item inclusion plus two independent bounds.
//!
//! A filter decides which items are included and how far a scan may go:
//!
//! - the **page window** (`start`, `count`) counts only included items;
//! - the **scan budget** (`lookup_limit`) counts every examined item.
//!
//! [`CheckerFilter`] AND-composes item predicates. [`ProxyFilter`] keeps the
//! bounds of an inner filter and replaces its inclusion test.

use std::fmt;

/// Predicate over an item, as stored by [`CheckerFilter`].
pub type ItemPredicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Page window and scan budget of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeLimits {
    /// Number of matching items to skip.
    pub start: Option<u64>,
    /// Maximum number of items to return; `None` means unbounded.
    pub count: Option<u64>,
    /// Maximum number of items to examine; `None` means unbounded.
    pub lookup_limit: Option<u64>,
}

impl RangeLimits {
    /// No bounds at all.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Sets the start offset.
    pub fn start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the page size.
    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the scan budget.
    pub fn lookup_limit(mut self, limit: u64) -> Self {
        self.lookup_limit = Some(limit);
        self
    }

    /// The effective start offset.
    pub fn effective_start(&self) -> u64 {
        self.start.unwrap_or(0)
    }

    /// Returns `true` if the `matched`-th included item (zero based) falls in
    /// the page window.
    pub fn is_included_by_range(&self, matched: u64) -> bool {
        let start = self.effective_start();
        if matched < start {
            return false;
        }
        match self.count {
            Some(count) => matched - start < count,
            None => true,
        }
    }

    /// Returns `true` while fewer than `start + count` items have matched.
    pub fn is_page_open(&self, matched: u64) -> bool {
        match self.count {
            Some(count) => matched < self.effective_start().saturating_add(count),
            None => true,
        }
    }

    /// Returns `true` while the page is not full and the scan budget is not
    /// exhausted.
    pub fn is_below_upper_range_limit(&self, matched: u64, processed: u64) -> bool {
        let page_open = self.is_page_open(matched);
        let budget_left = match self.lookup_limit {
            Some(limit) => processed < limit,
            None => true,
        };
        page_open && budget_left
    }
}

/// Runtime predicate plus pagination and scan bounds.
pub trait Filter<T> {
    /// The page window and scan budget.
    fn limits(&self) -> RangeLimits;

    /// Returns `true` if the item passes every predicate.
    fn is_included(&self, item: &T) -> bool;

    /// Returns `true` if the scan should end before this item.
    ///
    /// Used when candidates are ordered and a boundary has been crossed.
    fn should_stop(&self, _item: &T) -> bool {
        false
    }

    /// See [`RangeLimits::is_included_by_range`].
    fn is_included_by_range(&self, matched: u64) -> bool {
        self.limits().is_included_by_range(matched)
    }

    /// See [`RangeLimits::is_below_upper_range_limit`].
    fn is_below_upper_range_limit(&self, matched: u64, processed: u64) -> bool {
        self.limits().is_below_upper_range_limit(matched, processed)
    }
}

impl<T, F: Filter<T> + ?Sized> Filter<T> for &F {
    fn limits(&self) -> RangeLimits {
        (**self).limits()
    }

    fn is_included(&self, item: &T) -> bool {
        (**self).is_included(item)
    }

    fn should_stop(&self, item: &T) -> bool {
        (**self).should_stop(item)
    }
}

impl<T, F: Filter<T> + ?Sized> Filter<T> for Box<F> {
    fn limits(&self) -> RangeLimits {
        (**self).limits()
    }

    fn is_included(&self, item: &T) -> bool {
        (**self).is_included(item)
    }

    fn should_stop(&self, item: &T) -> bool {
        (**self).should_stop(item)
    }
}

// ============================================================================
// CheckerFilter
// ============================================================================

/// A filter that AND-composes item predicates.
///
/// An empty filter includes everything. Predicates run in registration
/// order and evaluation stops at the first one that fails.
///
/// # Example
///
/// ```
/// use waypoint_finder::{CheckerFilter, Filter, RangeLimits};
///
/// let filter = CheckerFilter::new(RangeLimits::unbounded().count(10))
///     .check(|n: &i32| *n > 0)
///     .check(|n: &i32| n % 2 == 0);
///
/// assert!(filter.is_included(&4));
/// assert!(!filter.is_included(&3));
/// assert!(!filter.is_included(&-2));
/// ```
pub struct CheckerFilter<T> {
    limits: RangeLimits,
    checkers: Vec<ItemPredicate<T>>,
    stoppers: Vec<ItemPredicate<T>>,
}

impl<T> CheckerFilter<T> {
    /// Creates a filter with the given bounds and no predicates.
    pub fn new(limits: RangeLimits) -> Self {
        Self {
            limits,
            checkers: Vec::new(),
            stoppers: Vec::new(),
        }
    }

    /// Adds an inclusion predicate.
    pub fn check(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.checkers.push(Box::new(predicate));
        self
    }

    /// Adds an early-stop predicate.
    pub fn stop_when(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.stoppers.push(Box::new(predicate));
        self
    }

    /// Adds an already boxed inclusion predicate.
    pub fn add_checker(&mut self, predicate: ItemPredicate<T>) {
        self.checkers.push(predicate);
    }

    /// Adds an already boxed early-stop predicate.
    pub fn add_stopper(&mut self, predicate: ItemPredicate<T>) {
        self.stoppers.push(predicate);
    }

    /// Replaces the bounds.
    pub fn set_limits(&mut self, limits: RangeLimits) {
        self.limits = limits;
    }

    /// Number of inclusion predicates.
    pub fn checker_count(&self) -> usize {
        self.checkers.len()
    }
}

impl<T> Filter<T> for CheckerFilter<T> {
    fn limits(&self) -> RangeLimits {
        self.limits
    }

    fn is_included(&self, item: &T) -> bool {
        self.checkers.iter().all(|check| check(item))
    }

    fn should_stop(&self, item: &T) -> bool {
        self.stoppers.iter().any(|stop| stop(item))
    }
}

impl<T> fmt::Debug for CheckerFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerFilter")
            .field("limits", &self.limits)
            .field("checkers", &self.checkers.len())
            .field("stoppers", &self.stoppers.len())
            .finish()
    }
}

// ============================================================================
// ProxyFilter
// ============================================================================

/// Wraps a filter, keeping its bounds and early stop but deciding inclusion
/// itself.
///
/// The inclusion closure receives the inner filter so it can delegate:
///
/// ```
/// use waypoint_finder::{CheckerFilter, Filter, ProxyFilter, RangeLimits};
///
/// let inner = CheckerFilter::new(RangeLimits::unbounded()).check(|n: &i32| *n > 0);
/// let visible = ProxyFilter::new(inner, |inner: &CheckerFilter<i32>, n: &i32| {
///     *n != 7 && inner.is_included(n)
/// });
/// assert!(visible.is_included(&3));
/// assert!(!visible.is_included(&7));
/// ```
pub struct ProxyFilter<F, P> {
    inner: F,
    include: P,
}

impl<F, P> ProxyFilter<F, P> {
    /// Wraps `inner` with a new inclusion test.
    pub fn new(inner: F, include: P) -> Self {
        Self { inner, include }
    }

    /// The wrapped filter.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<T, F, P> Filter<T> for ProxyFilter<F, P>
where
    F: Filter<T>,
    P: Fn(&F, &T) -> bool,
{
    fn limits(&self) -> RangeLimits {
        self.inner.limits()
    }

    fn is_included(&self, item: &T) -> bool {
        (self.include)(&self.inner, item)
    }

    fn should_stop(&self, item: &T) -> bool {
        self.inner.should_stop(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_window_with_count() {
        let limits = RangeLimits::unbounded().start(3).count(2);
        assert!(!limits.is_included_by_range(2));
        assert!(limits.is_included_by_range(3));
        assert!(limits.is_included_by_range(4));
        assert!(!limits.is_included_by_range(5));
    }

    #[test]
    fn range_window_without_count() {
        let limits = RangeLimits::unbounded().start(2);
        assert!(!limits.is_included_by_range(1));
        assert!(limits.is_included_by_range(1_000));
    }

    #[test]
    fn upper_limit_page_and_budget() {
        let limits = RangeLimits::unbounded().start(1).count(2).lookup_limit(5);
        assert!(limits.is_below_upper_range_limit(2, 4));
        assert!(!limits.is_below_upper_range_limit(3, 4));
        assert!(!limits.is_below_upper_range_limit(0, 5));
    }

    #[test]
    fn zero_count_is_closed_immediately() {
        let limits = RangeLimits::unbounded().count(0);
        assert!(!limits.is_below_upper_range_limit(0, 0));
        assert!(!limits.is_included_by_range(0));
    }

    #[test]
    fn checker_filter_short_circuits() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let filter = CheckerFilter::new(RangeLimits::unbounded())
            .check(|n: &i32| *n > 0)
            .check(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                true
            });

        assert!(!filter.is_included(&-1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(filter.is_included(&1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_checker_filter_includes_all() {
        let filter: CheckerFilter<i32> = CheckerFilter::new(RangeLimits::unbounded());
        assert!(filter.is_included(&0));
        assert!(!filter.should_stop(&0));
    }

    #[test]
    fn proxy_keeps_bounds_and_stop() {
        let inner = CheckerFilter::new(RangeLimits::unbounded().count(3))
            .stop_when(|n: &i32| *n > 100);
        let proxy = ProxyFilter::new(inner, |_: &CheckerFilter<i32>, n: &i32| n % 2 == 0);
        assert_eq!(proxy.limits().count, Some(3));
        assert!(proxy.should_stop(&101));
        assert!(proxy.is_included(&2));
        assert!(!proxy.is_included(&3));
    }
}
