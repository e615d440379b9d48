//! Finders: resolving locator text to items.
//!
//! Resolution of a dimension locator runs in two stages:
//!
//! 1. **Fast path.** Each key dimension present with exactly one value is
//!    looked up directly, in registration order. A permitted hit is the
//!    whole answer.
//! 2. **Slow path.** Every present dimension contributes its predicates to
//!    a [`CheckerFilter`], the first dimension with a producer narrows the
//!    candidates, and the candidates are streamed through the filter within
//!    the page window and scan budget.
//!
//! Either way the locator must be fully processed: a dimension no stage
//! read is reported to the caller.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use waypoint_locator::{Locator, LocatorError};

use crate::builder::{CanonicalFn, ItemStream, ItemsFn, PermissionFn, RegisteredDimension};
use crate::context::RequestScope;
use crate::dimension::{AND, COUNT, LOGIC, LOOKUP_LIMIT, NOT, OR, PAGING, START};
use crate::error::{FinderError, Result};
use crate::filter::{CheckerFilter, Filter, ItemPredicate, ProxyFilter, RangeLimits};
use crate::paged::PagedSearchResult;
use crate::processor::apply;
use crate::settings::{ExtraDimensionPolicy, FinderSettings};

/// Resolves locators against one kind of item.
pub trait Finder<T> {
    /// Finds the items a locator selects.
    ///
    /// `None` returns every permitted item, unpaged. Empty text is a
    /// malformed query.
    fn get_items(&self, scope: &RequestScope<'_>, locator: Option<&str>)
        -> Result<PagedSearchResult<T>>;

    /// Finds the first item a locator selects.
    ///
    /// Fails with [`FinderError::NotFound`] when nothing matches.
    fn get_item(&self, scope: &RequestScope<'_>, locator: &str) -> Result<T>;

    /// Builds the filter a locator describes, with its page window and scan
    /// budget. The permission predicate is not part of it.
    fn filter(&self, locator: &mut Locator) -> Result<CheckerFilter<T>>;

    /// Renders a locator that resolves to exactly this item.
    fn canonical_locator(&self, item: &T) -> Result<String>;
}

/// Description of a registered dimension, for help output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionInfo {
    /// Dimension name as written in locators.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Left out of supported dimension lists.
    pub hidden: bool,
}

// ============================================================================
// TypedFinder
// ============================================================================

/// A finder assembled by [`TypedFinderBuilder`](crate::TypedFinderBuilder).
///
/// Immutable once built; share it between requests.
pub struct TypedFinder<T> {
    pub(crate) name: String,
    pub(crate) items: ItemsFn<T>,
    pub(crate) dimensions: Vec<RegisteredDimension<T>>,
    pub(crate) single_value_as: Option<String>,
    pub(crate) defaults: Vec<(String, String)>,
    pub(crate) permission: Option<PermissionFn<T>>,
    pub(crate) canonical: Option<CanonicalFn<T>>,
    pub(crate) logic: bool,
    pub(crate) settings: FinderSettings,
}

enum Source<T> {
    All,
    /// Evaluated only when the scan runs.
    Produced(Box<dyn FnOnce() -> ItemStream<T>>),
    Nothing,
}

struct Composed<T> {
    filter: CheckerFilter<T>,
    source: Source<T>,
}

#[derive(Debug, Clone, Copy)]
enum Logic {
    And,
    Or,
    Not,
}

const LOGIC_DIMENSIONS: [(&str, Logic); 3] = [(AND, Logic::And), (OR, Logic::Or), (NOT, Logic::Not)];

impl<T: 'static> TypedFinder<T> {
    /// The finder name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The settings in effect.
    pub fn settings(&self) -> &FinderSettings {
        &self.settings
    }

    /// The registered dimensions, in registration order.
    pub fn dimensions(&self) -> Vec<DimensionInfo> {
        self.dimensions
            .iter()
            .map(|d| DimensionInfo {
                name: d.name.clone(),
                description: d.description.clone(),
                hidden: d.hidden,
            })
            .collect()
    }

    fn supported_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dimensions
            .iter()
            .filter(|d| !d.hidden)
            .map(|d| d.name.clone())
            .collect();
        names.extend(PAGING.map(String::from));
        if self.logic {
            names.extend(LOGIC.map(String::from));
        }
        names
    }

    fn permitted(&self, item: &T, scope: &RequestScope<'_>) -> bool {
        self.permission
            .as_ref()
            .map_or(true, |permitted| permitted(item, scope))
    }

    fn map_single_value(&self, locator: &mut Locator) {
        if let Some(name) = &self.single_value_as {
            locator.single_value_to_dimension(name);
        }
    }

    /// Single value mapping, hidden defaults and the supported list.
    fn prepare(&self, locator: &mut Locator) {
        self.map_single_value(locator);
        for (name, value) in &self.defaults {
            if locator.set_dimension_if_absent(name, value.as_str()) {
                locator.add_hidden_dimensions([name.as_str()]);
            }
        }
        locator.add_supported_dimensions(self.supported_names());
    }

    fn find_by_key(&self, scope: &RequestScope<'_>, locator: &mut Locator) -> Result<Option<T>> {
        for dimension in self.dimensions.iter().filter(|d| d.has_key) {
            if locator.dimension_value_count(&dimension.name) != 1 {
                continue;
            }
            let Some(raw) = locator.single_dimension_value(&dimension.name) else {
                continue;
            };
            let found = match (dimension.compile)(&raw)?.lookup {
                Some(lookup) => lookup()?,
                None => None,
            };
            match found {
                Some(item) if self.permitted(&item, scope) => {
                    locator.add_ignore_unused_dimensions(PAGING);
                    let extra = locator.unused_dimensions();
                    if !extra.is_empty()
                        && self.settings.extra_key_dimensions == ExtraDimensionPolicy::Warn
                    {
                        tracing::warn!(
                            finder = %self.name,
                            key = %dimension.name,
                            extra = ?extra,
                            "ignoring dimensions given alongside a key"
                        );
                        locator.add_ignore_unused_dimensions(extra);
                    }
                    locator.check_fully_processed()?;
                    tracing::debug!(finder = %self.name, key = %dimension.name, "resolved by key");
                    return Ok(Some(item));
                }
                _ => locator.mark_unused([dimension.name.as_str()]),
            }
        }
        Ok(None)
    }

    fn read_limits(&self, locator: &mut Locator) -> Result<RangeLimits> {
        Ok(RangeLimits {
            start: read_bound(locator, START)?,
            count: read_bound(locator, COUNT)?.or(self.settings.default_count),
            lookup_limit: read_bound(locator, LOOKUP_LIMIT)?.or(self.settings.default_lookup_limit),
        })
    }

    fn compose(&self, locator: &mut Locator, limits: RangeLimits) -> Result<Composed<T>> {
        let mut filter = CheckerFilter::new(limits);
        let mut source = Source::All;

        for dimension in &self.dimensions {
            if !locator.is_dimension_present(&dimension.name) {
                continue;
            }
            let values = locator.dimension_values(&dimension.name);
            if !dimension.has_filter {
                let [value] = values.as_slice() else {
                    return Err(LocatorError::invalid_value(
                        dimension.name.as_str(),
                        values.join(", "),
                        "a single value",
                    )
                    .into());
                };
                let compiled = (dimension.compile)(value)?;
                if let Some(stop) = compiled.stop {
                    filter.add_stopper(stop);
                }
                if dimension.has_key {
                    // The key lookup already missed and there is nothing to scan with.
                    source = Source::Nothing;
                }
                continue;
            }
            let single = values.len() == 1;
            for value in &values {
                let compiled = (dimension.compile)(value)?;
                if let Some(include) = compiled.include {
                    filter.add_checker(include);
                }
                if let Some(stop) = compiled.stop {
                    filter.add_stopper(stop);
                }
                if single && matches!(source, Source::All) {
                    if let Some(produce) = compiled.produce {
                        tracing::trace!(finder = %self.name, producer = %dimension.name, "narrowing candidates");
                        source = Source::Produced(produce);
                    }
                }
            }
        }

        if self.logic {
            for (name, logic) in LOGIC_DIMENSIONS {
                for value in locator.dimension_values(name) {
                    filter.add_checker(self.logic_predicate(logic, &value)?);
                }
            }
        }

        Ok(Composed { filter, source })
    }

    /// Builds the predicate of one `and`/`or`/`not` value.
    fn logic_predicate(&self, logic: Logic, text: &str) -> Result<ItemPredicate<T>> {
        let mut nested = Locator::parse(text)?;
        self.map_single_value(&mut nested);
        nested.add_supported_dimensions(
            self.dimensions
                .iter()
                .filter(|d| d.has_filter && !d.hidden)
                .map(|d| d.name.clone()),
        );
        nested.add_supported_dimensions(LOGIC);

        let mut parts: Vec<ItemPredicate<T>> = Vec::new();
        for dimension in self.dimensions.iter().filter(|d| d.has_filter) {
            for value in nested.dimension_values(&dimension.name) {
                if let Some(include) = (dimension.compile)(&value)?.include {
                    parts.push(include);
                }
            }
        }
        for (name, inner) in LOGIC_DIMENSIONS {
            for value in nested.dimension_values(name) {
                parts.push(self.logic_predicate(inner, &value)?);
            }
        }
        nested.check_fully_processed()?;

        Ok(match logic {
            Logic::And => Box::new(move |item: &T| parts.iter().all(|part| part(item))),
            Logic::Or => Box::new(move |item: &T| parts.iter().any(|part| part(item))),
            Logic::Not => Box::new(move |item: &T| !parts.iter().all(|part| part(item))),
        })
    }

    fn resolve(&self, scope: &RequestScope<'_>, mut locator: Locator) -> Result<PagedSearchResult<T>> {
        self.prepare(&mut locator);
        let limits = self.read_limits(&mut locator)?;
        // An empty page never resolves a key.
        if limits.count != Some(0) {
            if let Some(item) = self.find_by_key(scope, &mut locator)? {
                return Ok(PagedSearchResult::single(item));
            }
        }

        let Composed { filter, source } = self.compose(&mut locator, limits)?;
        locator.check_fully_processed()?;

        let candidates = match source {
            Source::All => (self.items)(),
            Source::Produced(produce) => produce(),
            Source::Nothing => {
                tracing::debug!(finder = %self.name, locator = %locator, "key not found");
                return Ok(PagedSearchResult::new(Vec::new(), limits));
            }
        };
        let permitted = ProxyFilter::new(&filter, |inner: &&CheckerFilter<T>, item: &T| {
            inner.is_included(item) && self.permitted(item, scope)
        });
        let (items, stats) = apply(&permitted, candidates);

        tracing::debug!(
            finder = %self.name,
            locator = %locator,
            processed = stats.processed,
            matched = stats.matched,
            stopped_early = stats.stopped_early,
            lookup_limit_reached = stats.lookup_limit_reached,
            "locator resolved"
        );
        Ok(PagedSearchResult::new(items, limits).with_lookup_limit_reached(stats.lookup_limit_reached))
    }
}

fn read_bound(locator: &mut Locator, name: &str) -> Result<Option<u64>> {
    match locator.single_dimension_value_as_long(name)? {
        None => Ok(None),
        Some(n) => u64::try_from(n).map(Some).map_err(|_| {
            LocatorError::invalid_value(name, n.to_string(), "a non-negative whole number").into()
        }),
    }
}

impl<T: 'static> Finder<T> for TypedFinder<T> {
    fn get_items(
        &self,
        scope: &RequestScope<'_>,
        locator: Option<&str>,
    ) -> Result<PagedSearchResult<T>> {
        let Some(text) = locator else {
            let items: Vec<T> = (self.items)()
                .filter(|item| self.permitted(item, scope))
                .collect();
            tracing::debug!(finder = %self.name, found = items.len(), "no locator, listing all items");
            return Ok(PagedSearchResult::unpaged(items));
        };
        if text.trim().is_empty() {
            return Err(LocatorError::Empty.into());
        }
        self.resolve(scope, Locator::parse(text)?)
    }

    fn get_item(&self, scope: &RequestScope<'_>, locator: &str) -> Result<T> {
        if locator.trim().is_empty() {
            return Err(LocatorError::Empty.into());
        }
        let mut parsed = Locator::parse(locator)?;
        self.map_single_value(&mut parsed);
        if !parsed.is_single_value() {
            parsed.set_dimension(COUNT, "1");
            parsed.add_hidden_dimensions([COUNT]);
        }
        self.resolve(scope, parsed)?
            .into_iter()
            .next()
            .ok_or_else(|| FinderError::not_found(locator))
    }

    fn filter(&self, locator: &mut Locator) -> Result<CheckerFilter<T>> {
        self.prepare(locator);
        let limits = self.read_limits(locator)?;
        let Composed { mut filter, source } = self.compose(locator, limits)?;
        locator.check_fully_processed()?;
        if matches!(source, Source::Nothing) {
            filter.add_checker(Box::new(|_: &T| false));
        }
        Ok(filter)
    }

    fn canonical_locator(&self, item: &T) -> Result<String> {
        match &self.canonical {
            Some(render) => Ok(render(item)),
            None => Err(FinderError::internal(format!(
                "finder '{}' cannot render canonical locators",
                self.name
            ))),
        }
    }
}

impl<T> fmt::Debug for TypedFinder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedFinder")
            .field("name", &self.name)
            .field(
                "dimensions",
                &self.dimensions.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            )
            .field("single_value_as", &self.single_value_as)
            .field("defaults", &self.defaults)
            .field("logic", &self.logic)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DelegatingFinder
// ============================================================================

/// A finder that forwards to another one, set once after construction.
///
/// Lets finders that refer to each other be wired up in any order.
pub struct DelegatingFinder<T> {
    delegate: OnceLock<Arc<dyn Finder<T> + Send + Sync>>,
}

impl<T: 'static> DelegatingFinder<T> {
    /// Creates a finder with no delegate yet.
    pub fn new() -> Self {
        Self {
            delegate: OnceLock::new(),
        }
    }

    /// Sets the delegate. Fails if it was already set.
    pub fn set_delegate(&self, delegate: Arc<dyn Finder<T> + Send + Sync>) -> Result<()> {
        self.delegate
            .set(delegate)
            .map_err(|_| FinderError::internal("finder delegate is already set"))
    }

    /// Returns `true` once the delegate is set.
    pub fn is_set(&self) -> bool {
        self.delegate.get().is_some()
    }

    fn delegate(&self) -> Result<&(dyn Finder<T> + Send + Sync)> {
        self.delegate
            .get()
            .map(|delegate| &**delegate)
            .ok_or_else(|| FinderError::internal("finder delegate is not set"))
    }
}

impl<T: 'static> Default for DelegatingFinder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Finder<T> for DelegatingFinder<T> {
    fn get_items(
        &self,
        scope: &RequestScope<'_>,
        locator: Option<&str>,
    ) -> Result<PagedSearchResult<T>> {
        self.delegate()?.get_items(scope, locator)
    }

    fn get_item(&self, scope: &RequestScope<'_>, locator: &str) -> Result<T> {
        self.delegate()?.get_item(scope, locator)
    }

    fn filter(&self, locator: &mut Locator) -> Result<CheckerFilter<T>> {
        self.delegate()?.filter(locator)
    }

    fn canonical_locator(&self, item: &T) -> Result<String> {
        self.delegate()?.canonical_locator(item)
    }
}

impl<T> fmt::Debug for DelegatingFinder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingFinder")
            .field("set", &self.delegate.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypedFinderBuilder;
    use crate::context::RequestContext;
    use crate::dimension::{Dimension, ID};

    fn numbers() -> TypedFinder<u32> {
        TypedFinderBuilder::new("numbers")
            .items(|| 1..=10u32)
            .dimension(&Dimension::long(ID), |s| s.equals(|n: &u32| i64::from(*n)))
            .dimension(&Dimension::long("min"), |s| {
                s.filter(|min: &i64, n: &u32| i64::from(*n) >= *min)
            })
            .build()
            .unwrap()
    }

    #[test]
    fn filter_carries_bounds() {
        let finder = numbers();
        let mut locator = Locator::parse("min:3,start:1,count:2,lookupLimit:9").unwrap();
        let filter = finder.filter(&mut locator).unwrap();
        assert_eq!(
            filter.limits(),
            RangeLimits::unbounded().start(1).count(2).lookup_limit(9)
        );
        assert!(filter.is_included(&3));
        assert!(!filter.is_included(&2));
    }

    #[test]
    fn producers_run_only_when_scanning() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let finder = TypedFinderBuilder::new("numbers")
            .items(|| 1..=10u32)
            .dimension(&Dimension::long("min"), move |s| {
                s.filter(|min: &i64, n: &u32| i64::from(*n) >= *min)
                    .producer(move |min: &i64| {
                        seen.fetch_add(1, Ordering::SeqCst);
                        (*min as u32)..=10
                    })
            })
            .build()
            .unwrap();

        let mut locator = Locator::parse("min:3").unwrap();
        finder.filter(&mut locator).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let context = RequestContext::new();
        let scope = context.enter().unwrap();
        let found = finder.get_items(&scope, Some("min:8")).unwrap();
        assert_eq!(found.items, vec![8, 9, 10]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn negative_bounds_are_invalid() {
        let context = RequestContext::new();
        let scope = context.enter().unwrap();
        let err = numbers().get_items(&scope, Some("count:-1")).unwrap_err();
        assert!(matches!(
            err,
            FinderError::Locator(LocatorError::InvalidValue { .. })
        ));
    }

    #[test]
    fn missing_canonical_renderer_is_internal() {
        let err = numbers().canonical_locator(&1).unwrap_err();
        assert!(matches!(err, FinderError::Internal(_)));
    }

    #[test]
    fn delegate_must_be_set_exactly_once() {
        let context = RequestContext::new();
        let scope = context.enter().unwrap();
        let delegating = DelegatingFinder::<u32>::new();
        assert!(matches!(
            delegating.get_items(&scope, None),
            Err(FinderError::Internal(_))
        ));

        delegating.set_delegate(Arc::new(numbers())).unwrap();
        assert_eq!(delegating.get_item(&scope, "id:4").unwrap(), 4);
        assert!(delegating.set_delegate(Arc::new(numbers())).is_err());
    }

    #[test]
    fn dimension_info_lists_registrations() {
        let names: Vec<String> = numbers().dimensions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["id", "min"]);
    }
}
