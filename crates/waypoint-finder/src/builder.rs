//! Declarative finder assembly.
//!
//! [`TypedFinderBuilder`] is a registration table: each entry pairs a
//! [`Dimension`] descriptor with what the finder does with its value.
//!
//! - `filter` / `equals*`: an inclusion predicate (AND-ed with the others);
//! - `stop_when`: an early-stop predicate for ordered sources;
//! - `producer`: a cheaper source of candidates, used instead of the full
//!   item universe when this is the first registered dimension present;
//! - `key`: a direct lookup tried before any scan.
//!
//! ```
//! use waypoint_finder::{Dimension, RequestContext, TypedFinderBuilder, Finder, ID};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Project { id: i64, name: String }
//!
//! let projects = vec![
//!     Project { id: 1, name: "web".into() },
//!     Project { id: 2, name: "api".into() },
//! ];
//! let source = projects.clone();
//! let finder = TypedFinderBuilder::new("project")
//!     .items(move || source.clone())
//!     .dimension(&Dimension::long(ID), |spec| spec.equals(|p: &Project| p.id))
//!     .dimension(&Dimension::string("name"), |spec| spec.equals_str(|p: &Project| &p.name))
//!     .build()
//!     .unwrap();
//!
//! let context = RequestContext::new();
//! let scope = context.enter().unwrap();
//! let found = finder.get_items(&scope, Some("name:api")).unwrap();
//! assert_eq!(found.items, vec![projects[1].clone()]);
//! ```

use std::sync::Arc;

use crate::condition::{ParameterSource, ValueCondition};
use crate::context::RequestScope;
use crate::dimension::{Dimension, LOGIC, PAGING};
use crate::error::{FinderError, Result};
use crate::filter::ItemPredicate;
use crate::finder::TypedFinder;
use crate::settings::FinderSettings;

/// Lazily produced candidates.
pub type ItemStream<T> = Box<dyn Iterator<Item = T>>;

pub(crate) type ItemsFn<T> = Arc<dyn Fn() -> ItemStream<T> + Send + Sync>;
pub(crate) type PermissionFn<T> = Arc<dyn Fn(&T, &RequestScope<'_>) -> bool + Send + Sync>;
pub(crate) type CanonicalFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
type CompileFn<T> = Arc<dyn Fn(&str) -> Result<CompiledValue<T>> + Send + Sync>;

type ValuePredicate<T, V> = Arc<dyn Fn(&V, &T) -> bool + Send + Sync>;
type Producer<T, V> = Arc<dyn Fn(&V) -> ItemStream<T> + Send + Sync>;
type KeyLookup<T, V> = Arc<dyn Fn(&V) -> Result<Option<T>> + Send + Sync>;

// ============================================================================
// DimensionSpec
// ============================================================================

/// What a finder does with the value of one dimension.
///
/// Passed to the closure given to [`TypedFinderBuilder::dimension`].
pub struct DimensionSpec<T, V> {
    filter: Option<ValuePredicate<T, V>>,
    stop: Option<ValuePredicate<T, V>>,
    producer: Option<Producer<T, V>>,
    key: Option<KeyLookup<T, V>>,
    description: Option<String>,
}

impl<T: 'static, V: 'static> DimensionSpec<T, V> {
    fn new() -> Self {
        Self {
            filter: None,
            stop: None,
            producer: None,
            key: None,
            description: None,
        }
    }

    /// Sets the inclusion predicate.
    pub fn filter(mut self, predicate: impl Fn(&V, &T) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(predicate));
        self
    }

    /// Includes items whose accessor result equals the dimension value.
    pub fn equals<A>(self, accessor: impl Fn(&T) -> A + Send + Sync + 'static) -> Self
    where
        V: PartialEq<A>,
    {
        self.filter(move |value, item| *value == accessor(item))
    }

    /// Ends the scan at the first item for which the predicate holds.
    ///
    /// That item is neither counted nor included.
    pub fn stop_when(mut self, predicate: impl Fn(&V, &T) -> bool + Send + Sync + 'static) -> Self {
        self.stop = Some(Arc::new(predicate));
        self
    }

    /// Sets a narrower source of candidates for this dimension's value.
    ///
    /// The inclusion predicate still applies to produced items.
    pub fn producer<I>(mut self, producer: impl Fn(&V) -> I + Send + Sync + 'static) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        self.producer = Some(Arc::new(move |value: &V| {
            Box::new(producer(value).into_iter()) as ItemStream<T>
        }));
        self
    }

    /// Sets a direct lookup used on the fast path.
    ///
    /// `Ok(None)` falls through to the scan. Lookups that assume uniqueness
    /// can use [`unique_match`] to report ambiguity.
    pub fn key(mut self, lookup: impl Fn(&V) -> Result<Option<T>> + Send + Sync + 'static) -> Self {
        self.key = Some(Arc::new(lookup));
        self
    }

    /// Overrides the descriptor's description for this finder.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

impl<T: 'static> DimensionSpec<T, String> {
    /// Includes items whose string accessor equals the dimension value.
    pub fn equals_str(self, accessor: impl Fn(&T) -> &str + Send + Sync + 'static) -> Self {
        self.filter(move |value, item| accessor(item) == value.as_str())
    }
}

impl<T: 'static> DimensionSpec<T, Option<bool>> {
    /// Includes items whose flag equals the dimension value; `any` includes
    /// every item.
    pub fn flag(self, accessor: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.filter(move |value, item| value.map_or(true, |wanted| accessor(item) == wanted))
    }
}

impl<T: 'static> DimensionSpec<T, ValueCondition> {
    /// Includes items whose optional string accessor satisfies the condition.
    pub fn condition(self, accessor: impl Fn(&T) -> Option<&str> + Send + Sync + 'static) -> Self {
        self.filter(move |condition, item| condition.matches(accessor(item)))
    }
}

impl<T: 'static> DimensionSpec<T, crate::condition::ParameterCondition> {
    /// Includes items whose parameters satisfy the condition.
    pub fn parameters<P>(self, accessor: impl Fn(&T) -> &P + Send + Sync + 'static) -> Self
    where
        P: ParameterSource + ?Sized + 'static,
    {
        self.filter(move |condition, item| condition.matches(accessor(item)))
    }
}

// ============================================================================
// Type-erased registration
// ============================================================================

/// One registered dimension with its value type erased.
pub(crate) struct RegisteredDimension<T> {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) has_filter: bool,
    pub(crate) has_producer: bool,
    pub(crate) has_key: bool,
    pub(crate) has_stop: bool,
    pub(crate) compile: CompileFn<T>,
}

/// The behaviors of one parsed dimension value.
pub(crate) struct CompiledValue<T> {
    pub(crate) include: Option<ItemPredicate<T>>,
    pub(crate) stop: Option<ItemPredicate<T>>,
    pub(crate) produce: Option<Box<dyn FnOnce() -> ItemStream<T>>>,
    pub(crate) lookup: Option<Box<dyn FnOnce() -> Result<Option<T>>>>,
}

fn erase<T, V>(dimension: &Dimension<V>, spec: DimensionSpec<T, V>) -> RegisteredDimension<T>
where
    T: 'static,
    V: Send + Sync + 'static,
{
    let parser = dimension.parser();
    let DimensionSpec {
        filter,
        stop,
        producer,
        key,
        description,
    } = spec;
    let (has_filter, has_producer, has_key) = (filter.is_some(), producer.is_some(), key.is_some());
    let has_stop = stop.is_some();

    let compile = move |raw: &str| -> Result<CompiledValue<T>> {
        let value = Arc::new(parser(raw)?);
        Ok(CompiledValue {
            include: filter.clone().map(|f| {
                let value = Arc::clone(&value);
                Box::new(move |item: &T| f(&*value, item)) as ItemPredicate<T>
            }),
            stop: stop.clone().map(|f| {
                let value = Arc::clone(&value);
                Box::new(move |item: &T| f(&*value, item)) as ItemPredicate<T>
            }),
            produce: producer.clone().map(|p| {
                let value = Arc::clone(&value);
                Box::new(move || p(&*value)) as Box<dyn FnOnce() -> ItemStream<T>>
            }),
            lookup: key.clone().map(|k| {
                let value = Arc::clone(&value);
                Box::new(move || k(&*value)) as Box<dyn FnOnce() -> Result<Option<T>>>
            }),
        })
    };

    RegisteredDimension {
        name: dimension.name().to_string(),
        description: description.or_else(|| dimension.describe().map(str::to_string)),
        hidden: dimension.is_hidden(),
        has_filter,
        has_producer,
        has_key,
        has_stop,
        compile: Arc::new(compile),
    }
}

// ============================================================================
// TypedFinderBuilder
// ============================================================================

/// Builder for [`TypedFinder`].
pub struct TypedFinderBuilder<T> {
    name: String,
    items: Option<ItemsFn<T>>,
    dimensions: Vec<RegisteredDimension<T>>,
    single_value_as: Option<String>,
    defaults: Vec<(String, String)>,
    permission: Option<PermissionFn<T>>,
    canonical: Option<CanonicalFn<T>>,
    logic: bool,
    settings: FinderSettings,
}

impl<T: 'static> TypedFinderBuilder<T> {
    /// Starts a finder; `name` appears in logs and errors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: None,
            dimensions: Vec::new(),
            single_value_as: None,
            defaults: Vec::new(),
            permission: None,
            canonical: None,
            logic: false,
            settings: FinderSettings::default(),
        }
    }

    /// Sets the item universe scanned when no producer applies.
    pub fn items<I>(mut self, items: impl Fn() -> I + Send + Sync + 'static) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        self.items = Some(Arc::new(move || Box::new(items().into_iter()) as ItemStream<T>));
        self
    }

    /// Registers a dimension. Registration order is the priority order for
    /// key lookups and producers.
    pub fn dimension<V>(
        mut self,
        dimension: &Dimension<V>,
        configure: impl FnOnce(DimensionSpec<T, V>) -> DimensionSpec<T, V>,
    ) -> Self
    where
        V: Send + Sync + 'static,
    {
        let spec = configure(DimensionSpec::new());
        self.dimensions.push(erase(dimension, spec));
        self
    }

    /// Reads a single value locator `X` as `name:X`.
    pub fn single_value_as(mut self, name: impl Into<String>) -> Self {
        self.single_value_as = Some(name.into());
        self
    }

    /// Adds `name:value` to every dimension locator that lacks `name`.
    ///
    /// Injected dimensions are hidden: they are not rendered and never
    /// reported as unused.
    pub fn default_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.push((name.into(), value.into()));
        self
    }

    /// Restricts every result to items the predicate permits.
    pub fn permission(
        mut self,
        permitted: impl Fn(&T, &RequestScope<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.permission = Some(Arc::new(permitted));
        self
    }

    /// Sets how an item's canonical locator is rendered.
    pub fn canonical_locator(mut self, render: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.canonical = Some(Arc::new(render));
        self
    }

    /// Enables the `and`, `or` and `not` dimensions.
    pub fn with_logic_dimensions(mut self) -> Self {
        self.logic = true;
        self
    }

    /// Replaces the settings.
    pub fn settings(mut self, settings: FinderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validates the registrations and builds the finder.
    pub fn build(self) -> Result<TypedFinder<T>> {
        let items = self.items.ok_or_else(|| {
            FinderError::internal(format!("finder '{}' has no item source", self.name))
        })?;

        let mut seen: Vec<&str> = PAGING.to_vec();
        if self.logic {
            seen.extend(LOGIC);
        }
        for dimension in &self.dimensions {
            if seen.contains(&dimension.name.as_str()) {
                return Err(FinderError::internal(format!(
                    "dimension '{}' is registered twice in finder '{}'",
                    dimension.name, self.name
                )));
            }
            if !(dimension.has_filter || dimension.has_key || dimension.has_stop) {
                return Err(FinderError::internal(format!(
                    "dimension '{}' of finder '{}' has no filter, key or stop predicate",
                    dimension.name, self.name
                )));
            }
            if dimension.has_producer && !dimension.has_filter {
                return Err(FinderError::internal(format!(
                    "dimension '{}' of finder '{}' has a producer but no filter",
                    dimension.name, self.name
                )));
            }
            seen.push(&dimension.name);
        }

        let registered = |name: &str| self.dimensions.iter().any(|d| d.name == name);
        if let Some(name) = &self.single_value_as {
            if !registered(name) {
                return Err(FinderError::internal(format!(
                    "single value dimension '{name}' is not registered in finder '{}'",
                    self.name
                )));
            }
        }
        if let Some((name, _)) = self.defaults.iter().find(|(name, _)| !registered(name)) {
            return Err(FinderError::internal(format!(
                "default dimension '{name}' is not registered in finder '{}'",
                self.name
            )));
        }

        Ok(TypedFinder {
            name: self.name,
            items,
            dimensions: self.dimensions,
            single_value_as: self.single_value_as,
            defaults: self.defaults,
            permission: self.permission,
            canonical: self.canonical,
            logic: self.logic,
            settings: self.settings,
        })
    }
}

/// Returns the only candidate the predicate accepts.
///
/// `Ok(None)` if there is none, [`FinderError::Ambiguous`] if there are
/// several. `dimension` and `value` only feed the error message.
pub fn unique_match<T, I>(
    candidates: I,
    dimension: &str,
    value: &str,
    predicate: impl Fn(&T) -> bool,
) -> Result<Option<T>>
where
    I: IntoIterator<Item = T>,
{
    let mut matching = candidates.into_iter().filter(|item| predicate(item));
    match matching.next() {
        None => Ok(None),
        Some(first) => match matching.count() {
            0 => Ok(Some(first)),
            more => Err(FinderError::ambiguous(dimension, value, more + 1)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::COUNT;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        id: i64,
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item { id: 1, name: "a".into() },
            Item { id: 2, name: "b".into() },
        ]
    }

    fn base() -> TypedFinderBuilder<Item> {
        TypedFinderBuilder::new("items").items(items)
    }

    #[test]
    fn missing_item_source_is_internal() {
        let err = TypedFinderBuilder::<Item>::new("items").build().unwrap_err();
        assert!(matches!(err, FinderError::Internal(_)));
    }

    #[test]
    fn duplicate_dimension_is_internal() {
        let err = base()
            .dimension(&Dimension::long("id"), |s| s.equals(|i: &Item| i.id))
            .dimension(&Dimension::long("id"), |s| s)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn paging_names_are_reserved() {
        let err = base()
            .dimension(&Dimension::long(COUNT), |s| s)
            .build()
            .unwrap_err();
        assert!(matches!(err, FinderError::Internal(_)));
    }

    #[test]
    fn producer_needs_a_filter() {
        let err = base()
            .dimension(&Dimension::string("name"), |s| s.producer(|_: &String| items()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("producer but no filter"));
    }

    #[test]
    fn dimension_without_behavior_is_internal() {
        let err = base()
            .dimension(&Dimension::long("max"), |s| s)
            .build()
            .unwrap_err();
        assert!(matches!(err, FinderError::Internal(_)));
        assert!(err.to_string().contains("'max'"));

        let stop_only = base()
            .dimension(&Dimension::long("max"), |s| s.stop_when(|max: &i64, i: &Item| i.id > *max))
            .build();
        assert!(stop_only.is_ok());
    }

    #[test]
    fn unknown_single_value_and_default_targets() {
        assert!(base().single_value_as("name").build().is_err());
        assert!(base().default_dimension("name", "a").build().is_err());
    }

    #[test]
    fn unique_match_outcomes() {
        assert_eq!(
            unique_match(items(), "id", "2", |i: &Item| i.id == 2).unwrap(),
            Some(items()[1].clone())
        );
        assert_eq!(unique_match(items(), "id", "9", |i: &Item| i.id == 9).unwrap(), None);
        let err = unique_match(items(), "id", "any", |_: &Item| true).unwrap_err();
        assert!(matches!(err, FinderError::Ambiguous { matches: 2, .. }));
    }
}
