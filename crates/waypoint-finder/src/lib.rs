//! Waypoint finders - locator-driven search over collections of items.
//!
//! A finder resolves a locator such as `project:web,state:finished,count:10`
//! against one kind of item. It supports:
//!
//! - Typed, reusable dimension descriptors ([`Dimension`])
//! - Key dimensions resolved by direct lookup before any scan
//! - Filtered scans bounded by a page window and a scan budget
//! - Producers that narrow the candidates for a dimension value
//! - String conditions with operators ([`ValueCondition`], [`MatchType`])
//! - Optional `and` / `or` / `not` dimensions over nested locators
//! - Paged results with next/previous links ([`PagedSearchResult`], [`PagerData`])
//!
//! # Quick Start
//!
//! ```rust
//! use waypoint_finder::{
//!     unique_match, Dimension, Finder, RequestContext, TypedFinderBuilder, ID,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Build {
//!     id: i64,
//!     branch: String,
//!     personal: bool,
//! }
//!
//! let builds: Arc<Vec<Build>> = Arc::new(
//!     (1..=10)
//!         .map(|id| Build { id, branch: if id % 2 == 0 { "main".into() } else { "dev".into() }, personal: id == 4 })
//!         .collect(),
//! );
//!
//! let all = Arc::clone(&builds);
//! let by_id = Arc::clone(&builds);
//! let finder = TypedFinderBuilder::new("build")
//!     .items(move || all.as_ref().clone())
//!     .dimension(&Dimension::long(ID), |spec| {
//!         spec.equals(|b: &Build| b.id).key(move |id: &i64| {
//!             unique_match(by_id.iter().cloned(), ID, &id.to_string(), |b: &Build| b.id == *id)
//!         })
//!     })
//!     .dimension(&Dimension::string("branch"), |spec| spec.equals_str(|b: &Build| &b.branch))
//!     .dimension(&Dimension::boolean("personal"), |spec| spec.flag(|b: &Build| b.personal))
//!     .default_dimension("personal", "false")
//!     .canonical_locator(|b: &Build| format!("id:{}", b.id))
//!     .build()
//!     .unwrap();
//!
//! let context = RequestContext::new();
//! let scope = context.enter().unwrap();
//!
//! // Fast path: a key lookup.
//! let found = finder.get_items(&scope, Some("id:4")).unwrap();
//! assert_eq!(found.items[0].id, 4);
//!
//! // Slow path: personal builds are hidden by default.
//! let page = finder.get_items(&scope, Some("branch:main,count:2")).unwrap();
//! let ids: Vec<i64> = page.items.iter().map(|b| b.id).collect();
//! assert_eq!(ids, vec![2, 6]);
//! assert_eq!(
//!     page.pager("/builds").next_href.as_deref(),
//!     Some("/builds?start=2&count=2")
//! );
//! ```
//!
//! # Resolution
//!
//! | Locator | Result |
//! |---------|--------|
//! | none | every permitted item, unpaged |
//! | empty text | malformed query |
//! | key dimension found | that item, unpaged |
//! | anything else | filtered scan, echoing `start`, `count`, `lookupLimit` |
//!
//! Dimensions nobody read are always an error, so typos never widen a query.
//!
//! # Logging
//!
//! Resolution emits [`tracing`] events (`debug` for outcomes, `warn` for
//! ignored dimensions). No subscriber is installed by this crate.

mod builder;
mod condition;
mod context;
mod dimension;
mod error;
mod filter;
mod finder;
mod match_type;
mod number;
mod paged;
mod processor;
mod settings;

// Re-export public API
pub use builder::{unique_match, DimensionSpec, ItemStream, TypedFinderBuilder};
pub use condition::{ParameterCondition, ParameterSource, ValueCondition};
pub use context::{RequestContext, RequestScope};
pub use dimension::{
    Dimension, ParseFn, AND, COUNT, ID, LOGIC, LOOKUP_LIMIT, NOT, OR, PAGING, START,
};
pub use error::{ErrorKind, FinderError, Result};
pub use filter::{CheckerFilter, Filter, ItemPredicate, ProxyFilter, RangeLimits};
pub use finder::{DelegatingFinder, DimensionInfo, Finder, TypedFinder};
pub use match_type::{MatchType, UnknownMatchType};
pub use number::Number;
pub use paged::{PagedSearchResult, PagerData};
pub use processor::{apply, FilterItemProcessor, ScanStats};
pub use settings::{ExtraDimensionPolicy, FinderSettings};
pub use waypoint_locator::{Locator, LocatorError};
