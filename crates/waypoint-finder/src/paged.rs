//! Paged results and pager links.
//!
//! [`PagedSearchResult`] carries the items of one page together with the
//! bounds that produced it. [`PagerData`] turns those bounds into next and
//! previous links for the surrounding API.

use serde::Serialize;
use url::form_urlencoded;
use waypoint_locator::Locator;

use crate::dimension::{COUNT, START};
use crate::filter::RangeLimits;

/// The items found by a finder, with the bounds echoed back.
///
/// A fast path hit is returned unpaged: all bounds are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedSearchResult<T> {
    /// Items of this page, in source order.
    pub items: Vec<T>,

    /// Start offset used for the scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,

    /// Page size used for the scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,

    /// Scan budget used for the scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_limit: Option<u64>,

    /// The scan budget ran out before the page was complete.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub lookup_limit_reached: bool,
}

impl<T> PagedSearchResult<T> {
    /// Creates a result echoing the given bounds.
    pub fn new(items: Vec<T>, limits: RangeLimits) -> Self {
        Self {
            items,
            start: limits.start,
            count: limits.count,
            lookup_limit: limits.lookup_limit,
            lookup_limit_reached: false,
        }
    }

    /// Creates a result with no paging metadata.
    pub fn unpaged(items: Vec<T>) -> Self {
        Self::new(items, RangeLimits::unbounded())
    }

    /// Creates an unpaged result holding one item.
    pub fn single(item: T) -> Self {
        Self::unpaged(vec![item])
    }

    /// Records whether the scan budget cut the scan short.
    pub fn with_lookup_limit_reached(mut self, reached: bool) -> Self {
        self.lookup_limit_reached = reached;
        self
    }

    /// Returns `true` if any bound was applied.
    pub fn is_paged(&self) -> bool {
        self.start.is_some() || self.count.is_some() || self.lookup_limit.is_some()
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the page is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consumes the result, returning the items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Pager links with `start` and `count` as query parameters.
    pub fn pager(&self, base_href: &str) -> PagerData {
        PagerData::new(base_href, self.start, self.count, self.items.len())
    }

    /// Pager links with `start` and `count` set inside the locator held by
    /// the query parameter `param`.
    pub fn locator_pager(&self, base_href: &str, param: &str) -> PagerData {
        PagerData::with_locator(base_href, param, self.start, self.count, self.items.len())
    }
}

impl<T> IntoIterator for PagedSearchResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// ============================================================================
// PagerData
// ============================================================================

/// Navigation links for a page.
///
/// # Example
///
/// ```
/// use waypoint_finder::PagerData;
///
/// let pager = PagerData::new("/x", Some(3), Some(2), 2);
/// assert_eq!(pager.next_href.as_deref(), Some("/x?start=5&count=2"));
/// assert_eq!(pager.prev_href.as_deref(), Some("/x?start=1&count=2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerData {
    /// The link of the current page.
    pub href: String,

    /// The next page, present only when this page is full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_href: Option<String>,

    /// The previous page, present when this page does not start at zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_href: Option<String>,
}

/// Where page bounds are written in a link.
#[derive(Debug, Clone, Copy)]
enum PageParams<'a> {
    Query,
    Locator(&'a str),
}

impl PagerData {
    /// Computes links that carry `start` and `count` as query parameters.
    ///
    /// `current` is the number of items actually on this page.
    pub fn new(base_href: &str, start: Option<u64>, count: Option<u64>, current: usize) -> Self {
        Self::build(base_href, PageParams::Query, start, count, current)
    }

    /// Computes links that carry `start` and `count` as dimensions of the
    /// locator in query parameter `param`.
    ///
    /// Falls back to plain query parameters when the existing locator is a
    /// single value or cannot be parsed.
    pub fn with_locator(
        base_href: &str,
        param: &str,
        start: Option<u64>,
        count: Option<u64>,
        current: usize,
    ) -> Self {
        Self::build(base_href, PageParams::Locator(param), start, count, current)
    }

    fn build(
        base_href: &str,
        params: PageParams<'_>,
        start: Option<u64>,
        count: Option<u64>,
        current: usize,
    ) -> Self {
        let start = start.unwrap_or(0);
        let next = match count {
            Some(count) if count > 0 && current as u64 >= count => {
                Some((start.saturating_add(count), count))
            }
            _ => None,
        };
        let prev = if start == 0 {
            None
        } else {
            Some(match count {
                Some(count) => (start.saturating_sub(count), count.min(start)),
                None => (0, start),
            })
        };
        let link = |(start, count): (u64, u64)| page_href(base_href, params, start, count);
        Self {
            href: base_href.to_string(),
            next_href: next.map(link),
            prev_href: prev.map(link),
        }
    }
}

fn page_href(base_href: &str, params: PageParams<'_>, start: u64, count: u64) -> String {
    let (without_fragment, fragment) = match base_href.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (base_href, None),
    };
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    let pairs = match params {
        PageParams::Locator(param) => match with_locator_bounds(&pairs, param, start, count) {
            Some(pairs) => pairs,
            None => {
                tracing::debug!(
                    href = base_href,
                    param,
                    "locator cannot carry page bounds, using query parameters"
                );
                with_query_bounds(pairs, start, count)
            }
        },
        PageParams::Query => with_query_bounds(pairs, start, count),
    };

    let mut href = path.to_string();
    if !pairs.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&pairs)
            .finish();
        href.push('?');
        href.push_str(&query);
    }
    if let Some(fragment) = fragment {
        href.push('#');
        href.push_str(fragment);
    }
    href
}

fn with_query_bounds(pairs: Vec<(String, String)>, start: u64, count: u64) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = pairs
        .into_iter()
        .filter(|(name, _)| name != START && name != COUNT)
        .collect();
    pairs.push((START.to_string(), start.to_string()));
    pairs.push((COUNT.to_string(), count.to_string()));
    pairs
}

fn with_locator_bounds(
    pairs: &[(String, String)],
    param: &str,
    start: u64,
    count: u64,
) -> Option<Vec<(String, String)>> {
    let mut locator = match pairs.iter().rev().find(|(name, _)| name == param) {
        Some((_, text)) => Locator::parse(text).ok()?,
        None => Locator::empty(),
    };
    if locator.is_single_value() {
        return None;
    }
    locator.set_dimension(START, start.to_string());
    locator.set_dimension(COUNT, count.to_string());
    let rendered = locator.to_string();

    let mut pairs: Vec<_> = pairs
        .iter()
        .filter(|(name, _)| name != param)
        .cloned()
        .collect();
    pairs.push((param.to_string(), rendered));
    Some(pairs)
}
