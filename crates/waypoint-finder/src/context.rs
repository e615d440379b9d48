//! Request-scoped state.
//!
//! A [`RequestContext`] is created once per worker and entered once per
//! request. The returned [`RequestScope`] guard is passed down the resolution
//! call chain; dropping it clears everything stored during the request.
//!
//! ```
//! use waypoint_finder::RequestContext;
//!
//! let context = RequestContext::new();
//! {
//!     let scope = context.enter().unwrap();
//!     scope.set_variable("user", "alice").unwrap();
//!     assert_eq!(scope.variable("user").as_deref(), Some("alice"));
//!     // Nesting is refused while a scope is alive.
//!     assert!(context.enter().is_err());
//! }
//! let scope = context.enter().unwrap();
//! assert_eq!(scope.variable("user"), None);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::error::{FinderError, Result};

/// Holder of per-request state, entered once per request.
#[derive(Debug, Default)]
pub struct RequestContext {
    active: Cell<bool>,
    variables: RefCell<BTreeMap<String, String>>,
    strings: RefCell<HashSet<Arc<str>>>,
}

impl RequestContext {
    /// Creates an idle context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a request.
    ///
    /// Fails if a scope from this context is still alive.
    pub fn enter(&self) -> Result<RequestScope<'_>> {
        if self.active.replace(true) {
            return Err(FinderError::internal(
                "request context entered while another request scope is active",
            ));
        }
        Ok(RequestScope { context: self })
    }

    /// Returns `true` while a scope is alive.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// Guard for one request; see [`RequestContext::enter`].
#[derive(Debug)]
pub struct RequestScope<'a> {
    context: &'a RequestContext,
}

impl RequestScope<'_> {
    /// Stores a variable for the rest of the request.
    ///
    /// Names follow the dimension name rules. Each variable can be set once.
    pub fn set_variable(&self, name: &str, value: impl Into<String>) -> Result<()> {
        if !is_variable_name(name) {
            return Err(FinderError::internal(format!(
                "invalid request variable name '{name}'"
            )));
        }
        let mut variables = self.context.variables.borrow_mut();
        if variables.contains_key(name) {
            return Err(FinderError::internal(format!(
                "request variable '{name}' is already set"
            )));
        }
        variables.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Returns a variable set earlier in this request.
    pub fn variable(&self, name: &str) -> Option<String> {
        self.context.variables.borrow().get(name).cloned()
    }

    /// Returns a shared copy of `text`, reusing an earlier copy made during
    /// this request.
    pub fn intern(&self, text: &str) -> Arc<str> {
        let mut strings = self.context.strings.borrow_mut();
        if let Some(existing) = strings.get(text) {
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(text);
        strings.insert(Arc::clone(&shared));
        shared
    }
}

impl Drop for RequestScope<'_> {
    fn drop(&mut self) {
        self.context.variables.borrow_mut().clear();
        self.context.strings.borrow_mut().clear();
        self.context.active.set(false);
    }
}

fn is_variable_name(name: &str) -> bool {
    waypoint_locator::is_valid_dimension_name(name)
}
