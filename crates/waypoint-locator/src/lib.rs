//! Locator - parser for compact `dimension:value` queries.
//!
//! A locator is the textual query a caller passes to a finder. It is either
//! a single unnamed value or a comma separated list of dimensions:
//!
//! ```text
//! MyProject
//! project:MyProject,state:finished,count:10
//! project:(id:p1,archived:false),start:20
//! ```
//!
//! Values containing `,` `:` `(` or `)` are wrapped in parentheses, which
//! also makes them usable as nested locators. Values whose parentheses do not
//! balance are written as `$base64:<url-safe base64>`; see [`escape_value`].
//!
//! # Example
//!
//! ```rust
//! use waypoint_locator::{Locator, LocatorError};
//!
//! let mut locator = Locator::parse("name:web,bogus:1").unwrap();
//! locator.add_supported_dimensions(["name"]);
//! assert_eq!(locator.single_dimension_value("name").as_deref(), Some("web"));
//!
//! // `bogus` was never read, so the locator is rejected.
//! let err = locator.check_fully_processed().unwrap_err();
//! assert!(matches!(err, LocatorError::UnusedDimensions { .. }));
//! ```

mod compose;
mod error;
mod escape;
mod locator;
mod parser;

pub use compose::{set_dimension_if_not_present, string_locator};
pub use error::{LocatorError, Result};
pub use escape::{escape_value, BASE64_PREFIX};
pub use locator::{parse_boolean, parse_long, Locator, ANY_VALUE};
pub use parser::is_valid_dimension_name;
