//! Selector profiling for critical CSS extraction.
//!
//! Every selector of a stylesheet is classified as force-kept, force-removed,
//! or reduced to a simpler selector that can be tested against the elements
//! visible in the page's critical viewport.

pub mod error;
pub mod selectors;
pub mod style;

pub use error::{CritselError, Result};
pub use selectors::normalize::{normalize_selector, normalize_selector_text, Classification};
pub use selectors::pattern::{matches_any, Pattern};
pub use selectors::profile::{build_selector_profile, profile_css, ProfileOptions, ProfileSummary, SelectorProfile};
pub use style::owned_css::{NodeId, OwnedStylesheet, SelectorArena, StylesheetBuilder};
pub use style::sheet_css::parse_stylesheet;
