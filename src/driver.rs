//! Capability surface supplied by the external browser-automation driver.
//!
//! The core never talks to a browser directly; it consumes these two traits.
//! Selectors are XPath expressions. Element probes return by value: a timeout
//! on an optional element means "absent", not an error. Only the waits the
//! run entry points declare fatal escalate into errors.

use std::time::Duration;

use serde_json::Value;

use crate::error::Result;

/// Quick probe for optional elements.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default wait for required elements.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded wait for the aggregate-rating element; exhausting it is fatal.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(100);

/// One browser tab.
pub trait Page {
    fn goto(&self, url: &str) -> Result<()>;

    /// Handle to the first element matching the selector. Locating is lazy:
    /// the element need not exist until a probe or read forces resolution.
    fn locate(&self, selector: &str) -> Result<Box<dyn Node>>;

    fn fill(&self, selector: &str, text: &str) -> Result<()>;
    fn press(&self, key: &str) -> Result<()>;
    fn scroll_by(&self, dx: i64, dy: i64) -> Result<()>;
    fn set_viewport(&self, width: u32, height: u32) -> Result<()>;

    /// Run a script in the page, e.g. for bottom-of-page detection.
    fn evaluate(&self, script: &str) -> Result<Value>;

    fn sleep(&self, duration: Duration);
}

/// A lazily resolved element handle.
pub trait Node {
    /// First descendant matching the selector.
    fn locate(&self, selector: &str) -> Result<Box<dyn Node>>;

    /// Every descendant matching the selector, in document order.
    fn locate_all(&self, selector: &str) -> Result<Vec<Box<dyn Node>>>;

    /// Non-throwing probe; false on timeout.
    fn is_visible(&self, timeout: Duration) -> bool;

    /// Non-throwing probe; false on timeout.
    fn is_attached(&self, timeout: Duration) -> bool;

    fn text(&self) -> Result<String>;

    /// Inner texts of every match of the selector this handle was built
    /// from, in document order.
    fn all_texts(&self) -> Result<Vec<String>>;

    fn attribute(&self, name: &str) -> Result<Option<String>>;

    fn click(&self, timeout: Duration) -> Result<()>;
}
