//! Configuration for new JavaScript contexts.

use crate::class::JscClass;
use crate::group::ContextGroup;

/// Options applied when creating a [`JscContext`](crate::JscContext).
///
/// # Example
///
/// ```no_run
/// use jscore::{ContextGroup, ContextOptions, JscContext};
///
/// let group = ContextGroup::new()?;
/// let ctx = JscContext::with_options(
///     ContextOptions::new()
///         .group(group)
///         .name("worker")
///         .inspectable(true),
/// )?;
/// assert_eq!(ctx.name().as_deref(), Some("worker"));
/// # Ok::<(), jscore::JscError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Group to create the context in.
    /// Default: None (the context gets a group of its own)
    pub group: Option<ContextGroup>,

    /// Class of the global object.
    /// Default: None (a standard global object)
    pub global_class: Option<JscClass>,

    /// Name shown by remote debuggers.
    /// Default: None
    pub name: Option<String>,

    /// Allow remote inspection of the context.
    /// Default: false
    pub inspectable: bool,
}

impl ContextOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the context inside an existing group.
    pub fn group(mut self, group: ContextGroup) -> Self {
        self.group = Some(group);
        self
    }

    /// Use a custom class for the global object.
    pub fn global_class(mut self, class: JscClass) -> Self {
        self.global_class = Some(class);
        self
    }

    /// Set the debugger name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enable or disable remote inspection.
    pub fn inspectable(mut self, enabled: bool) -> Self {
        self.inspectable = enabled;
        self
    }
}
