//! Parser configuration.

/// Default limit on multipart nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options controlling tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum multipart nesting depth; the root is depth 0.
    pub max_depth: usize,
    /// Treat a missing `Content-Type` as `text/plain` instead of failing.
    pub implicit_content_type: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            implicit_content_type: false,
        }
    }
}

impl ParseOptions {
    /// Creates the default options: strict `Content-Type`, depth limit of
    /// [`DEFAULT_MAX_DEPTH`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an options builder.
    #[must_use]
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::new()
    }
}

/// Builder for [`ParseOptions`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptionsBuilder {
    options: ParseOptions,
}

impl ParseOptionsBuilder {
    /// Creates a builder starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = depth;
        self
    }

    /// Sets whether a missing `Content-Type` defaults to `text/plain`.
    #[must_use]
    pub const fn implicit_content_type(mut self, enabled: bool) -> Self {
        self.options.implicit_content_type = enabled;
        self
    }

    /// Builds the options.
    #[must_use]
    pub const fn build(self) -> ParseOptions {
        self.options
    }
}
