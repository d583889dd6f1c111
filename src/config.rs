//! Configuration for request capture.
//!
//! This module provides the `InspectConfig` builder for customizing
//! capture behavior.

use std::collections::HashSet;

/// Configuration for an [`InspectedClient`](crate::InspectedClient).
///
/// Use the builder pattern to customize behavior:
///
/// ```
/// use reqscope::InspectConfig;
///
/// let config = InspectConfig::new()
///     .capture_stacks(true)            // Record a call-site stack per request
///     .sensitive_header("x-api-key")   // Mask this header in rendered output
///     .max_redirects(5);
/// ```
#[derive(Clone, Debug)]
pub struct InspectConfig {
    /// Whether to capture a call-site stack for every send. Default: false.
    /// Capturing and symbolizing a stack on every call is expensive, so
    /// this is strictly opt-in.
    pub(crate) capture_stacks: bool,

    /// Header names (lowercase) whose values are masked in rendered
    /// request header text.
    pub(crate) sensitive_headers: HashSet<String>,

    /// Maximum redirect hops the default transport will follow. Default: 10.
    pub(crate) max_redirects: usize,

    /// Maximum number of stack frames kept per capture. Default: 16.
    pub(crate) max_stack_frames: usize,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl InspectConfig {
    /// Create a new configuration with default values.
    ///
    /// Defaults:
    /// - Stack capture: disabled
    /// - Sensitive headers: `authorization`
    /// - Max redirects: 10
    /// - Max stack frames: 16
    pub fn new() -> Self {
        let mut sensitive = HashSet::new();
        sensitive.insert("authorization".to_string());

        Self {
            capture_stacks: false,
            sensitive_headers: sensitive,
            max_redirects: 10,
            max_stack_frames: 16,
        }
    }

    /// Enable or disable call-site stack capture.
    pub fn capture_stacks(mut self, capture: bool) -> Self {
        self.capture_stacks = capture;
        self
    }

    /// Add a sensitive header name.
    ///
    /// Values for these headers are replaced with `******` in rendered
    /// request header text. Header names are case-insensitive.
    pub fn sensitive_header(mut self, header: impl Into<String>) -> Self {
        self.sensitive_headers.insert(header.into().to_lowercase());
        self
    }

    /// Set the maximum number of redirect hops the default transport follows.
    pub fn max_redirects(mut self, hops: usize) -> Self {
        self.max_redirects = hops;
        self
    }

    /// Set the maximum number of stack frames kept per capture.
    pub fn max_stack_frames(mut self, frames: usize) -> Self {
        self.max_stack_frames = frames;
        self
    }

    /// Check if a header is sensitive.
    pub(crate) fn is_sensitive_header(&self, name: &str) -> bool {
        self.sensitive_headers.contains(&name.to_lowercase())
    }
}
