//! Base plugin trait definition.
//!
//! Format backends and OCR engines implement [`Plugin`] for identification and
//! lifecycle hooks.

use crate::Result;

/// Base trait shared by every pluggable backend.
///
/// Plugins are `Send + Sync` because one [`Extractor`](crate::Extractor) may be
/// cloned into several threads, each running independent extractions.
///
/// # Example
///
/// ```rust
/// use extractum::plugins::Plugin;
/// use extractum::Result;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct MyPlugin {
///     initialized: AtomicBool,
/// }
///
/// impl Plugin for MyPlugin {
///     fn name(&self) -> &str {
///         "my-plugin"
///     }
///
///     fn version(&self) -> String {
///         "1.0.0".to_string()
///     }
///
///     fn initialize(&self) -> Result<()> {
///         self.initialized.store(true, Ordering::Release);
///         Ok(())
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Unique, whitespace-free identifier (e.g. `"pdf-extractor"`).
    fn name(&self) -> &str;

    /// Semantic version of the plugin.
    fn version(&self) -> String;

    /// Called once when the plugin is registered.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Called when the plugin is removed from a registry.
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        ""
    }
}
