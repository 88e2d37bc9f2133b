//! Disposable rendering sessions for pages that only take shape after their
//! scripts run. Extraction code talks to these traits, never to a concrete
//! engine, so the pipeline is testable against a scripted fake.

use std::time::Duration;

use async_trait::async_trait;

use crate::declare::ExtractionError;

pub mod chrome;
#[cfg(test)]
pub mod fake;

/// One isolated page session. Owned exclusively by a single extraction call
/// and thrown away afterwards.
#[async_trait]
pub trait RenderingSession: Send {
    /// Loads the url and waits for the navigation to settle, bounded by the
    /// session's page load timeout.
    async fn navigate(&mut self, url: &str) -> Result<(), ExtractionError>;

    /// Polled wait for the selector, then returns its rendered text with
    /// innerText semantics, so sibling child blocks arrive as separate lines.
    /// Fails with `ElementNotFound` once `timeout` lapses.
    async fn wait_for_text(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<String, ExtractionError>;

    /// Releases the engine behind the session. Safe to call more than once,
    /// later calls are no-ops.
    async fn shutdown(&mut self);
}

/// Builds rendering sessions. Constructed once at startup from settings and
/// injected wherever sessions are needed.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderingSession>, ExtractionError>;
}
