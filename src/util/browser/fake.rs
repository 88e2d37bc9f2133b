use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    declare::ExtractionError,
    util::browser::{RenderingSession, SessionFactory},
};

/// Scripted page served by [`FakeSessionFactory`]. Regions are keyed by the
/// selector a session would wait for; a missing key behaves like a region
/// that never materialized.
#[derive(Clone, Default)]
pub struct FakePage {
    fail_navigate: Option<String>,
    regions: HashMap<String, String>,
}

impl FakePage {
    pub fn with_region(mut self, selector: &str, text: &str) -> Self {
        self.regions.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn failing_navigation(detail: &str) -> Self {
        FakePage {
            fail_navigate: Some(detail.to_string()),
            regions: HashMap::new(),
        }
    }
}

/// Session factory double with open and teardown counters, so tests can
/// assert that every acquired session was released exactly once.
pub struct FakeSessionFactory {
    page: FakePage,
    fail_open: Option<String>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl FakeSessionFactory {
    pub fn new(page: FakePage) -> Self {
        FakeSessionFactory {
            page,
            fail_open: None,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_open(detail: &str) -> Self {
        FakeSessionFactory {
            page: FakePage::default(),
            fail_open: Some(detail.to_string()),
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn open(&self) -> Result<Box<dyn RenderingSession>, ExtractionError> {
        if let Some(detail) = &self.fail_open {
            return Err(ExtractionError::SessionInit(detail.clone()));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(FakeSession {
            page: self.page.clone(),
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct FakeSession {
    page: FakePage,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderingSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ExtractionError> {
        if let Some(detail) = &self.page.fail_navigate {
            return Err(ExtractionError::NavigationTimeout {
                url: url.to_string(),
                detail: detail.clone(),
            });
        }

        Ok(())
    }

    async fn wait_for_text(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<String, ExtractionError> {
        match self.page.regions.get(selector) {
            Some(text) => Ok(text.clone()),
            None => Err(ExtractionError::ElementNotFound {
                selector: selector.to_string(),
                detail: "region never appeared".to_string(),
            }),
        }
    }

    async fn shutdown(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
