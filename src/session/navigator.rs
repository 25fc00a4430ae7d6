use std::sync::Mutex;

use super::lock_ignoring_poison;

/// Receives route changes the client forces, e.g. the redirect to the login
/// route after a 401.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

#[derive(Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, route: &str) {
        tracing::debug!("Ignoring navigation to {}", route);
    }
}

/// Keeps every route it was sent to
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        lock_ignoring_poison(&self.routes).clone()
    }

    pub fn last(&self) -> Option<String> {
        lock_ignoring_poison(&self.routes).last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        lock_ignoring_poison(&self.routes).push(route.to_string());
    }
}
