//! An insertion-ordered set of backend adapters (§4.6).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::backend::{Backend, InstallStatus};
use crate::error::HarnessError;

/// Holds a fixed set of backend adapters, keyed by [`Backend::id`].
///
/// Insertion order is preserved (`ids()` returns registration order), and
/// registering the same id twice is rejected rather than silently
/// overwriting the first registration.
#[derive(Default)]
pub struct Registry {
    order: Vec<String>,
    backends: HashMap<String, Arc<dyn Backend>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` under its own [`Backend::id`].
    ///
    /// # Errors
    /// Returns [`HarnessError::DuplicateBackend`] if that id is already
    /// registered.
    pub fn register(&mut self, backend: Arc<dyn Backend>) -> Result<(), HarnessError> {
        let id = backend.id().to_string();
        if self.backends.contains_key(&id) {
            return Err(HarnessError::DuplicateBackend(id));
        }
        self.order.push(id.clone());
        self.backends.insert(id, backend);
        Ok(())
    }

    /// Looks up a backend by id.
    ///
    /// # Errors
    /// Returns [`HarnessError::UnknownBackend`] if no such id was
    /// registered.
    pub fn get(&self, id: &str) -> Result<&Arc<dyn Backend>, HarnessError> {
        self.backends
            .get(id)
            .ok_or_else(|| HarnessError::UnknownBackend(id.to_string()))
    }

    /// Registered backend ids, in registration order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Probes every registered backend's install status concurrently.
    ///
    /// Returns a map keyed by backend id; every registered id is present in
    /// the result regardless of probe outcome.
    pub async fn check_all_install_status(&self) -> HashMap<String, InstallStatus> {
        let mut tasks = JoinSet::new();
        for id in &self.order {
            let id = id.clone();
            let backend = Arc::clone(&self.backends[&id]);
            tasks.spawn(async move { (id, backend.check_install_status().await) });
        }

        let mut results = HashMap::with_capacity(self.order.len());
        while let Some(outcome) = tasks.join_next().await {
            if let Ok((id, status)) = outcome {
                results.insert(id, status);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Invocation;
    use crate::error::HarnessError as Err;
    use crate::query::Query;
    use crate::streamer::{ExitHook, LineParser, ProcessSpec};
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct StubBackend(&'static str);

    #[async_trait]
    impl Backend for StubBackend {
        fn id(&self) -> &str {
            self.0
        }

        fn build_invocation(&self, _query: &Query) -> Result<Invocation, Err> {
            Ok(Invocation {
                process: ProcessSpec {
                    program: PathBuf::from(self.0),
                    args: vec![],
                    cwd: None,
                    env: HashMap::new(),
                },
                cleanup_paths: vec![],
            })
        }

        fn event_handlers(&self, _query: &Query) -> (LineParser, Option<ExitHook>) {
            (Arc::new(|_| vec![]), None)
        }

        async fn check_install_status(&self) -> InstallStatus {
            InstallStatus::Installed { version: None }
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = Registry::new();
        registry.register(Arc::new(StubBackend("claude"))).unwrap();
        let err = registry.register(Arc::new(StubBackend("claude"))).unwrap_err();
        assert!(matches!(err, Err::DuplicateBackend(id) if id == "claude"));
    }

    #[test]
    fn unknown_backend_lookup_errors() {
        let registry = Registry::new();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, Err::UnknownBackend(id) if id == "nope"));
    }

    #[test]
    fn ids_preserve_registration_order() {
        let mut registry = Registry::new();
        registry.register(Arc::new(StubBackend("codex"))).unwrap();
        registry.register(Arc::new(StubBackend("claude"))).unwrap();
        assert_eq!(registry.ids(), ["codex", "claude"]);
    }

    #[tokio::test]
    async fn check_all_install_status_covers_every_registered_id() {
        let mut registry = Registry::new();
        registry.register(Arc::new(StubBackend("codex"))).unwrap();
        registry.register(Arc::new(StubBackend("claude"))).unwrap();
        let statuses = registry.check_all_install_status().await;
        assert_eq!(statuses.len(), 2);
        assert!(matches!(
            statuses["codex"],
            InstallStatus::Installed { .. }
        ));
    }
}
