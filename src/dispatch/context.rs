//! Shared execution context handed to every unit

use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::exchange::SharedChannel;

/// Type-keyed store of cross-cutting services units may need
#[derive(Default)]
pub struct ServiceMap {
    services: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a service, replacing any earlier one of the same type
    pub fn insert<T: Any + Send + Sync>(&self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let service = self.services.get(&TypeId::of::<T>())?.value().clone();
        service.downcast::<T>().ok()
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMap")
            .field("len", &self.services.len())
            .finish()
    }
}

/// Context for unit execution.
///
/// Units get it by reference and run one after another against the same
/// instance, so nothing in here is owned by a single unit.
#[derive(Debug)]
pub struct ExecutionContext {
    run_id: String,
    project: String,
    channel: Arc<SharedChannel>,
    services: ServiceMap,
}

impl ExecutionContext {
    pub fn new(project: impl Into<String>, channel: Arc<SharedChannel>) -> Self {
        Self {
            run_id: cuid2::create_id(),
            project: project.into(),
            channel,
            services: ServiceMap::new(),
        }
    }

    /// Add a service
    pub fn with_service<T: Any + Send + Sync>(self, service: T) -> Self {
        self.services.insert(Arc::new(service));
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn channel(&self) -> &Arc<SharedChannel> {
        &self.channel
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    /// Shorthand for `services().get::<T>()`
    pub fn service<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services.get::<T>()
    }
}
