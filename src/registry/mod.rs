// src/registry/mod.rs

//! Named resources and their global acquisition order.
//!
//! - [`ResourceRegistry`] hands out [`Resource`]s, each stamped with the next
//!   order index at registration time.
//! - [`lock`] holds the per-resource lock and the RAII [`ResourceGuard`].
//!
//! Order indices start at 0, are never reused and never change, so "acquire
//! in increasing order index" is one total order shared by every task.

pub mod lock;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::errors::{LockstepError, Result};
use lock::ResourceLock;

pub use lock::ResourceGuard;

/// A registered, lockable resource.
///
/// Cheap to clone; all clones share the same lock.
#[derive(Clone)]
pub struct Resource {
    inner: Arc<ResourceInner>,
}

struct ResourceInner {
    name: String,
    order_index: usize,
    lock: ResourceLock,
}

impl Resource {
    fn new(name: String, order_index: usize) -> Self {
        Self {
            inner: Arc::new(ResourceInner {
                name,
                order_index,
                lock: ResourceLock::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Position in the global lock-acquisition order.
    pub fn order_index(&self) -> usize {
        self.inner.order_index
    }

    pub(crate) fn lock(&self) -> &ResourceLock {
        &self.inner.lock
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Resource {}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.inner.name)
            .field("order_index", &self.inner.order_index)
            .finish()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.inner.name, self.inner.order_index)
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_index: usize,
    by_name: HashMap<String, Resource>,
}

/// Maps resource names to locks and assigns order indices.
///
/// All operations go through one short-lived mutex around the counter and
/// the map; it is never held while a resource lock is being waited on.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    inner: Mutex<RegistryInner>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every name in order; the first gets index 0.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for name in names {
            registry.register(name)?;
        }
        Ok(registry)
    }

    fn state(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `name` and assign it the next order index.
    ///
    /// A name can only be registered once; a duplicate does not consume an
    /// index.
    pub fn register(&self, name: impl Into<String>) -> Result<Resource> {
        let name = name.into();
        let mut state = self.state();

        if state.by_name.contains_key(&name) {
            return Err(LockstepError::DuplicateResource(name));
        }

        let resource = Resource::new(name.clone(), state.next_index);
        state.next_index += 1;
        state.by_name.insert(name, resource.clone());

        debug!(
            resource = %resource.name(),
            order_index = resource.order_index(),
            "registered resource"
        );
        Ok(resource)
    }

    pub fn get(&self, name: &str) -> Result<Resource> {
        self.state()
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| LockstepError::NotFound(name.to_string()))
    }

    /// Look up several names, keeping the caller's order.
    ///
    /// No sorting happens here: whether the order is acceptable is for the
    /// scheduler to decide at submission.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Resource>> {
        names.iter().map(|n| self.get(n.as_ref())).collect()
    }

    pub fn len(&self) -> usize {
        self.state().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered resources, sorted by order index.
    pub fn resources(&self) -> Vec<Resource> {
        let mut all: Vec<Resource> = self.state().by_name.values().cloned().collect();
        all.sort_by_key(Resource::order_index);
        all
    }
}
