//! Provider registry shared between the search path and the login flow

use super::traits::Provider;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("provider {0} is already registered")]
    DuplicateProvider(String),
}

/// Ordered, reader/writer-locked list of active providers.
///
/// The underlying collection never leaves this type: searches take a
/// [`snapshot`](Self::snapshot) and release the lock before calling out.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<Vec<Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider. Names must be unique.
    pub fn add(&self, provider: Arc<dyn Provider>) -> Result<(), RegistryError> {
        let mut providers = self.providers.write();
        if providers.iter().any(|p| p.name() == provider.name()) {
            return Err(RegistryError::DuplicateProvider(
                provider.name().to_string(),
            ));
        }
        providers.push(provider);
        Ok(())
    }

    /// Swap in `provider` at the position of the entry with the same name,
    /// or append it. Returns the replaced provider.
    pub fn replace(&self, provider: Arc<dyn Provider>) -> Option<Arc<dyn Provider>> {
        let mut providers = self.providers.write();
        match providers.iter_mut().find(|p| p.name() == provider.name()) {
            Some(slot) => Some(std::mem::replace(slot, provider)),
            None => {
                providers.push(provider);
                None
            }
        }
    }

    /// Remove the first provider called `name`. Unknown names are ignored.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Provider>> {
        let mut providers = self.providers.write();
        let index = providers.iter().position(|p| p.name() == name)?;
        Some(providers.remove(index))
    }

    /// Copy of the current provider list
    pub fn snapshot(&self) -> Vec<Arc<dyn Provider>> {
        self.providers.read().clone()
    }

    /// Get all provider names in registration order
    pub fn names(&self) -> Vec<String> {
        self.providers
            .read()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}
