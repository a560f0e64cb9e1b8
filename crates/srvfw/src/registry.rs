// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of remotely reachable server objects.
//!
//! The registry adopts objects at registration and drops them at
//! deregistration; the admin listener only ever borrows. This is the
//! two-party ownership seam between the engine and the transport.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cqc_wire::{Request, Response};
use parking_lot::Mutex;
use thiserror::Error;

/// An object reachable through the admin listener.
#[async_trait]
pub trait RemoteObject: Send + Sync {
    /// Registry key. Also the `object` field of `Request::Query`.
    fn name(&self) -> &str;

    /// Handle one request addressed to this object.
    async fn handle(&self, request: &Request) -> Response;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("An object named {0} is already registered")]
    AlreadyRegistered(String),
}

/// Shared object registry, one per server process.
#[derive(Default)]
pub struct ObjectRegistry {
    objects: Mutex<HashMap<String, Arc<dyn RemoteObject>>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an object under its own name.
    pub fn register(&self, object: Arc<dyn RemoteObject>) -> Result<(), RegistryError> {
        let name = object.name().to_string();
        let mut objects = self.objects.lock();
        if objects.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        objects.insert(name, object);
        Ok(())
    }

    /// Drop an object, returning it to the caller if it was registered.
    pub fn deregister(&self, name: &str) -> Option<Arc<dyn RemoteObject>> {
        self.objects.lock().remove(name)
    }

    /// Borrow an object for a single dispatch.
    pub fn get(&self, name: &str) -> Option<Arc<dyn RemoteObject>> {
        self.objects.lock().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }
}
