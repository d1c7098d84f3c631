// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::AuthGate;
use crate::store::InMemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub auth: Arc<AuthGate>,
}

impl AppState {
    pub fn new(auth: AuthGate) -> Self {
        Self {
            store: Arc::new(RwLock::new(InMemoryStore::new())),
            auth: Arc::new(auth),
        }
    }

    pub fn with_store(mut self, store: InMemoryStore) -> Self {
        self.store = Arc::new(RwLock::new(store));
        self
    }
}
