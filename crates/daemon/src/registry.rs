// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry (C0, §4.9): the daemon's `HashMap<AppName, Arc<Engine>>`, the
//! only state shared across hosted applications. Generic over the isolate
//! and id-generator so tests can drive it with `FakeIsolate`/
//! `SequentialIdGen` the same way `warden-engine`'s own tests do; production
//! use goes through the default type parameters (a real OS process per
//! worker, UUID worker ids).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use warden_adapters::isolate::{Isolate, ProcessIsolate};
use warden_core::{AppDescriptor, AppName, IdGen, UuidIdGen};
use warden_engine::{Engine, EngineInfo, ShutdownMode};

/// The daemon's production engine type: real child processes, UUID worker
/// ids. Most callers only ever need this alias; `Registry<I, G>` stays
/// generic for test-support substitution.
pub type AppEngine = Engine<ProcessIsolate, UuidIdGen>;

/// Owns one engine per hosted application. Apps can be started and queried
/// independently; nothing here shares state across apps beyond this map,
/// mirroring the per-application isolation §1 requires of the core.
pub struct Registry<I: Isolate + 'static = ProcessIsolate, G: IdGen + 'static = UuidIdGen> {
    isolate: Arc<I>,
    id_gen: G,
    engines: Mutex<HashMap<AppName, Arc<Engine<I, G>>>>,
}

impl Registry<ProcessIsolate, UuidIdGen> {
    pub fn new() -> Self {
        Self::with(Arc::new(ProcessIsolate), UuidIdGen)
    }
}

impl Default for Registry<ProcessIsolate, UuidIdGen> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Isolate + 'static, G: IdGen + 'static> Registry<I, G> {
    /// Builds a registry that spawns every hosted app's workers through
    /// `isolate` and names them through `id_gen`; both are shared (cloned,
    /// for `id_gen`) across every app the registry ever starts.
    pub fn with(isolate: Arc<I>, id_gen: G) -> Self {
        Self {
            isolate,
            id_gen,
            engines: Mutex::new(HashMap::new()),
        }
    }

    /// Starts hosting `app`, replacing whatever engine was previously
    /// registered under the same name. The caller is responsible for
    /// `shutdown`-ing a displaced engine first if a clean drain matters;
    /// a config reload typically builds a fresh `Registry` instead.
    pub fn start(&self, app: AppDescriptor) -> Arc<Engine<I, G>> {
        let name = app.name.clone();
        let engine = Engine::start(app, Arc::clone(&self.isolate), self.id_gen.clone());
        self.engines.lock().insert(name, Arc::clone(&engine));
        engine
    }

    pub fn get(&self, name: &AppName) -> Option<Arc<Engine<I, G>>> {
        self.engines.lock().get(name).cloned()
    }

    pub fn names(&self) -> Vec<AppName> {
        self.engines.lock().keys().cloned().collect()
    }

    /// Aggregate `info()` across every hosted app (§4.9's `info_all`); the
    /// control-plane JSON surface that exposes this remains an external
    /// collaborator (§1).
    pub fn info_all(&self) -> HashMap<AppName, EngineInfo> {
        self.engines
            .lock()
            .iter()
            .map(|(name, engine)| (name.clone(), engine.info()))
            .collect()
    }

    /// Shuts down every hosted app. Each `Engine::shutdown` only posts
    /// commands and returns; workers drain asynchronously afterwards.
    pub async fn shutdown_all(&self, mode: ShutdownMode) {
        let engines: Vec<_> = self.engines.lock().values().cloned().collect();
        for engine in engines {
            engine.shutdown(mode).await;
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
