// Copyright 2026 foyer Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    fmt::Debug,
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{
    runtime::Runtime,
    sync::broadcast,
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::error::{Error, ErrorKind, Result};

/// A wrapper around [`Runtime`] that shuts down the runtime in the background when dropped.
///
/// This is necessary because directly dropping a nested runtime is not allowed in a parent runtime.
pub struct BackgroundShutdownRuntime(ManuallyDrop<Runtime>);

impl Debug for BackgroundShutdownRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BackgroundShutdownRuntime").finish()
    }
}

impl Drop for BackgroundShutdownRuntime {
    fn drop(&mut self) {
        // Safety: The runtime is only dropped once here.
        let runtime = unsafe { ManuallyDrop::take(&mut self.0) };
        runtime.shutdown_background();
    }
}

impl Deref for BackgroundShutdownRuntime {
    type Target = Runtime;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for BackgroundShutdownRuntime {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Runtime> for BackgroundShutdownRuntime {
    fn from(runtime: Runtime) -> Self {
        Self(ManuallyDrop::new(runtime))
    }
}

/// Runs timer-driven maintenance passes on a dedicated runtime.
///
/// Every pass is a plain blocking closure. Passes of the same task never overlap.
pub struct BackgroundTasks {
    runtime: BackgroundShutdownRuntime,
    stop_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl Debug for BackgroundTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTasks")
            .field("tasks", &self.handles.lock().iter().map(|(name, _)| *name).collect::<Vec<_>>())
            .finish()
    }
}

impl BackgroundTasks {
    /// Create a single-worker runtime for background tasks.
    pub fn new(thread_name: impl Into<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(thread_name)
            .enable_time()
            .build()
            .map_err(|e| Error::new(ErrorKind::External, "build background runtime failed").with_source(e))?;
        let (stop_tx, _) = broadcast::channel(1);
        Ok(Self {
            runtime: runtime.into(),
            stop_tx,
            handles: Mutex::new(vec![]),
        })
    }

    /// Run `pass` every `period` until the tasks are stopped.
    ///
    /// `pass` returns `false` to stop the task on its own.
    pub fn spawn_periodic<F>(&self, name: &'static str, period: Duration, mut pass: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let mut stop_rx = self.stop_tx.subscribe();
        let handle = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            tracing::info!(task = name, ?period, "[background] task started");
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.recv() => {
                        tracing::info!(task = name, "[background] task exit");
                        return;
                    }
                    _ = interval.tick() => {
                        if !pass() {
                            tracing::info!(task = name, "[background] task finished");
                            return;
                        }
                    }
                }
            }
        });
        self.handles.lock().push((name, handle));
    }

    /// Signal all tasks to stop without waiting for them.
    pub fn stop(&self) {
        // Err only means no task is listening any more.
        let _ = self.stop_tx.send(());
    }

    /// Signal all tasks to stop and wait until in-flight passes finish.
    ///
    /// Must not be called from a background pass.
    pub fn shutdown(&self) {
        self.stop();
        let handles = std::mem::take(&mut *self.handles.lock());
        for (name, handle) in handles {
            if let Err(e) = futures::executor::block_on(handle) {
                tracing::warn!(task = name, ?e, "[background] task join error");
            }
        }
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.stop();
    }
}
