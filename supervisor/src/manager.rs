// Copyright (c) 2026 Service Supervisor contributors
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations
// under the License.
//
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use common::error::SupervisorError;
use common::objects::ServiceId;

use crate::dispatcher::Dispatcher;
use crate::graph::{self, Registry};
use crate::service::Service;

/// Wires a loaded registry to its command queue and dispatcher task, and is
/// the handle both `main` and in-process tests drive the engine through.
///
/// Mirrors the reference workspace's top-level manager type: own the shared
/// state, spawn the single serialising worker task, expose a thin queue
/// handle to producers (stdin reader, tests) instead of letting them touch
/// the dispatcher directly.
pub struct Manager {
    registry: Arc<Registry>,
    pub queue: mpsc::Sender<String>,
    dispatcher_handle: JoinHandle<()>,
}

impl Manager {
    pub fn from_registry(registry: Arc<Registry>) -> Self {
        let (tx, rx) = mpsc::channel(common::COMMAND_CHANNEL_CAPACITY);
        let dispatcher = Dispatcher::new(Arc::clone(&registry), rx);
        let dispatcher_handle = tokio::spawn(dispatcher.run());
        Manager { registry, queue: tx, dispatcher_handle }
    }

    pub fn load_file(path: &Path) -> Result<Self, SupervisorError> {
        let registry = graph::load_file(path)?;
        Ok(Self::from_registry(registry))
    }

    pub fn load_from_str(contents: &str) -> Result<Self, SupervisorError> {
        let registry = graph::load_from_str(contents)?;
        Ok(Self::from_registry(registry))
    }

    pub fn get(&self, id: &ServiceId) -> Option<Arc<Service>> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Blocks until the dispatcher task has processed `EXIT` and returned.
    pub async fn join(self) {
        if let Err(err) = self.dispatcher_handle.await {
            log::warn!("dispatcher task did not exit cleanly: {err}");
        }
    }
}

//////////////////////////////////////////////////////////////////////////////
//                 ########  #######    #########  #########                //
//                    ##     ##        ##             ##                    //
//                    ##     ##                ##     ##                    //
//                    ##     #######   #########      ##                    //
//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use common::objects::ServiceState;
    use common::test_utils::example_graph_file_contents;

    #[tokio::test]
    async fn utest_resume_all_through_the_queue_reaches_running() {
        let manager = Manager::load_from_str(example_graph_file_contents()).unwrap();

        manager.queue.send("RESUME-ALL".to_string()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;

        for id in ["a", "b", "c", "d", "e"] {
            let id = id.to_string();
            assert_eq!(manager.get(&id).unwrap().state().await, ServiceState::Running);
        }

        manager.queue.send("EXIT".to_string()).await.unwrap();
        manager.join().await;
    }

    #[tokio::test]
    async fn utest_unknown_file_surfaces_a_load_error() {
        let result = Manager::load_file(Path::new("/nonexistent/services.txt"));
        assert!(matches!(result, Err(SupervisorError::Io(_))));
    }
}
