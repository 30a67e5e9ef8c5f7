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

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::graph::Registry;
use crate::sync::CountdownLatch;

/// A single parsed command line, per the dispatcher grammar (spec.md §4.4).
#[derive(Debug, PartialEq, Eq)]
enum Command {
    ResumeAll,
    StopAll,
    ResumeService(String),
    StopService(String),
    Exit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some("RESUME-ALL"), None, None) => Command::ResumeAll,
            (Some("STOP-ALL"), None, None) => Command::StopAll,
            (Some("RESUME-SERVICE"), Some(id), None) => Command::ResumeService(id.to_string()),
            (Some("STOP-SERVICE"), Some(id), None) => Command::StopService(id.to_string()),
            (Some("EXIT"), None, None) => Command::Exit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// Consumes textual commands from a bounded queue on a single dedicated
/// task, serialising every graph-level operation against concurrent
/// `stdin`/in-process producers. Mirrors the reference workspace's own
/// `while let Some(x) = self.receiver.recv().await { match x { ... } }`
/// manager loop.
pub struct Dispatcher {
    registry: Arc<Registry>,
    receiver: mpsc::Receiver<String>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, receiver: mpsc::Receiver<String>) -> Self {
        Dispatcher { registry, receiver }
    }

    /// Runs until an `EXIT` command (or stdin EOF, which enqueues one) is
    /// processed, or the channel is dropped out from under it.
    pub async fn run(mut self) {
        while let Some(line) = self.receiver.recv().await {
            log::debug!("dispatcher received command: '{line}'");
            match Command::parse(&line) {
                Command::ResumeAll => self.resume_all().await,
                Command::StopAll => self.stop_all().await,
                Command::ResumeService(id) => self.resume_service(&id).await,
                Command::StopService(id) => self.stop_service(&id).await,
                Command::Exit => {
                    self.exit().await;
                    break;
                }
                Command::Unknown(line) => {
                    log::warn!("ignoring malformed command: '{line}'");
                }
            }
        }
        log::info!("dispatcher loop ended");
    }

    async fn resume_all(&self) {
        for source in self.registry.sources() {
            source.resume().await;
        }
    }

    async fn stop_all(&self) {
        for sink in self.registry.sinks() {
            sink.stop().await;
        }
    }

    async fn resume_service(&self, id: &str) {
        match self.registry.get(id) {
            Some(service) => service.resume().await,
            None => log::warn!("RESUME-SERVICE: unknown service '{id}'"),
        }
    }

    async fn stop_service(&self, id: &str) {
        match self.registry.get(id) {
            Some(service) => service.stop().await,
            None => log::warn!("STOP-SERVICE: unknown service '{id}'"),
        }
    }

    /// `EXIT` ≡ stop every sink, then join every service, then terminate
    /// (resolved open question, see DESIGN.md).
    async fn exit(&self) {
        log::info!("EXIT received, stopping every sink and waiting for the graph to drain");
        for sink in self.registry.sinks() {
            sink.stop().await;
        }
        self.join_all_concurrently().await;

        for service in self.registry.all() {
            service.terminate().await;
        }
        self.join_all_concurrently().await;
    }

    /// Waits for every service in the registry to reach `TERMINATED`,
    /// concurrently rather than one at a time, via a count-down latch sized
    /// to the registry.
    async fn join_all_concurrently(&self) {
        let services: Vec<_> = self.registry.all().cloned().collect();
        let latch = Arc::new(CountdownLatch::new(services.len()));
        for service in services {
            let latch = Arc::clone(&latch);
            tokio::spawn(async move {
                service.join().await;
                latch.count_down().await;
            });
        }
        latch.wait().await;
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

    #[test]
    fn utest_parses_nullary_commands() {
        assert_eq!(Command::parse("RESUME-ALL"), Command::ResumeAll);
        assert_eq!(Command::parse("STOP-ALL"), Command::StopAll);
        assert_eq!(Command::parse("EXIT"), Command::Exit);
    }

    #[test]
    fn utest_parses_unary_commands() {
        assert_eq!(Command::parse("RESUME-SERVICE b"), Command::ResumeService("b".to_string()));
        assert_eq!(Command::parse("STOP-SERVICE  a"), Command::StopService("a".to_string()));
    }

    #[test]
    fn utest_unknown_verb_is_unknown() {
        assert_eq!(Command::parse("START-ALL"), Command::Unknown("START-ALL".to_string()));
        assert_eq!(Command::parse(""), Command::Unknown("".to_string()));
    }

    #[test]
    fn utest_extra_arguments_are_malformed() {
        assert_eq!(
            Command::parse("RESUME-SERVICE b c"),
            Command::Unknown("RESUME-SERVICE b c".to_string())
        );
    }

    #[tokio::test]
    async fn utest_resume_all_then_stop_all_then_exit_drains_the_queue() {
        let registry = crate::graph::load_from_str("b a\n").unwrap();
        let (tx, rx) = mpsc::channel(common::COMMAND_CHANNEL_CAPACITY);
        let dispatcher = Dispatcher::new(Arc::clone(&registry), rx);
        let handle = tokio::spawn(dispatcher.run());

        tx.send("RESUME-ALL".to_string()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        for id in ["a", "b"] {
            assert_eq!(
                registry.get(id).unwrap().state().await,
                common::objects::ServiceState::Running
            );
        }

        tx.send("EXIT".to_string()).await.unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("dispatcher must exit promptly")
            .unwrap();

        for id in ["a", "b"] {
            assert_eq!(
                registry.get(id).unwrap().state().await,
                common::objects::ServiceState::Terminated
            );
        }
    }

    #[tokio::test]
    async fn utest_unknown_service_id_is_logged_and_does_not_block_the_loop() {
        let registry = crate::graph::load_from_str("a\n").unwrap();
        let (tx, rx) = mpsc::channel(common::COMMAND_CHANNEL_CAPACITY);
        let dispatcher = Dispatcher::new(Arc::clone(&registry), rx);
        let handle = tokio::spawn(dispatcher.run());

        tx.send("RESUME-SERVICE ghost".to_string()).await.unwrap();
        tx.send("garbage command".to_string()).await.unwrap();
        tx.send("EXIT".to_string()).await.unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("dispatcher must not get stuck on malformed input")
            .unwrap();
    }
}
