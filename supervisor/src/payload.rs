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
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use common::objects::ServiceId;

use crate::service::Service;

/// A handle a payload uses to observe the service that owns it, without
/// reaching into the engine's lock-protected state directly.
pub struct PayloadContext {
    service: Arc<Service>,
}

impl PayloadContext {
    pub(crate) fn new(service: Arc<Service>) -> Self {
        PayloadContext { service }
    }

    pub fn id(&self) -> &str {
        &self.service.id
    }

    /// Whether an orderly stop has been requested. A "bad" payload is one
    /// that never calls this, or calls it and disregards the answer.
    pub async fn stop_requested(&self) -> bool {
        self.service.stop_requested_snapshot().await
    }

    /// Test hook mirror: a bad payload ignores `stop_requested`, which is
    /// exactly how the demo payload below behaves when this is set.
    pub async fn is_bad(&self) -> bool {
        self.service.is_bad_snapshot().await
    }
}

/// Pluggable work contract every service observes. Non-blocking or
/// periodically polling `stop_requested` is the caller's responsibility, not
/// the engine's: the engine only promises to set the flag and notify.
#[async_trait]
pub trait Payload: Send + Sync {
    async fn run(&self, ctx: &PayloadContext);
}

/// Reference demo payload: sleeps a random interval, logs, and loops while
/// `!stop_requested`. With the owning service's `is_bad` flag set, it keeps
/// looping regardless, to exercise the stop-timeout path.
pub struct DemoPayload {
    id: ServiceId,
}

impl DemoPayload {
    pub fn new(id: ServiceId) -> Self {
        DemoPayload { id }
    }
}

#[async_trait]
impl Payload for DemoPayload {
    async fn run(&self, ctx: &PayloadContext) {
        loop {
            let millis = rand::thread_rng().gen_range(0..1000);
            tokio::time::sleep(Duration::from_millis(millis)).await;
            log::info!("service '{}' is working", self.id);

            if ctx.stop_requested().await && !ctx.is_bad().await {
                log::debug!("service '{}' payload observed stop request, exiting", self.id);
                break;
            }
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
    use crate::graph::load_from_str;

    #[tokio::test]
    async fn utest_demo_payload_exits_once_stop_requested() {
        let registry = load_from_str("a\n").unwrap();
        let service = registry.get("a").unwrap();
        service.resume().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        service.stop().await;

        tokio::time::timeout(Duration::from_secs(2), service.wait_for_waiting_run())
            .await
            .expect("service should leave RUNNING once its payload observes the stop request");
    }

    #[tokio::test]
    async fn utest_bad_payload_ignores_stop_request_until_timeout() {
        let registry = load_from_str("a\n").unwrap();
        let service = registry.get("a").unwrap();
        service.set_is_bad(true).await;
        service.set_timeout(5).await.unwrap();
        service.resume().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let timed_out_quickly =
            tokio::time::timeout(Duration::from_millis(200), service.stop()).await;

        assert!(timed_out_quickly.is_ok(), "stop() must return once its own timeout elapses");
    }
}
