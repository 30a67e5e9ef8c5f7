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

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use common::error::SupervisorError;
use common::objects::{ServiceId, ServiceState};

use crate::graph::Registry;
use crate::payload::{Payload, PayloadContext};
use crate::sync::wait_while;

struct Inner {
    state: ServiceState,
    stop_requested: bool,
    terminate_requested: bool,
    is_bad: bool,
    stop_timeout_ms: u64,
    /// Dependencies observed RUNNING *for the current resume cycle*. Cleared
    /// at the start of every cycle in `run_worker` so that a stale entry from
    /// a previous cycle can never satisfy this cycle's start-barrier wait.
    running_dependencies: HashSet<ServiceId>,
    running_dependents: HashSet<ServiceId>,
    worker_started: bool,
    /// Bumped every time a resume request reaches an idle service (CREATED,
    /// the post-stop WAITING_RUN, or a WAITING_RUN still waiting to be
    /// picked up). Lets the worker loop tell "still idle" from "resume
    /// requested while I was idle" without a second boolean, and wakes
    /// `wait_for_next_resume` for a service that already cycled through once.
    resume_epoch: u64,
}

impl Inner {
    fn new(stop_timeout_ms: u64) -> Self {
        Inner {
            state: ServiceState::Created,
            stop_requested: false,
            terminate_requested: false,
            is_bad: false,
            stop_timeout_ms,
            running_dependencies: HashSet::new(),
            running_dependents: HashSet::new(),
            worker_started: false,
            resume_epoch: 0,
        }
    }
}

/// One node of the dependency DAG: its id, its immutable structural edges,
/// and the mutable lifecycle state mutated by its own worker task and by
/// synchronised calls from peers. `dependency_ids`/`dependent_ids` are fixed
/// at load time; everything else lives behind `inner`'s monitor.
pub struct Service {
    pub id: ServiceId,
    dependency_ids: Vec<ServiceId>,
    dependent_ids: Vec<ServiceId>,
    registry: Weak<Registry>,
    inner: Mutex<Inner>,
    notify: Notify,
    payload: Arc<dyn Payload>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Service {
    pub(crate) fn new(
        id: ServiceId,
        dependency_ids: Vec<ServiceId>,
        dependent_ids: Vec<ServiceId>,
        registry: Weak<Registry>,
        payload: Arc<dyn Payload>,
    ) -> Self {
        Service {
            id,
            dependency_ids,
            dependent_ids,
            registry,
            inner: Mutex::new(Inner::new(common::DEFAULT_STOP_TIMEOUT_MS)),
            notify: Notify::new(),
            payload,
            worker_handle: Mutex::new(None),
        }
    }

    pub fn dependency_ids(&self) -> &[ServiceId] {
        &self.dependency_ids
    }

    pub fn dependent_ids(&self) -> &[ServiceId] {
        &self.dependent_ids
    }

    pub async fn state(&self) -> ServiceState {
        self.inner.lock().await.state
    }

    fn registry(&self) -> Option<Arc<Registry>> {
        self.registry.upgrade()
    }

    // ---- in-process test API (spec.md §6) ----

    pub async fn set_timeout(&self, ms: i64) -> Result<(), SupervisorError> {
        if ms < 0 {
            return Err(SupervisorError::InvalidTimeout(ms));
        }
        self.inner.lock().await.stop_timeout_ms = ms as u64;
        Ok(())
    }

    pub async fn set_is_bad(&self, is_bad: bool) {
        self.inner.lock().await.is_bad = is_bad;
    }

    pub(crate) async fn is_bad_snapshot(&self) -> bool {
        self.inner.lock().await.is_bad
    }

    pub(crate) async fn stop_requested_snapshot(&self) -> bool {
        self.inner.lock().await.stop_requested
    }

    // ---- public control interface (spec.md §4.2) ----

    pub async fn resume(self: &Arc<Self>) {
        self.resume_for(None).await;
    }

    pub async fn stop(self: &Arc<Self>) {
        self.request_stop(false).await;
    }

    pub async fn terminate(self: &Arc<Self>) {
        self.request_stop(true).await;
    }

    pub async fn join(&self) {
        wait_while(&self.inner, &self.notify, |inner| !inner.state.is_terminated(), None).await;
    }

    #[cfg(test)]
    pub(crate) async fn wait_for_waiting_run(&self) {
        wait_while(
            &self.inner,
            &self.notify,
            |inner| !matches!(inner.state, ServiceState::WaitingRun | ServiceState::Terminated),
            None,
        )
        .await;
    }

    /// Registers `parent` (if any) as depending on this service right now,
    /// and (idempotently) starts the resume handshake. Called with `parent =
    /// None` for an externally issued `RESUME-SERVICE`/`RESUME-ALL`, and with
    /// `parent = Some(id)` by a dependent's own worker cascading into its
    /// dependencies (spec step 1 of the start handshake).
    pub async fn resume_for(self: &Arc<Self>, parent: Option<ServiceId>) {
        let mut spawn_needed = false;
        let mut already_running = false;
        {
            let mut inner = self.inner.lock().await;
            if let Some(parent_id) = &parent {
                inner.running_dependents.insert(parent_id.clone());
            }
            if inner.state.is_terminated() {
                return;
            }
            match inner.state {
                ServiceState::Created | ServiceState::WaitingStop => {
                    log::info!("service '{}': {} -> WAITING_RUN", self.id, inner.state);
                    inner.state = ServiceState::WaitingRun;
                    inner.resume_epoch += 1;
                }
                ServiceState::WaitingRun => {
                    // Idle after a prior cycle: the worker is parked in
                    // `wait_for_next_resume` keyed off the epoch it captured
                    // at the top of that cycle. Without bumping it here,
                    // this resume request would never wake the worker and
                    // the service could never reach RUNNING again.
                    inner.resume_epoch += 1;
                }
                ServiceState::Running => {
                    already_running = true;
                }
                ServiceState::Terminated => unreachable!("handled above"),
            }
            if !inner.worker_started {
                inner.worker_started = true;
                spawn_needed = true;
            }
        }
        self.notify.notify_waiters();

        // A dependency that is already RUNNING only announces itself to a
        // dependent's `running_dependencies` once, at the moment it *enters*
        // RUNNING (see `enter_running_and_notify_dependents`). A dependent
        // starting a fresh resume cycle after that point needs the same
        // membership re-asserted for its new cycle, since it was cleared at
        // the start of that cycle (see `run_worker`).
        if already_running {
            if let (Some(parent_id), Some(registry)) = (&parent, self.registry()) {
                if let Some(parent_service) = registry.get(parent_id) {
                    let mut parent_inner = parent_service.inner.lock().await;
                    parent_inner.running_dependencies.insert(self.id.clone());
                    drop(parent_inner);
                    parent_service.notify.notify_waiters();
                }
            }
        }

        if spawn_needed {
            let me = Arc::clone(self);
            let handle = tokio::spawn(async move { Service::run_worker(me).await });
            *self.worker_handle.lock().await = Some(handle);
        }
    }

    async fn request_stop(self: &Arc<Self>, terminate: bool) {
        // "Stop before start": make sure a worker exists so the state
        // machine can actually walk forward to TERMINATED for `join`.
        let mut spawn_needed = false;
        {
            let mut inner = self.inner.lock().await;
            if inner.state.is_terminated() {
                return;
            }
            if !inner.worker_started {
                inner.worker_started = true;
                spawn_needed = true;
                if inner.state == ServiceState::Created {
                    inner.state = ServiceState::WaitingRun;
                    inner.resume_epoch += 1;
                }
            }
        }
        if spawn_needed {
            let me = Arc::clone(self);
            let handle = tokio::spawn(async move { Service::run_worker(me).await });
            *self.worker_handle.lock().await = Some(handle);
        }

        self.enter_waiting_stop_and_cascade().await;
        self.wait_for_dependents_drain().await;

        let mut inner = self.inner.lock().await;
        if !inner.state.is_terminated() {
            inner.stop_requested = true;
            if terminate {
                inner.terminate_requested = true;
            }
        }
        drop(inner);
        self.notify.notify_waiters();
    }

    /// Steps 2-3 of the stop handshake (spec.md §4.2): move to WAITING_STOP
    /// and cascade a stop request upward to every registered dependent. Safe
    /// to call repeatedly (from a direct `stop()`/`terminate()` call and
    /// from the worker's own post-payload path) since every step is
    /// idempotent.
    async fn enter_waiting_stop_and_cascade(self: &Arc<Self>) {
        let dependent_ids: Vec<ServiceId> = {
            let mut inner = self.inner.lock().await;
            if matches!(inner.state, ServiceState::WaitingRun | ServiceState::Running) {
                log::info!("service '{}': {} -> WAITING_STOP", self.id, inner.state);
                inner.state = ServiceState::WaitingStop;
            }
            inner.running_dependents.iter().cloned().collect()
        };
        self.notify.notify_waiters();

        if dependent_ids.is_empty() {
            return;
        }
        let Some(registry) = self.registry() else {
            return;
        };
        let mut cascades = tokio::task::JoinSet::new();
        for dependent_id in dependent_ids {
            if let Some(dependent) = registry.get(&dependent_id) {
                cascades.spawn(async move { dependent.stop().await });
            }
        }
        while cascades.join_next().await.is_some() {}
    }

    async fn wait_for_dependents_drain(&self) {
        let timeout_ms = self.inner.lock().await.stop_timeout_ms;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        let drained = wait_while(
            &self.inner,
            &self.notify,
            |inner| !inner.running_dependents.is_empty(),
            Some(deadline),
        )
        .await;

        if !drained {
            log::warn!(
                "service '{}': stop timeout ({} ms) elapsed with dependents still active, proceeding anyway",
                self.id,
                timeout_ms
            );
        }
    }

    async fn wait_for_dependencies_running(self: &Arc<Self>) -> bool {
        wait_while(
            &self.inner,
            &self.notify,
            |inner| {
                let should_abort = inner.stop_requested || inner.terminate_requested;
                !should_abort
                    && !self
                        .dependency_ids
                        .iter()
                        .all(|dep| inner.running_dependencies.contains(dep))
            },
            None,
        )
        .await;

        let inner = self.inner.lock().await;
        !(inner.stop_requested || inner.terminate_requested)
    }

    async fn cascade_resume_to_dependencies(self: &Arc<Self>) {
        let Some(registry) = self.registry() else {
            return;
        };
        let mut cascades = tokio::task::JoinSet::new();
        for dependency_id in self.dependency_ids.clone() {
            if let Some(dependency) = registry.get(&dependency_id) {
                let parent = self.id.clone();
                cascades.spawn(async move { dependency.resume_for(Some(parent)).await });
            }
        }
        while cascades.join_next().await.is_some() {}
    }

    async fn enter_running_and_notify_dependents(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock().await;
            log::info!("service '{}': {} -> RUNNING", self.id, inner.state);
            inner.state = ServiceState::Running;
            inner.stop_requested = false;
        }
        self.notify.notify_waiters();

        if let Some(registry) = self.registry() {
            for dependent_id in &self.dependent_ids {
                if let Some(dependent) = registry.get(dependent_id) {
                    let mut dependent_inner = dependent.inner.lock().await;
                    dependent_inner.running_dependencies.insert(self.id.clone());
                    drop(dependent_inner);
                    dependent.notify.notify_waiters();
                }
            }
        }
    }

    /// Removes `self` from every dependency's `running_dependents`, the
    /// mirror image of the registration `resume_for` performs (step 5 of
    /// the stop handshake).
    async fn leave_dependencies(&self) {
        let Some(registry) = self.registry() else {
            return;
        };
        for dependency_id in &self.dependency_ids {
            if let Some(dependency) = registry.get(dependency_id) {
                let mut dependency_inner = dependency.inner.lock().await;
                dependency_inner.running_dependents.remove(&self.id);
                drop(dependency_inner);
                dependency.notify.notify_waiters();
            }
        }
    }

    async fn run_worker(self: Arc<Self>) {
        loop {
            let this_epoch = {
                // Starting a fresh resume cycle: drop any `running_dependencies`
                // membership left over from a previous cycle, or a dependency
                // that was already RUNNING before this cycle started won't
                // re-signal, and the stale entry would let
                // `wait_for_dependencies_running` below return immediately
                // without actually observing this cycle's dependencies.
                let mut inner = self.inner.lock().await;
                inner.running_dependencies.clear();
                inner.resume_epoch
            };

            let should_skip_start = {
                let inner = self.inner.lock().await;
                inner.stop_requested || inner.terminate_requested
            };
            if !should_skip_start {
                self.cascade_resume_to_dependencies().await;
                let interrupted = !self.wait_for_dependencies_running().await;
                if !interrupted {
                    self.enter_running_and_notify_dependents().await;
                    let ctx = PayloadContext::new(Arc::clone(&self));
                    self.payload.run(&ctx).await;
                }
            }

            self.enter_waiting_stop_and_cascade().await;
            self.wait_for_dependents_drain().await;
            self.leave_dependencies().await;

            let terminate = {
                let mut inner = self.inner.lock().await;
                if inner.terminate_requested {
                    log::info!("service '{}': {} -> TERMINATED", self.id, inner.state);
                    inner.state = ServiceState::Terminated;
                    true
                } else {
                    log::info!("service '{}': {} -> WAITING_RUN", self.id, inner.state);
                    inner.state = ServiceState::WaitingRun;
                    inner.stop_requested = false;
                    false
                }
            };
            self.notify.notify_waiters();

            if terminate {
                break;
            }

            self.wait_for_next_resume(this_epoch).await;
        }
    }

    async fn wait_for_next_resume(&self, previous_epoch: u64) {
        wait_while(
            &self.inner,
            &self.notify,
            |inner| !(inner.terminate_requested || inner.resume_epoch != previous_epoch),
            None,
        )
        .await;
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
    use std::time::Duration as StdDuration;

    async fn settle() {
        tokio::time::sleep(StdDuration::from_millis(30)).await;
    }

    #[tokio::test]
    async fn utest_resume_all_reaches_running_on_worked_example() {
        let registry = load_from_str("d b c\nb a\nc a\ne\n").unwrap();
        for source in registry.sources() {
            source.resume().await;
        }
        settle().await;

        for id in ["a", "b", "c", "d", "e"] {
            assert_eq!(
                registry.get(id).unwrap().state().await,
                ServiceState::Running,
                "service '{id}' should be RUNNING"
            );
        }
    }

    #[tokio::test]
    async fn utest_stop_all_returns_every_service_to_waiting_run() {
        let registry = load_from_str("d b c\nb a\nc a\ne\n").unwrap();
        for source in registry.sources() {
            source.resume().await;
        }
        settle().await;

        for sink in registry.sinks() {
            sink.stop().await;
        }

        for id in ["a", "b", "c", "d", "e"] {
            let service = registry.get(id).unwrap();
            tokio::time::timeout(StdDuration::from_secs(2), service.wait_for_waiting_run())
                .await
                .unwrap_or_else(|_| panic!("service '{id}' never returned to WAITING_RUN"));
            assert_eq!(service.state().await, ServiceState::WaitingRun);
        }
    }

    #[tokio::test]
    async fn utest_selective_resume_only_starts_the_reachable_subgraph() {
        let registry = load_from_str("d b c\nb a\nc a\ne\n").unwrap();

        registry.get("b").unwrap().resume().await;
        settle().await;

        assert_eq!(registry.get("a").unwrap().state().await, ServiceState::Running);
        assert_eq!(registry.get("b").unwrap().state().await, ServiceState::Running);
        for id in ["c", "d", "e"] {
            assert_eq!(registry.get(id).unwrap().state().await, ServiceState::WaitingRun);
        }
    }

    #[tokio::test]
    async fn utest_stopping_a_dependency_cascades_upward_to_all_dependents() {
        let registry = load_from_str("d b c\nb a\nc a\ne\n").unwrap();
        registry.get("d").unwrap().resume().await;
        settle().await;
        for id in ["a", "b", "c", "d"] {
            assert_eq!(registry.get(id).unwrap().state().await, ServiceState::Running);
        }

        registry.get("a").unwrap().stop().await;

        for id in ["a", "b", "c", "d"] {
            let service = registry.get(id).unwrap();
            tokio::time::timeout(StdDuration::from_secs(2), service.wait_for_waiting_run())
                .await
                .unwrap_or_else(|_| panic!("service '{id}' should have been dragged back down"));
        }
    }

    #[tokio::test]
    async fn utest_repeated_resume_all_is_idempotent() {
        let registry = load_from_str("b a\n").unwrap();
        registry.get("b").unwrap().resume().await;
        registry.get("b").unwrap().resume().await;
        registry.get("b").unwrap().resume().await;
        settle().await;

        assert_eq!(registry.get("a").unwrap().state().await, ServiceState::Running);
        assert_eq!(registry.get("b").unwrap().state().await, ServiceState::Running);
    }

    #[tokio::test]
    async fn utest_stop_all_then_resume_all_twice_reaches_running_again() {
        // Scenario S4 verbatim: STOP-ALL, RESUME-ALL, RESUME-ALL must leave
        // every service RUNNING. This exercises a service cycling all the
        // way down to an idle WAITING_RUN and being resumed a second time,
        // which previously left the worker parked forever (the epoch that
        // gates `wait_for_next_resume` was never bumped from a WAITING_RUN
        // no-op), and separately required `running_dependencies` to be
        // cleared each cycle so a stale membership from the first cycle
        // didn't let the start-barrier wait return early without observing
        // the second cycle's dependencies.
        let registry = load_from_str("d b c\nb a\nc a\ne\n").unwrap();
        for source in registry.sources() {
            source.resume().await;
        }
        settle().await;
        for id in ["a", "b", "c", "d", "e"] {
            assert_eq!(registry.get(id).unwrap().state().await, ServiceState::Running);
        }

        for sink in registry.sinks() {
            sink.stop().await;
        }
        for id in ["a", "b", "c", "d", "e"] {
            let service = registry.get(id).unwrap();
            tokio::time::timeout(StdDuration::from_secs(2), service.wait_for_waiting_run())
                .await
                .unwrap_or_else(|_| panic!("service '{id}' never returned to WAITING_RUN"));
        }

        for source in registry.sources() {
            source.resume().await;
        }
        for source in registry.sources() {
            source.resume().await;
        }

        for id in ["a", "b", "c", "d", "e"] {
            let service = registry.get(id).unwrap();
            tokio::time::timeout(StdDuration::from_secs(2), async {
                loop {
                    if service.state().await == ServiceState::Running {
                        return;
                    }
                    tokio::time::sleep(StdDuration::from_millis(10)).await;
                }
            })
            .await
            .unwrap_or_else(|_| panic!("service '{id}' never reached RUNNING again after a second resume"));
        }
    }

    #[tokio::test]
    async fn utest_exit_terminates_every_service() {
        // Mirrors the dispatcher's EXIT handling: stop every sink, join
        // everything back to quiescence, then terminate every service (not
        // just the sinks -- a stop cascade never implies a terminate one).
        let registry = load_from_str("b a\n").unwrap();
        registry.get("b").unwrap().resume().await;
        settle().await;

        for sink in registry.sinks() {
            sink.stop().await;
        }
        for id in registry.ids().cloned().collect::<Vec<_>>() {
            registry.get(&id).unwrap().join().await;
        }
        for id in registry.ids().cloned().collect::<Vec<_>>() {
            registry.get(&id).unwrap().terminate().await;
        }
        for id in registry.ids().cloned().collect::<Vec<_>>() {
            let service = registry.get(&id).unwrap();
            tokio::time::timeout(StdDuration::from_secs(2), service.join())
                .await
                .unwrap_or_else(|_| panic!("service '{id}' never reached TERMINATED"));
        }

        for id in ["a", "b"] {
            assert_eq!(registry.get(id).unwrap().state().await, ServiceState::Terminated);
        }
    }

    #[tokio::test]
    async fn utest_stop_before_resume_terminates_cleanly() {
        let registry = load_from_str("a\n").unwrap();
        let service = registry.get("a").unwrap();

        service.terminate().await;
        tokio::time::timeout(StdDuration::from_secs(2), service.join())
            .await
            .expect("a service stopped before it was ever resumed must still reach TERMINATED");

        assert_eq!(service.state().await, ServiceState::Terminated);
    }

    #[tokio::test]
    async fn utest_invalid_timeout_is_rejected_and_state_is_unchanged() {
        let registry = load_from_str("a\n").unwrap();
        let service = registry.get("a").unwrap();

        let result = service.set_timeout(-1).await;

        assert_eq!(result, Err(SupervisorError::InvalidTimeout(-1)));
        assert_eq!(service.state().await, ServiceState::Created);
    }

    #[tokio::test]
    async fn utest_resume_then_immediate_stop_leaves_a_consistent_quiescent_state() {
        let registry = load_from_str("d b c\nb a\nc a\ne\n").unwrap();
        let d = registry.get("d").unwrap();

        d.resume().await;
        d.stop().await;
        settle().await;

        for id in ["a", "b", "c", "d", "e"] {
            let state = registry.get(id).unwrap().state().await;
            assert!(
                matches!(state, ServiceState::WaitingRun | ServiceState::Running),
                "service '{id}' ended up in an inconsistent state: {state}"
            );
        }
    }

    #[tokio::test]
    async fn utest_stop_timeout_lets_dependency_proceed_without_its_dependent() {
        let registry = load_from_str("b a\n").unwrap();
        let a = registry.get("a").unwrap();
        let b = registry.get("b").unwrap();
        b.set_is_bad(true).await;
        a.set_timeout(1).await.unwrap();

        b.resume().await;
        settle().await;
        assert_eq!(b.state().await, ServiceState::Running);

        tokio::time::timeout(StdDuration::from_millis(200), a.stop())
            .await
            .expect("a's stop() must return once its own 1ms timeout elapses, well under 200ms");

        // a's own payload still has to notice `stop_requested` on its next
        // poll (up to ~1s, per the demo payload's random sleep) before a's
        // worker can finish unwinding back to WAITING_RUN.
        tokio::time::timeout(StdDuration::from_secs(2), a.wait_for_waiting_run())
            .await
            .expect("a should eventually unwind to WAITING_RUN despite b never draining");

        assert_eq!(a.state().await, ServiceState::WaitingRun);
        assert_eq!(b.state().await, ServiceState::WaitingStop);
    }
}
