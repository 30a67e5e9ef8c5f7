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

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

/// Blocks the caller until `should_wait` reports `false` on the guarded
/// state, or (if `deadline` is given) until the wall-clock deadline passes.
///
/// `notify` plays the role the service monitor plays in a thread-based
/// implementation: every mutation of `state` that could change the predicate
/// must be followed by a `notify.notify_waiters()` call under the same lock,
/// or a waiter here can block past the point its condition became true.
///
/// Returns `true` if the predicate was satisfied, `false` on timeout. A
/// timeout never resets: the deadline is computed once by the caller, so
/// spurious wakeups just re-check the same predicate against the same
/// deadline.
pub async fn wait_while<T>(
    state: &Mutex<T>,
    notify: &Notify,
    mut should_wait: impl FnMut(&T) -> bool,
    deadline: Option<Instant>,
) -> bool {
    loop {
        let notified = notify.notified();
        {
            let guard = state.lock().await;
            if !should_wait(&guard) {
                return true;
            }
        }
        match deadline {
            None => notified.await,
            Some(deadline) => {
                tokio::select! {
                    _ = notified => {}
                    _ = tokio::time::sleep_until(deadline) => return false,
                }
            }
        }
    }
}

//////////////////////////////////////////////////////////////////////////////
//                 ########  #######    #########  #########                //
//                    ##     ##        ##             ##                    //
//                    ##     #####     #########      ##                    //
//                    ##     ##                ##     ##                    //
//                    ##     #######   #########      ##                    //
//////////////////////////////////////////////////////////////////////////////
