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

use tokio::sync::Mutex;
use tokio::sync::Notify;

use super::wait_while;

/// A count-down latch: initialised with a count, decremented by
/// `count_down`, awaited by `wait`. Used by the dispatcher's `EXIT` handling
/// to wait for every service in the registry to reach `TERMINATED` without
/// threading a `JoinHandle` per service through the call site.
pub struct CountdownLatch {
    remaining: Mutex<usize>,
    notify: Notify,
}

impl CountdownLatch {
    pub fn new(count: usize) -> Self {
        CountdownLatch {
            remaining: Mutex::new(count),
            notify: Notify::new(),
        }
    }

    pub async fn count_down(&self) {
        let mut remaining = self.remaining.lock().await;
        if *remaining > 0 {
            *remaining -= 1;
        }
        drop(remaining);
        self.notify.notify_waiters();
    }

    pub async fn wait(&self) {
        wait_while(&self.remaining, &self.notify, |count| *count > 0, None).await;
    }
}

//////////////////////////////////////////////////////////////////////////////
//                 ########  #######    #########  #########                //
//                    ##     ##        ##             ##                    //
//                    ##     #####     #########      ##                    //
//                    ##     ##                ##     ##                    //
//                    ##     #######   #########      ##                    //
//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn utest_wait_returns_once_all_counted_down() {
        let latch = Arc::new(CountdownLatch::new(3));

        for _ in 0..3 {
            let latch = latch.clone();
            tokio::spawn(async move { latch.count_down().await });
        }

        latch.wait().await;
    }

    #[tokio::test]
    async fn utest_zero_count_latch_does_not_block() {
        let latch = CountdownLatch::new(0);
        latch.wait().await;
    }

    #[tokio::test]
    async fn utest_extra_count_downs_do_not_underflow() {
        let latch = CountdownLatch::new(1);
        latch.count_down().await;
        latch.count_down().await;
        latch.wait().await;
    }
}
