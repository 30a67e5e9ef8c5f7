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

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Reads one command per line from `stdin` and forwards it to the
/// dispatcher's queue. EOF is equivalent to sending `EXIT` (spec.md §6).
pub async fn run(queue: mpsc::Sender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if queue.send(line).await.is_err() {
                    log::debug!("command queue closed, stdin reader stopping");
                    return;
                }
            }
            Ok(None) => {
                log::info!("stdin closed, enqueueing EXIT");
                let _ = queue.send("EXIT".to_string()).await;
                return;
            }
            Err(err) => {
                log::warn!("error reading stdin: {err}, enqueueing EXIT");
                let _ = queue.send("EXIT".to_string()).await;
                return;
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
