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

use clap::Parser;

use supervisor::cli::Args;
use supervisor::manager::Manager;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(args.default_log_filter()));

    let manager = match Manager::load_file(&args.file) {
        Ok(manager) => manager,
        Err(err) => {
            log::error!("failed to load '{}': {err}", args.file.display());
            return std::process::ExitCode::FAILURE;
        }
    };

    log::info!("loaded dependency graph from '{}'", args.file.display());

    let stdin_queue = manager.queue.clone();
    tokio::spawn(supervisor::stdin_reader::run(stdin_queue));

    manager.join().await;
    log::info!("supervisor exiting");
    std::process::ExitCode::SUCCESS
}
