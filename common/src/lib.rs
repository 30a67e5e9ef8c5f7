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

pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 1500;
pub const COMMAND_CHANNEL_CAPACITY: usize = 20;

pub mod error;
pub mod objects;
#[cfg(feature = "test_utils")]
pub mod test_utils;
