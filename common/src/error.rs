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

use std::fmt::Display;

/// Errors that can abort a graph load or be raised back to an in-process caller.
///
/// Runtime conditions that the engine must survive (unknown service in a
/// command, malformed command line, a stop timeout) are logged and folded
/// into state transitions instead of being represented here; see
/// `dispatcher` and `service::entity` for where those are handled.
#[derive(Debug, PartialEq, Eq)]
pub enum SupervisorError {
    Io(String),
    MalformedLine(String),
    CyclicGraph(String),
    InvalidTimeout(i64),
}

impl Display for SupervisorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorError::Io(msg) => write!(f, "could not read dependency file: {msg}"),
            SupervisorError::MalformedLine(line) => {
                write!(f, "malformed line in dependency file: '{line}'")
            }
            SupervisorError::CyclicGraph(id) => {
                write!(f, "cyclic dependency detected, service '{id}' is part of a cycle")
            }
            SupervisorError::InvalidTimeout(ms) => {
                write!(f, "stop timeout must be non-negative, got {ms}")
            }
        }
    }
}

impl std::error::Error for SupervisorError {}

impl From<std::io::Error> for SupervisorError {
    fn from(value: std::io::Error) -> Self {
        SupervisorError::Io(value.to_string())
    }
}
