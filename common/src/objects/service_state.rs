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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceState {
    #[default]
    Created,
    WaitingRun,
    Running,
    WaitingStop,
    Terminated,
}

impl Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServiceState::Created => "CREATED",
            ServiceState::WaitingRun => "WAITING_RUN",
            ServiceState::Running => "RUNNING",
            ServiceState::WaitingStop => "WAITING_STOP",
            ServiceState::Terminated => "TERMINATED",
        };
        write!(f, "{name}")
    }
}

impl ServiceState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, ServiceState::Terminated)
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
    use super::ServiceState;

    #[test]
    fn utest_default_state_is_created() {
        assert_eq!(ServiceState::default(), ServiceState::Created);
    }

    #[test]
    fn utest_only_terminated_reports_is_terminated() {
        assert!(ServiceState::Terminated.is_terminated());
        assert!(!ServiceState::Running.is_terminated());
    }

    #[test]
    fn utest_display_matches_dispatcher_vocabulary() {
        assert_eq!(ServiceState::WaitingRun.to_string(), "WAITING_RUN");
        assert_eq!(ServiceState::WaitingStop.to_string(), "WAITING_STOP");
    }
}
