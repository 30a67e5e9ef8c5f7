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

pub type ServiceId = String;

/// The parsed-but-not-yet-linked representation of a single dependency file
/// line: a service id and the ids it depends on. The loader turns a
/// collection of these into a linked registry with `dependents` populated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceSpec {
    pub id: ServiceId,
    pub dependencies: Vec<ServiceId>,
}

impl ServiceSpec {
    pub fn new(id: impl Into<ServiceId>, dependencies: Vec<ServiceId>) -> Self {
        ServiceSpec {
            id: id.into(),
            dependencies,
        }
    }

    pub fn leaf(id: impl Into<ServiceId>) -> Self {
        ServiceSpec::new(id, Vec::new())
    }
}

#[cfg(any(feature = "test_utils", test))]
pub fn generate_test_service_spec(id: &str, dependencies: &[&str]) -> ServiceSpec {
    ServiceSpec::new(
        id,
        dependencies.iter().map(|d| d.to_string()).collect(),
    )
}

//////////////////////////////////////////////////////////////////////////////
//                 ########  #######    #########  #########                //
//                    ##     ##        ##             ##                    //
//                    ##     #####     #########      ##                    //
//                    ##     ##                ##     ##                    //
//                    ##     #######   #########      ##                    //
//////////////////////////////////////////////////////////////////////////////
