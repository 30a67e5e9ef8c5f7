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

use std::collections::HashMap;
use std::sync::Arc;

use common::objects::ServiceId;

use crate::service::Service;

/// The `id -> Service` mapping produced by the loader. Read-only after
/// construction: services are added only while the registry is being built,
/// never afterwards, matching the "registry is read-only after load"
/// invariant.
pub struct Registry {
    services: HashMap<ServiceId, Arc<Service>>,
}

impl Registry {
    pub(crate) fn new(services: HashMap<ServiceId, Arc<Service>>) -> Self {
        Registry { services }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Service>> {
        self.services.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ServiceId> {
        self.services.keys()
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<Service>> {
        self.services.values()
    }

    /// Services with no dependents (indegree 0). The entry point for resume
    /// cascades: starting a source drags its whole dependency sub-DAG up.
    pub fn sources(&self) -> Vec<Arc<Service>> {
        self.services
            .values()
            .filter(|service| service.dependent_ids().is_empty())
            .cloned()
            .collect()
    }

    /// Services with no dependencies. The entry point for stop cascades:
    /// stopping a sink drags its dependent sub-DAG upward.
    pub fn sinks(&self) -> Vec<Arc<Service>> {
        self.services
            .values()
            .filter(|service| service.dependency_ids().is_empty())
            .cloned()
            .collect()
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
    use crate::graph::loader::load_from_str;
    use common::test_utils::example_graph_file_contents;

    #[test]
    fn utest_sources_and_sinks_match_worked_example() {
        let registry = load_from_str(example_graph_file_contents()).unwrap();

        let mut sources: Vec<_> = registry.sources().iter().map(|s| s.id.clone()).collect();
        sources.sort();
        assert_eq!(sources, vec!["d".to_string(), "e".to_string()]);

        let mut sinks: Vec<_> = registry.sinks().iter().map(|s| s.id.clone()).collect();
        sinks.sort();
        assert_eq!(sinks, vec!["a".to_string(), "e".to_string()]);
    }

    #[test]
    fn utest_get_unknown_id_is_none() {
        let registry = load_from_str(example_graph_file_contents()).unwrap();
        assert!(registry.get("does-not-exist").is_none());
    }
}
