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
use std::path::Path;
use std::sync::Arc;

use common::error::SupervisorError;
use common::objects::{ServiceId, ServiceSpec};

use crate::graph::cycle_check;
use crate::graph::registry::Registry;
use crate::payload::DemoPayload;
use crate::service::Service;

/// Parses one dependency-file line: the first whitespace-separated token is
/// the service id, the rest are the ids it depends on. Blank lines and
/// `#`-prefixed comment lines are ignored.
fn parse_line(line: &str) -> Option<ServiceSpec> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let mut tokens = trimmed.split_whitespace();
    let id = tokens.next()?.to_string();
    let dependencies = tokens.map(|t| t.to_string()).collect();
    Some(ServiceSpec::new(id, dependencies))
}

/// Builds the full id -> dependency-ids adjacency, creating an empty-
/// dependency entry for any id that is only ever referenced as a dependency
/// (never given its own line).
fn build_adjacency(specs: &[ServiceSpec]) -> HashMap<ServiceId, Vec<ServiceId>> {
    let mut adjacency: HashMap<ServiceId, Vec<ServiceId>> = HashMap::new();
    for spec in specs {
        adjacency
            .entry(spec.id.clone())
            .or_default()
            .extend(spec.dependencies.iter().cloned());
        for dependency in &spec.dependencies {
            adjacency.entry(dependency.clone()).or_default();
        }
    }
    adjacency
}

fn build_dependents(
    adjacency: &HashMap<ServiceId, Vec<ServiceId>>,
) -> HashMap<ServiceId, Vec<ServiceId>> {
    let mut dependents: HashMap<ServiceId, Vec<ServiceId>> =
        adjacency.keys().map(|id| (id.clone(), Vec::new())).collect();
    for (id, dependencies) in adjacency {
        for dependency in dependencies {
            dependents.entry(dependency.clone()).or_default().push(id.clone());
        }
    }
    dependents
}

/// Builds a linked, acyclic registry from already-parsed specs. Shared by
/// `load_from_str` (used by tests and the in-process API) and `load_file`.
///
/// Returns an `Arc<Registry>` rather than a bare `Registry`: every `Service`
/// holds a `Weak<Registry>` back-reference to resolve dependency/dependent
/// ids to handles without an ownership cycle, and that `Weak` only stays
/// upgradeable for as long as the `Registry` actually lives behind an `Arc`.
pub fn build_registry(specs: Vec<ServiceSpec>) -> Result<Arc<Registry>, SupervisorError> {
    let adjacency = build_adjacency(&specs);

    if let Some(cycle_node) = cycle_check::dfs(&adjacency) {
        return Err(SupervisorError::CyclicGraph(cycle_node));
    }

    let dependents = build_dependents(&adjacency);

    let registry = Arc::new_cyclic(|registry_weak: &std::sync::Weak<Registry>| {
        let mut services = HashMap::new();
        for (id, dependency_ids) in &adjacency {
            let dependent_ids = dependents.get(id).cloned().unwrap_or_default();
            let payload = Arc::new(DemoPayload::new(id.clone()));
            let service = Service::new(
                id.clone(),
                dependency_ids.clone(),
                dependent_ids,
                registry_weak.clone(),
                payload,
            );
            services.insert(id.clone(), Arc::new(service));
        }
        Registry::new(services)
    });

    Ok(registry)
}

pub fn load_from_str(contents: &str) -> Result<Arc<Registry>, SupervisorError> {
    let specs: Vec<ServiceSpec> = contents.lines().filter_map(parse_line).collect();
    build_registry(specs)
}

pub fn load_file(path: &Path) -> Result<Arc<Registry>, SupervisorError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

//////////////////////////////////////////////////////////////////////////////
//                 ########  #######    #########  #########                //
//                    ##     ##        ##             ##                    //
//                    ##     ##                ##     ##                    //
//                    ##     #######   #########      ##                    //
//////////////////////////////////////////////////////////////////////////////
