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

use std::collections::{HashMap, HashSet};

use common::objects::ServiceId;

/// Returns the id of a service that is part of a cycle, or `None` if the
/// adjacency map (id -> dependency ids) describes a DAG.
///
/// Three-colour depth-first search: a node is WHITE while unvisited, GREY
/// (`temp_marked`) while it is an ancestor on the current search path, and
/// BLACK (`perm_marked`) once every one of its dependencies has been fully
/// explored. Encountering a GREY node proves a cycle; the search stops at
/// the first one found.
///
/// Iteration order over the adjacency map is not significant to correctness,
/// but node ids are visited in sorted order so that which node is reported
/// as "part of the cycle" is deterministic across runs.
pub fn dfs(adjacency: &HashMap<ServiceId, Vec<ServiceId>>) -> Option<ServiceId> {
    let mut temp_marked: HashSet<&ServiceId> = HashSet::with_capacity(adjacency.len());
    let mut perm_marked: HashSet<&ServiceId> = HashSet::with_capacity(adjacency.len());

    let mut ids: Vec<&ServiceId> = adjacency.keys().collect();
    ids.sort();

    for id in ids {
        if perm_marked.contains(id) {
            continue;
        }
        if let Some(cycle_node) = visit(id, adjacency, &mut temp_marked, &mut perm_marked) {
            return Some(cycle_node.clone());
        }
    }
    None
}

fn visit<'a>(
    node: &'a ServiceId,
    adjacency: &'a HashMap<ServiceId, Vec<ServiceId>>,
    temp_marked: &mut HashSet<&'a ServiceId>,
    perm_marked: &mut HashSet<&'a ServiceId>,
) -> Option<&'a ServiceId> {
    if perm_marked.contains(node) {
        return None;
    }
    if temp_marked.contains(node) {
        log::debug!("service '{node}' is part of a cycle");
        return Some(node);
    }

    log::trace!("visit '{node}'");
    temp_marked.insert(node);

    let mut dependencies: Vec<&ServiceId> = adjacency
        .get(node)
        .map(|deps| deps.iter().collect())
        .unwrap_or_default();
    dependencies.sort();

    for dependency in dependencies {
        if let Some(cycle_node) = visit(dependency, adjacency, temp_marked, perm_marked) {
            return Some(cycle_node);
        }
    }

    log::trace!("'{node}' fully explored, marking permanent", node = node);
    temp_marked.remove(node);
    perm_marked.insert(node);
    None
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

    fn adjacency(pairs: &[(&str, &[&str])]) -> HashMap<ServiceId, Vec<ServiceId>> {
        pairs
            .iter()
            .map(|(id, deps)| {
                (
                    id.to_string(),
                    deps.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn utest_no_cycle_on_the_worked_example() {
        let graph = adjacency(&[
            ("d", &["b", "c"]),
            ("b", &["a"]),
            ("c", &["a"]),
            ("e", &[]),
            ("a", &[]),
        ]);

        assert_eq!(dfs(&graph), None);
    }

    #[test]
    fn utest_detects_direct_two_node_cycle() {
        let graph = adjacency(&[("a", &["b"]), ("b", &["a"])]);

        let cycle_node = dfs(&graph);
        assert!(cycle_node == Some("a".to_string()) || cycle_node == Some("b".to_string()));
    }

    #[test]
    fn utest_detects_self_dependency_cycle() {
        let graph = adjacency(&[("a", &["a"])]);
        assert_eq!(dfs(&graph), Some("a".to_string()));
    }

    #[test]
    fn utest_detects_longer_cycle() {
        let graph = adjacency(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        assert!(dfs(&graph).is_some());
    }

    #[test]
    fn utest_ignores_non_existing_dependency() {
        let graph = adjacency(&[("a", &["ghost"])]);
        assert_eq!(dfs(&graph), None);
    }

    #[test]
    fn utest_diamond_shape_has_no_cycle() {
        let graph = adjacency(&[
            ("top", &["left", "right"]),
            ("left", &["bottom"]),
            ("right", &["bottom"]),
            ("bottom", &[]),
        ]);
        assert_eq!(dfs(&graph), None);
    }
}
