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

//! Shared fixtures for tests that build small dependency graphs.
//!
//! The layout mirrors the worked example from the dependency file format
//! documentation: `d` depends on `b` and `c`; `b` and `c` both depend on `a`;
//! `e` stands alone. Sources are `{d, e}`, sinks are `{a, e}`.

use crate::objects::ServiceSpec;

pub fn example_graph_specs() -> Vec<ServiceSpec> {
    vec![
        ServiceSpec::new("d", vec!["b".to_string(), "c".to_string()]),
        ServiceSpec::new("b", vec!["a".to_string()]),
        ServiceSpec::new("c", vec!["a".to_string()]),
        ServiceSpec::leaf("e"),
        ServiceSpec::leaf("a"),
    ]
}

pub fn example_graph_file_contents() -> &'static str {
    "d b c\nb a\nc a\ne\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utest_example_graph_specs_has_five_services() {
        assert_eq!(example_graph_specs().len(), 5);
    }
}
