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

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "supervisor", about = "Dependency-aware service supervisor")]
pub struct Args {
    /// Path to the dependency file describing the service graph.
    #[arg(default_value = "services.txt")]
    pub file: PathBuf,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
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

    #[test]
    fn utest_defaults_to_services_txt() {
        let args = Args::parse_from(["supervisor"]);
        assert_eq!(args.file, PathBuf::from("services.txt"));
        assert_eq!(args.default_log_filter(), "info");
    }

    #[test]
    fn utest_accepts_explicit_file_and_verbosity() {
        let args = Args::parse_from(["supervisor", "-vv", "my_services.txt"]);
        assert_eq!(args.file, PathBuf::from("my_services.txt"));
        assert_eq!(args.default_log_filter(), "trace");
    }
}
