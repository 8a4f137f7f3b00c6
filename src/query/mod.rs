// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query module - search and chunk listing commands

pub mod chunks;
pub mod search;

use std::process::ExitCode;

/// Terminal state of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Something was printed
    Found,
    /// The pipeline stopped early with nothing to show
    NothingFound,
}

impl Status {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Status::Found => ExitCode::SUCCESS,
            Status::NothingFound => ExitCode::from(1),
        }
    }
}
