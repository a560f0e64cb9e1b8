// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process exit codes shared by every server in the family.

use serde::{Deserialize, Serialize};

/// Why a server process ended.
///
/// Set exactly once per process by the shutdown primitive; last writer
/// wins, which is acceptable because all shutdown paths store equivalent
/// semantic values. The service shell uses the distinct codes to decide
/// restart policy (an `AdminStop` exit must not be auto-restarted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitCode {
    /// Clean shutdown.
    Normal,
    /// Remote or local administrative stop.
    AdminStop,
    /// Startup did not reach the Ready stage.
    InitFailed,
    /// An unexpected error escaped a stage.
    FatalError,
}

impl ExitCode {
    /// OS process exit code.
    pub fn process_code(self) -> i32 {
        match self {
            ExitCode::Normal => 0,
            ExitCode::AdminStop => 3,
            ExitCode::InitFailed => 4,
            ExitCode::FatalError => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExitCode;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            ExitCode::Normal,
            ExitCode::AdminStop,
            ExitCode::InitFailed,
            ExitCode::FatalError,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a.process_code(), b.process_code());
            }
        }
    }

    #[test]
    fn normal_is_zero() {
        assert_eq!(ExitCode::Normal.process_code(), 0);
    }
}
