//! Boot test verdicts
//!
//! A test kernel writes its log to the serial console and finishes with a
//! four-byte sentinel: `CA FE BA BE` on success, `DE AD BE EF` on failure.

use thiserror::Error;

pub const SUCCESS_SENTINEL: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];
pub const FAILURE_SENTINEL: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootVerdict {
    Success,
    Failure,
    /// Output ended without a sentinel; holds the trailing bytes
    Invalid(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerdictError {
    #[error("kernel reported a test failure")]
    Failed,

    #[error("invalid kernel output (trailing bytes {0:02X?})")]
    Invalid(Vec<u8>),
}

/// Console output split into the kernel log and its verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleOutput<'a> {
    pub log: &'a [u8],
    pub verdict: BootVerdict,
}

impl<'a> ConsoleOutput<'a> {
    pub fn parse(output: &'a [u8]) -> Self {
        let Some(split) = output.len().checked_sub(SUCCESS_SENTINEL.len()) else {
            return Self {
                log: &[],
                verdict: BootVerdict::Invalid(output.to_vec()),
            };
        };
        let (log, tail) = output.split_at(split);
        Self {
            log,
            verdict: BootVerdict::from_sentinel(tail),
        }
    }
}

impl BootVerdict {
    fn from_sentinel(tail: &[u8]) -> Self {
        if tail == SUCCESS_SENTINEL {
            BootVerdict::Success
        } else if tail == FAILURE_SENTINEL {
            BootVerdict::Failure
        } else {
            BootVerdict::Invalid(tail.to_vec())
        }
    }

    /// Verdict of a complete console capture
    pub fn decode(output: &[u8]) -> Self {
        ConsoleOutput::parse(output).verdict
    }

    pub fn is_success(&self) -> bool {
        *self == BootVerdict::Success
    }

    pub fn into_result(self) -> Result<(), VerdictError> {
        match self {
            BootVerdict::Success => Ok(()),
            BootVerdict::Failure => Err(VerdictError::Failed),
            BootVerdict::Invalid(tail) => Err(VerdictError::Invalid(tail)),
        }
    }
}
