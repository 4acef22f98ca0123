//! Per-file outcomes and the run-level verdict.
//!
//! Every file handed to a validator produces exactly one [`ValidationOutcome`].
//! The outcomes are folded into a [`RunVerdict`] by [`aggregate`], the same way
//! no matter which transport produced them.

use std::path::{Path, PathBuf};

use crate::transport::{NoOpReason, TransportKind};

/// Result of validating a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The controller accepted the file.
    Pass,
    /// The file was rejected, could not be read, or could not be submitted.
    Fail {
        /// Text to show next to the filename.
        diagnostic: String,
    },
}

impl ValidationOutcome {
    /// Create a failed outcome with a diagnostic.
    pub fn fail(diagnostic: impl Into<String>) -> Self {
        Self::Fail {
            diagnostic: diagnostic.into(),
        }
    }

    /// Outcome for a file that is not on disk.
    pub fn missing() -> Self {
        Self::fail("file does not exist")
    }

    /// True if the file passed.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// The diagnostic of a failed outcome.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Pass => None,
            Self::Fail { diagnostic } => Some(diagnostic),
        }
    }
}

/// Process-level verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunVerdict {
    /// Every file passed, or there was nothing to do.
    Ok,
    /// At least one file failed, or the run was aborted.
    Failed,
}

impl RunVerdict {
    /// Exit status for the hook: 0 for `Ok`, 1 for `Failed`.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Failed => 1,
        }
    }
}

/// Fold outcomes into a verdict. An empty sequence is `Ok`.
pub fn aggregate<'a, I>(outcomes: I) -> RunVerdict
where
    I: IntoIterator<Item = &'a ValidationOutcome>,
{
    if outcomes.into_iter().all(ValidationOutcome::is_pass) {
        RunVerdict::Ok
    } else {
        RunVerdict::Failed
    }
}

/// The outcome for one file, tagged with its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: ValidationOutcome,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>, outcome: ValidationOutcome) -> Self {
        Self {
            path: path.into(),
            outcome,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Everything a completed run produced, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Transport that ran, or why none did.
    pub ran: Result<TransportKind, NoOpReason>,
    /// One entry per input file, in the order supplied.
    pub files: Vec<FileReport>,
}

impl RunReport {
    /// A report for a run that validated `files` over `transport`.
    pub fn new(transport: TransportKind, files: Vec<FileReport>) -> Self {
        Self {
            ran: Ok(transport),
            files,
        }
    }

    /// A report for a run where no transport was used.
    pub fn noop(reason: NoOpReason) -> Self {
        Self {
            ran: Err(reason),
            files: Vec::new(),
        }
    }

    /// Aggregate verdict over every file.
    pub fn verdict(&self) -> RunVerdict {
        aggregate(self.files.iter().map(|f| &f.outcome))
    }

    /// Files that failed, in input order.
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.outcome.is_pass())
    }

    /// Number of files that passed.
    pub fn passed(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_pass()).count()
    }
}
