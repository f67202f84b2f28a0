#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Error kinds of the control channel.
//!
//! None of these ever abort the host solver: every failure degrades to
//! "this directive or connection had no effect" and a log line.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the definition compiler. The first failure aborts the
/// remaining definitions in a batch; earlier ones are not rolled back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The solver has released variables registered for reuse, a
    /// configuration the compiler cannot splice fresh variables into.
    #[error("solver has free variables registered; definitions are unsupported")]
    UnsupportedConfiguration,

    /// A leaf failed structural validation, which fails the whole
    /// definition.
    #[error("definition contains a negative or out-of-range literal")]
    InvalidStructure,

    /// A leaf code with no literal reading reached compilation.
    #[error("literal code {0} has no literal reading")]
    BadLiteralCode(i64),
}

/// A recognized directive key with the wrong payload shape. Logged per
/// key; other keys in the same document still apply.
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("directive `{0}` expects a sequence")]
    ExpectedSequence(&'static str),

    #[error("directive `{0}` expects a boolean")]
    ExpectedBoolean(&'static str),

    #[error("directive `definitions` is malformed: {0}")]
    MalformedDefinitions(#[from] serde_json::Error),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Channel-level failures.
#[derive(Debug, Error)]
pub enum TetherError {
    /// The listening address is unusable. Fatal to channel startup only;
    /// the solver can continue without live control.
    #[error("cannot bind control socket at {path:?}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The request body is not a well-formed directive document.
    #[error("request body is not a directive document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("socket i/o failed: {0}")]
    Io(#[from] io::Error),
}
