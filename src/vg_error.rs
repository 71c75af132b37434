// Error types for the startup sequence
// Fatal bootstrap errors end the process; module errors only make a candidate decline

use std::io;
use std::path::PathBuf;

/// Fatal startup failures. Each one terminates the process with a diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Missing or malformed `-d` request
    #[error("Try '-d<dir>=<path>'.")]
    Usage,

    #[error("Malformed -d parameter '{0}'. Try '-d<dir>=<path>'.")]
    MalformedOverride(String),

    #[error("Unrecognised -d parameter {0}")]
    UnknownSlot(String),

    /// The slot is shared between users on a multi-user install
    #[error("Can't redefine path to {0} dir on multiuser setup")]
    RestrictedSlot(String),

    #[error("Cannot create '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Can't open savefile directory '{path}': {source}")]
    SaveDirUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to prepare any 'display module'!")]
    NoDisplay,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Why a display or sound module declined to start.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("standard output is not a terminal")]
    NotATerminal,

    #[error("terminal is {width}x{height}, need at least {min_width}x{min_height}")]
    TooSmall {
        width: u16,
        height: u16,
        min_width: u16,
        min_height: u16,
    },

    #[error("not supported here: {0}")]
    Unsupported(&'static str),

    #[cfg_attr(not(feature = "headless"), allow(dead_code))]
    #[error("{path}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}
