//! # Routine script interpreter module
//!
//! This module tokenises routine scripts into a sequence of entries. Each
//! entry has the form
//!
//! ```text
//! keyword: payload;
//! ```
//!
//! where the payload is free text (JSON in practice) up to the terminating
//! semicolon. Lines which do not start with a keyword, for example `#`
//! comments, are ignored. Interpreting the payloads is left to the user.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Pattern matching a single script entry.
const ENTRY_PATTERN: &str = r"^\s*([a-z_]+)\s*:\s*([^;]*);";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single entry of a script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    /// Line number (starting at 1) the entry begins on
    pub line: usize,

    /// The keyword identifying what the entry does
    pub keyword: String,

    /// The payload of the entry, with surrounding whitespace trimmed
    pub payload: String
}

/// A script interpreter.
///
/// After initialising with the path to the script use `.entries()` to
/// iterate over the script's entries in order.
#[derive(Debug)]
pub struct ScriptInterpreter {
    script_path: Option<PathBuf>,
    entries: Vec<ScriptEntry>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("The script entry pattern is invalid: {0}")]
    InvalidPattern(regex::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_str(&script)?;
        si.script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the text of a script.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {
        let re = RegexBuilder::new(ENTRY_PATTERN)
            .multi_line(true)
            .build()
            .map_err(ScriptError::InvalidPattern)?;

        let mut entries = vec![];

        for cap in re.captures_iter(script) {
            // Both groups are mandatory in the pattern
            let (keyword, payload) = match (cap.get(1), cap.get(2)) {
                (Some(k), Some(p)) => (k, p),
                _ => continue
            };

            // Count from the keyword rather than the match start, since the
            // leading whitespace may span blank lines
            let line = script[..keyword.start()].matches('\n').count() + 1;

            entries.push(ScriptEntry {
                line,
                keyword: keyword.as_str().to_string(),
                payload: payload.as_str().trim().to_string()
            });
        }

        if entries.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            script_path: None,
            entries
        })
    }

    /// Iterate over the entries of the script in order.
    pub fn entries(&self) -> impl Iterator<Item = &ScriptEntry> {
        self.entries.iter()
    }

    /// Get the number of entries in the script
    pub fn get_num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Get the path the script was loaded from, if any.
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
