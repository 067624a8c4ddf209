//! CLI command implementations
//!
//! Each command returns the text to print on stdout, so the commands can be
//! tested without spawning the binary.

use bytedom::{Document, Session};
use std::fmt;
use std::fs;
use std::path::Path;

/// Why a command failed, and the exit code that goes with it.
#[derive(Debug)]
pub enum Failure {
    /// An input could not be read or an output could not be written.
    Io { path: String, source: std::io::Error },
    /// The program itself was rejected.
    Program(bytedom::Error),
}

impl Failure {
    pub fn exit_code(&self) -> i32 {
        match self {
            Failure::Io { .. } => 2,
            Failure::Program(_) => 1,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Io { path, source } => write!(f, "error: `{path}`: {source}"),
            Failure::Program(e) => write!(f, "runtime error: {e}"),
        }
    }
}

impl From<bytedom::Error> for Failure {
    fn from(e: bytedom::Error) -> Self {
        Failure::Program(e)
    }
}

fn read(path: &str) -> Result<Vec<u8>, Failure> {
    fs::read(Path::new(path)).map_err(|source| Failure::Io {
        path: path.to_string(),
        source,
    })
}

pub fn disasm(path: &str) -> Result<String, Failure> {
    Ok(bytedom::disassemble(&read(path)?))
}

/// Executes the program and renders what it built. Sibling runs that ended
/// up side by side at the top level are rendered together.
pub fn run(path: &str) -> Result<String, Failure> {
    let program = read(path)?;
    let mut session = Session::new(Document::new());
    let root = session.run(program)?;

    let doc = session.host();
    let html = if !doc.fragment().is_empty() {
        doc.fragment_html()
    } else {
        root.map(|root| doc.to_html(root)).unwrap_or_default()
    };
    Ok(format!("{html}\n"))
}

pub fn patch(old: &str, new: &str, out: &str) -> Result<String, Failure> {
    let patched = bytedom::patch(&read(old)?, &read(new)?);
    fs::write(out, &patched).map_err(|source| Failure::Io {
        path: out.to_string(),
        source,
    })?;
    Ok(format!("wrote {} byte(s) to {out}\n", patched.len()))
}
