use jbytecode::jvm;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Assembly(jvm::Error),

    /// Malformed assembly source
    Syntax { line: usize, message: String },

    /// Label used but never defined
    UnknownLabel { line: usize, label: String },

    /// Label defined twice, or not followed by any instruction
    BadLabel { line: usize, label: String },

    Usage(String),
}

impl From<jvm::Error> for Error {
    fn from(err: jvm::Error) -> Error {
        Error::Assembly(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Assembly(err) => err.fmt(f),
            Error::Syntax { line, message } => write!(f, "line {}: {}", line, message),
            Error::UnknownLabel { line, label } => {
                write!(f, "line {}: label '{}' is not defined", line, label)
            }
            Error::BadLabel { line, label } => {
                write!(f, "line {}: label '{}' cannot be defined here", line, label)
            }
            Error::Usage(msg) => f.write_str(msg),
        }
    }
}
