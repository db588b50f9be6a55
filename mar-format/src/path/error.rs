use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntoMarPathError {
    UnrepresentableStr,
    ParentDir,
    Absolute,
    NulByte,
    EmptyPath,
    TooLong(usize),
}

impl std::error::Error for IntoMarPathError {}

impl fmt::Display for IntoMarPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntoMarPathError::TooLong(len) => write!(
                f,
                "{} ({} bytes, limit {})",
                self.as_str(),
                len,
                super::MAX_PATH_LEN
            ),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

impl IntoMarPathError {
    pub fn as_str(&self) -> &str {
        match self {
            IntoMarPathError::UnrepresentableStr => "unrepresentable string found in path",
            IntoMarPathError::ParentDir => "path contains a `..` segment",
            IntoMarPathError::Absolute => "path is not relative",
            IntoMarPathError::NulByte => "path contains a NUL byte",
            IntoMarPathError::EmptyPath => "no path provided",
            IntoMarPathError::TooLong(_) => "path is too long to be archived",
        }
    }
}
