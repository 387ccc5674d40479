use anyhow::anyhow;

use crate::models::ValidationError;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Internal,
}

/// Structured engine failure.
///
/// `public` is safe to show to an end user, `code` is a stable machine
/// identifier, and `violations` carries the structural validation errors
/// behind a rejection when there are any. `source` keeps the internal
/// diagnostic chain.
#[derive(Debug)]
pub struct EngineError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub public: &'static str,
    pub violations: Vec<ValidationError>,
    pub source: anyhow::Error,
}

impl EngineError {
    pub fn invalid(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code: "invalid_input",
            public,
            violations: Vec::new(),
            source,
        }
    }

    pub fn invalid_with_code(
        code: &'static str,
        public: &'static str,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code,
            public,
            violations: Vec::new(),
            source,
        }
    }

    pub fn invalid_with_violations(
        code: &'static str,
        public: &'static str,
        violations: Vec<ValidationError>,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code,
            public,
            violations,
            source,
        }
    }

    pub fn not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            code: "not_found",
            public,
            violations: Vec::new(),
            source,
        }
    }

    pub fn internal(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Internal,
            code: "internal_invariant_violation",
            public,
            violations: Vec::new(),
            source,
        }
    }

    pub fn message(public: &'static str) -> Self {
        Self::invalid(public, anyhow!(public))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.public, self.code)
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}
