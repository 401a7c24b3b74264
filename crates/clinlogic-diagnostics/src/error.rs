//! Logic error types

use crate::{ErrorCode, SourceLocation, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An error report with location and context, ready for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    pub location: Option<SourceLocation>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the diagnostic for a terminal, pointing at the offending column
    #[cfg(feature = "colored")]
    pub fn render(&self, source: &str) -> String {
        use colored::Colorize;

        let label = format!("error[{}]", self.code).red().bold();
        let mut out = format!("{}: {}\n", label, self.message);

        if let Some(loc) = &self.location {
            if let Some(line) = source.lines().nth(loc.line.saturating_sub(1)) {
                let gutter = format!("{} | ", loc.line);
                out.push_str(&format!("{}{}\n", gutter.cyan(), line));
                let pad = " ".repeat(gutter.len() + loc.column.saturating_sub(1));
                let marker = "^".repeat(loc.length.max(1));
                out.push_str(&format!("{}{}\n", pad, marker.red().bold()));
            }
        }

        let help = self.help.as_deref().or(self.code.info().help);
        if let Some(help) = help {
            out.push_str(&format!("  {} {}\n", "help:".green().bold(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} - {}", self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Main logic error type
#[derive(Debug, Clone, Error)]
pub enum LogicError {
    /// Query parse error
    #[error("{code}: {message}")]
    Parse {
        code: ErrorCode,
        message: String,
        query: String,
        location: Option<SourceLocation>,
    },

    /// Rule definition or binding error
    #[error("{code}: {message}")]
    Rule {
        code: ErrorCode,
        message: String,
        token: Option<String>,
    },

    /// Evaluation error
    #[error("{code}: {message}")]
    Evaluation { code: ErrorCode, message: String },

    /// System error
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<LogicError>),
}

impl LogicError {
    /// Create a parse error
    pub fn parse(code: ErrorCode, message: impl Into<String>, query: impl Into<String>) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            query: query.into(),
            location: None,
        }
    }

    /// Create a parse error pointing at a span of the query
    pub fn parse_at(
        code: ErrorCode,
        message: impl Into<String>,
        query: impl Into<String>,
        span: Span,
    ) -> Self {
        let query = query.into();
        let location = SourceLocation::from_span(span, &query);
        Self::Parse {
            code,
            message: message.into(),
            query,
            location: Some(location),
        }
    }

    /// Create a rule error
    pub fn rule(code: ErrorCode, message: impl Into<String>, token: Option<String>) -> Self {
        Self::Rule {
            code,
            message: message.into(),
            token,
        }
    }

    /// Create an evaluation error
    pub fn evaluation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Evaluation {
            code,
            message: message.into(),
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to a system error; other kinds are returned unchanged
    pub fn with_context(self, context: impl Into<String>) -> Self {
        match self {
            Self::System { code, message, .. } => Self::System {
                code,
                message,
                context: Some(context.into()),
            },
            other => other,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { code, .. } => *code,
            Self::Rule { code, .. } => *code,
            Self::Evaluation { code, .. } => *code,
            Self::System { code, .. } => *code,
            Self::Multiple(errors) => errors.first().map(|e| e.code()).unwrap_or(ErrorCode::new(0)),
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Parse { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Parse { code, message, location, .. } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(loc) = location {
                    diag = diag.with_location(loc.clone());
                }
                diag
            }
            Self::Rule { code, message, token } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(token) = token {
                    diag = diag.with_help(format!("while processing rule '{}'", token));
                }
                diag
            }
            Self::Evaluation { code, message } => Diagnostic::error(*code, message.clone()),
            Self::System { code, message, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(ctx) = context {
                    diag = diag.with_help(ctx.clone());
                }
                diag
            }
            Self::Multiple(errors) => {
                if let Some(first) = errors.first() {
                    first.to_diagnostic()
                } else {
                    Diagnostic::error(ErrorCode::new(0), "Unknown error")
                }
            }
        }
    }
}
