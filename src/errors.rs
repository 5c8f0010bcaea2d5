//! Error taxonomy and message synthesis
//!
//! Every failure the engine reports is an [`ArgError`]: a kind, the template
//! that produced it, and the final message text. Messages are built by a
//! [`Reporter`] that knows the function name and override text declared in the
//! format string.

use serde::Serialize;
use std::fmt;

/// Broad class of a parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The extension's own declaration is wrong (bad format string or
    /// parameter-name list). Never subject to message override.
    Usage,
    /// The dynamic caller passed bad arguments.
    Call,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage => write!(f, "usage error"),
            Self::Call => write!(f, "call error"),
        }
    }
}

/// Fixed message templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Template {
    UnknownFormatCode,
    EmptyKeywordName,
    RequiredPositionalMissing,
    TooManyArguments,
    NoValueForRequired,
    TooFewKeywords,
    TooManyKeywords,
    KeywordOnlyAsPositional,
    ExpectedInt,
    ExpectedNumber,
    IntOverflow,
    IntUnderflow,
}

impl Template {
    /// Kind of error this template reports
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::UnknownFormatCode | Self::EmptyKeywordName => ErrorKind::Usage,
            _ => ErrorKind::Call,
        }
    }

    /// Verbatim template text
    pub const fn text(self) -> &'static str {
        match self {
            Self::UnknownFormatCode => "unknown arg format code",
            Self::EmptyKeywordName => "empty keyword parameter name",
            Self::RequiredPositionalMissing => "required positional argument missing",
            Self::TooManyArguments => "mismatched args (too many arguments for fmt)",
            Self::NoValueForRequired => "no value for required argument",
            Self::TooFewKeywords => "mismatched args (too few keywords for fmt)",
            Self::TooManyKeywords => "mismatched args (too many keywords for fmt)",
            Self::KeywordOnlyAsPositional => "keyword only argument passed as positional argument",
            Self::ExpectedInt => "argument must be int",
            Self::ExpectedNumber => "argument must be int or float",
            Self::IntOverflow => "signed integer is greater than maximum",
            Self::IntUnderflow => "signed integer is less than minimum",
        }
    }
}

/// A failed parse: kind, originating template, and final message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgError {
    kind: ErrorKind,
    template: Template,
    message: String,
}

impl ArgError {
    pub fn new(template: Template, message: impl Into<String>) -> Self {
        Self {
            kind: template.kind(),
            template,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn template(&self) -> Template {
        self.template
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_usage(&self) -> bool {
        self.kind == ErrorKind::Usage
    }

    pub fn is_call(&self) -> bool {
        self.kind == ErrorKind::Call
    }
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ArgError {}

/// Builds [`ArgError`]s for one format string
///
/// Usage errors always use `"<name>() <template>"` (or `"function <template>"`
/// without a name). Call errors use the override message verbatim when one was
/// declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter<'s> {
    name: Option<&'s str>,
    message: Option<&'s str>,
}

impl<'s> Reporter<'s> {
    pub fn new(name: Option<&'s str>, message: Option<&'s str>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            message,
        }
    }

    pub fn name(&self) -> Option<&'s str> {
        self.name
    }

    pub fn report(&self, template: Template) -> ArgError {
        let message = match (template.kind(), self.message) {
            (ErrorKind::Call, Some(custom)) => custom.to_string(),
            _ => self.prefixed(template.text()),
        };

        tracing::debug!(
            target: "argmarshal",
            kind = %template.kind(),
            ?template,
            function = self.name.unwrap_or("function"),
            "argument parsing failed"
        );

        ArgError::new(template, message)
    }

    fn prefixed(&self, text: &str) -> String {
        match self.name {
            Some(name) => format!("{}() {}", name, text),
            None => format!("function {}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix() {
        let err = Reporter::default().report(Template::RequiredPositionalMissing);
        assert_eq!(err.message(), "function required positional argument missing");
        assert_eq!(err.kind(), ErrorKind::Call);
    }

    #[test]
    fn test_named_prefix() {
        let err = Reporter::new(Some("my_func"), None).report(Template::TooManyArguments);
        assert_eq!(err.to_string(), "my_func() mismatched args (too many arguments for fmt)");
    }

    #[test]
    fn test_override_replaces_call_errors() {
        let reporter = Reporter::new(None, Some("my-error-message"));
        assert_eq!(reporter.report(Template::TooFewKeywords).message(), "my-error-message");
        assert_eq!(reporter.report(Template::ExpectedInt).message(), "my-error-message");
    }

    #[test]
    fn test_override_never_applies_to_usage_errors() {
        let reporter = Reporter::new(None, Some("ignored"));
        let err = reporter.report(Template::EmptyKeywordName);
        assert!(err.is_usage());
        assert_eq!(err.message(), "function empty keyword parameter name");
    }

    #[test]
    fn test_empty_name_is_absent() {
        let err = Reporter::new(Some(""), None).report(Template::UnknownFormatCode);
        assert_eq!(err.message(), "function unknown arg format code");
    }
}
