//! Format-string parser
//!
//! A format string is scanned once, left to right:
//!
//! ```text
//! format  := body [ ':' name | ';' message ]
//! body    := ( code [ '+' ] | '|' | '$' )*
//! code    := 'i' | 'l' | 'd' | 'O' | 'N'
//! ```
//!
//! `$` and `+` are only understood by the keyword variant. The trailer is split
//! off before scanning so every error can name the function.

use crate::errors::{ArgError, Reporter, Template};
use serde::Serialize;
use std::fmt;

/// Which entry point a format string is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Variant {
    Positional,
    Keywords,
}

/// Native type a parameter converts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeCode {
    /// `i`: native int
    Int,
    /// `l`: native long
    Long,
    /// `d`: native double
    Double,
    /// `O`: borrowed handle
    Object,
    /// `N`: owned handle
    NewObject,
}

impl TypeCode {
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(Self::Int),
            'l' => Some(Self::Long),
            'd' => Some(Self::Double),
            'O' => Some(Self::Object),
            'N' => Some(Self::NewObject),
            _ => None,
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Int => 'i',
            Self::Long => 'l',
            Self::Double => 'd',
            Self::Object => 'O',
            Self::NewObject => 'N',
        }
    }

    /// Whether conversion hands out an owned handle
    pub const fn transfers_ownership(self) -> bool {
        matches!(self, Self::NewObject)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArgSpec {
    pub code: TypeCode,
    pub optional: bool,
    pub keyword_only: bool,
}

/// Parsed, immutable format string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSpec {
    variant: Variant,
    args: Vec<ArgSpec>,
    name: Option<String>,
    message: Option<String>,
    min_required: usize,
}

impl FormatSpec {
    /// Parse a format string for [`Variant::Positional`]
    pub fn positional(fmt: &str) -> Result<Self, ArgError> {
        Self::parse(fmt, Variant::Positional)
    }

    /// Parse a format string for [`Variant::Keywords`]
    pub fn keywords(fmt: &str) -> Result<Self, ArgError> {
        Self::parse(fmt, Variant::Keywords)
    }

    pub fn parse(fmt: &str, variant: Variant) -> Result<Self, ArgError> {
        let (body, name, message) = split_trailer(fmt);
        let reporter = Reporter::new(name, message);

        let mut args = Vec::with_capacity(body.len());
        let mut optional = false;
        let mut keyword_only = false;
        let mut after_code = false;

        for c in body.chars() {
            if let Some(code) = TypeCode::from_char(c) {
                args.push(ArgSpec { code, optional, keyword_only });
                after_code = true;
                continue;
            }

            let accepted = match (c, variant) {
                ('|', _) if !optional => {
                    optional = true;
                    true
                }
                ('$', Variant::Keywords) if !keyword_only => {
                    keyword_only = true;
                    true
                }
                ('+', Variant::Keywords) => after_code,
                _ => false,
            };

            if !accepted {
                return Err(reporter.report(Template::UnknownFormatCode));
            }
            after_code = false;
        }

        let min_required = args.iter().filter(|a| !a.optional).count();

        tracing::trace!(
            target: "argmarshal",
            fmt,
            ?variant,
            params = args.len(),
            min_required,
            "format parsed"
        );

        Ok(Self {
            variant,
            args,
            name: name.filter(|n| !n.is_empty()).map(str::to_string),
            message: message.map(str::to_string),
            min_required,
        })
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Function name from a `:name` trailer
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Override text from a `;message` trailer
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Number of non-optional parameters
    pub fn min_required(&self) -> usize {
        self.min_required
    }

    pub fn max_total(&self) -> usize {
        self.args.len()
    }

    pub fn reporter(&self) -> Reporter<'_> {
        Reporter::new(self.name.as_deref(), self.message.as_deref())
    }
}

/// Split `body[:name|;message]`; the first `:` or `;` wins
fn split_trailer(fmt: &str) -> (&str, Option<&str>, Option<&str>) {
    match fmt.find(|c: char| c == ':' || c == ';') {
        Some(pos) => {
            let (body, rest) = fmt.split_at(pos);
            let text = &rest[1..];
            if rest.starts_with(':') {
                (body, Some(text), None)
            } else {
                (body, None, Some(text))
            }
        }
        None => (fmt, None, None),
    }
}
