//! The WHERE operator vocabulary.

use std::fmt;
use std::str::FromStr;

use sqlgen_core::{Dialect, DialectKind, Error, ValidationError, ValidationErrorKind};

/// Every operator understood by the WHERE compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Is,
    IsNot,
    In,
    NotIn,
    Like,
    NotLike,
    ILike,
    NotILike,
    StartsWith,
    EndsWith,
    Substring,
    Regexp,
    NotRegexp,
    IRegexp,
    NotIRegexp,
    Between,
    NotBetween,
    Overlap,
    Contains,
    Contained,
    Adjacent,
    StrictLeft,
    StrictRight,
    NoExtendRight,
    NoExtendLeft,
    Any,
    All,
    Match,
    Col,
    And,
    Or,
    Not,
}

impl Op {
    pub const ALL: [Op; 38] = [
        Op::Eq,
        Op::Ne,
        Op::Gt,
        Op::Gte,
        Op::Lt,
        Op::Lte,
        Op::Is,
        Op::IsNot,
        Op::In,
        Op::NotIn,
        Op::Like,
        Op::NotLike,
        Op::ILike,
        Op::NotILike,
        Op::StartsWith,
        Op::EndsWith,
        Op::Substring,
        Op::Regexp,
        Op::NotRegexp,
        Op::IRegexp,
        Op::NotIRegexp,
        Op::Between,
        Op::NotBetween,
        Op::Overlap,
        Op::Contains,
        Op::Contained,
        Op::Adjacent,
        Op::StrictLeft,
        Op::StrictRight,
        Op::NoExtendRight,
        Op::NoExtendLeft,
        Op::Any,
        Op::All,
        Op::Match,
        Op::Col,
        Op::And,
        Op::Or,
        Op::Not,
    ];

    /// The operator's name as written in filter documents (without `$`).
    pub const fn name(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Ne => "ne",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Is => "is",
            Op::IsNot => "isNot",
            Op::In => "in",
            Op::NotIn => "notIn",
            Op::Like => "like",
            Op::NotLike => "notLike",
            Op::ILike => "iLike",
            Op::NotILike => "notILike",
            Op::StartsWith => "startsWith",
            Op::EndsWith => "endsWith",
            Op::Substring => "substring",
            Op::Regexp => "regexp",
            Op::NotRegexp => "notRegexp",
            Op::IRegexp => "iRegexp",
            Op::NotIRegexp => "notIRegexp",
            Op::Between => "between",
            Op::NotBetween => "notBetween",
            Op::Overlap => "overlap",
            Op::Contains => "contains",
            Op::Contained => "contained",
            Op::Adjacent => "adjacent",
            Op::StrictLeft => "strictLeft",
            Op::StrictRight => "strictRight",
            Op::NoExtendRight => "noExtendRight",
            Op::NoExtendLeft => "noExtendLeft",
            Op::Any => "any",
            Op::All => "all",
            Op::Match => "match",
            Op::Col => "col",
            Op::And => "and",
            Op::Or => "or",
            Op::Not => "not",
        }
    }

    /// SQL keyword or symbol for a comparison operator on `kind`.
    ///
    /// Logical operators and the `LIKE` helpers render through their own
    /// paths; `any`, `all` and `col` compare with `=`.
    pub const fn keyword(self, kind: DialectKind) -> &'static str {
        let postgres = matches!(kind, DialectKind::Postgres);
        match self {
            Op::Eq | Op::Any | Op::All | Op::Col => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Is => "IS",
            Op::IsNot | Op::Not => "IS NOT",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
            Op::Like | Op::StartsWith | Op::EndsWith | Op::Substring => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::ILike => "ILIKE",
            Op::NotILike => "NOT ILIKE",
            Op::Regexp if postgres => "~",
            Op::Regexp => "REGEXP",
            Op::NotRegexp if postgres => "!~",
            Op::NotRegexp => "NOT REGEXP",
            Op::IRegexp => "~*",
            Op::NotIRegexp => "!~*",
            Op::Between => "BETWEEN",
            Op::NotBetween => "NOT BETWEEN",
            Op::Overlap => "&&",
            Op::Contains => "@>",
            Op::Contained => "<@",
            Op::Adjacent => "-|-",
            Op::StrictLeft => "<<",
            Op::StrictRight => ">>",
            Op::NoExtendRight => "&<",
            Op::NoExtendLeft => "&>",
            Op::Match => "@@",
            Op::And => "AND",
            Op::Or => "OR",
        }
    }

    /// `and`, `or` and `not` combine predicates instead of comparing.
    pub const fn is_logical(self) -> bool {
        matches!(self, Op::And | Op::Or | Op::Not)
    }

    pub const fn is_between(self) -> bool {
        matches!(self, Op::Between | Op::NotBetween)
    }

    pub const fn is_in(self) -> bool {
        matches!(self, Op::In | Op::NotIn)
    }

    /// Operators whose right side is a pattern built around the operand.
    pub const fn is_like_helper(self) -> bool {
        matches!(self, Op::StartsWith | Op::EndsWith | Op::Substring)
    }

    /// Array and range operators.
    pub const fn is_range(self) -> bool {
        matches!(
            self,
            Op::Overlap
                | Op::Contains
                | Op::Contained
                | Op::Adjacent
                | Op::StrictLeft
                | Op::StrictRight
                | Op::NoExtendRight
                | Op::NoExtendLeft
        )
    }

    /// Reject the operator if `dialect` cannot express it.
    pub fn check_supported(self, dialect: &Dialect) -> sqlgen_core::Result<()> {
        let supports = dialect.supports();
        let (option, ok) = match self {
            Op::ILike | Op::NotILike => ("iLike", dialect.kind() == DialectKind::Postgres),
            Op::Regexp | Op::NotRegexp => ("REGEXP", supports.enabled("REGEXP")),
            Op::IRegexp | Op::NotIRegexp => ("IREGEXP", supports.enabled("IREGEXP")),
            Op::Overlap | Op::Contains | Op::Contained => (
                "dataTypes.ARRAY",
                supports.enabled("dataTypes.ARRAY") || supports.enabled("dataTypes.RANGE"),
            ),
            Op::Adjacent
            | Op::StrictLeft
            | Op::StrictRight
            | Op::NoExtendRight
            | Op::NoExtendLeft => ("dataTypes.RANGE", supports.enabled("dataTypes.RANGE")),
            Op::Any | Op::All => ("dataTypes.ARRAY", supports.enabled("dataTypes.ARRAY")),
            Op::Match => ("dataTypes.TSVECTOR", supports.enabled("dataTypes.TSVECTOR")),
            _ => return Ok(()),
        };
        if ok {
            return Ok(());
        }
        tracing::debug!(dialect = dialect.name(), operator = self.name(), "operator rejected");
        Err(Error::unsupported(
            dialect.name(),
            option,
            format!(
                "The {} operator is not supported by the {} dialect",
                self.name(),
                dialect.name()
            ),
        ))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Op.{}", self.name())
    }
}

impl FromStr for Op {
    type Err = Error;

    /// Parse `gt`, `$gt` or `Op.gt`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s
            .strip_prefix('$')
            .or_else(|| s.strip_prefix("Op."))
            .unwrap_or(s);
        Op::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| {
                ValidationError::new(
                    ValidationErrorKind::UnknownOperator,
                    format!("\"{s}\" is not a valid operator"),
                )
                .with_operator(s)
                .into()
            })
    }
}
