//! Generator configuration.

use serde::{Deserialize, Serialize};

/// Options shared by every generator call.
///
/// Passed explicitly; nothing is read from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Schema applied to table references that name none
    pub schema: Option<String>,
    /// Drop NULL values from INSERT/UPDATE column lists
    pub omit_null: bool,
    /// Replace join and column aliases with short tokens in SELECT
    pub minify_aliases: bool,
    /// Quote identifiers (always on for generated aliases)
    pub quote_identifiers: bool,
    /// Offset used when formatting naive date-times, as `+HH:MM`
    pub timezone: String,
    /// Bind INSERT/UPDATE values instead of inlining escaped literals
    pub bind_param: bool,
    /// Enforce the dialect identifier length limit on generated names
    pub check_identifier_length: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            schema: None,
            omit_null: false,
            minify_aliases: false,
            quote_identifiers: true,
            timezone: "+00:00".to_string(),
            bind_param: true,
            check_identifier_length: true,
        }
    }
}

impl GeneratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_omit_null(mut self, omit_null: bool) -> Self {
        self.omit_null = omit_null;
        self
    }

    pub fn with_minify_aliases(mut self, minify: bool) -> Self {
        self.minify_aliases = minify;
        self
    }

    pub fn with_quote_identifiers(mut self, quote: bool) -> Self {
        self.quote_identifiers = quote;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_bind_param(mut self, bind_param: bool) -> Self {
        self.bind_param = bind_param;
        self
    }

    pub fn with_check_identifier_length(mut self, check: bool) -> Self {
        self.check_identifier_length = check;
        self
    }

    /// Parse [`timezone`](Self::timezone) into a fixed offset.
    ///
    /// Accepts `Z`, `+HH:MM` and `-HH:MM`.
    pub fn offset(&self) -> crate::Result<chrono::FixedOffset> {
        parse_offset(&self.timezone).ok_or_else(|| {
            crate::ConfigError::new(format!("invalid timezone offset \"{}\"", self.timezone)).into()
        })
    }
}

fn parse_offset(text: &str) -> Option<chrono::FixedOffset> {
    if text == "Z" || text == "UTC" {
        return chrono::FixedOffset::east_opt(0);
    }
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    chrono::FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
