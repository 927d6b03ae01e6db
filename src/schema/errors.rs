use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing field: {field}")]
    MissingField { field: String },

    #[error("invalid type in {field}: {reason}")]
    InvalidType { field: String, reason: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("invalid regex in {field}: {source}")]
    InvalidRegex {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("test page doesn't match for parser '{parser}': {url}")]
    TestPageMismatch { parser: String, url: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Dotted path of the offending field, if the error names one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::InvalidType { field, .. }
            | Self::InvalidValue { field, .. }
            | Self::InvalidRegex { field, .. } => Some(field),
            Self::TestPageMismatch { .. } => None,
        }
    }
}
