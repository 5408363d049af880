//! # Error Types
//!
//! Error taxonomy for the usergate service using `thiserror`.

/// Custom result type for usergate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for usergate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A credential could not be processed at all (e.g. an empty password given to the hasher)
    #[error("Invalid credential input: {0}")]
    InvalidCredentialInput(String),

    /// An account with this email already exists
    #[error("An account with email '{email}' already exists")]
    DuplicateAccount { email: String },

    /// Wrong email or wrong password; the two are never distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, forged or expired token
    #[error("Authentication required")]
    Unauthorized,

    /// The authenticated account no longer exists
    #[error("Account '{id}' not found")]
    AccountNotFound { id: String },

    /// Password does not satisfy the password policy
    #[error("{0}")]
    PasswordPolicyViolation(String),

    /// Field-level validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// The user store could not complete the operation
    #[error("Store unavailable: {context}")]
    StoreUnavailable {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    pub fn invalid_credential_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidCredentialInput(message.into())
    }

    pub fn duplicate_account<S: Into<String>>(email: S) -> Self {
        Self::DuplicateAccount { email: email.into() }
    }

    pub fn account_not_found<S: Into<String>>(id: S) -> Self {
        Self::AccountNotFound { id: id.into() }
    }

    pub fn password_policy<S: Into<String>>(message: S) -> Self {
        Self::PasswordPolicyViolation(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a new validation error tied to a request field
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Wrap a store failure with context
    pub fn store<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::StoreUnavailable { source, context: context.into() }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a new configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Stable, machine-readable kind reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentialInput(_) => "invalid_credential_input",
            Self::DuplicateAccount { .. } => "duplicate_account",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthorized => "unauthorized",
            Self::AccountNotFound { .. } => "account_not_found",
            Self::PasswordPolicyViolation(_) => "password_policy_violation",
            Self::Validation { .. } => "validation_failed",
            Self::StoreUnavailable { .. }
            | Self::Config { .. }
            | Self::Io { .. }
            | Self::Internal { .. } => "internal_error",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentialInput(_)
            | Self::PasswordPolicyViolation(_)
            | Self::Validation { .. } => 400,
            Self::InvalidCredentials | Self::Unauthorized => 401,
            Self::AccountNotFound { .. } => 404,
            Self::DuplicateAccount { .. } => 409,
            Self::StoreUnavailable { .. }
            | Self::Config { .. }
            | Self::Io { .. }
            | Self::Internal { .. } => 500,
        }
    }

    /// Whether the failure is an infrastructure problem that must stay opaque to callers
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreUnavailable { source: err, context: "Database operation failed".to_string() }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io { source: err, context: "I/O operation failed".to_string() }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        let field_errors = err.field_errors();

        // Report the first failing field; ordering of the map is not stable so sort by name.
        let mut fields: Vec<_> = field_errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        match fields.first().and_then(|(field, errors)| errors.first().map(|e| (field, e))) {
            Some((field, error)) => {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                Self::Validation { message, field: Some(field.to_string()) }
            }
            None => Self::Validation { message: err.to_string(), field: None },
        }
    }
}
