use http::StatusCode;
use std::fmt;

/// The closed set of failures a guard or the login flow may report.
///
/// Everything the client sees is one of these; persistence details never
/// reach the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoToken,
    InvalidToken,
    /// Bad credentials. Unknown user and wrong password are indistinguishable.
    Unauthorized,
    AlreadyExists,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NoToken => "AUTH_NO_TOKEN",
            ErrorKind::InvalidToken => "AUTH_INVALID_TOKEN",
            ErrorKind::Unauthorized => "ACCESS_UNAUTHORIZED",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NoToken | ErrorKind::InvalidToken | ErrorKind::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            ErrorKind::AlreadyExists => StatusCode::PRECONDITION_FAILED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::NoToken => "No token was found on request headers.",
            ErrorKind::InvalidToken => "The token provided is invalid.",
            ErrorKind::Unauthorized => "Access unauthorized.",
            ErrorKind::AlreadyExists => "This resource already exists on the database.",
            ErrorKind::NotFound => "The requested resource could not be found",
            ErrorKind::Internal => "Internal server error.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A terminal failure raised while a request is guarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {}", .kind.code(), .kind.message())]
pub struct GuardError {
    kind: ErrorKind,
}

impl GuardError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    pub fn no_token() -> Self {
        Self::new(ErrorKind::NoToken)
    }

    pub fn invalid_token() -> Self {
        Self::new(ErrorKind::InvalidToken)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized)
    }

    pub fn already_exists() -> Self {
        Self::new(ErrorKind::AlreadyExists)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }
}

impl From<ErrorKind> for GuardError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}
