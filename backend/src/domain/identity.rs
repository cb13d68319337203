//! Authenticated subjects and their marketplace roles.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validation errors returned by [`SubjectId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectValidationError {
    Empty,
    Untrimmed,
    MissingAtSign,
    TooLong { max: usize },
}

impl fmt::Display for SubjectValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "subject must not be empty"),
            Self::Untrimmed => write!(f, "subject must not carry surrounding whitespace"),
            Self::MissingAtSign => write!(f, "subject must be an email address"),
            Self::TooLong { max } => write!(f, "subject must be at most {max} characters"),
        }
    }
}

impl std::error::Error for SubjectValidationError {}

/// Maximum accepted subject length, matching the directory column width.
pub const SUBJECT_MAX: usize = 254;

/// Opaque identifier of an authenticated subject (an email address).
///
/// The verifier embeds this value in issued credentials; everything
/// downstream treats it as the sole trusted statement of identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Validate and construct a [`SubjectId`] from borrowed input.
    pub fn new(subject: impl AsRef<str>) -> Result<Self, SubjectValidationError> {
        Self::from_owned(subject.as_ref().to_owned())
    }

    fn from_owned(subject: String) -> Result<Self, SubjectValidationError> {
        if subject.is_empty() {
            return Err(SubjectValidationError::Empty);
        }
        if subject.trim() != subject {
            return Err(SubjectValidationError::Untrimmed);
        }
        if subject.len() > SUBJECT_MAX {
            return Err(SubjectValidationError::TooLong { max: SUBJECT_MAX });
        }
        if !subject.contains('@') {
            return Err(SubjectValidationError::MissingAtSign);
        }
        Ok(Self(subject))
    }
}

impl AsRef<str> for SubjectId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<SubjectId> for String {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = SubjectValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Closed set of marketplace roles.
///
/// Authorization is an exact match against one of these values; there is no
/// hierarchy, so an admin does not implicitly satisfy an instructor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Signed in but not yet assigned a marketplace role.
    Unassigned,
    /// Browses, selects, and purchases classes.
    Student,
    /// Publishes and maintains class offerings.
    Instructor,
    /// Reviews offerings and manages the directory.
    Admin,
}

impl Role {
    /// Stable lowercase name used in storage and request payloads.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unassigned" => Ok(Self::Unassigned),
            "student" => Ok(Self::Student),
            "instructor" => Ok(Self::Instructor),
            "admin" => Ok(Self::Admin),
            other => Err(ParseRoleError(other.to_owned())),
        }
    }
}

/// Directory record tying a subject to its role.
///
/// Created on first sign-in with [`Role::Unassigned`]; the role changes only
/// through promotion, and records are never deleted in normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub subject: SubjectId,
    pub role: Role,
}

impl Identity {
    /// Directory record for a first sign-in.
    #[must_use]
    pub fn unassigned(subject: SubjectId) -> Self {
        Self {
            subject,
            role: Role::Unassigned,
        }
    }
}
