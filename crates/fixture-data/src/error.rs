//! Error types for the fixture-data crate.
//!
//! This module defines semantic error enums for profile registry parsing and
//! fixture generation, following the project's error handling conventions
//! with `thiserror`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when parsing or querying a profile registry.
///
/// These errors cover file I/O, JSON parsing, schema validation, and profile
/// lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// The registry file could not be read.
    #[error("failed to read profile registry at '{path}': {message}")]
    IoError {
        /// Path to the registry file.
        path: PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// The registry JSON is malformed or missing required fields.
    #[error("invalid profile registry JSON: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// The registry version is not supported.
    #[error("unsupported profile registry version: expected {expected}, found {actual}")]
    UnsupportedVersion {
        /// Expected version number.
        expected: u32,
        /// Actual version found in the registry.
        actual: u32,
    },

    /// The registry contains no profiles.
    #[error("profile registry contains no profiles")]
    EmptyProfiles,

    /// Two profiles share a name.
    #[error("profile '{name}' is defined more than once")]
    DuplicateProfile {
        /// The repeated profile name.
        name: String,
    },

    /// The requested profile was not found in the registry.
    #[error("profile '{name}' not found in registry")]
    ProfileNotFound {
        /// The profile name that was not found.
        name: String,
    },

    /// The reference time is not an RFC 3339 timestamp.
    #[error("profile '{profile}' has an invalid reference time: {value}")]
    InvalidReferenceTime {
        /// Profile carrying the value.
        profile: String,
        /// The rejected timestamp string.
        value: String,
    },

    /// A count range has its bounds inverted.
    #[error("profile '{profile}' count '{field}' has min {min} greater than max {max}")]
    InvalidRange {
        /// Profile carrying the range.
        profile: String,
        /// Count field name.
        field: &'static str,
        /// Lower bound.
        min: usize,
        /// Upper bound.
        max: usize,
    },

    /// A fixed user e-mail address is malformed.
    #[error("profile '{profile}' fixed user e-mail is invalid: {email}")]
    InvalidFixedUserEmail {
        /// Profile carrying the fixed user.
        profile: String,
        /// The rejected address.
        email: String,
    },
}

/// Errors that can occur during fixture generation.
///
/// These errors indicate that the generator could not produce a value that
/// satisfies the record constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Failed to generate a valid display name after maximum retries.
    #[error("failed to generate valid display name after {max_attempts} attempts")]
    DisplayNameGenerationFailed {
        /// Number of attempts made before giving up.
        max_attempts: usize,
    },

    /// Failed to generate an unused e-mail address after maximum retries.
    #[error("failed to generate a unique e-mail address after {max_attempts} attempts")]
    EmailGenerationFailed {
        /// Number of attempts made before giving up.
        max_attempts: usize,
    },

    /// A timestamp offset fell outside the representable range.
    #[error("timestamp offset of {seconds} seconds is out of range")]
    TimestampOutOfRange {
        /// Requested offset from the reference time.
        seconds: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_error_io_formats_correctly() {
        let err = ProfileError::IoError {
            path: PathBuf::from("/tmp/profiles.json"),
            message: "file not found".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "failed to read profile registry at '/tmp/profiles.json': file not found"
        );
    }

    #[test]
    fn profile_error_version_formats_correctly() {
        let err = ProfileError::UnsupportedVersion {
            expected: 1,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "unsupported profile registry version: expected 1, found 2"
        );
    }

    #[test]
    fn profile_error_not_found_formats_correctly() {
        let err = ProfileError::ProfileNotFound {
            name: "staging".to_owned(),
        };
        assert_eq!(err.to_string(), "profile 'staging' not found in registry");
    }

    #[test]
    fn profile_error_invalid_range_formats_correctly() {
        let err = ProfileError::InvalidRange {
            profile: "test".to_owned(),
            field: "tasksPerBoard",
            min: 5,
            max: 2,
        };
        assert_eq!(
            err.to_string(),
            "profile 'test' count 'tasksPerBoard' has min 5 greater than max 2"
        );
    }

    #[test]
    fn generation_error_display_name_formats_correctly() {
        let err = GenerationError::DisplayNameGenerationFailed { max_attempts: 100 };
        assert_eq!(
            err.to_string(),
            "failed to generate valid display name after 100 attempts"
        );
    }

    #[test]
    fn generation_error_timestamp_formats_correctly() {
        let err = GenerationError::TimestampOutOfRange { seconds: -5 };
        assert_eq!(
            err.to_string(),
            "timestamp offset of -5 seconds is out of range"
        );
    }
}
