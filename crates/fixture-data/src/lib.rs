//! Deterministic fixture generation for seeding a task-board document store.
//!
//! This crate is pure and synchronous: it defines the generated record types,
//! the seeded [`FixtureGenerator`], the per-record validation rules, and the
//! environment [`ProfileRegistry`]. It performs no persistence, so both the
//! seeding service and its tests can depend on it freely.
//!
//! # Overview
//!
//! - Load environment profiles (seed, reference time, fixed users, counts)
//! - Draw reproducible identifiers, names, text, and timestamps
//! - Validate candidate records against their parent records
//!
//! # Example
//!
//! ```
//! use fixture_data::{FixtureGenerator, ProfileRegistry};
//!
//! let registry = ProfileRegistry::builtin().expect("built-in registry");
//! let profile = registry.find_profile("test").expect("test profile");
//!
//! let mut first = FixtureGenerator::for_profile(profile);
//! let mut second = FixtureGenerator::for_profile(profile);
//! assert_eq!(first.uuid(), second.uuid());
//! ```

pub mod catalogue;
mod error;
mod generator;
mod profile;
pub mod records;
pub mod validation;

pub use error::{GenerationError, ProfileError};
pub use generator::{FixtureGenerator, shift_days};
pub use profile::{CountRange, FixedUser, Profile, ProfileCounts, ProfileRegistry};
pub use records::*;
pub use validation::{
    DISPLAY_NAME_MAX, DISPLAY_NAME_MIN, ValidationIssue, ValidationReport, is_valid_display_name,
    is_valid_email, is_valid_hex_color,
};
