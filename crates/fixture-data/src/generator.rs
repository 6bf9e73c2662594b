//! Deterministic fixture generation from a single seed.
//!
//! [`FixtureGenerator`] owns the only RNG of a run. Every identifier,
//! timestamp, and text value handed to the seeding stages is drawn from it,
//! so the same seed and reference time always reproduce the same fixture set.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use fake::Fake;
use fake::faker::company::raw::{Buzzword, CatchPhrase, CompanyName};
use fake::faker::internet::raw::{IPv4, UserAgent};
use fake::faker::lorem::raw::{Paragraph, Sentence, Word};
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::GenerationError;
use crate::profile::{CountRange, Profile};
use crate::validation::{
    DISPLAY_NAME_MAX, is_valid_display_name, is_valid_email, sanitize_display_name,
};

/// Maximum number of attempts to generate a valid display name.
const MAX_NAME_ATTEMPTS: usize = 100;

/// Maximum number of attempts to find an unused e-mail address.
const MAX_EMAIL_ATTEMPTS: usize = 50;

/// Domains used for generated e-mail addresses.
const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

const SECONDS_PER_DAY: i64 = 86_400;

/// Seeded source of every random value used during a run.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use fixture_data::FixtureGenerator;
///
/// let reference = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("timestamp");
/// let mut first = FixtureGenerator::new(7, reference);
/// let mut second = FixtureGenerator::new(7, reference);
///
/// assert_eq!(first.uuid(), second.uuid());
/// assert_eq!(
///     first.person_name().expect("name"),
///     second.person_name().expect("name"),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FixtureGenerator {
    rng: ChaCha8Rng,
    reference_time: DateTime<Utc>,
    used_emails: HashSet<String>,
}

impl FixtureGenerator {
    /// Creates a generator seeded with `seed`.
    ///
    /// Generated timestamps are offsets from `reference_time`, never from the
    /// wall clock.
    #[must_use]
    pub fn new(seed: u64, reference_time: DateTime<Utc>) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            reference_time,
            used_emails: HashSet::new(),
        }
    }

    /// Creates a generator from a profile's seed and reference time.
    #[must_use]
    pub fn for_profile(profile: &Profile) -> Self {
        Self::new(profile.seed(), profile.reference_time())
    }

    /// Returns the instant timestamps are derived from.
    #[must_use]
    pub const fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// Draws a deterministic identifier.
    pub fn uuid(&mut self) -> Uuid {
        Uuid::from_u128(self.rng.random())
    }

    /// Draws a count within `range`.
    pub fn count(&mut self, range: CountRange) -> usize {
        self.between(range.min(), range.max())
    }

    /// Draws an integer in `min..=max`, returning `min` when the bounds meet.
    pub fn between(&mut self, min: usize, max: usize) -> usize {
        if min >= max {
            min
        } else {
            self.rng.random_range(min..=max)
        }
    }

    /// Draws a `u32` in `min..=max`.
    pub fn between_u32(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            min
        } else {
            self.rng.random_range(min..=max)
        }
    }

    /// Returns `true` with probability `numerator / denominator`.
    pub fn chance(&mut self, numerator: u32, denominator: u32) -> bool {
        if denominator == 0 || numerator >= denominator {
            return denominator != 0;
        }
        self.rng.random_ratio(numerator, denominator)
    }

    /// Picks one element, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..items.len());
        items.get(index)
    }

    /// Picks one identifier that is not in `exclude`.
    pub fn pick_excluding(&mut self, ids: &[Uuid], exclude: &HashSet<Uuid>) -> Option<Uuid> {
        let candidates: Vec<Uuid> = ids
            .iter()
            .copied()
            .filter(|id| !exclude.contains(id))
            .collect();
        self.pick(&candidates).copied()
    }

    /// Selects between `min_count` and `max_count` distinct identifiers that
    /// are not in `exclude`.
    ///
    /// Bounds are clamped to the number of eligible candidates, so the result
    /// may be smaller than `min_count` when too few remain. Repeated input
    /// identifiers are considered once.
    pub fn subset_excluding(
        &mut self,
        ids: &[Uuid],
        exclude: &HashSet<Uuid>,
        min_count: usize,
        max_count: usize,
    ) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        let mut candidates: Vec<Uuid> = ids
            .iter()
            .copied()
            .filter(|id| !exclude.contains(id) && seen.insert(*id))
            .collect();
        if candidates.is_empty() {
            return candidates;
        }

        let clamped_min = min_count.min(candidates.len());
        let clamped_max = max_count.min(candidates.len());
        let count = self.between(clamped_min, clamped_max);

        candidates.shuffle(&mut self.rng);
        candidates.truncate(count);
        candidates
    }

    /// A timestamp up to `max_days` before the reference time.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::TimestampOutOfRange`] if the offset cannot
    /// be represented.
    pub fn past(&mut self, max_days: u32) -> Result<DateTime<Utc>, GenerationError> {
        let seconds = self.offset_seconds(max_days);
        offset(self.reference_time, -seconds)
    }

    /// A timestamp up to `max_days` after the reference time.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::TimestampOutOfRange`] if the offset cannot
    /// be represented.
    pub fn future(&mut self, max_days: u32) -> Result<DateTime<Utc>, GenerationError> {
        let seconds = self.offset_seconds(max_days);
        offset(self.reference_time, seconds)
    }

    /// A timestamp up to `max_days` after `start`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::TimestampOutOfRange`] if the offset cannot
    /// be represented.
    pub fn after(
        &mut self,
        start: DateTime<Utc>,
        max_days: u32,
    ) -> Result<DateTime<Utc>, GenerationError> {
        let seconds = self.offset_seconds(max_days);
        offset(start, seconds)
    }

    fn offset_seconds(&mut self, max_days: u32) -> i64 {
        let max = i64::from(max_days).saturating_mul(SECONDS_PER_DAY);
        if max == 0 {
            0
        } else {
            self.rng.random_range(0..=max)
        }
    }

    /// Generates a valid display name.
    ///
    /// Names are a first name followed by a last name, sanitised and
    /// truncated; generation retries until the result validates.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::DisplayNameGenerationFailed`] when no valid
    /// name is produced within the retry budget.
    pub fn person_name(&mut self) -> Result<String, GenerationError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let first: String = FirstName(EN).fake_with_rng(&mut self.rng);
            let last: String = LastName(EN).fake_with_rng(&mut self.rng);
            let sanitized = sanitize_display_name(&format!("{first} {last}"));
            let truncated: String = sanitized.chars().take(DISPLAY_NAME_MAX).collect();

            if is_valid_display_name(&truncated) {
                return Ok(truncated);
            }
        }

        Err(GenerationError::DisplayNameGenerationFailed {
            max_attempts: MAX_NAME_ATTEMPTS,
        })
    }

    /// Marks an address as taken so generated addresses never collide with
    /// it. Returns `false` when it was already reserved.
    pub fn reserve_email(&mut self, email: &str) -> bool {
        self.used_emails.insert(email.to_ascii_lowercase())
    }

    /// Generates an unused e-mail address derived from `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::EmailGenerationFailed`] when every attempt
    /// collides with an address already handed out.
    pub fn unique_email(&mut self, name: &str) -> Result<String, GenerationError> {
        let local = email_local_part(name);
        for attempt in 0..MAX_EMAIL_ATTEMPTS {
            let domain = self.pick(EMAIL_DOMAINS).copied().unwrap_or("example.com");
            let candidate = if attempt == 0 {
                format!("{local}@{domain}")
            } else {
                let suffix: u16 = self.rng.random_range(1..10_000);
                format!("{local}{suffix}@{domain}")
            };
            if is_valid_email(&candidate) && self.reserve_email(&candidate) {
                return Ok(candidate);
            }
        }

        Err(GenerationError::EmailGenerationFailed {
            max_attempts: MAX_EMAIL_ATTEMPTS,
        })
    }

    /// A single lorem word.
    pub fn word(&mut self) -> String {
        Word(EN).fake_with_rng(&mut self.rng)
    }

    /// A capitalised title of `min..=max` lorem words.
    pub fn title(&mut self, min_words: usize, max_words: usize) -> String {
        let count = self.between(min_words.max(1), max_words.max(1));
        let words: Vec<String> = (0..count).map(|_| self.word()).collect();
        capitalise(&words.join(" "))
    }

    /// A lorem sentence.
    pub fn sentence(&mut self) -> String {
        Sentence(EN, 4..10).fake_with_rng(&mut self.rng)
    }

    /// A lorem paragraph.
    pub fn paragraph(&mut self) -> String {
        Paragraph(EN, 1..3).fake_with_rng(&mut self.rng)
    }

    /// A company name.
    pub fn company_name(&mut self) -> String {
        CompanyName(EN).fake_with_rng(&mut self.rng)
    }

    /// A marketing buzzword.
    pub fn buzzword(&mut self) -> String {
        Buzzword(EN).fake_with_rng(&mut self.rng)
    }

    /// A marketing catch phrase.
    pub fn catch_phrase(&mut self) -> String {
        CatchPhrase(EN).fake_with_rng(&mut self.rng)
    }

    /// A `#rrggbb` colour.
    pub fn hex_color(&mut self) -> String {
        let value: u32 = self.rng.random_range(0..=0x00FF_FFFF);
        format!("#{value:06x}")
    }

    /// An IPv4 address.
    pub fn ipv4(&mut self) -> String {
        IPv4(EN).fake_with_rng(&mut self.rng)
    }

    /// A browser user agent.
    pub fn user_agent(&mut self) -> String {
        UserAgent(EN).fake_with_rng(&mut self.rng)
    }

    /// A 32-character lowercase hex token.
    pub fn token(&mut self) -> String {
        let value: u128 = self.rng.random();
        format!("{value:032x}")
    }

    /// Hashes `password` with a generated salt as `sha256$<salt>$<digest>`.
    pub fn password_hash(&mut self, password: &str) -> String {
        let salt_bytes: [u8; 16] = self.rng.random();
        let salt = hex::encode(salt_bytes);
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("sha256${salt}${}", hex::encode(hasher.finalize()))
    }
}

/// Shifts `start` by exactly `days`.
///
/// # Errors
///
/// Returns [`GenerationError::TimestampOutOfRange`] if the result cannot be
/// represented.
pub fn shift_days(start: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, GenerationError> {
    offset(start, days.saturating_mul(SECONDS_PER_DAY))
}

fn offset(start: DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>, GenerationError> {
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or(GenerationError::TimestampOutOfRange { seconds })
}

/// Lowercase dotted e-mail local part built from a display name.
fn email_local_part(name: &str) -> String {
    let mut local = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            local.push(c.to_ascii_lowercase());
        } else if !local.is_empty() && !local.ends_with('.') {
            local.push('.');
        }
    }
    let trimmed = local.trim_end_matches('.');
    if trimmed.is_empty() {
        "user".to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
