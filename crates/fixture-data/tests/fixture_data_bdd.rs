//! Behavioural tests for the fixture-data crate.
//!
//! These tests bind the Gherkin scenarios covering profile loading,
//! deterministic generation, and record validation.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use fixture_data::validation::validate_tag;
use fixture_data::{
    FixtureGenerator, Profile, ProfileCounts, ProfileRegistry, TagRecord, TagScope,
    ValidationReport, is_valid_display_name, is_valid_email,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use uuid::Uuid;

/// Test world holding the registry, generator output, and validation results.
#[derive(Default, ScenarioState)]
struct World {
    registry: Slot<ProfileRegistry>,
    profile: Slot<Profile>,
    seed: Slot<u64>,
    first_draw: Slot<Vec<String>>,
    second_draw: Slot<Vec<String>>,
    emails: Slot<Vec<String>>,
    tag: Slot<TagRecord>,
    report: Slot<ValidationReport>,
}

impl World {
    fn registry(&self) -> ProfileRegistry {
        self.registry.get().expect("registry should be loaded")
    }

    fn seed(&self) -> u64 {
        self.seed.get().expect("seed should be set")
    }
}

fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn world() -> World {
    World::default()
}

// ============================================================================
// Given steps
// ============================================================================

#[given("the built-in profile registry")]
fn the_built_in_profile_registry(world: &World) {
    let registry = ProfileRegistry::builtin().expect("builtin registry parses");
    world.registry.set(registry);
}

#[given("a generator seeded with {seed:u64}")]
fn a_generator_seeded_with(world: &World, seed: u64) {
    world.seed.set(seed);
}

#[given("a tag with an invalid colour")]
fn a_tag_with_an_invalid_colour(world: &World) {
    world.tag.set(TagRecord {
        id: Uuid::from_u128(1),
        name: "broken".to_owned(),
        color: "not-a-color".to_owned(),
        description: None,
        scope: TagScope::Global,
        scope_ref: None,
        created_by: Uuid::from_u128(2),
        created_at: reference_time(),
    });
}

// ============================================================================
// When steps
// ============================================================================

#[when("the test profile is selected")]
fn the_test_profile_is_selected(world: &World) {
    let registry = world.registry();
    let profile = registry.find_profile("test").expect("test profile");
    world.profile.set(profile.clone());
}

#[when("the production profile is selected")]
fn the_production_profile_is_selected(world: &World) {
    let registry = world.registry();
    let profile = registry.find_profile("production").expect("production profile");
    world.profile.set(profile.clone());
}

#[when("{count:usize} names are drawn twice from fresh generators")]
fn names_are_drawn_twice(world: &World, count: usize) {
    let draw = |seed: u64| -> Vec<String> {
        let mut generator = FixtureGenerator::new(seed, reference_time());
        (0..count)
            .map(|_| generator.person_name().expect("name"))
            .collect()
    };
    world.first_draw.set(draw(world.seed()));
    world.second_draw.set(draw(world.seed()));
}

#[when("{count:usize} e-mail addresses are generated")]
fn e_mail_addresses_are_generated(world: &World, count: usize) {
    let mut generator = FixtureGenerator::new(world.seed(), reference_time());
    let emails = (0..count)
        .map(|_| {
            let name = generator.person_name().expect("name");
            generator.unique_email(&name).expect("email")
        })
        .collect();
    world.emails.set(emails);
}

#[when("the tag is validated")]
fn the_tag_is_validated(world: &World) {
    let tag = world.tag.get().expect("tag should be set");
    world.report.set(validate_tag(&tag));
}

// ============================================================================
// Then steps
// ============================================================================

#[then("the profile seed is {seed:u64}")]
fn the_profile_seed_is(world: &World, seed: u64) {
    let profile = world.profile.get().expect("profile should be selected");
    assert_eq!(profile.seed(), seed);
}

#[then("the profile lists {count:usize} fixed users")]
fn the_profile_lists_fixed_users(world: &World, count: usize) {
    let profile = world.profile.get().expect("profile should be selected");
    assert_eq!(profile.fixed_users().len(), count);
}

#[then("both draws are identical")]
fn both_draws_are_identical(world: &World) {
    let first = world.first_draw.get().expect("first draw");
    let second = world.second_draw.get().expect("second draw");
    assert_eq!(first, second, "draws should be deterministic");
}

#[then("every drawn name is a valid display name")]
fn every_drawn_name_is_valid(world: &World) {
    for name in world.first_draw.get().expect("first draw") {
        assert!(is_valid_display_name(&name), "invalid name: {name}");
    }
}

#[then("every address is valid and distinct")]
fn every_address_is_valid_and_distinct(world: &World) {
    let emails = world.emails.get().expect("emails");
    let distinct: HashSet<&String> = emails.iter().collect();
    assert_eq!(distinct.len(), emails.len());
    for email in &emails {
        assert!(is_valid_email(email), "invalid email: {email}");
    }
}

#[then("validation reports a colour error")]
fn validation_reports_a_colour_error(world: &World) {
    let report = world.report.get().expect("report");
    assert!(!report.is_valid());
    assert!(report.errors().iter().any(|issue| issue.field == "color"));
}

#[then("every profile count is zero")]
fn every_profile_count_is_zero(world: &World) {
    let profile = world.profile.get().expect("profile should be selected");
    assert_eq!(*profile.counts(), ProfileCounts::default());
}

// ============================================================================
// Scenario bindings
// ============================================================================

#[scenario(
    path = "tests/features/fixture_data.feature",
    name = "Built-in registry provides the test profile"
)]
fn built_in_registry_provides_the_test_profile(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/fixture_data.feature",
    name = "Same seed reproduces the same draws"
)]
fn same_seed_reproduces_the_same_draws(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/fixture_data.feature",
    name = "Generated e-mail addresses are unique"
)]
fn generated_e_mail_addresses_are_unique(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/fixture_data.feature",
    name = "Tag with a malformed colour is rejected"
)]
fn tag_with_a_malformed_colour_is_rejected(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/fixture_data.feature",
    name = "Production profile creates nothing"
)]
fn production_profile_creates_nothing(world: World) {
    let _ = world;
}
