//! Integration tests for loading profile registries from disk.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]


use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use fixture_data::{CountRange, ProfileError, ProfileRegistry, SystemRole};
use test_support::{open_parent, write_temp_file};

const REGISTRY_JSON: &str = r#"{
    "version": 1,
    "profiles": [{
        "name": "staging",
        "seed": 77,
        "referenceTime": "2026-06-01T08:30:00+02:00",
        "fixedUsers": [
            {"name": "Ops Admin", "email": "ops@example.com", "password": "Ops123!", "systemRole": "admin"}
        ],
        "counts": {"users": {"min": 4, "max": 9}, "boardTemplates": 2}
    }]
}"#;

#[test]
fn loads_registry_from_file() {
    let path = write_temp_file("load", "profiles.json", REGISTRY_JSON).expect("temp file");
    let (dir, name) = open_parent(&path).expect("open parent");

    let registry = ProfileRegistry::from_file(&dir, name).expect("registry loads");
    let profile = registry.find_profile("staging").expect("staging profile");

    assert_eq!(profile.seed(), 77);
    assert_eq!(profile.counts().users, CountRange::new(4, 9));
    assert_eq!(profile.counts().board_templates, CountRange::fixed(2));
    assert_eq!(
        profile.reference_time().to_rfc3339(),
        "2026-06-01T06:30:00+00:00"
    );
    let admin = profile.fixed_users().first().expect("fixed user");
    assert_eq!(admin.system_role, SystemRole::Admin);
    assert_eq!(admin.email, "ops@example.com");
}

#[test]
fn missing_file_reports_io_error() {
    let dir = Dir::open_ambient_dir(".", ambient_authority()).expect("open cwd");
    let result = ProfileRegistry::from_file(&dir, Utf8Path::new("does-not-exist.json"));

    match result {
        Err(ProfileError::IoError { path, .. }) => {
            assert_eq!(path.to_string_lossy(), "does-not-exist.json");
        }
        other => panic!("expected IoError, got {other:?}"),
    }
}

#[test]
fn corrupt_file_reports_parse_error() {
    let path = write_temp_file("corrupt", "profiles.json", "{ nope").expect("temp file");
    let (dir, name) = open_parent(&path).expect("open parent");

    let result = ProfileRegistry::from_file(&dir, name);
    assert!(matches!(result, Err(ProfileError::ParseError { .. })));
}

#[test]
fn builtin_profiles_include_fixed_accounts() {
    let registry = ProfileRegistry::builtin().expect("builtin registry");

    for name in ["development", "test"] {
        let profile = registry.find_profile(name).expect("profile");
        let emails: Vec<&str> = profile
            .fixed_users()
            .iter()
            .map(|user| user.email.as_str())
            .collect();
        assert!(emails.contains(&"admin@taskboard.test"), "{name}: {emails:?}");
        assert!(
            profile.counts().users.min() >= profile.fixed_users().len(),
            "{name} must have room for its fixed users"
        );
    }
}
