// Copyright (c) 2025 - Cowboy AI, Inc.
//! Update Command Tests
//!
//! Checksum-guarded application, compensation and server-tier translation
//! across the domain and host tiers.

mod fixtures;

use cim_fleet_config::model::{JvmConfig, PathSpec, ServerGroup, Subsystem};
use cim_fleet_config::update::JvmChange;
use cim_fleet_config::{
    DomainUpdate, DomainUpdateCommand, HostUpdate, HostUpdateCommand, ModelElement, ModelUpdate,
    PropertyChange, ServerUpdate, TargetScope, UpdateError,
};
use fixtures::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use test_case::test_case;

/// User Story: adding a server group requires its profile
///
/// As an operator
/// I want a server group bound to a missing profile to be refused
/// So that the domain never references configuration that does not exist
///
/// Acceptance Criteria:
/// - The command fails with a not-found precondition failure
/// - The domain's server-group set is unchanged
#[test]
fn test_server_group_with_missing_profile_is_not_found() {
    // Given a domain without the "default" profile
    let mut domain = empty_domain_fixture();
    let before = domain.clone();
    let command = DomainUpdateCommand::new(
        DomainUpdate::AddServerGroup {
            group: ServerGroup::new("sg1", DEFAULT_PROFILE),
        },
        domain.checksum(),
        domain.checksum(),
    );

    // When the group is added
    let result = command.apply(&mut domain);

    // Then the command fails as a precondition failure
    let error = result.unwrap_err();
    assert!(error.is_precondition());
    assert!(matches!(error, UpdateError::NotFound { .. }));

    // And no server group was added
    assert_eq!(domain.server_groups().count(), 0);
    assert_eq!(domain, before);
}

#[test]
fn test_server_group_with_missing_profile_cannot_be_prepared() {
    let domain = empty_domain_fixture();

    let result = DomainUpdateCommand::prepare(
        &domain,
        DomainUpdate::AddServerGroup {
            group: ServerGroup::new("sg1", DEFAULT_PROFILE),
        },
    );

    assert!(matches!(result, Err(UpdateError::NotFound { .. })));
}

/// User Story: JVM configuration can be undone
///
/// As an operator
/// I want to revert a JVM configuration I just added
/// So that a mistaken change leaves no trace in the host model
#[test]
fn test_jvm_add_then_compensate_restores_checksum() {
    // Given a host model
    let mut host = host_fixture(HOST_A);
    let snapshot = host.clone();

    // When a JVM configuration is added
    let add = HostUpdateCommand::prepare(
        &host,
        HostUpdate::AddJvm {
            jvm: JvmConfig::new("large").heap("2g", "8g").option("-XX:+UseG1GC"),
        },
    )
    .unwrap();
    add.apply(&mut host).unwrap();
    assert!(host.jvm("large").is_some());

    // And immediately compensated
    let undo = add.compensate(&snapshot).unwrap();
    assert_eq!(undo.operation(), &HostUpdate::RemoveJvm { name: "large".to_string() });
    undo.apply(&mut host).unwrap();

    // Then the host returns to its exact prior checksum
    assert_eq!(host.checksum(), snapshot.checksum());
    assert_eq!(host, snapshot);
}

#[test]
fn test_jvm_setting_on_removed_jvm_is_not_found() {
    let mut host = host_fixture(HOST_A);
    let change = HostUpdate::Jvm {
        jvm: "default".to_string(),
        change: JvmChange::HeapSize {
            value: Some("512m".to_string()),
        },
    };
    let command = HostUpdateCommand::prepare(&host, change.clone()).unwrap();

    // The JVM disappears between construction and application
    HostUpdateCommand::prepare(
        &host,
        HostUpdate::RemoveJvm {
            name: "default".to_string(),
        },
    )
    .unwrap()
    .apply(&mut host)
    .unwrap();

    // The stale command is caught by its checksum before anything else
    assert!(matches!(
        command.apply(&mut host),
        Err(UpdateError::ConcurrentModification { .. })
    ));
    // And a fresh one fails on the missing JVM
    assert!(matches!(
        HostUpdateCommand::prepare(&host, change),
        Err(UpdateError::NotFound { .. })
    ));
}

#[test]
fn test_stale_domain_command_is_concurrent_modification() {
    let mut domain = domain_fixture();
    let stale = DomainUpdateCommand::prepare(
        &domain,
        DomainUpdate::SystemProperty {
            change: PropertyChange::set("a", "1"),
        },
    )
    .unwrap();
    DomainUpdateCommand::prepare(
        &domain,
        DomainUpdate::SystemProperty {
            change: PropertyChange::set("b", "2"),
        },
    )
    .unwrap()
    .apply(&mut domain)
    .unwrap();
    let current = domain.clone();

    let result = stale.apply(&mut domain);

    assert!(result.unwrap_err().is_conflict());
    assert_eq!(domain, current);
}

#[test]
fn test_remove_subsystem_then_compensate_restores_leaf_attributes() {
    let mut domain = domain_fixture();
    let snapshot = domain.clone();
    let remove = DomainUpdateCommand::prepare(
        &domain,
        DomainUpdate::RemoveSubsystem {
            profile: DEFAULT_PROFILE.to_string(),
            name: "logging".to_string(),
        },
    )
    .unwrap();
    remove.apply(&mut domain).unwrap();

    remove.compensate(&snapshot).unwrap().apply(&mut domain).unwrap();

    let restored = domain.profile(DEFAULT_PROFILE).unwrap().subsystems.get("logging");
    let original = snapshot.profile(DEFAULT_PROFILE).unwrap().subsystems.get("logging");
    assert_eq!(restored, original);
    assert_eq!(
        restored.unwrap().properties.get("level").map(String::as_str),
        Some("INFO")
    );
}

#[test]
fn test_removing_absent_property_has_no_compensation() {
    let mut domain = domain_fixture();
    let snapshot = domain.clone();
    let command = DomainUpdateCommand::prepare(
        &domain,
        DomainUpdate::SystemProperty {
            change: PropertyChange::remove("never.set"),
        },
    )
    .unwrap();

    command.apply(&mut domain).unwrap();

    assert_eq!(command.compensate(&snapshot), None);
    assert_eq!(domain.checksum(), snapshot.checksum());
}

#[test_case(
    DomainUpdate::AddSubsystem {
        profile: DEFAULT_PROFILE.into(),
        subsystem: Subsystem::new("mail", "urn:mail:1.0"),
    },
    Some(ServerUpdate::AddSubsystem { subsystem: Subsystem::new("mail", "urn:mail:1.0") });
    "subsystem on bound profile"
)]
#[test_case(
    DomainUpdate::AddSubsystem {
        profile: "spare".into(),
        subsystem: Subsystem::new("mail", "urn:mail:1.0"),
    },
    None;
    "subsystem on unbound profile"
)]
#[test_case(
    DomainUpdate::SetNamespaces { namespaces: vec![] },
    None;
    "namespaces are authoring metadata"
)]
#[test_case(
    DomainUpdate::SystemProperty { change: PropertyChange::set("x", "y") },
    Some(ServerUpdate::SystemProperty { change: PropertyChange::set("x", "y") });
    "system property"
)]
#[test_case(
    DomainUpdate::RemoveServerGroup { name: MAIN_GROUP.into() },
    None;
    "server group removal"
)]
fn test_domain_translation(update: DomainUpdate, expected: Option<ServerUpdate>) {
    let domain = domain_fixture();
    let command = DomainUpdateCommand::prepare(&domain, update).unwrap();

    assert_eq!(command.translate_to_server_tier(&domain), expected);
}

#[test_case(HostUpdate::AddJvm { jvm: JvmConfig::new("large") }, false; "jvm add")]
#[test_case(
    HostUpdate::Jvm {
        jvm: "default".into(),
        change: JvmChange::Options { options: vec!["-server".into()] },
    },
    false;
    "jvm setting"
)]
#[test_case(HostUpdate::AddExtension { module: "org.example.mail".into() }, false; "extension")]
#[test_case(HostUpdate::RemovePath { name: "log.dir".into() }, true; "path removal")]
#[test_case(HostUpdate::AddPath { path: PathSpec::new("data", "/srv/data") }, true; "path add")]
#[test_case(
    HostUpdate::SystemProperty { change: PropertyChange::set("role", "edge") },
    true;
    "system property"
)]
fn test_host_translation_is_live_only(update: HostUpdate, live: bool) {
    let host = host_fixture(HOST_A);
    let command = HostUpdateCommand::prepare(&host, update).unwrap();

    assert_eq!(command.translate_to_server_tier(&host).is_some(), live);
}

#[test]
fn test_translation_is_deterministic() {
    let domain = domain_fixture();
    let command = DomainUpdateCommand::prepare(
        &domain,
        DomainUpdate::RemoveSubsystem {
            profile: DEFAULT_PROFILE.to_string(),
            name: "web".to_string(),
        },
    )
    .unwrap();

    let first = command.translate_to_server_tier(&domain);
    let second = command.translate_to_server_tier(&domain);

    assert_eq!(first, second);
    assert_eq!(
        command.operation().target_scope(&domain),
        TargetScope::ServerGroups(BTreeSet::from([MAIN_GROUP.to_string()]))
    );
}

#[test]
fn test_command_survives_the_wire() {
    let domain = domain_fixture();
    let command = DomainUpdateCommand::prepare(
        &domain,
        DomainUpdate::AddServerGroupDeployment {
            group: MAIN_GROUP.to_string(),
            deployment: app_deployment(),
        },
    )
    .unwrap();

    let json = serde_json::to_string(&command).unwrap();
    let received: DomainUpdateCommand = serde_json::from_str(&json).unwrap();

    let mut target = domain.clone();
    assert_eq!(received.apply(&mut target), Ok(command.after_checksum()));
}
