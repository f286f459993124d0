// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Undo Law
//!
//! For every command C that applies to M producing M′, at every tier:
//! - `checksum(M′) == C.after`
//! - `C.compensate(M).apply(M′)` restores `checksum(M)`
//!
//! And for every model whose checksum is not `C.before`, `apply` fails with
//! a concurrent modification and leaves the model unchanged.

use cim_fleet_config::model::{
    DeploymentIdentity, DeploymentUnit, DomainControllerRef, JvmConfig, ManagementSocket,
    NamespacePrefix, PathSpec, Profile, ServerGroup, SocketBinding, Subsystem,
};
use cim_fleet_config::update::JvmChange;
use cim_fleet_config::{
    DomainModel, DomainUpdate, HostModel, HostUpdate, ModelElement, ModelStore, ModelUpdate,
    PropertyChange, ServerModel, ServerUpdate, UpdateCommand, UpdateError,
};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

// ============================================================================
// Property Test Strategies
// ============================================================================

fn profile_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["default", "ha", "spare"]).prop_map(str::to_string)
}

fn group_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["main", "backup"]).prop_map(str::to_string)
}

fn element_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["logging", "web", "mail"]).prop_map(str::to_string)
}

fn path_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["data", "log", "tmp"]).prop_map(str::to_string)
}

fn path_spec() -> impl Strategy<Value = PathSpec> {
    path_name().prop_map(|name| {
        let location = format!("/var/{name}");
        PathSpec::new(name, location)
    })
}

fn deployment(name: String, content: u8) -> DeploymentUnit {
    DeploymentUnit::new(
        DeploymentIdentity::of_content(format!("{name}.war"), &[content]),
        format!("{name}.war"),
    )
}

fn property_change() -> impl Strategy<Value = PropertyChange> {
    let name = prop::sample::select(vec!["a", "b", "c"]);
    prop_oneof![
        (name.clone(), "[0-9]{1,2}").prop_map(|(n, v)| PropertyChange::set(n, v)),
        name.prop_map(|n| PropertyChange::remove(n)),
    ]
}

fn domain_update() -> impl Strategy<Value = DomainUpdate> {
    prop_oneof![
        profile_name().prop_map(|name| DomainUpdate::AddProfile {
            profile: Profile::new(name)
        }),
        profile_name().prop_map(|name| DomainUpdate::RemoveProfile { name }),
        (profile_name(), element_name(), "[a-z]{1,4}").prop_map(|(profile, name, value)| {
            DomainUpdate::AddSubsystem {
                profile,
                subsystem: Subsystem::new(name, "urn:test:1.0").with_property("key", value),
            }
        }),
        (profile_name(), element_name())
            .prop_map(|(profile, name)| DomainUpdate::RemoveSubsystem { profile, name }),
        (group_name(), profile_name()).prop_map(|(name, profile)| DomainUpdate::AddServerGroup {
            group: ServerGroup::new(name, profile)
        }),
        group_name().prop_map(|name| DomainUpdate::RemoveServerGroup { name }),
        prop::collection::vec("[a-z]{1,3}", 0..3).prop_map(|prefixes| {
            DomainUpdate::SetNamespaces {
                namespaces: prefixes
                    .into_iter()
                    .map(|p| NamespacePrefix::new(p.clone(), format!("urn:{p}")))
                    .collect(),
            }
        }),
        property_change().prop_map(|change| DomainUpdate::SystemProperty { change }),
        (group_name(), element_name(), any::<u8>()).prop_map(|(group, name, content)| {
            DomainUpdate::AddServerGroupDeployment {
                group,
                deployment: deployment(name, content),
            }
        }),
        (group_name(), element_name()).prop_map(|(group, name)| {
            DomainUpdate::RemoveServerGroupDeployment {
                group,
                name: format!("{name}.war"),
            }
        }),
    ]
}

fn jvm_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["default", "large"]).prop_map(str::to_string)
}

fn heap() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(vec!["256m", "512m", "1024m"]).prop_map(str::to_string))
}

fn jvm_change() -> impl Strategy<Value = JvmChange> {
    prop_oneof![
        heap().prop_map(|value| JvmChange::HeapSize { value }),
        heap().prop_map(|value| JvmChange::MaxHeapSize { value }),
        prop::option::of(
            prop::sample::select(vec!["/opt/java", "/usr/lib/jvm"]).prop_map(str::to_string)
        )
        .prop_map(|value| JvmChange::JavaHome { value }),
        prop::collection::vec(
            prop::sample::select(vec!["-server", "-Xss1m", "-XX:+UseG1GC"]).prop_map(str::to_string),
            0..3,
        )
        .prop_map(|options| JvmChange::Options { options }),
    ]
}

fn host_update() -> impl Strategy<Value = HostUpdate> {
    let module = prop::sample::select(vec!["org.fleet.logging", "org.fleet.web"]);
    let port = 9990u16..9993;
    prop_oneof![
        prop::sample::select(vec!["node1", "node2"])
            .prop_map(|name| HostUpdate::SetName { name: name.to_string() }),
        module.clone().prop_map(|module| HostUpdate::AddExtension {
            module: module.to_string()
        }),
        module.prop_map(|module| HostUpdate::RemoveExtension {
            module: module.to_string()
        }),
        (jvm_name(), heap()).prop_map(|(name, heap)| {
            let mut jvm = JvmConfig::new(name);
            if let Some(heap) = heap {
                jvm = jvm.heap(heap.clone(), heap);
            }
            HostUpdate::AddJvm { jvm }
        }),
        jvm_name().prop_map(|name| HostUpdate::RemoveJvm { name }),
        (jvm_name(), jvm_change()).prop_map(|(jvm, change)| HostUpdate::Jvm { jvm, change }),
        path_spec().prop_map(|path| HostUpdate::AddPath { path }),
        path_name().prop_map(|name| HostUpdate::RemovePath { name }),
        prop::option::of(port.clone()).prop_map(|port| HostUpdate::SetManagementSocket {
            socket: port.map(|port| ManagementSocket::new("management", port)),
        }),
        prop::option::of(port).prop_map(|port| HostUpdate::SetDomainController {
            controller: port.map(|port| DomainControllerRef::new("primary", port)),
        }),
        property_change().prop_map(|change| HostUpdate::SystemProperty { change }),
    ]
}

fn server_update() -> impl Strategy<Value = ServerUpdate> {
    let binding_name = prop::sample::select(vec!["http", "https"]);
    prop_oneof![
        (element_name(), "[a-z]{1,4}").prop_map(|(name, value)| ServerUpdate::AddSubsystem {
            subsystem: Subsystem::new(name, "urn:test:1.0").with_property("key", value),
        }),
        element_name().prop_map(|name| ServerUpdate::RemoveSubsystem { name }),
        (binding_name.clone(), prop::sample::select(vec![8080u16, 8443, 65000])).prop_map(
            |(name, port)| ServerUpdate::AddSocketBinding {
                binding: SocketBinding::new(name, "public", port),
            }
        ),
        binding_name.prop_map(|name| ServerUpdate::RemoveSocketBinding {
            name: name.to_string()
        }),
        prop::sample::select(vec![0u16, 100, 1000]).prop_map(|offset| ServerUpdate::SetPortOffset {
            offset
        }),
        property_change().prop_map(|change| ServerUpdate::SystemProperty { change }),
        path_spec().prop_map(|path| ServerUpdate::AddPath { path }),
        path_name().prop_map(|name| ServerUpdate::RemovePath { name }),
        (element_name(), any::<u8>()).prop_map(|(name, content)| ServerUpdate::AddDeployment {
            deployment: deployment(name, content),
        }),
        element_name().prop_map(|name| ServerUpdate::RemoveDeployment {
            name: format!("{name}.war"),
        }),
    ]
}

fn base_domain() -> DomainModel {
    DomainModel::builder()
        .profile(
            Profile::new("default")
                .with_subsystem(Subsystem::new("logging", "urn:test:1.0").with_property("key", "v")),
        )
        .profile(Profile::new("spare"))
        .server_group(ServerGroup::new("main", "default"))
        .system_property("a", "1")
        .build()
        .unwrap()
}

fn base_host() -> HostModel {
    HostModel::builder("node1")
        .extension("org.fleet.logging")
        .jvm(JvmConfig::new("default").heap("256m", "1024m").option("-server"))
        .path(PathSpec::new("data", "/var/data"))
        .management_socket(ManagementSocket::new("management", 9990))
        .system_property("a", "1")
        .build()
        .unwrap()
}

fn base_server() -> ServerModel {
    ServerModel::builder("server-one")
        .subsystem(Subsystem::new("logging", "urn:test:1.0").with_property("key", "v"))
        .socket_binding(SocketBinding::new("http", "public", 8080))
        .path(PathSpec::new("data", "/var/data"))
        .deployment(deployment("web".to_string(), 1))
        .system_property("a", "1")
        .build()
        .unwrap()
}

// ============================================================================
// Laws, shared by every tier
// ============================================================================

/// Apply reaches the asserted checksum and compensation undoes it
fn compensation_restores_checksum<U: ModelUpdate>(
    before: &U::Model,
    update: U,
) -> Result<(), TestCaseError> {
    let mut model = before.clone();

    match UpdateCommand::prepare(&model, update) {
        Ok(command) => {
            let after = command.apply(&mut model).unwrap();
            prop_assert_eq!(after, command.after_checksum());
            prop_assert_eq!(model.checksum(), after);

            match command.compensate(before) {
                Some(undo) => {
                    prop_assert_eq!(undo.before_checksum(), after);
                    undo.apply(&mut model).unwrap();
                    prop_assert_eq!(model.checksum(), before.checksum());
                    prop_assert_eq!(&model, before);
                }
                None => prop_assert_eq!(after, before.checksum()),
            }
        }
        Err(e) => {
            prop_assert!(e.is_precondition() || matches!(e, UpdateError::Invalid(_)));
            prop_assert_eq!(&model, before);
        }
    }
    Ok(())
}

/// A command prepared against another state never applies
fn stale_command_leaves_model_unchanged<U: ModelUpdate>(
    base: U::Model,
    first: U,
    second: U,
) -> Result<(), TestCaseError> {
    let mut model = base;
    let Ok(stale) = UpdateCommand::prepare(&model, first) else {
        return Ok(());
    };
    let Ok(intervening) = UpdateCommand::prepare(&model, second) else {
        return Ok(());
    };
    prop_assume!(intervening.after_checksum() != intervening.before_checksum());
    intervening.apply(&mut model).unwrap();
    let current = model.clone();

    let result = stale.apply(&mut model);

    let is_conflict = matches!(result, Err(UpdateError::ConcurrentModification { .. }));
    prop_assert!(is_conflict);
    prop_assert_eq!(&model, &current);
    Ok(())
}

/// Translation is a pure function of snapshot and operation
fn translation_is_deterministic<U: ModelUpdate>(
    model: &U::Model,
    update: U,
) -> Result<(), TestCaseError> {
    let Ok(command) = UpdateCommand::prepare(model, update) else {
        return Ok(());
    };

    prop_assert_eq!(
        command.translate_to_server_tier(model),
        command.translate_to_server_tier(model)
    );
    Ok(())
}

/// Rolling back a whole history restores the original model
fn rollback_unwinds_history<U: ModelUpdate>(
    original: U::Model,
    updates: Vec<U>,
) -> Result<(), TestCaseError> {
    let store = ModelStore::<U>::new(original.clone());

    tokio_test::block_on(async {
        for update in updates {
            // Precondition failures are expected for random sequences
            let _ = store.submit(update).await;
        }
        while store.rollback_last().await.unwrap().is_some() {}
    });

    let restored = tokio_test::block_on(store.snapshot());
    prop_assert_eq!(restored.checksum(), original.checksum());
    prop_assert_eq!(restored, original);
    Ok(())
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_domain_compensation_restores_checksum(update in domain_update()) {
        compensation_restores_checksum(&base_domain(), update)?;
    }

    #[test]
    fn prop_host_compensation_restores_checksum(update in host_update()) {
        compensation_restores_checksum(&base_host(), update)?;
    }

    #[test]
    fn prop_server_compensation_restores_checksum(update in server_update()) {
        compensation_restores_checksum(&base_server(), update)?;
    }

    #[test]
    fn prop_domain_stale_command_leaves_model_unchanged(
        first in domain_update(),
        second in domain_update(),
    ) {
        stale_command_leaves_model_unchanged(base_domain(), first, second)?;
    }

    #[test]
    fn prop_host_stale_command_leaves_model_unchanged(
        first in host_update(),
        second in host_update(),
    ) {
        stale_command_leaves_model_unchanged(base_host(), first, second)?;
    }

    #[test]
    fn prop_server_stale_command_leaves_model_unchanged(
        first in server_update(),
        second in server_update(),
    ) {
        stale_command_leaves_model_unchanged(base_server(), first, second)?;
    }

    #[test]
    fn prop_domain_translation_is_deterministic(update in domain_update()) {
        translation_is_deterministic(&base_domain(), update)?;
    }

    #[test]
    fn prop_host_translation_is_deterministic(update in host_update()) {
        translation_is_deterministic(&base_host(), update)?;
    }

    #[test]
    fn prop_server_translation_is_deterministic(update in server_update()) {
        translation_is_deterministic(&base_server(), update)?;
    }

    #[test]
    fn prop_domain_rollback_unwinds_history(
        updates in prop::collection::vec(domain_update(), 1..12)
    ) {
        rollback_unwinds_history(base_domain(), updates)?;
    }

    #[test]
    fn prop_host_rollback_unwinds_history(
        updates in prop::collection::vec(host_update(), 1..12)
    ) {
        rollback_unwinds_history(base_host(), updates)?;
    }

    #[test]
    fn prop_server_rollback_unwinds_history(
        updates in prop::collection::vec(server_update(), 1..12)
    ) {
        rollback_unwinds_history(base_server(), updates)?;
    }
}
