// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-fleet-config
//!
//! Deterministic models shared by the integration tests. Every fixture builds
//! the same model on every call, so checksums are stable across tests.

#![allow(dead_code)]

use std::sync::Arc;

use cim_fleet_config::model::{
    DeploymentIdentity, DeploymentUnit, JvmConfig, PathSpec, Profile, ServerGroup, SocketBinding,
    Subsystem,
};
use cim_fleet_config::{DomainModel, HostModel, ProcessHandle, ServerModel, ServerProcess};

pub const HOST_A: &str = "host-a";
pub const HOST_B: &str = "host-b";
pub const MAIN_GROUP: &str = "main-server-group";
pub const DEFAULT_PROFILE: &str = "default";

/// Domain with one profile bound to one group, plus an unbound spare profile
pub fn domain_fixture() -> DomainModel {
    DomainModel::builder()
        .profile(
            Profile::new(DEFAULT_PROFILE)
                .with_subsystem(
                    Subsystem::new("logging", "urn:logging:1.0").with_property("level", "INFO"),
                )
                .with_subsystem(Subsystem::new("web", "urn:web:1.0")),
        )
        .profile(Profile::new("spare"))
        .server_group(ServerGroup::new(MAIN_GROUP, DEFAULT_PROFILE))
        .system_property("jboss.bind.address", "127.0.0.1")
        .build()
        .expect("Invalid domain fixture")
}

/// Domain with no profiles at all
pub fn empty_domain_fixture() -> DomainModel {
    DomainModel::new()
}

pub fn host_fixture(name: &str) -> HostModel {
    HostModel::builder(name)
        .extension("org.example.logging")
        .jvm(JvmConfig::new("default").heap("256m", "1024m"))
        .path(PathSpec::new("log.dir", "/var/log/fleet"))
        .system_property("role", "worker")
        .build()
        .expect("Invalid host fixture")
}

pub fn server_fixture(name: &str) -> ServerModel {
    ServerModel::builder(name)
        .subsystem(Subsystem::new("logging", "urn:logging:1.0").with_property("level", "INFO"))
        .socket_binding(SocketBinding::new("http", "public", 8080))
        .deployment(app_deployment())
        .build()
        .expect("Invalid server fixture")
}

pub fn app_deployment() -> DeploymentUnit {
    DeploymentUnit::new(DeploymentIdentity::of_content("app.war", b"app-v1"), "app.war")
}

/// Live process `host/server` running [`server_fixture`]
pub fn process_fixture(host: &str, server: &str) -> Arc<ServerProcess> {
    Arc::new(ServerProcess::new(
        ProcessHandle::new(host, server),
        server_fixture(server),
    ))
}
