// Copyright (c) 2025 - Cowboy AI, Inc.
//! Server-Tier Updates
//!
//! Already at the bottom tier: translation returns the update itself.

use serde::{Deserialize, Serialize};

use crate::model::invariants::{effective_port, validate_name};
use crate::model::{DeploymentUnit, ElementKind, PathSpec, ServerModel, SocketBinding, Subsystem};
use crate::update::{ModelUpdate, PropertyChange, TargetScope, UpdateError};

/// Operation against a live server's model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerUpdate {
    AddSubsystem { subsystem: Subsystem },
    RemoveSubsystem { name: String },
    AddSocketBinding { binding: SocketBinding },
    RemoveSocketBinding { name: String },
    SetPortOffset { offset: u16 },
    SystemProperty { change: PropertyChange },
    AddPath { path: PathSpec },
    RemovePath { name: String },
    AddDeployment { deployment: DeploymentUnit },
    RemoveDeployment { name: String },
}

impl ModelUpdate for ServerUpdate {
    type Model = ServerModel;

    fn operation(&self) -> &'static str {
        match self {
            ServerUpdate::AddSubsystem { .. } => "add-subsystem",
            ServerUpdate::RemoveSubsystem { .. } => "remove-subsystem",
            ServerUpdate::AddSocketBinding { .. } => "add-socket-binding",
            ServerUpdate::RemoveSocketBinding { .. } => "remove-socket-binding",
            ServerUpdate::SetPortOffset { .. } => "set-port-offset",
            ServerUpdate::SystemProperty { .. } => "system-property",
            ServerUpdate::AddPath { .. } => "add-path",
            ServerUpdate::RemovePath { .. } => "remove-path",
            ServerUpdate::AddDeployment { .. } => "add-deployment",
            ServerUpdate::RemoveDeployment { .. } => "remove-deployment",
        }
    }

    fn apply_to(&self, model: &mut ServerModel) -> Result<(), UpdateError> {
        match self {
            ServerUpdate::AddSubsystem { subsystem } => {
                validate_name(ElementKind::Subsystem, &subsystem.name)?;
                if model.subsystems.contains_key(&subsystem.name) {
                    return Err(UpdateError::duplicate(ElementKind::Subsystem, &subsystem.name));
                }
                model
                    .subsystems
                    .insert(subsystem.name.clone(), subsystem.clone());
            }
            ServerUpdate::RemoveSubsystem { name } => {
                model
                    .subsystems
                    .remove(name)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::Subsystem, name))?;
            }
            ServerUpdate::AddSocketBinding { binding } => {
                validate_name(ElementKind::SocketBinding, &binding.name)?;
                if model.socket_bindings.contains_key(&binding.name) {
                    return Err(UpdateError::duplicate(ElementKind::SocketBinding, &binding.name));
                }
                effective_port(&binding.name, binding.port, model.port_offset)?;
                model
                    .socket_bindings
                    .insert(binding.name.clone(), binding.clone());
            }
            ServerUpdate::RemoveSocketBinding { name } => {
                model
                    .socket_bindings
                    .remove(name)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::SocketBinding, name))?;
            }
            ServerUpdate::SetPortOffset { offset } => {
                for binding in model.socket_bindings.values() {
                    effective_port(&binding.name, binding.port, *offset)?;
                }
                model.port_offset = *offset;
            }
            ServerUpdate::SystemProperty { change } => {
                change.apply(&mut model.system_properties);
            }
            ServerUpdate::AddPath { path } => {
                validate_name(ElementKind::Path, &path.name)?;
                if model.paths.contains_key(&path.name) {
                    return Err(UpdateError::duplicate(ElementKind::Path, &path.name));
                }
                model.paths.insert(path.name.clone(), path.clone());
            }
            ServerUpdate::RemovePath { name } => {
                model
                    .paths
                    .remove(name)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::Path, name))?;
            }
            ServerUpdate::AddDeployment { deployment } => {
                validate_name(ElementKind::Deployment, deployment.name())?;
                if model.deployments.contains_key(deployment.name()) {
                    return Err(UpdateError::duplicate(ElementKind::Deployment, deployment.name()));
                }
                model
                    .deployments
                    .insert(deployment.name().to_string(), deployment.clone());
            }
            ServerUpdate::RemoveDeployment { name } => {
                model
                    .deployments
                    .remove(name)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::Deployment, name))?;
            }
        }
        Ok(())
    }

    fn compensating(&self, before: &ServerModel) -> Option<Self> {
        match self {
            ServerUpdate::AddSubsystem { subsystem } => (!before
                .subsystems
                .contains_key(&subsystem.name))
            .then(|| ServerUpdate::RemoveSubsystem {
                name: subsystem.name.clone(),
            }),
            ServerUpdate::RemoveSubsystem { name } => before
                .subsystem(name)
                .map(|subsystem| ServerUpdate::AddSubsystem {
                    subsystem: subsystem.clone(),
                }),
            ServerUpdate::AddSocketBinding { binding } => (!before
                .socket_bindings
                .contains_key(&binding.name))
            .then(|| ServerUpdate::RemoveSocketBinding {
                name: binding.name.clone(),
            }),
            ServerUpdate::RemoveSocketBinding { name } => before
                .socket_binding(name)
                .map(|binding| ServerUpdate::AddSocketBinding {
                    binding: binding.clone(),
                }),
            ServerUpdate::SetPortOffset { offset } => {
                (before.port_offset != *offset).then_some(ServerUpdate::SetPortOffset {
                    offset: before.port_offset,
                })
            }
            ServerUpdate::SystemProperty { change } => change
                .inverse(&before.system_properties)
                .map(|change| ServerUpdate::SystemProperty { change }),
            ServerUpdate::AddPath { path } => {
                (!before.paths.contains_key(&path.name)).then(|| ServerUpdate::RemovePath {
                    name: path.name.clone(),
                })
            }
            ServerUpdate::RemovePath { name } => before
                .path(name)
                .map(|path| ServerUpdate::AddPath { path: path.clone() }),
            ServerUpdate::AddDeployment { deployment } => (!before
                .deployments
                .contains_key(deployment.name()))
            .then(|| ServerUpdate::RemoveDeployment {
                name: deployment.name().to_string(),
            }),
            ServerUpdate::RemoveDeployment { name } => before
                .deployment(name)
                .map(|deployment| ServerUpdate::AddDeployment {
                    deployment: deployment.clone(),
                }),
        }
    }

    fn to_server_update(&self, _before: &ServerModel) -> Option<ServerUpdate> {
        Some(self.clone())
    }

    /// Already applied to the live model it targets; nothing further to reach
    fn target_scope(&self, _before: &ServerModel) -> TargetScope {
        TargetScope::Nothing
    }
}
