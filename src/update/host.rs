// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host-Tier Updates
//!
//! JVM launch settings and extension modules are read when a server process
//! starts, so they never translate to a live update. Paths and system
//! properties are pushed to the host's running servers.

use serde::{Deserialize, Serialize};

use crate::model::invariants::validate_name;
use crate::model::{
    DomainControllerRef, ElementKind, HostModel, JvmConfig, ManagementSocket, PathSpec,
};
use crate::update::{ModelUpdate, PropertyChange, ServerUpdate, TargetScope, UpdateError};

/// Change to one setting of a named JVM configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "setting", rename_all = "kebab-case")]
pub enum JvmChange {
    HeapSize { value: Option<String> },
    MaxHeapSize { value: Option<String> },
    JavaHome { value: Option<String> },
    Options { options: Vec<String> },
}

impl JvmChange {
    fn apply(&self, jvm: &mut JvmConfig) {
        match self {
            JvmChange::HeapSize { value } => jvm.heap_size = value.clone(),
            JvmChange::MaxHeapSize { value } => jvm.max_heap_size = value.clone(),
            JvmChange::JavaHome { value } => jvm.java_home = value.clone(),
            JvmChange::Options { options } => jvm.options = options.clone(),
        }
    }

    fn inverse(&self, jvm: &JvmConfig) -> Option<Self> {
        let prior = match self {
            JvmChange::HeapSize { .. } => JvmChange::HeapSize {
                value: jvm.heap_size.clone(),
            },
            JvmChange::MaxHeapSize { .. } => JvmChange::MaxHeapSize {
                value: jvm.max_heap_size.clone(),
            },
            JvmChange::JavaHome { .. } => JvmChange::JavaHome {
                value: jvm.java_home.clone(),
            },
            JvmChange::Options { .. } => JvmChange::Options {
                options: jvm.options.clone(),
            },
        };
        (prior != *self).then_some(prior)
    }
}

/// Operation against a host model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostUpdate {
    SetName { name: String },
    AddExtension { module: String },
    RemoveExtension { module: String },
    AddJvm { jvm: JvmConfig },
    RemoveJvm { name: String },
    /// Change one setting of an existing JVM configuration
    Jvm { jvm: String, change: JvmChange },
    AddPath { path: PathSpec },
    RemovePath { name: String },
    SetManagementSocket { socket: Option<ManagementSocket> },
    SetDomainController { controller: Option<DomainControllerRef> },
    SystemProperty { change: PropertyChange },
}

impl ModelUpdate for HostUpdate {
    type Model = HostModel;

    fn operation(&self) -> &'static str {
        match self {
            HostUpdate::SetName { .. } => "set-name",
            HostUpdate::AddExtension { .. } => "add-extension",
            HostUpdate::RemoveExtension { .. } => "remove-extension",
            HostUpdate::AddJvm { .. } => "add-jvm",
            HostUpdate::RemoveJvm { .. } => "remove-jvm",
            HostUpdate::Jvm { .. } => "jvm-setting",
            HostUpdate::AddPath { .. } => "add-path",
            HostUpdate::RemovePath { .. } => "remove-path",
            HostUpdate::SetManagementSocket { .. } => "set-management-socket",
            HostUpdate::SetDomainController { .. } => "set-domain-controller",
            HostUpdate::SystemProperty { .. } => "system-property",
        }
    }

    fn apply_to(&self, model: &mut HostModel) -> Result<(), UpdateError> {
        match self {
            HostUpdate::SetName { name } => {
                validate_name(ElementKind::Host, name)?;
                model.name = name.clone();
            }
            HostUpdate::AddExtension { module } => {
                validate_name(ElementKind::Extension, module)?;
                if !model.extensions.insert(module.clone()) {
                    return Err(UpdateError::duplicate(ElementKind::Extension, module));
                }
            }
            HostUpdate::RemoveExtension { module } => {
                if !model.extensions.remove(module) {
                    return Err(UpdateError::not_found(ElementKind::Extension, module));
                }
            }
            HostUpdate::AddJvm { jvm } => {
                validate_name(ElementKind::Jvm, &jvm.name)?;
                if model.jvms.contains_key(&jvm.name) {
                    return Err(UpdateError::duplicate(ElementKind::Jvm, &jvm.name));
                }
                model.jvms.insert(jvm.name.clone(), jvm.clone());
            }
            HostUpdate::RemoveJvm { name } => {
                model
                    .jvms
                    .remove(name)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::Jvm, name))?;
            }
            HostUpdate::Jvm { jvm, change } => {
                let target = model
                    .jvms
                    .get_mut(jvm)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::Jvm, jvm))?;
                change.apply(target);
            }
            HostUpdate::AddPath { path } => {
                validate_name(ElementKind::Path, &path.name)?;
                if model.paths.contains_key(&path.name) {
                    return Err(UpdateError::duplicate(ElementKind::Path, &path.name));
                }
                model.paths.insert(path.name.clone(), path.clone());
            }
            HostUpdate::RemovePath { name } => {
                model
                    .paths
                    .remove(name)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::Path, name))?;
            }
            HostUpdate::SetManagementSocket { socket } => {
                model.management = socket.clone();
            }
            HostUpdate::SetDomainController { controller } => {
                model.domain_controller = controller.clone();
            }
            HostUpdate::SystemProperty { change } => {
                change.apply(&mut model.system_properties);
            }
        }
        Ok(())
    }

    fn compensating(&self, before: &HostModel) -> Option<Self> {
        match self {
            HostUpdate::SetName { name } => (before.name != *name).then(|| HostUpdate::SetName {
                name: before.name.clone(),
            }),
            HostUpdate::AddExtension { module } => {
                (!before.has_extension(module)).then(|| HostUpdate::RemoveExtension {
                    module: module.clone(),
                })
            }
            HostUpdate::RemoveExtension { module } => {
                before.has_extension(module).then(|| HostUpdate::AddExtension {
                    module: module.clone(),
                })
            }
            HostUpdate::AddJvm { jvm } => {
                (!before.jvms.contains_key(&jvm.name)).then(|| HostUpdate::RemoveJvm {
                    name: jvm.name.clone(),
                })
            }
            HostUpdate::RemoveJvm { name } => before
                .jvm(name)
                .map(|jvm| HostUpdate::AddJvm { jvm: jvm.clone() }),
            HostUpdate::Jvm { jvm, change } => {
                let current = before.jvm(jvm)?;
                change.inverse(current).map(|change| HostUpdate::Jvm {
                    jvm: jvm.clone(),
                    change,
                })
            }
            HostUpdate::AddPath { path } => {
                (!before.paths.contains_key(&path.name)).then(|| HostUpdate::RemovePath {
                    name: path.name.clone(),
                })
            }
            HostUpdate::RemovePath { name } => before
                .path(name)
                .map(|path| HostUpdate::AddPath { path: path.clone() }),
            HostUpdate::SetManagementSocket { socket } => {
                (before.management != *socket).then(|| HostUpdate::SetManagementSocket {
                    socket: before.management.clone(),
                })
            }
            HostUpdate::SetDomainController { controller } => (before.domain_controller
                != *controller)
                .then(|| HostUpdate::SetDomainController {
                    controller: before.domain_controller.clone(),
                }),
            HostUpdate::SystemProperty { change } => change
                .inverse(&before.system_properties)
                .map(|change| HostUpdate::SystemProperty { change }),
        }
    }

    fn target_scope(&self, before: &HostModel) -> TargetScope {
        if self.to_server_update(before).is_some() {
            TargetScope::Host(before.name.clone())
        } else {
            TargetScope::Nothing
        }
    }

    fn to_server_update(&self, _before: &HostModel) -> Option<ServerUpdate> {
        match self {
            HostUpdate::AddPath { path } => Some(ServerUpdate::AddPath { path: path.clone() }),
            HostUpdate::RemovePath { name } => Some(ServerUpdate::RemovePath { name: name.clone() }),
            HostUpdate::SystemProperty { change } => Some(ServerUpdate::SystemProperty {
                change: change.clone(),
            }),
            HostUpdate::SetName { .. }
            | HostUpdate::AddExtension { .. }
            | HostUpdate::RemoveExtension { .. }
            | HostUpdate::AddJvm { .. }
            | HostUpdate::RemoveJvm { .. }
            | HostUpdate::Jvm { .. }
            | HostUpdate::SetManagementSocket { .. }
            | HostUpdate::SetDomainController { .. } => None,
        }
    }
}
