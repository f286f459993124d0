// Copyright (c) 2025 - Cowboy AI, Inc.
//! Domain-Tier Updates
//!
//! # Server-Tier Translation
//!
//! | Operation | Live server update |
//! |---|---|
//! | add/remove profile | none |
//! | add/remove subsystem (profile bound to a group) | add/remove subsystem |
//! | add/remove subsystem (unbound profile) | none |
//! | add/remove server group | none |
//! | namespaces, schema locations | none |
//! | system property | system property |
//! | add/remove server-group deployment | add/remove deployment |

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{
    DeploymentUnit, DomainModel, ElementKind, NamespacePrefix, Profile, SchemaLocation,
    ServerGroup, Subsystem,
};
use crate::model::invariants::validate_name;
use crate::update::{ModelUpdate, PropertyChange, ServerUpdate, TargetScope, UpdateError};

/// Operation against the domain model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DomainUpdate {
    AddProfile { profile: Profile },
    RemoveProfile { name: String },
    AddSubsystem { profile: String, subsystem: Subsystem },
    RemoveSubsystem { profile: String, name: String },
    AddServerGroup { group: ServerGroup },
    RemoveServerGroup { name: String },
    /// Replace the namespace prefix list
    SetNamespaces { namespaces: Vec<NamespacePrefix> },
    /// Replace the schema location list
    SetSchemaLocations { locations: Vec<SchemaLocation> },
    SystemProperty { change: PropertyChange },
    AddServerGroupDeployment { group: String, deployment: DeploymentUnit },
    RemoveServerGroupDeployment { group: String, name: String },
}

impl DomainUpdate {
    /// Server groups whose servers observe this change
    ///
    /// Profile-scoped changes reach the groups bound to the profile,
    /// group-scoped changes reach that group, system properties reach every
    /// group. Authoring metadata and structural group/profile changes reach
    /// none.
    pub fn affected_server_groups(&self, before: &DomainModel) -> BTreeSet<String> {
        match self {
            DomainUpdate::AddSubsystem { profile, .. }
            | DomainUpdate::RemoveSubsystem { profile, .. } => before.groups_using_profile(profile),
            DomainUpdate::AddServerGroupDeployment { group, .. }
            | DomainUpdate::RemoveServerGroupDeployment { group, .. } => {
                BTreeSet::from([group.clone()])
            }
            DomainUpdate::SystemProperty { .. } => before.server_groups.keys().cloned().collect(),
            DomainUpdate::AddProfile { .. }
            | DomainUpdate::RemoveProfile { .. }
            | DomainUpdate::AddServerGroup { .. }
            | DomainUpdate::RemoveServerGroup { .. }
            | DomainUpdate::SetNamespaces { .. }
            | DomainUpdate::SetSchemaLocations { .. } => BTreeSet::new(),
        }
    }
}

fn profile_mut<'a>(model: &'a mut DomainModel, name: &str) -> Result<&'a mut Profile, UpdateError> {
    model
        .profiles
        .get_mut(name)
        .ok_or_else(|| UpdateError::not_found(ElementKind::Profile, name))
}

fn group_mut<'a>(model: &'a mut DomainModel, name: &str) -> Result<&'a mut ServerGroup, UpdateError> {
    model
        .server_groups
        .get_mut(name)
        .ok_or_else(|| UpdateError::not_found(ElementKind::ServerGroup, name))
}

impl ModelUpdate for DomainUpdate {
    type Model = DomainModel;

    fn operation(&self) -> &'static str {
        match self {
            DomainUpdate::AddProfile { .. } => "add-profile",
            DomainUpdate::RemoveProfile { .. } => "remove-profile",
            DomainUpdate::AddSubsystem { .. } => "add-subsystem",
            DomainUpdate::RemoveSubsystem { .. } => "remove-subsystem",
            DomainUpdate::AddServerGroup { .. } => "add-server-group",
            DomainUpdate::RemoveServerGroup { .. } => "remove-server-group",
            DomainUpdate::SetNamespaces { .. } => "set-namespaces",
            DomainUpdate::SetSchemaLocations { .. } => "set-schema-locations",
            DomainUpdate::SystemProperty { .. } => "system-property",
            DomainUpdate::AddServerGroupDeployment { .. } => "add-server-group-deployment",
            DomainUpdate::RemoveServerGroupDeployment { .. } => "remove-server-group-deployment",
        }
    }

    fn apply_to(&self, model: &mut DomainModel) -> Result<(), UpdateError> {
        match self {
            DomainUpdate::AddProfile { profile } => {
                validate_name(ElementKind::Profile, &profile.name)?;
                if model.profiles.contains_key(&profile.name) {
                    return Err(UpdateError::duplicate(ElementKind::Profile, &profile.name));
                }
                model.profiles.insert(profile.name.clone(), profile.clone());
            }
            DomainUpdate::RemoveProfile { name } => {
                if !model.profiles.contains_key(name) {
                    return Err(UpdateError::not_found(ElementKind::Profile, name));
                }
                let groups = model.groups_using_profile(name);
                if !groups.is_empty() {
                    return Err(UpdateError::ProfileInUse {
                        profile: name.clone(),
                        groups: groups.into_iter().collect(),
                    });
                }
                model.profiles.remove(name);
            }
            DomainUpdate::AddSubsystem { profile, subsystem } => {
                validate_name(ElementKind::Subsystem, &subsystem.name)?;
                let target = profile_mut(model, profile)?;
                if target.subsystems.contains_key(&subsystem.name) {
                    return Err(UpdateError::duplicate(ElementKind::Subsystem, &subsystem.name));
                }
                target
                    .subsystems
                    .insert(subsystem.name.clone(), subsystem.clone());
            }
            DomainUpdate::RemoveSubsystem { profile, name } => {
                profile_mut(model, profile)?
                    .subsystems
                    .remove(name)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::Subsystem, name))?;
            }
            DomainUpdate::AddServerGroup { group } => {
                validate_name(ElementKind::ServerGroup, &group.name)?;
                if model.server_groups.contains_key(&group.name) {
                    return Err(UpdateError::duplicate(ElementKind::ServerGroup, &group.name));
                }
                if !model.profiles.contains_key(&group.profile) {
                    return Err(UpdateError::not_found(ElementKind::Profile, &group.profile));
                }
                model.server_groups.insert(group.name.clone(), group.clone());
            }
            DomainUpdate::RemoveServerGroup { name } => {
                model
                    .server_groups
                    .remove(name)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::ServerGroup, name))?;
            }
            DomainUpdate::SetNamespaces { namespaces } => {
                model.namespaces = namespaces.clone();
            }
            DomainUpdate::SetSchemaLocations { locations } => {
                model.schema_locations = locations.clone();
            }
            DomainUpdate::SystemProperty { change } => {
                change.apply(&mut model.system_properties);
            }
            DomainUpdate::AddServerGroupDeployment { group, deployment } => {
                validate_name(ElementKind::Deployment, deployment.name())?;
                let target = group_mut(model, group)?;
                if target.deployments.contains_key(deployment.name()) {
                    return Err(UpdateError::duplicate(ElementKind::Deployment, deployment.name()));
                }
                target
                    .deployments
                    .insert(deployment.name().to_string(), deployment.clone());
            }
            DomainUpdate::RemoveServerGroupDeployment { group, name } => {
                group_mut(model, group)?
                    .deployments
                    .remove(name)
                    .ok_or_else(|| UpdateError::not_found(ElementKind::Deployment, name))?;
            }
        }
        Ok(())
    }

    fn compensating(&self, before: &DomainModel) -> Option<Self> {
        match self {
            DomainUpdate::AddProfile { profile } => {
                if before.profiles.contains_key(&profile.name) {
                    return None;
                }
                Some(DomainUpdate::RemoveProfile {
                    name: profile.name.clone(),
                })
            }
            DomainUpdate::RemoveProfile { name } => before
                .profile(name)
                .map(|profile| DomainUpdate::AddProfile {
                    profile: profile.clone(),
                }),
            DomainUpdate::AddSubsystem { profile, subsystem } => {
                let existing = before.profile(profile)?;
                if existing.subsystems.contains_key(&subsystem.name) {
                    return None;
                }
                Some(DomainUpdate::RemoveSubsystem {
                    profile: profile.clone(),
                    name: subsystem.name.clone(),
                })
            }
            DomainUpdate::RemoveSubsystem { profile, name } => before
                .profile(profile)?
                .subsystems
                .get(name)
                .map(|subsystem| DomainUpdate::AddSubsystem {
                    profile: profile.clone(),
                    subsystem: subsystem.clone(),
                }),
            DomainUpdate::AddServerGroup { group } => {
                if before.server_groups.contains_key(&group.name) {
                    return None;
                }
                Some(DomainUpdate::RemoveServerGroup {
                    name: group.name.clone(),
                })
            }
            DomainUpdate::RemoveServerGroup { name } => before
                .server_group(name)
                .map(|group| DomainUpdate::AddServerGroup {
                    group: group.clone(),
                }),
            DomainUpdate::SetNamespaces { namespaces } => {
                if before.namespaces == *namespaces {
                    return None;
                }
                Some(DomainUpdate::SetNamespaces {
                    namespaces: before.namespaces.clone(),
                })
            }
            DomainUpdate::SetSchemaLocations { locations } => {
                if before.schema_locations == *locations {
                    return None;
                }
                Some(DomainUpdate::SetSchemaLocations {
                    locations: before.schema_locations.clone(),
                })
            }
            DomainUpdate::SystemProperty { change } => change
                .inverse(&before.system_properties)
                .map(|change| DomainUpdate::SystemProperty { change }),
            DomainUpdate::AddServerGroupDeployment { group, deployment } => {
                let existing = before.server_group(group)?;
                if existing.deployments.contains_key(deployment.name()) {
                    return None;
                }
                Some(DomainUpdate::RemoveServerGroupDeployment {
                    group: group.clone(),
                    name: deployment.name().to_string(),
                })
            }
            DomainUpdate::RemoveServerGroupDeployment { group, name } => before
                .server_group(group)?
                .deployments
                .get(name)
                .map(|deployment| DomainUpdate::AddServerGroupDeployment {
                    group: group.clone(),
                    deployment: deployment.clone(),
                }),
        }
    }

    fn target_scope(&self, before: &DomainModel) -> TargetScope {
        match self {
            DomainUpdate::SystemProperty { .. } => TargetScope::AllServers,
            _ => {
                let groups = self.affected_server_groups(before);
                if groups.is_empty() || self.to_server_update(before).is_none() {
                    TargetScope::Nothing
                } else {
                    TargetScope::ServerGroups(groups)
                }
            }
        }
    }

    fn to_server_update(&self, before: &DomainModel) -> Option<ServerUpdate> {
        match self {
            DomainUpdate::AddSubsystem { profile, subsystem } => {
                if before.groups_using_profile(profile).is_empty() {
                    return None;
                }
                Some(ServerUpdate::AddSubsystem {
                    subsystem: subsystem.clone(),
                })
            }
            DomainUpdate::RemoveSubsystem { profile, name } => {
                if before.groups_using_profile(profile).is_empty() {
                    return None;
                }
                Some(ServerUpdate::RemoveSubsystem { name: name.clone() })
            }
            DomainUpdate::SystemProperty { change } => Some(ServerUpdate::SystemProperty {
                change: change.clone(),
            }),
            DomainUpdate::AddServerGroupDeployment { deployment, .. } => {
                Some(ServerUpdate::AddDeployment {
                    deployment: deployment.clone(),
                })
            }
            DomainUpdate::RemoveServerGroupDeployment { name, .. } => {
                Some(ServerUpdate::RemoveDeployment { name: name.clone() })
            }
            DomainUpdate::AddProfile { .. }
            | DomainUpdate::RemoveProfile { .. }
            | DomainUpdate::AddServerGroup { .. }
            | DomainUpdate::RemoveServerGroup { .. }
            | DomainUpdate::SetNamespaces { .. }
            | DomainUpdate::SetSchemaLocations { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeploymentIdentity, ModelElement};
    use crate::update::DomainUpdateCommand;
    use pretty_assertions::assert_eq;

    fn domain() -> DomainModel {
        DomainModel::builder()
            .profile(
                Profile::new("default")
                    .with_subsystem(Subsystem::new("logging", "urn:logging:1.0")),
            )
            .profile(Profile::new("spare"))
            .server_group(ServerGroup::new("main", "default"))
            .build()
            .unwrap()
    }

    fn apply(model: &mut DomainModel, update: DomainUpdate) -> Result<(), UpdateError> {
        DomainUpdateCommand::prepare(model, update)?.apply(model).map(|_| ())
    }

    #[test]
    fn test_add_server_group_requires_profile() {
        let mut model = DomainModel::new();
        let result = apply(
            &mut model,
            DomainUpdate::AddServerGroup {
                group: ServerGroup::new("sg1", "default"),
            },
        );

        assert_eq!(
            result,
            Err(UpdateError::NotFound {
                kind: ElementKind::Profile,
                name: "default".to_string(),
            })
        );
        assert_eq!(model.server_groups().count(), 0);
    }

    #[test]
    fn test_remove_bound_profile_is_rejected() {
        let mut model = domain();
        let result = apply(
            &mut model,
            DomainUpdate::RemoveProfile {
                name: "default".to_string(),
            },
        );

        assert_eq!(
            result,
            Err(UpdateError::ProfileInUse {
                profile: "default".to_string(),
                groups: vec!["main".to_string()],
            })
        );
    }

    #[test]
    fn test_duplicate_subsystem_is_rejected() {
        let mut model = domain();
        let result = apply(
            &mut model,
            DomainUpdate::AddSubsystem {
                profile: "default".to_string(),
                subsystem: Subsystem::new("logging", "urn:logging:2.0"),
            },
        );

        assert!(matches!(result, Err(UpdateError::Duplicate { kind: ElementKind::Subsystem, .. })));
    }

    #[test]
    fn test_remove_subsystem_compensation_restores_exact_element() {
        let mut model = domain();
        let before = model.clone();
        let update = DomainUpdate::RemoveSubsystem {
            profile: "default".to_string(),
            name: "logging".to_string(),
        };
        let command = DomainUpdateCommand::prepare(&model, update).unwrap();
        command.apply(&mut model).unwrap();

        let undo = command.compensate(&before).unwrap();
        undo.apply(&mut model).unwrap();

        assert_eq!(model, before);
    }

    #[test]
    fn test_metadata_updates_do_not_translate() {
        let model = domain();
        let update = DomainUpdate::SetNamespaces {
            namespaces: vec![NamespacePrefix::new("xsi", "urn:xsi")],
        };

        assert_eq!(update.to_server_update(&model), None);
        assert_eq!(update.target_scope(&model), TargetScope::Nothing);
    }

    #[test]
    fn test_profile_updates_do_not_translate() {
        let model = domain();
        let update = DomainUpdate::AddProfile {
            profile: Profile::new("ha"),
        };

        assert_eq!(update.to_server_update(&model), None);
    }

    #[test]
    fn test_subsystem_translation_follows_profile_binding() {
        let model = domain();
        let bound = DomainUpdate::AddSubsystem {
            profile: "default".to_string(),
            subsystem: Subsystem::new("jmx", "urn:jmx:1.0"),
        };
        let unbound = DomainUpdate::AddSubsystem {
            profile: "spare".to_string(),
            subsystem: Subsystem::new("jmx", "urn:jmx:1.0"),
        };

        assert_eq!(
            bound.to_server_update(&model),
            Some(ServerUpdate::AddSubsystem {
                subsystem: Subsystem::new("jmx", "urn:jmx:1.0"),
            })
        );
        assert_eq!(
            bound.target_scope(&model),
            TargetScope::ServerGroups(BTreeSet::from(["main".to_string()]))
        );
        assert_eq!(unbound.to_server_update(&model), None);
    }

    #[test]
    fn test_system_property_translates_to_all_servers() {
        let model = domain();
        let change = PropertyChange::set("jboss.node", "a");
        let update = DomainUpdate::SystemProperty {
            change: change.clone(),
        };

        assert_eq!(
            update.to_server_update(&model),
            Some(ServerUpdate::SystemProperty { change })
        );
        assert_eq!(update.target_scope(&model), TargetScope::AllServers);
    }

    #[test]
    fn test_group_deployment_translates_to_server_deployment() {
        let mut model = domain();
        let unit = DeploymentUnit::new(DeploymentIdentity::of_content("app.war", b"bytes"), "app.war");
        let update = DomainUpdate::AddServerGroupDeployment {
            group: "main".to_string(),
            deployment: unit.clone(),
        };
        let before = model.clone();

        apply(&mut model, update.clone()).unwrap();

        assert_eq!(
            update.to_server_update(&before),
            Some(ServerUpdate::AddDeployment { deployment: unit })
        );
        assert_ne!(model.checksum(), before.checksum());
    }

    #[test]
    fn test_affected_server_groups() {
        let model = domain();
        let bound = DomainUpdate::RemoveSubsystem {
            profile: "default".to_string(),
            name: "logging".to_string(),
        };
        let unbound = DomainUpdate::RemoveSubsystem {
            profile: "spare".to_string(),
            name: "logging".to_string(),
        };
        let property = DomainUpdate::SystemProperty {
            change: PropertyChange::remove("x"),
        };

        assert_eq!(bound.affected_server_groups(&model), BTreeSet::from(["main".to_string()]));
        assert!(unbound.affected_server_groups(&model).is_empty());
        assert_eq!(unbound.target_scope(&model), TargetScope::Nothing);
        assert_eq!(property.affected_server_groups(&model).len(), 1);
    }

    #[test]
    fn test_add_existing_profile_has_no_compensation() {
        let model = domain();
        let update = DomainUpdate::AddProfile {
            profile: Profile::new("default"),
        };

        assert_eq!(update.compensating(&model), None);
    }
}
