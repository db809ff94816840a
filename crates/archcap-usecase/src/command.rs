//! Commands - The write-side surface of ARCHCAP
//!
//! Each command is a plain struct; [`Command`] is the union the command
//! bus routes on. Handlers implement [`CommandHandler`] and are looked up
//! by [`CommandKind`].

use archcap_domain::{
    BusinessDomainId, CapabilityId, CapabilityMetadata, ComponentId, Expert, RealizationId,
    RealizationLevel,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UseCaseError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCapability {
    /// Generated when absent
    #[serde(default)]
    pub id: Option<CapabilityId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<CapabilityId>,
    /// "L1".."L4"
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCapability {
    pub capability_id: CapabilityId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCapabilityTag {
    pub capability_id: CapabilityId,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCapabilityExpert {
    pub capability_id: CapabilityId,
    pub expert: Expert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCapabilityExpert {
    pub capability_id: CapabilityId,
    pub expert_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCapabilityMetadata {
    pub capability_id: CapabilityId,
    pub metadata: CapabilityMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCapability {
    pub capability_id: CapabilityId,
}

/// Move a capability; no parent promotes it to L1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCapabilityParent {
    pub capability_id: CapabilityId,
    #[serde(default)]
    pub new_parent_id: Option<CapabilityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeCapabilityInheritance {
    pub capability_id: CapabilityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSystemToCapability {
    pub capability_id: CapabilityId,
    pub component_id: ComponentId,
    pub component_name: String,
    pub level: RealizationLevel,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlinkSystemFromCapability {
    pub realization_id: RealizationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignCapabilityToDomain {
    pub business_domain_id: BusinessDomainId,
    pub capability_id: CapabilityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignCapabilityFromDomain {
    pub business_domain_id: BusinessDomainId,
    pub capability_id: CapabilityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum Command {
    CreateCapability(CreateCapability),
    UpdateCapability(UpdateCapability),
    AddCapabilityTag(AddCapabilityTag),
    AddCapabilityExpert(AddCapabilityExpert),
    RemoveCapabilityExpert(RemoveCapabilityExpert),
    UpdateCapabilityMetadata(UpdateCapabilityMetadata),
    DeleteCapability(DeleteCapability),
    ChangeCapabilityParent(ChangeCapabilityParent),
    RecomputeCapabilityInheritance(RecomputeCapabilityInheritance),
    LinkSystemToCapability(LinkSystemToCapability),
    UnlinkSystemFromCapability(UnlinkSystemFromCapability),
    AssignCapabilityToDomain(AssignCapabilityToDomain),
    UnassignCapabilityFromDomain(UnassignCapabilityFromDomain),
}

/// Routing key of a [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateCapability,
    UpdateCapability,
    AddCapabilityTag,
    AddCapabilityExpert,
    RemoveCapabilityExpert,
    UpdateCapabilityMetadata,
    DeleteCapability,
    ChangeCapabilityParent,
    RecomputeCapabilityInheritance,
    LinkSystemToCapability,
    UnlinkSystemFromCapability,
    AssignCapabilityToDomain,
    UnassignCapabilityFromDomain,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateCapability => "CreateCapability",
            Self::UpdateCapability => "UpdateCapability",
            Self::AddCapabilityTag => "AddCapabilityTag",
            Self::AddCapabilityExpert => "AddCapabilityExpert",
            Self::RemoveCapabilityExpert => "RemoveCapabilityExpert",
            Self::UpdateCapabilityMetadata => "UpdateCapabilityMetadata",
            Self::DeleteCapability => "DeleteCapability",
            Self::ChangeCapabilityParent => "ChangeCapabilityParent",
            Self::RecomputeCapabilityInheritance => "RecomputeCapabilityInheritance",
            Self::LinkSystemToCapability => "LinkSystemToCapability",
            Self::UnlinkSystemFromCapability => "UnlinkSystemFromCapability",
            Self::AssignCapabilityToDomain => "AssignCapabilityToDomain",
            Self::UnassignCapabilityFromDomain => "UnassignCapabilityFromDomain",
        }
    }
}

impl core::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::CreateCapability(_) => CommandKind::CreateCapability,
            Self::UpdateCapability(_) => CommandKind::UpdateCapability,
            Self::AddCapabilityTag(_) => CommandKind::AddCapabilityTag,
            Self::AddCapabilityExpert(_) => CommandKind::AddCapabilityExpert,
            Self::RemoveCapabilityExpert(_) => CommandKind::RemoveCapabilityExpert,
            Self::UpdateCapabilityMetadata(_) => CommandKind::UpdateCapabilityMetadata,
            Self::DeleteCapability(_) => CommandKind::DeleteCapability,
            Self::ChangeCapabilityParent(_) => CommandKind::ChangeCapabilityParent,
            Self::RecomputeCapabilityInheritance(_) => CommandKind::RecomputeCapabilityInheritance,
            Self::LinkSystemToCapability(_) => CommandKind::LinkSystemToCapability,
            Self::UnlinkSystemFromCapability(_) => CommandKind::UnlinkSystemFromCapability,
            Self::AssignCapabilityToDomain(_) => CommandKind::AssignCapabilityToDomain,
            Self::UnassignCapabilityFromDomain(_) => CommandKind::UnassignCapabilityFromDomain,
        }
    }
}

/// What a handler reports back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    /// Id of the created or touched entity
    pub id: Option<String>,
    /// Events raised on the primary aggregate
    pub events_raised: usize,
}

impl CommandResult {
    pub fn new(id: impl Into<String>, events_raised: usize) -> Self {
        Self {
            id: Some(id.into()),
            events_raised,
        }
    }

    /// The entity was looked at but nothing changed
    pub fn unchanged(id: impl Into<String>) -> Self {
        Self::new(id, 0)
    }
}

/// Executes one kind of command
pub trait CommandHandler: Send + Sync {
    fn handle(&self, command: Command) -> Result<CommandResult>;
}

/// Routes commands to their handler
///
/// Dispatch is synchronous: the call returns once the handler and every
/// post-commit event handler it triggered have run.
pub trait CommandBus: Send + Sync {
    fn dispatch(&self, command: Command) -> Result<CommandResult>;
}

pub(crate) fn unexpected(command: &Command) -> UseCaseError {
    UseCaseError::UnexpectedCommand(command.kind())
}
