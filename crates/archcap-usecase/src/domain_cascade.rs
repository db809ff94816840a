//! Business-domain reassignment after an L1 capability is demoted
//!
//! Business domains only attach to L1 capabilities. When an L1 moves under
//! another capability its assignments move up to the new L1 ancestor. The
//! work runs post-commit as separately dispatched commands, one domain at a
//! time; a failing domain is logged and skipped. Without an L1 ancestor to
//! take over, the assignments stay where they are.
//!
//! The handler holds the bus weakly: the bus owns the handlers that publish
//! the events this handler consumes.

use std::sync::{Arc, Weak};

use archcap_domain::service::ancestry::find_l1_ancestor;
use archcap_domain::{
    AssignmentReader, BusinessDomainId, CapabilityEvent, CapabilityId, CapabilityLevel,
    CapabilityReadModel,
};
use tracing::{info, warn};

use crate::command::{
    AssignCapabilityToDomain, Command, CommandBus, UnassignCapabilityFromDomain,
};
use crate::error::Result;
use crate::event::EventHandler;
use crate::traversal::{ErrorPolicy, Worklist};

pub struct DomainReassignmentHandler {
    capabilities: Arc<dyn CapabilityReadModel>,
    assignments: Arc<dyn AssignmentReader>,
    bus: Weak<dyn CommandBus>,
}

impl DomainReassignmentHandler {
    pub fn new(
        capabilities: Arc<dyn CapabilityReadModel>,
        assignments: Arc<dyn AssignmentReader>,
        bus: Weak<dyn CommandBus>,
    ) -> Self {
        Self {
            capabilities,
            assignments,
            bus,
        }
    }

    fn reassign(&self, capability_id: &CapabilityId, new_parent_id: &CapabilityId) -> Result<()> {
        let domains: Vec<BusinessDomainId> = self
            .assignments
            .get_by_capability_id(capability_id)?
            .into_iter()
            .map(|assignment| assignment.business_domain_id)
            .collect();
        if domains.is_empty() {
            return Ok(());
        }

        let Some(l1) = find_l1_ancestor(self.capabilities.as_ref(), new_parent_id)?
            .filter(|node| node.level == CapabilityLevel::L1)
        else {
            warn!(
                capability_id = %capability_id,
                new_parent_id = %new_parent_id,
                domains = domains.len(),
                "No L1 ancestor to take over the assignments"
            );
            return Ok(());
        };
        let Some(bus) = self.bus.upgrade() else {
            warn!(capability_id = %capability_id, "Command bus gone, assignments left in place");
            return Ok(());
        };

        let report = Worklist::new(domains).walk(ErrorPolicy::BestEffort, |domain| {
            bus.dispatch(Command::UnassignCapabilityFromDomain(
                UnassignCapabilityFromDomain {
                    business_domain_id: domain.clone(),
                    capability_id: capability_id.clone(),
                },
            ))?;

            if !self.assignments.assignment_exists(domain, &l1.id)? {
                bus.dispatch(Command::AssignCapabilityToDomain(AssignCapabilityToDomain {
                    business_domain_id: domain.clone(),
                    capability_id: l1.id.clone(),
                }))?;
            }
            Ok(Vec::new())
        })?;

        info!(
            capability_id = %capability_id,
            reassigned = report.completed.len(),
            failed = report.failed.len(),
            "Business domains reassigned"
        );
        Ok(())
    }
}

impl EventHandler for DomainReassignmentHandler {
    fn name(&self) -> &'static str {
        "domain-reassignment"
    }

    fn handle(&self, event: &CapabilityEvent) -> Result<()> {
        match event {
            CapabilityEvent::CapabilityParentChanged {
                capability_id,
                new_parent_id: Some(new_parent_id),
                old_level: CapabilityLevel::L1,
                new_level,
                ..
            } if *new_level != CapabilityLevel::L1 => self.reassign(capability_id, new_parent_id),
            _ => Ok(()),
        }
    }
}
