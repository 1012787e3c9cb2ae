//! Capability-gated power actions.

use crate::{
    error::GreeterError,
    event::TerminalEffect,
    types::{Capability, CapabilityFlags},
};

/// One of the four power actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerAction {
    /// Hibernate.
    Hibernate,
    /// Restart.
    Restart,
    /// Shut down.
    Shutdown,
    /// Suspend.
    Suspend,
}

impl PowerAction {
    /// All power actions.
    pub const ALL: [Self; 4] = [Self::Hibernate, Self::Restart, Self::Shutdown, Self::Suspend];

    /// Capability the action requires.
    pub fn capability(self) -> Capability {
        match self {
            Self::Hibernate => Capability::Hibernate,
            Self::Restart => Capability::Restart,
            Self::Shutdown => Capability::Shutdown,
            Self::Suspend => Capability::Suspend,
        }
    }

    /// Terminal effect of a successful action.
    pub fn effect(self) -> TerminalEffect {
        match self {
            Self::Hibernate => TerminalEffect::Hibernate,
            Self::Restart => TerminalEffect::Restart,
            Self::Shutdown => TerminalEffect::Shutdown,
            Self::Suspend => TerminalEffect::Suspend,
        }
    }
}

/// Checks capability flags before letting a power action through.
///
/// Flags are fixed at construction and survive resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerActionGateway {
    capabilities: CapabilityFlags,
}

impl PowerActionGateway {
    /// Create a gateway for `capabilities`.
    pub fn new(capabilities: CapabilityFlags) -> Self {
        Self { capabilities }
    }

    /// Capability flags in force.
    pub fn capabilities(&self) -> &CapabilityFlags {
        &self.capabilities
    }

    /// Authorize `action`.
    ///
    /// # Errors
    ///
    /// [`GreeterError::CapabilityDenied`] when the matching flag is not set.
    pub fn authorize(&self, action: PowerAction) -> Result<TerminalEffect, GreeterError> {
        let capability = action.capability();
        if !self.capabilities.allows(capability) {
            return Err(GreeterError::CapabilityDenied { capability });
        }

        tracing::info!(?action, "power action authorized");
        Ok(action.effect())
    }
}
