//! Submission channels and the registry that routes agency components to them.
//!
//! A channel is a pluggable delivery capability: API submission, email, a
//! drop directory. The worker never inspects concrete channel types. It asks
//! a [`ChannelFactory`] for the channel that serves a request's agency
//! component and talks to it through [`SubmissionChannel`].

pub mod outbox;

use crate::error::{Error, Result};
use crate::model::{AgencyComponentId, FailureDetail, FoiaRequest, SubmissionOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Delivery capability for one kind of agency backend.
#[async_trait]
pub trait SubmissionChannel: Send + Sync {
    /// Attempt one delivery.
    ///
    /// Ordinary delivery failures are reported as [`SubmissionOutcome::Failed`]
    /// or [`SubmissionOutcome::NoResult`], never as a panic or error.
    /// Timeouts are the channel's own responsibility.
    async fn submit(&self, request: &FoiaRequest) -> SubmissionOutcome;

    /// Failure detail for the most recent attempt that produced no result.
    fn last_errors(&self) -> FailureDetail;
}

/// Resolves the channel that serves an agency component.
pub trait ChannelFactory: Send + Sync {
    fn resolve(&self, agency: AgencyComponentId) -> Result<Arc<dyn SubmissionChannel>>;
}

/// Top-level TOML for the route file.
#[derive(Debug, Default, Deserialize)]
pub struct RouteConfig {
    /// Channel used for agency components without an explicit route.
    #[serde(default)]
    pub default_channel: Option<String>,
    #[serde(default, rename = "route")]
    pub routes: Vec<Route>,
}

/// One agency component → channel mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct Route {
    pub agency_component: AgencyComponentId,
    pub channel: String,
}

/// Registry of named channels plus the agency routing table.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, Arc<dyn SubmissionChannel>>,
    routes: HashMap<AgencyComponentId, String>,
    default_channel: Option<String>,
}

impl ChannelRegistry {
    /// Create an empty registry with no channels and no routes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a channel under a name. Replaces any channel with the same name.
    pub fn register(
        mut self,
        name: impl Into<String>,
        channel: Arc<dyn SubmissionChannel>,
    ) -> Self {
        self.channels.insert(name.into(), channel);
        self
    }

    /// Route an agency component to a named channel.
    pub fn route(mut self, agency: AgencyComponentId, channel: impl Into<String>) -> Self {
        self.routes.insert(agency, channel.into());
        self
    }

    pub fn default_channel(mut self, channel: impl Into<String>) -> Self {
        self.default_channel = Some(channel.into());
        self
    }

    /// Apply a parsed route config on top of the registered channels.
    ///
    /// Every referenced channel must already be registered.
    pub fn with_routes(mut self, config: RouteConfig) -> Result<Self> {
        let known = |name: &str| -> Result<()> {
            if self.channels.contains_key(name) {
                Ok(())
            } else {
                Err(Error::Config(format!("route references unknown channel {name:?}")))
            }
        };

        if let Some(ref name) = config.default_channel {
            known(name)?;
        }
        for route in &config.routes {
            known(&route.channel)?;
        }

        if let Some(name) = config.default_channel {
            self.default_channel = Some(name);
        }
        for route in config.routes {
            self.routes.insert(route.agency_component, route.channel);
        }
        Ok(self)
    }

    /// Load routes from a TOML file.
    pub fn load_routes(self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read route file {}: {e}", path.display()))
        })?;
        let config: RouteConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad route file {}: {e}", path.display())))?;
        self.with_routes(config)
    }
}

impl ChannelFactory for ChannelRegistry {
    fn resolve(&self, agency: AgencyComponentId) -> Result<Arc<dyn SubmissionChannel>> {
        let name = self
            .routes
            .get(&agency)
            .or(self.default_channel.as_ref())
            .ok_or_else(|| Error::ChannelUnresolved(agency.to_string()))?;

        self.channels
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ChannelUnresolved(format!("{agency} (channel {name:?})")))
    }
}
