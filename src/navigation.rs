//! Interception of navigation events raised by the embedding browser engine.
//!
//! Each event is handled on its own; the only state shared between events is
//! the resolver's mapping table.

use crate::error::Result;
use crate::resolver::Resolver;
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// Address submitted from the address bar. May be a bare hostname.
    AddressBar(String),
    /// In-page link or redirect about to be followed.
    WillNavigate(String),
    /// Request to open the URL in a new window.
    NewWindow(String),
}

impl NavigationEvent {
    pub fn url(&self) -> &str {
        match self {
            NavigationEvent::AddressBar(url)
            | NavigationEvent::WillNavigate(url)
            | NavigationEvent::NewWindow(url) => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Let the engine carry on: follow the link or open the window.
    Proceed,
    /// Cancel the default action and load this URL in the current surface.
    Redirect(String),
    /// Load this URL in the current surface (address bar submissions).
    Load(String),
}

/// The engine side of navigation: whatever actually loads pages.
pub trait NavigationHost {
    fn load_url(&self, url: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct NavigationController {
    resolver: Arc<Resolver>,
}

impl NavigationController {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        NavigationController { resolver }
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Decides what to do with `event`. Malformed URLs are reported for
    /// every kind of event.
    pub fn decide(&self, event: &NavigationEvent) -> Result<NavigationDecision> {
        let rewrite = self.resolver.resolve(event.url())?;

        let decision = match event {
            NavigationEvent::AddressBar(_) => NavigationDecision::Load(rewrite.final_url),
            NavigationEvent::WillNavigate(_) | NavigationEvent::NewWindow(_) => {
                if rewrite.rewritten {
                    NavigationDecision::Redirect(rewrite.final_url)
                } else {
                    NavigationDecision::Proceed
                }
            }
        };
        Ok(decision)
    }

    /// Decides on `event` and drives `host` accordingly.
    ///
    /// Engine-originated events with a URL we cannot parse are left to the
    /// engine; only address bar input reports the parse error.
    pub fn handle<H>(&self, event: &NavigationEvent, host: &H) -> anyhow::Result<NavigationDecision>
    where
        H: NavigationHost + ?Sized,
    {
        let decision = match self.decide(event) {
            Ok(decision) => decision,
            Err(err) if !matches!(event, NavigationEvent::AddressBar(_)) => {
                warn!("Not intercepting {:?}: {}", event, err);
                NavigationDecision::Proceed
            }
            Err(err) => return Err(err.into()),
        };

        match &decision {
            NavigationDecision::Redirect(url) | NavigationDecision::Load(url) => {
                debug!("Loading {} for {:?}", url, event);
                host.load_url(url)?;
            }
            NavigationDecision::Proceed => {}
        }

        Ok(decision)
    }
}
