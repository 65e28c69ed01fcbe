//! Boundary operations called by the UI layer.
//!
//! Every failure is returned as a response value; nothing here propagates
//! an error to the caller.

use crate::error::ResolveError;
use crate::navigation::{NavigationController, NavigationDecision, NavigationEvent, NavigationHost};
use crate::resolver::domain_map::DomainMapping;
use crate::resolver::Resolver;
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NavigateResponse {
    fn loaded(final_url: String) -> Self {
        Self {
            success: true,
            final_url: Some(final_url),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            final_url: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainUpdateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct BrowserApi<H> {
    controller: NavigationController,
    host: H,
}

impl<H: NavigationHost> BrowserApi<H> {
    pub fn new(resolver: Arc<Resolver>, host: H) -> Self {
        BrowserApi {
            controller: NavigationController::new(resolver),
            host,
        }
    }

    #[cfg(test)]
    fn host(&self) -> &H {
        &self.host
    }

    /// Resolves address bar input and asks the host to load the result.
    pub fn navigate(&self, input: &str) -> NavigateResponse {
        let event = NavigationEvent::AddressBar(input.to_string());
        match self.controller.handle(&event, &self.host) {
            Ok(NavigationDecision::Load(final_url)) | Ok(NavigationDecision::Redirect(final_url)) => {
                NavigateResponse::loaded(final_url)
            }
            Ok(NavigationDecision::Proceed) => NavigateResponse::loaded(input.to_string()),
            Err(err) => {
                error!("Navigation to {} failed: {:#}", input, err);
                NavigateResponse::failed(format!("{:#}", err))
            }
        }
    }

    pub fn add_or_update_domain(&self, hostname: &str, target: &str) -> DomainUpdateResponse {
        add_or_update_domain(self.controller.resolver(), hostname, target)
    }

    pub fn get_all_domains(&self) -> Vec<DomainMapping> {
        get_all_domains(self.controller.resolver())
    }
}

fn validate_domain_args(hostname: &str, target: &str) -> Result<(), ResolveError> {
    if hostname.trim().is_empty() {
        return Err(ResolveError::InvalidArgument("hostname must not be empty"));
    }
    if target.trim().is_empty() {
        return Err(ResolveError::InvalidArgument("target must not be empty"));
    }
    Ok(())
}

/// Adds or overwrites a mapping. Only empty arguments are refused.
pub fn add_or_update_domain(resolver: &Resolver, hostname: &str, target: &str) -> DomainUpdateResponse {
    match validate_domain_args(hostname, target) {
        Ok(()) => {
            let (hostname, target) = (hostname.trim(), target.trim());
            resolver.set_mapping(hostname, target);
            info!("Domain {} now redirects to {}", hostname, target);
            DomainUpdateResponse {
                success: true,
                error: None,
            }
        }
        Err(err) => DomainUpdateResponse {
            success: false,
            error: Some(err.to_string()),
        },
    }
}

pub fn get_all_domains(resolver: &Resolver) -> Vec<DomainMapping> {
    resolver.list_mappings()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::tests::RecordingHost;

    fn api() -> BrowserApi<RecordingHost> {
        BrowserApi::new(Arc::new(Resolver::with_builtin()), RecordingHost::default())
    }

    #[test]
    fn test_navigate_mapped_host() {
        let api = api();
        let response = api.navigate("myapp.local/dashboard?x=1");
        assert_eq!(
            response,
            NavigateResponse {
                success: true,
                final_url: Some("http://localhost:3000/dashboard?x=1".into()),
                error: None,
            }
        );
        assert_eq!(*api.host().loads.lock().unwrap(), ["http://localhost:3000/dashboard?x=1"]);
    }

    #[test]
    fn test_navigate_unmapped_host() {
        let response = api().navigate("unknown.example.com/");
        assert!(response.success);
        assert_eq!(response.final_url.as_deref(), Some("http://unknown.example.com/"));
    }

    #[test]
    fn test_navigate_malformed_url_is_reported() {
        let api = api();
        let response = api.navigate("not a url");
        assert!(!response.success);
        assert!(response.final_url.is_none());
        assert!(response.error.unwrap().contains("malformed URL"));
        assert!(api.host().loads.lock().unwrap().is_empty());
    }

    #[test]
    fn test_navigate_load_failure_is_reported() {
        let api = BrowserApi::new(
            Arc::new(Resolver::with_builtin()),
            RecordingHost {
                fail_on: Some("localhost:3000"),
                ..Default::default()
            },
        );
        let response = api.navigate("myapp.local");
        assert!(!response.success);
        assert!(response.error.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_add_domain_then_navigate() {
        let api = api();
        assert_eq!(
            api.add_or_update_domain("new.test", "http://localhost:4000"),
            DomainUpdateResponse {
                success: true,
                error: None,
            }
        );
        let response = api.navigate("new.test/x");
        assert_eq!(response.final_url.as_deref(), Some("http://localhost:4000/x"));
    }

    #[test]
    fn test_add_domain_rejects_empty_arguments() {
        let api = api();
        let response = api.add_or_update_domain("", "http://localhost:4000");
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("invalid argument: hostname must not be empty")
        );

        let response = api.add_or_update_domain("new.test", "   ");
        assert!(!response.success);
        assert_eq!(api.get_all_domains().len(), 3);
    }

    #[test]
    fn test_get_all_domains_lists_seed_and_updates() {
        let api = api();
        api.add_or_update_domain("myapp.local", "http://localhost:3001");
        let domains = api.get_all_domains();
        assert_eq!(domains.len(), 3);
        assert!(domains.contains(&DomainMapping::new("myapp.local", "http://localhost:3001")));
    }

    #[test]
    fn test_response_serialization_skips_empty_fields() {
        let yaml = serde_yaml::to_string(&NavigateResponse::loaded("http://a/".into())).unwrap();
        assert!(yaml.starts_with("success: true\nfinalUrl:"));
        assert!(!yaml.contains("error"));
    }
}
