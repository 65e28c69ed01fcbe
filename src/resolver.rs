use crate::error::{ResolveError, Result};
use crate::resolver::domain_map::{DomainMap, DomainMapping, HostMatching};
use crate::resolver::mapping_config::MappingConfig;
use log::{debug, warn};
use std::borrow::Cow;
use url::Url;

pub mod domain_map;
pub mod mapping_config;
pub mod watcher;

/// Scheme assumed for address input that carries none.
pub const ASSUMED_SCHEME: &str = "http://";

/// Outcome of resolving a navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub rewritten: bool,
    pub final_url: String,
}

/// Prefixes [`ASSUMED_SCHEME`] unless `input` starts with `scheme://`.
pub fn with_assumed_scheme(input: &str) -> Cow<'_, str> {
    if has_scheme(input) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{}{}", ASSUMED_SCHEME, input))
    }
}

/// A scheme is `[A-Za-z][A-Za-z0-9+.-]*` directly followed by `://`.
fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Rewrites navigation targets whose hostname has a mapping.
#[derive(Debug, Default)]
pub struct Resolver {
    domains: DomainMap,
}

impl Resolver {
    pub fn new(domains: DomainMap) -> Self {
        Resolver { domains }
    }

    pub fn with_builtin() -> Self {
        Self::new(DomainMap::with_builtin(HostMatching::default()))
    }

    /// Builds a resolver from a mapping file: built-in seeds first (unless
    /// disabled), then the file's entries on top.
    pub fn from_config(config: &MappingConfig) -> Self {
        let domains = if config.include_builtin() {
            DomainMap::with_builtin(config.matching())
        } else {
            DomainMap::new(config.matching())
        };

        let resolver = Self::new(domains);
        resolver.apply_config(config);
        resolver
    }

    /// Applies every entry of `config`, returning how many were written.
    ///
    /// Entries missing from `config` are kept; there is no removal.
    pub fn apply_config(&self, config: &MappingConfig) -> usize {
        if config.matching() != self.domains.matching() {
            warn!(
                "Ignoring matching mode {:?}, resolver was started with {:?}",
                config.matching(),
                self.domains.matching()
            );
        }

        for mapping in config.domains() {
            self.set_mapping(&mapping.hostname, &mapping.target_base);
        }
        config.domains().len()
    }

    pub fn matching(&self) -> HostMatching {
        self.domains.matching()
    }

    pub fn mapping_count(&self) -> usize {
        self.domains.len()
    }

    /// Resolves `input` against the current mappings.
    ///
    /// On a hit the original path and query are appended to the target base
    /// as-is. On a miss the input is returned after scheme assumption.
    pub fn resolve(&self, input: &str) -> Result<Rewrite> {
        let candidate = with_assumed_scheme(input.trim());

        let url = Url::parse(&candidate).map_err(|err| ResolveError::MalformedUrl {
            input: input.to_string(),
            reason: err.to_string(),
        })?;
        let hostname = url.host_str().ok_or_else(|| ResolveError::MalformedUrl {
            input: input.to_string(),
            reason: "URL has no host".to_string(),
        })?;

        match self.domains.get(hostname) {
            Some(target_base) => {
                let final_url = rewrite_url(&target_base, &url);
                debug!("Rewrote {} to {}", candidate, final_url);
                Ok(Rewrite {
                    rewritten: true,
                    final_url,
                })
            }
            None => Ok(Rewrite {
                rewritten: false,
                final_url: candidate.into_owned(),
            }),
        }
    }

    pub fn lookup(&self, hostname: &str) -> Option<String> {
        self.domains.get(hostname)
    }

    /// Inserts or overwrites a mapping. The target is not validated.
    pub fn set_mapping(&self, hostname: &str, target_base: &str) {
        if let Some(previous) = self.domains.insert(hostname, target_base) {
            debug!(
                "Mapping for {} changed from {} to {}",
                hostname, previous, target_base
            );
        } else {
            debug!("Mapping added: {} -> {}", hostname, target_base);
        }
    }

    pub fn list_mappings(&self) -> Vec<DomainMapping> {
        self.domains.snapshot()
    }
}

fn rewrite_url(target_base: &str, url: &Url) -> String {
    let path = url.path();
    let query = url.query().filter(|query| !query.is_empty());

    let mut rewritten =
        String::with_capacity(target_base.len() + path.len() + query.map_or(0, |q| q.len() + 1));
    rewritten.push_str(target_base);
    rewritten.push_str(path);
    if let Some(query) = query {
        rewritten.push('?');
        rewritten.push_str(query);
    }
    rewritten
}
