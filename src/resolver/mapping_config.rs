use crate::resolver::domain_map::{DomainMapping, HostMatching};
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct MappingConfig {
    #[serde(default)]
    matching: HostMatching,
    #[serde(default = "default_include_builtin")]
    include_builtin: bool,
    #[serde(default)]
    domains: Vec<DomainMapping>,
}

fn default_include_builtin() -> bool {
    true
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            matching: HostMatching::default(),
            include_builtin: default_include_builtin(),
            domains: Vec::new(),
        }
    }
}

impl MappingConfig {
    pub fn matching(&self) -> HostMatching {
        self.matching
    }

    pub fn include_builtin(&self) -> bool {
        self.include_builtin
    }

    pub fn domains(&self) -> &Vec<DomainMapping> {
        &self.domains
    }

    pub fn with_matching(mut self, matching: HostMatching) -> Self {
        self.matching = matching;
        self
    }
}

pub fn parse_mapping_config(yaml_content: &str) -> Result<MappingConfig> {
    // An empty document deserializes as unit, not as an empty map
    if yaml_content.trim().is_empty() {
        return Ok(MappingConfig::default());
    }

    let config: MappingConfig = serde_yaml::from_str(yaml_content)?;

    Ok(config)
}

pub fn read_mapping_config(file_path: &Path) -> Result<MappingConfig> {
    let yaml_content = fs::read_to_string(file_path)?;

    parse_mapping_config(&yaml_content)
}
