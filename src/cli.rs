use crate::resolver::domain_map::HostMatching;
use crate::resolver::mapping_config::{read_mapping_config, MappingConfig};
use crate::resolver::Resolver;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version = env!("APP_VERSION"), about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP redirect gateway.
    Serve {
        #[arg(
            short = 'l',
            long,
            default_value = "127.0.0.1:8080",
            help = "Listen address for the redirect gateway."
        )]
        listen_addr: String,

        #[command(flatten)]
        mappings: MappingArgs,
    },
    /// Print the URL a navigation target resolves to.
    Resolve {
        #[arg(help = "Address as typed into the address bar.")]
        url: String,

        #[command(flatten)]
        mappings: MappingArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct MappingArgs {
    #[arg(short = 'd', long, help = "Path to a YAML file with extra domain mappings.")]
    pub domains: Option<PathBuf>,

    #[arg(long, help = "Match hostnames regardless of case.")]
    pub case_insensitive: bool,
}

impl MappingArgs {
    pub fn load_config(&self) -> anyhow::Result<MappingConfig> {
        let config = match &self.domains {
            Some(path) => read_mapping_config(path)?,
            None => MappingConfig::default(),
        };

        Ok(if self.case_insensitive {
            config.with_matching(HostMatching::CaseInsensitive)
        } else {
            config
        })
    }

    pub fn build_resolver(&self) -> anyhow::Result<Resolver> {
        Ok(Resolver::from_config(&self.load_config()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["host-redirect", "serve"]).unwrap();
        match cli.command {
            Command::Serve {
                listen_addr,
                mappings,
            } => {
                assert_eq!(listen_addr, "127.0.0.1:8080");
                assert!(mappings.domains.is_none());
                assert!(!mappings.case_insensitive);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_resolve_with_options() {
        let cli = Cli::try_parse_from([
            "host-redirect",
            "resolve",
            "myapp.local/x",
            "-d",
            "domains.yaml",
            "--case-insensitive",
        ])
        .unwrap();
        match cli.command {
            Command::Resolve { url, mappings } => {
                assert_eq!(url, "myapp.local/x");
                assert_eq!(mappings.domains, Some(PathBuf::from("domains.yaml")));
                assert!(mappings.case_insensitive);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_build_resolver_without_file_uses_builtin() {
        let resolver = MappingArgs::default().build_resolver().unwrap();
        assert_eq!(resolver.list_mappings().len(), 3);
        assert_eq!(resolver.matching(), HostMatching::Exact);
    }

    #[test]
    fn test_case_insensitive_flag_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "matching: exact\ndomains:\n  - hostname: API.local\n    target: http://localhost:4000").unwrap();

        let args = MappingArgs {
            domains: Some(file.path().to_path_buf()),
            case_insensitive: true,
        };
        let resolver = args.build_resolver().unwrap();
        assert_eq!(resolver.matching(), HostMatching::CaseInsensitive);
        assert_eq!(
            resolver.resolve("api.local/v1").unwrap().final_url,
            "http://localhost:4000/v1"
        );
    }
}
