//! Networks command

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::{json, Value};

use defi_evm_networks::{explorer_link, shorten, ContractRole, ExplorerKind, NetworkRegistry};

/// List the built-in lending deployments
#[derive(Debug, Clone, Default, Args)]
pub struct NetworksCommand {
    /// Print the registry as JSON
    #[arg(long)]
    pub json: bool,
}

impl NetworksCommand {
    pub fn execute(&self) -> Result<i32> {
        let registry = NetworkRegistry::builtin();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&registry_document(&registry))?);
        } else {
            println!("{}", render_registry(&registry));
        }
        Ok(0)
    }
}

pub fn registry_document(registry: &NetworkRegistry) -> Value {
    let networks: Vec<Value> = registry
        .iter()
        .map(|network| {
            let missing: Vec<String> = network
                .missing_roles()
                .iter()
                .map(ContractRole::to_string)
                .collect();
            json!({
                "chain_id": network.chain_id,
                "name": network.name,
                "complete": network.is_complete(),
                "missing": missing,
                "controller": network.address_str(ContractRole::Controller),
            })
        })
        .collect();
    json!({ "networks": networks })
}

pub fn render_registry(registry: &NetworkRegistry) -> String {
    let mut lines = vec![format!("{}", "Lending deployments".cyan().bold())];
    for network in registry.iter() {
        let header = format!("{:>6}  {}", network.chain_id, network.name);
        if network.is_complete() {
            let controller = network.address_str(ContractRole::Controller);
            lines.push(format!(
                "{} {}  controller {}  {}",
                "✓".green(),
                header,
                shorten(controller),
                explorer_link(network.chain_id, controller, ExplorerKind::Address)
            ));
        } else {
            let missing: Vec<String> = network
                .missing_roles()
                .iter()
                .map(ContractRole::to_string)
                .collect();
            lines.push(format!(
                "{} {}  missing {}",
                "✗".red(),
                header,
                missing.join(", ").dimmed()
            ));
        }
    }
    lines.join("\n")
}
