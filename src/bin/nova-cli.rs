use clap::{Parser, Subcommand};
use serde::Serialize;

use nova_client::config::{load_config, ClientConfig};
use nova_client::observability::{init_logging, TracingLog};
use nova_client::NovaClient;

#[derive(Parser)]
#[command(name = "nova-cli")]
#[command(about = "Command line client for a nova compute endpoint", long_about = None)]
struct Cli {
    /// Compute endpoint, overriding the config file.
    #[arg(short, long)]
    url: Option<String>,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List security groups
    Groups,
    /// Show one security group by name
    Group { name: String },
    /// Create a security group unless one with that name exists
    CreateGroup {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete a security group by id
    DeleteGroup { id: String },
    /// List floating ips
    Ips,
    /// Allocate a floating ip
    AllocateIp,
    /// Release a floating ip by id
    ReleaseIp { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = cli.url {
        config.endpoint = url;
    }
    init_logging(&config.observability.log_level);

    let client = NovaClient::from_config(&config, Some(std::sync::Arc::new(TracingLog)))?;

    match cli.command {
        Commands::Groups => print(&client.list_security_groups().await?)?,
        Commands::Group { name } => print(&client.security_group_by_name(&name).await?)?,
        Commands::CreateGroup { name, description } => {
            let group = match client.security_group_by_name(&name).await {
                Ok(existing) => existing,
                Err(e) if e.is_not_found() => client.create_security_group(&name, &description).await?,
                Err(e) => return Err(e.into()),
            };
            print(&group)?;
        }
        Commands::DeleteGroup { id } => {
            client.delete_security_group(&id).await?;
            println!("deleted security group {}", id);
        }
        Commands::Ips => print(&client.list_floating_ips().await?)?,
        Commands::AllocateIp => print(&client.allocate_floating_ip().await?)?,
        Commands::ReleaseIp { id } => {
            client.delete_floating_ip(&id).await?;
            println!("released floating ip {}", id);
        }
    }

    Ok(())
}

fn print<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
