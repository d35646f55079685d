use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use subsync::generator::{descriptor_to_link, inventory_stats};
use subsync::inventory::{self, RoutingGroups};
use subsync::models::SyncRequest;
use subsync::parser::parse_link;
use subsync::{AppContext, Settings};

/// Normalize proxy share links and regenerate subscription artifacts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", default_value = "subsync.toml")]
    config: PathBuf,

    /// Override the data directory from the configuration file
    #[arg(long, value_name = "DIR")]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge the node store into the working inventory
    Reconcile,
    /// Reconcile, then rewrite the proxy lists and the link bundle
    Render,
    /// Fetch subscription feeds and merge their nodes
    Sync {
        /// Only sync these configured subscriptions
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,
        /// Sync these feed URLs instead of the configured subscriptions
        #[arg(long = "url", value_name = "URL")]
        urls: Vec<String>,
        /// Label recorded as the trigger of this run
        #[arg(long, default_value = "manual")]
        trigger: String,
    },
    /// Print inventory statistics as JSON
    Stats,
    /// Parse one share link and print its descriptor
    Parse {
        link: String,
        #[arg(long, default_value = "node")]
        name: String,
        #[arg(long)]
        region: Option<String>,
    },
    /// Add a link to a local node, creating the node if needed
    AddLink {
        #[arg(long)]
        name: String,
        #[arg(long)]
        link: String,
        /// Protocol key, taken from the link when omitted
        #[arg(long)]
        protocol: Option<String>,
        /// Only merge into nodes that were added locally
        #[arg(long)]
        callback: bool,
    },
    /// Rename a node
    Rename { id: String, name: String },
    /// Delete a non-store node
    DeleteNode { id: String },
    /// Remove one protocol link from a non-store node
    DeleteProtocol { id: String, protocol: String },
    /// Remove every node that came from a subscription feed
    ClearSubscriptions,
    /// Apply ordering and routing classes from a JSON file
    Routing {
        /// JSON object with `direct`, `relay` and `unclassified` id lists
        file: PathBuf,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(&args.config)?;
    if let Some(data_dir) = args.data_dir {
        settings.common.data_dir = data_dir;
    }

    // Initialize the logger
    env_logger::init_from_env(Env::default().default_filter_or(settings.common.log_level.as_str()));

    if let Command::Parse { link, name, region } = &args.command {
        let proxy = parse_link(link, name, region.as_deref())
            .with_context(|| format!("cannot parse {}", link))?;
        print!("{}", serde_yaml::to_string(&proxy)?);
        println!("{}", descriptor_to_link(&proxy));
        return Ok(());
    }

    let ctx = AppContext::from_settings(settings)?;
    match args.command {
        Command::Reconcile => {
            let nodes = inventory::refresh_inventory(&ctx).await?;
            info!("Inventory holds {} nodes", nodes.len());
        }
        Command::Render => {
            inventory::regenerate_artifacts(&ctx).await?;
        }
        Command::Sync { ids, urls, trigger } => {
            let request = SyncRequest {
                selected_ids: (!ids.is_empty()).then_some(ids),
                urls_override: (!urls.is_empty()).then_some(urls),
                trigger,
            };
            let outcome = inventory::sync_subscriptions(&ctx, request).await?;
            print_json(&outcome)?;
        }
        Command::Stats => {
            let nodes = inventory::refresh_inventory(&ctx).await?;
            print_json(&inventory_stats(&nodes))?;
        }
        Command::AddLink {
            name,
            link,
            protocol,
            callback,
        } => {
            let added = if callback {
                inventory::add_callback_link(&ctx, &name, protocol.as_deref(), &link).await?
            } else {
                inventory::add_local_link(&ctx, &name, protocol.as_deref(), &link).await?
            };
            println!("{}", added.id);
        }
        Command::Rename { id, name } => inventory::rename_node(&ctx, &id, &name).await?,
        Command::DeleteNode { id } => inventory::delete_node(&ctx, &id).await?,
        Command::DeleteProtocol { id, protocol } => {
            let change = inventory::delete_protocol(&ctx, &id, &protocol).await?;
            info!("Protocol {} removed from {}: {:?}", protocol, id, change);
        }
        Command::ClearSubscriptions => {
            let deleted = inventory::clear_subscription_nodes(&ctx).await?;
            info!("Removed {} subscription nodes", deleted);
        }
        Command::Routing { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let groups: RoutingGroups = serde_json::from_str(&content)?;
            if groups == RoutingGroups::default() {
                bail!("{} lists no node ids", file.display());
            }
            inventory::update_routing(&ctx, &groups).await?;
        }
        Command::Parse { .. } => {}
    }
    Ok(())
}
