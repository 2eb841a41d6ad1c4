use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use host_router::RouteRecord;

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Management CLI for the host router's control plane", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3005")]
    url: String,

    /// Bearer token, when the router has `admin.api_key` set.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RouteArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    domain: String,
    /// Backend `host:port`.
    #[arg(long)]
    proxy_to: String,
}

impl From<RouteArgs> for RouteRecord {
    fn from(a: RouteArgs) -> Self {
        RouteRecord::new(a.name, a.domain, a.proxy_to)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List stored routes
    List,
    /// Add a route
    Add(RouteArgs),
    /// Replace the route with the given id
    Update {
        id: String,
        #[command(flatten)]
        route: RouteArgs,
    },
    /// Delete the route with the given id
    Delete { id: String },
    /// Re-read the route store and rebuild the routing table
    Reload,
    /// Replace every stored route with the records of a JSON file
    Import { file: PathBuf },
}

struct Rpc {
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
}

impl Rpc {
    async fn call(&self, body: Value) -> Result<Value, Box<dyn std::error::Error>> {
        let res = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        let value: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        if !status.is_success() {
            return Err(format!("control plane returned {}: {}", status, value).into());
        }
        Ok(value)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }
    let rpc = Rpc {
        client: reqwest::Client::new(),
        endpoint: format!("{}/api/rpc", cli.url.trim_end_matches('/')),
        headers,
    };

    let reply = match cli.command {
        Commands::List => rpc.call(json!({ "action": "getConfig" })).await?,
        Commands::Add(route) => {
            let record = RouteRecord::from(route);
            rpc.call(json!({ "action": "addConfig", "data": record })).await?
        }
        Commands::Update { id, route } => {
            let record = RouteRecord::from(route);
            rpc.call(json!({ "action": "updateConfig", "id": id, "data": record }))
                .await?
        }
        Commands::Delete { id } => rpc.call(json!({ "action": "deleteConfig", "id": id })).await?,
        Commands::Reload => rpc.call(json!({ "action": "reloadConfig" })).await?,
        Commands::Import { file } => import(&rpc, &file).await?,
    };

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

/// Clear the store, then add each record of `file` in order.
async fn import(rpc: &Rpc, file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let records: Vec<RouteRecord> = serde_json::from_str(&std::fs::read_to_string(file)?)?;
    eprintln!("Found {} configurations to import", records.len());

    let existing = rpc.call(json!({ "action": "getConfig" })).await?;
    let ids: Vec<String> = existing["data"]
        .as_array()
        .map(|routes| {
            routes
                .iter()
                .filter_map(|r| r["id"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    for id in &ids {
        rpc.call(json!({ "action": "deleteConfig", "id": id })).await?;
    }
    eprintln!("Cleared {} existing configurations", ids.len());

    for record in &records {
        eprintln!("Inserting {} ({} -> {})", record.name, record.domain, record.target);
        rpc.call(json!({ "action": "addConfig", "data": record })).await?;
    }

    rpc.call(json!({ "action": "getConfig" })).await
}
