use anyhow::{Context, Result};
use clap::Parser;
use restmcp::cli::{Cli, Commands};
use restmcp::core::protocol::METHOD_TOOLS_CALL;
use restmcp::core::{JsonRpcRequest, RequestId};
use restmcp::{build_gateway, utils, Gateway, Settings};
use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::new()?,
    };

    // stdout carries protocol traffic, so logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .context("invalid logging level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let gateway = build_gateway(&settings)?;

    match cli.command {
        Commands::Serve => handle_serve(&gateway).await,
        Commands::Tools { schema, verbose } => handle_tools(&gateway, schema, verbose),
        Commands::Call { name, args, id } => handle_call(&gateway, name, args, id).await,
    }
}

async fn handle_serve(gateway: &Gateway) -> Result<()> {
    tracing::info!("Serving JSON-RPC on stdio");

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = gateway.handle_message(&line).await;
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');

        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

fn handle_tools(gateway: &Gateway, schema: bool, verbose: bool) -> Result<()> {
    let registry = gateway.registry();

    if schema {
        println!("{}", serde_json::to_string_pretty(&registry.list_tools())?);
        return Ok(());
    }

    if verbose {
        utils::print_header(&format!("{} tools", registry.len()));
        println!("{}", registry.tools_description());
        return Ok(());
    }

    utils::print_header(&format!("{} tools", registry.len()));
    for endpoint in registry.endpoints() {
        utils::print_endpoint(endpoint);
    }
    Ok(())
}

async fn handle_call(gateway: &Gateway, name: String, args: String, id: String) -> Result<()> {
    let arguments: Value = serde_json::from_str(&args).context("--args must be valid JSON")?;
    if !arguments.is_object() {
        anyhow::bail!("--args must be a JSON object");
    }

    let id = match id.parse::<i64>() {
        Ok(n) => RequestId::Number(n),
        Err(_) => RequestId::String(id),
    };

    utils::print_info(&format!("Calling {}...", name));

    let request = JsonRpcRequest::new(id, METHOD_TOOLS_CALL)
        .with_params(serde_json::json!({"name": name, "arguments": arguments}));
    let outcome = gateway.dispatch(request).await;

    utils::print_response(&outcome.response);
    if let Some(context) = outcome.context {
        tracing::debug!("{}", context);
    }

    if outcome.response.is_success() {
        utils::print_success("Done");
    }
    Ok(())
}
