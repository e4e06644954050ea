//! Weft demo binary.
//!
//! Runs a client against an in-memory server that answers `requestModel`
//! with a small graph, walks the startup phases, selects every node, and
//! prints the resulting model.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use weft_client::{ClientConfig, DiagramClient, DiagramLoader, LoopbackTransport, setup_tracing};
use weft_primitives::{Action, ActionPayload, Bounds, ModelElement, ModelRoot};
use async_trait as _;
use parking_lot as _;
use serde as _;
use thiserror as _;
use toml as _;
use tracing_subscriber as _;
use weft_command as _;
use weft_dispatch as _;
use weft_feedback as _;
use weft_selection as _;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(about = "Drive a weft diagram client against an in-memory server")]
struct Args {
	/// Path to a TOML client configuration
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Number of nodes in the demo graph
	#[arg(short, long, default_value_t = 3)]
	nodes: usize,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn demo_graph(nodes: usize) -> anyhow::Result<ModelRoot> {
	let mut root = ModelRoot::new("demo", "graph").with_revision(1);
	for i in 0..nodes {
		let bounds = Bounds::new(i as f64 * 120.0, 40.0, 100.0, 60.0);
		root.add_element(ModelElement::new(format!("node{i}"), "node").with_bounds(bounds))?;
		root.add_element(
			ModelElement::new(format!("node{i}_label"), "label")
				.with_parent(format!("node{i}"))
				.with_selectable(false),
		)?;
	}
	Ok(root)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	let config = match &args.config {
		Some(path) => ClientConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => ClientConfig::default(),
	};

	let graph = demo_graph(args.nodes)?;
	let transport = Arc::new(LoopbackTransport::new(move |message| match message.action.payload() {
		ActionPayload::RequestModel { .. } => vec![Action::set_model(graph.clone())],
		_ => Vec::new(),
	}));

	let client = DiagramClient::builder(config)
		.transport(transport.clone())
		.on_command_executed(|event| {
			tracing::info!(kind = event.kind.as_str(), elements = event.root.len(), "view.render");
		})
		.build()?;

	let ready = DiagramLoader::new(client.clone(), Vec::new()).load().await?;
	client
		.dispatcher()
		.dispatch(Action::initialize_canvas_bounds(Bounds::new(0.0, 0.0, 1280.0, 720.0)))
		.await?;
	tokio::time::timeout(Duration::from_secs(5), ready)
		.await
		.context("model never initialized")??;

	client
		.dispatcher()
		.dispatch(Action::new(ActionPayload::SelectAll { select: true }))
		.await?;

	let root = client.root();
	println!("{}", serde_json::to_string_pretty(root.as_ref())?);
	println!("selected: {:?}", client.selection().selected_element_ids());
	println!("messages sent to server: {}", transport.sent().len());
	Ok(())
}
