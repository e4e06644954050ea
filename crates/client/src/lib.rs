//! Composition root for the weft diagram client.
//!
//! Wires the dispatcher, command stack, feedback dispatcher, and selection
//! service into one [`DiagramClient`], optionally connected to a server
//! through a [`Transport`], and drives startup with [`DiagramLoader`].

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod startup;
pub mod transport;

// Used by the `weft` binary.
use anyhow as _;
use clap as _;

pub use client::{DiagramClient, DiagramClientBuilder};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};
pub use logging::setup_tracing;
pub use startup::{DiagramLoader, StartupHook, StartupPhase};
pub use transport::{LoopbackTransport, RemoteActionForwarder, Transport, TransportError, spawn_inbound_pump};
