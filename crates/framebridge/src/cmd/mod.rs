use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod simulate;
pub mod tokens;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a posted payload into a control token, call or return.
    Decode(DecodeArgs),
    /// Build the wire payload for a call or a return.
    Encode(EncodeArgs),
    /// List the bare control tokens and what receiving each one does.
    Tokens,
    /// Run a host page and an embedded frame in memory and trace the traffic.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Tokens => tokens::run(format),
        Command::Simulate(args) => simulate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Payload as posted: JSON, or a bare token. `-` reads stdin.
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Operation to call, or whose result is being returned.
    pub operation: String,
    /// Call parameters as JSON. An array is spread into positional arguments.
    #[arg(long, value_name = "JSON", conflicts_with = "return_value")]
    pub params: Option<String>,
    /// Encode a return envelope carrying this JSON value.
    #[arg(long, value_name = "JSON")]
    pub return_value: Option<String>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// URL of the host page.
    #[arg(long, default_value = "https://host.example/watch")]
    pub page: String,
    /// Source of the embedded frame; its origin scopes host messages.
    #[arg(long, default_value = "https://embed.example/player")]
    pub src: String,
    /// Referrer the frame reports.
    #[arg(long, default_value = "https://host.example/watch")]
    pub referrer: String,
    /// Host storage entry mirrored into the frame, stored as written (repeatable).
    #[arg(long = "storage", value_name = "KEY=VALUE")]
    pub storage: Vec<String>,
    /// Load the frame only after the host's first handshake was lost.
    #[arg(long)]
    pub late_embed: bool,
    /// Never load the frame; the awaited call runs into its timeout.
    #[arg(long, conflicts_with = "late_embed")]
    pub no_embed: bool,
    /// Enter and leave fullscreen on the host once connected.
    #[arg(long)]
    pub fullscreen: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
