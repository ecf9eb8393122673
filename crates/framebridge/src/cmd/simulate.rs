//! A host page and the frame it embeds, run against one in-memory mailbox.
//!
//! The host queues an awaited `getReferrer` before the frame is connected,
//! the handshake completes, the storage mirror is pushed and the frame's
//! answer comes back as a `return` envelope. Every posted message is traced.

use std::cell::RefCell;
use std::rc::Rc;

use framebridge_envelope::{decode, Envelope};
use framebridge_peer::{
    Bridge, Direction, HostParts, KeyValueStore, MemoryLocation, MemoryStore, StorageItem,
};
use framebridge_transport::{resolve_origin, Delivery, Mailbox, WindowId, ANY_ORIGIN};
use framebridge_viewport::memory::{
    MemoryFullscreen, MemoryStyle, MemoryViewport, MemoryVisibility,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::cmd::SimulateArgs;
use crate::exit::{
    io_error, peer_error, transport_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{preview, print_json, print_raw, print_table, OutputFormat};

const GET_REFERRER: &str = "getReferrer";

#[derive(Debug, Serialize)]
struct TraceEntry {
    step: usize,
    from: &'static str,
    to: &'static str,
    kind: String,
    delivered: bool,
    payload: Value,
}

#[derive(Serialize)]
struct SimulationOutput {
    schema_id: &'static str,
    embed_origin: String,
    messages: Vec<TraceEntry>,
    host_link: &'static str,
    embed_link: Option<&'static str>,
    referrer: Option<Value>,
    embed_storage: Vec<StorageItem>,
    embed_events: Vec<Value>,
}

struct Windows {
    mailbox: Mailbox,
    host: WindowId,
    embed: WindowId,
}

impl Windows {
    fn label(&self, id: WindowId) -> &'static str {
        if id == self.host {
            "host"
        } else if id == self.embed {
            "embed"
        } else {
            "unknown"
        }
    }
}

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    let page = Url::parse(&args.page)
        .map_err(|err| CliError::new(USAGE, format!("invalid --page: {err}")))?;
    let embed_origin = resolve_origin(&args.src, Some(&page));
    if embed_origin == ANY_ORIGIN {
        return Err(transport_error(
            "frame source has no origin",
            framebridge_transport::TransportError::InvalidOrigin(args.src.clone()),
        ));
    }
    let seed = parse_storage(&args.storage)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))?;

    let mailbox = Mailbox::new();
    let windows = Windows {
        host: mailbox.open_window(&page.origin().ascii_serialization()),
        embed: mailbox.open_window(&embed_origin),
        mailbox,
    };

    let mut host_store = MemoryStore::new();
    for (key, value) in &seed {
        // Memory stores accept every write.
        let _ = host_store.set_item(key, value);
    }

    let mut host = Bridge::builder()
        .child(
            windows.mailbox.target(windows.host, windows.embed),
            &args.src,
            Some(&page),
        )
        .build(parts(&windows.mailbox, host_store, &args.page, ""));

    let mut trace = Vec::new();
    if args.late_embed || args.no_embed {
        for delivery in windows.mailbox.drain() {
            record(&windows, &mut trace, &delivery, false);
        }
    }

    let referrer = host.call_remote_and_await(Direction::Child, GET_REFERRER, Value::Null);

    let events = Rc::new(RefCell::new(Vec::new()));
    let mut embed = if args.no_embed {
        None
    } else {
        Some(embed_bridge(&windows, &args, &events)?)
    };

    pump(&windows, &mut host, &mut embed, &mut trace);
    if args.fullscreen {
        host.enter_full_screen();
        pump(&windows, &mut host, &mut embed, &mut trace);
        host.cancel_full_screen();
        pump(&windows, &mut host, &mut embed, &mut trace);
    }

    let referrer = runtime.block_on(referrer);
    info!(answered = referrer.is_some(), "simulation finished");

    let out = SimulationOutput {
        schema_id: "https://schemas.3leaps.dev/framebridge/cli/v1/simulation.schema.json",
        embed_origin,
        messages: trace,
        host_link: host
            .link_state(Direction::Child)
            .map(|state| state.as_str())
            .unwrap_or("none"),
        embed_link: embed
            .as_ref()
            .and_then(|embed| embed.link_state(Direction::Parent))
            .map(|state| state.as_str()),
        referrer,
        embed_storage: embed
            .as_mut()
            .map(Bridge::local_storage_items)
            .unwrap_or_default(),
        embed_events: events.borrow().clone(),
    };
    print_simulation(&out, format);

    Ok(if out.referrer.is_some() { SUCCESS } else { TIMEOUT })
}

fn parse_storage(entries: &[String]) -> CliResult<Vec<(String, String)>> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(CliError::new(
                USAGE,
                format!("invalid --storage {entry:?}, expected KEY=VALUE"),
            )),
        })
        .collect()
}

fn parts(mailbox: &Mailbox, store: MemoryStore, href: &str, referrer: &str) -> HostParts {
    HostParts {
        events: Box::new(mailbox.clone()),
        style: Box::new(MemoryStyle::default()),
        viewport: Box::new(MemoryViewport::with_content("width=device-width")),
        fullscreen: Box::new(MemoryFullscreen::standard()),
        visibility: Some(Box::new(MemoryVisibility::supported())),
        storage: Some(Box::new(store)),
        location: Box::new(MemoryLocation::new(href, referrer)),
    }
}

fn embed_bridge(
    windows: &Windows,
    args: &SimulateArgs,
    events: &Rc<RefCell<Vec<Value>>>,
) -> CliResult<Bridge> {
    let mut builder = Bridge::builder().parent(windows.mailbox.target(windows.embed, windows.host));
    for operation in [
        Direction::Child.window_event_operation(),
        Direction::Child.document_event_operation(),
    ] {
        let events = Rc::clone(events);
        builder = builder
            .operation(operation, move |_, arguments| {
                let event = arguments.get(0).cloned().unwrap_or(Value::Null);
                debug!(operation, event = %event, "frame received event");
                events.borrow_mut().push(event);
                None
            })
            .map_err(|err| peer_error("failed to register event handler", err))?;
    }
    Ok(builder.build(parts(
        &windows.mailbox,
        MemoryStore::new(),
        &args.src,
        &args.referrer,
    )))
}

fn pump(
    windows: &Windows,
    host: &mut Bridge,
    embed: &mut Option<Bridge>,
    trace: &mut Vec<TraceEntry>,
) {
    while let Some(delivery) = windows.mailbox.pop() {
        let receiver = if delivery.to == windows.host {
            Some(&mut *host)
        } else if delivery.to == windows.embed {
            embed.as_mut()
        } else {
            None
        };
        let delivered = match receiver {
            Some(bridge) => {
                bridge.handle_message(&delivery.message);
                true
            }
            None => false,
        };
        record(windows, trace, &delivery, delivered);
    }
}

fn record(windows: &Windows, trace: &mut Vec<TraceEntry>, delivery: &Delivery, delivered: bool) {
    let from = delivery
        .message
        .source
        .map(|id| windows.label(id))
        .unwrap_or("unknown");
    trace.push(TraceEntry {
        step: trace.len() + 1,
        from,
        to: windows.label(delivery.to),
        kind: kind(&delivery.message.data),
        delivered,
        payload: delivery.message.data.clone(),
    });
}

fn kind(payload: &Value) -> String {
    match decode(payload) {
        Some(Envelope::Control(token)) => format!("control:{token}"),
        Some(Envelope::Call { operation, .. }) => format!("call:{operation}"),
        Some(Envelope::Return { key, .. }) => format!("return:{key}"),
        None => "unknown".to_string(),
    }
}

fn print_simulation(out: &SimulationOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Raw => {
            for entry in &out.messages {
                print_raw(&entry.payload);
            }
        }
        OutputFormat::Table => {
            print_table(
                &["STEP", "FROM", "TO", "KIND", "PAYLOAD"],
                out.messages
                    .iter()
                    .map(|entry| {
                        vec![
                            entry.step.to_string(),
                            entry.from.to_string(),
                            if entry.delivered {
                                entry.to.to_string()
                            } else {
                                format!("{} (lost)", entry.to)
                            },
                            entry.kind.clone(),
                            preview(&entry.payload),
                        ]
                    })
                    .collect(),
            );
            print_summary(out);
        }
        OutputFormat::Pretty => {
            for entry in &out.messages {
                let lost = if entry.delivered { "" } else { " (lost)" };
                println!(
                    "#{:<3} {:>5} -> {:<5}{} {}",
                    entry.step, entry.from, entry.to, lost, entry.kind
                );
            }
            print_summary(out);
        }
    }
}

fn print_summary(out: &SimulationOutput) {
    println!("host link: {}", out.host_link);
    println!("embed link: {}", out.embed_link.unwrap_or("not loaded"));
    match &out.referrer {
        Some(referrer) => println!("referrer: {}", preview(referrer)),
        None => println!("referrer: no answer before timeout"),
    }
    println!("embed storage entries: {}", out.embed_storage.len());
}
