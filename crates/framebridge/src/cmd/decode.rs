use std::io::Read;

use framebridge_envelope::{is_private, try_decode, Arguments, Envelope};
use serde::Serialize;
use serde_json::Value;

use crate::cmd::DecodeArgs;
use crate::exit::{envelope_error, io_error, CliResult, SUCCESS};
use crate::output::{preview, print_json, print_raw, print_table, OutputFormat};

#[derive(Debug, Serialize)]
struct DecodeOutput {
    schema_id: &'static str,
    kind: &'static str,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    /// False when a peer would drop the call unseen.
    dispatchable: bool,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = if args.payload == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|err| io_error("failed to read stdin", err))?;
        buf
    } else {
        args.payload
    };

    let payload = parse_payload(&input);
    let envelope = try_decode(&payload).map_err(|err| envelope_error("not an envelope", err))?;
    let out = describe(envelope);

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Raw => print_raw(&payload),
        OutputFormat::Table => {
            let mut rows = vec![
                vec!["kind".to_string(), out.kind.to_string()],
                vec!["name".to_string(), out.name.clone()],
            ];
            if let Some(arguments) = &out.arguments {
                rows.extend(
                    arguments
                        .iter()
                        .enumerate()
                        .map(|(n, arg)| vec![format!("arg{n}"), preview(arg)]),
                );
            }
            if let Some(value) = &out.value {
                rows.push(vec!["value".to_string(), preview(value)]);
            }
            rows.push(vec!["dispatchable".to_string(), out.dispatchable.to_string()]);
            print_table(&["FIELD", "VALUE"], rows);
        }
        OutputFormat::Pretty => {
            println!("{} {}", out.kind, out.name);
            if let Some(arguments) = &out.arguments {
                for (n, arg) in arguments.iter().enumerate() {
                    println!("  arg{n} = {arg}");
                }
            }
            if let Some(value) = &out.value {
                println!("  value = {value}");
            }
        }
    }
    Ok(SUCCESS)
}

/// Posted payloads are JSON values; anything that does not parse is taken
/// as a bare string, the way tokens are posted.
fn parse_payload(input: &str) -> Value {
    let trimmed = input.trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn describe(envelope: Envelope) -> DecodeOutput {
    let schema_id = "https://schemas.3leaps.dev/framebridge/cli/v1/envelope.schema.json";
    match envelope {
        Envelope::Control(token) => DecodeOutput {
            schema_id,
            kind: "control",
            name: token.as_str().to_string(),
            arguments: None,
            value: None,
            dispatchable: true,
        },
        Envelope::Call { operation, params } => DecodeOutput {
            schema_id,
            kind: "call",
            dispatchable: !is_private(&operation),
            name: operation,
            arguments: Some(Arguments::from_params(params).into_vec()),
            value: None,
        },
        Envelope::Return { key, value } => DecodeOutput {
            schema_id,
            kind: "return",
            name: key,
            arguments: None,
            value: Some(value),
            dispatchable: false,
        },
    }
}
