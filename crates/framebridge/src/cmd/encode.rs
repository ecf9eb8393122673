use framebridge_envelope::{encode_call, encode_return, is_private, RETURN_OPERATION};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::cmd::EncodeArgs;
use crate::exit::{envelope_error, json_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{preview, print_json, print_raw, print_table, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput<'a> {
    schema_id: &'static str,
    payload: &'a Value,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.operation.is_empty() || args.operation == RETURN_OPERATION {
        return Err(CliError::new(
            USAGE,
            format!("{:?} is not an operation name", args.operation),
        ));
    }
    if is_private(&args.operation) {
        warn!(operation = %args.operation, "private operations are dropped by the receiver");
    }

    let payload = match (&args.params, &args.return_value) {
        (_, Some(raw)) => {
            let value = parse_json("invalid --return-value", raw)?;
            encode_return(&args.operation, &value)
        }
        (Some(raw), None) => {
            let params = parse_json("invalid --params", raw)?;
            encode_call(&args.operation, &params)
        }
        (None, None) => encode_call(&args.operation, &Value::Array(Vec::new())),
    }
    .map_err(|err| envelope_error("failed to encode", err))?;

    match format {
        OutputFormat::Json => print_json(&EncodeOutput {
            schema_id: "https://schemas.3leaps.dev/framebridge/cli/v1/wire-payload.schema.json",
            payload: &payload,
        }),
        OutputFormat::Raw => print_raw(&payload),
        OutputFormat::Pretty => println!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
        ),
        OutputFormat::Table => {
            let rows = payload
                .as_object()
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(name, value)| vec![name.clone(), preview(value)])
                        .collect()
                })
                .unwrap_or_default();
            print_table(&["FIELD", "VALUE"], rows);
        }
    }
    Ok(SUCCESS)
}

fn parse_json(context: &str, raw: &str) -> CliResult<Value> {
    serde_json::from_str(raw).map_err(|err| json_error(context, err))
}
