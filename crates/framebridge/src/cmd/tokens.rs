use framebridge_envelope::ControlToken;
use serde::Serialize;

use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct TokenInfo {
    token: &'static str,
    effect: &'static str,
}

#[derive(Serialize)]
struct TokensOutput {
    schema_id: &'static str,
    tokens: Vec<TokenInfo>,
}

fn effect(token: ControlToken) -> &'static str {
    match token {
        ControlToken::Handshake => "acknowledge, then mark the sender's direction ready",
        ControlToken::HandshakeSucceeded => "mark the sender's direction ready and flush its queue",
        ControlToken::FullBrowser | ControlToken::FullScreen => {
            "take over the viewport, then request native fullscreen"
        }
        ControlToken::FullBrowserOff | ControlToken::CancelFullScreen => {
            "leave native fullscreen if active and restore the viewport"
        }
    }
}

pub fn run(format: OutputFormat) -> CliResult<i32> {
    let tokens: Vec<TokenInfo> = ControlToken::ALL
        .into_iter()
        .map(|token| TokenInfo {
            token: token.as_str(),
            effect: effect(token),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&TokensOutput {
            schema_id: "https://schemas.3leaps.dev/framebridge/cli/v1/control-tokens.schema.json",
            tokens,
        }),
        OutputFormat::Table => print_table(
            &["TOKEN", "EFFECT"],
            tokens
                .iter()
                .map(|info| vec![info.token.to_string(), info.effect.to_string()])
                .collect(),
        ),
        OutputFormat::Pretty | OutputFormat::Raw => {
            for info in &tokens {
                println!("{:<20} {}", info.token, info.effect);
            }
        }
    }
    Ok(SUCCESS)
}
