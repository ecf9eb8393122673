use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("framebridge {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: framebridge");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("FRAMEBRIDGE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("features: peer={}, cli=true", cfg!(feature = "peer"));
    println!(
        "protocol: tokens={}, return_timeout_ms={}",
        framebridge_envelope::ControlToken::ALL.len(),
        framebridge_peer::BridgeConfig::default()
            .return_timeout
            .as_millis()
    );

    Ok(SUCCESS)
}
