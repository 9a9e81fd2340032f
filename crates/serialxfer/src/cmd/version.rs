use serialxfer_frame::{LinkConfig, DEFAULT_POLYNOMIAL};
use serialxfer_transport::DEFAULT_BAUD_RATE;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("serialxfer {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let link = LinkConfig::default();
    println!("name: serialxfer");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("SERIALXFER_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("features: async={}, cli=true", cfg!(feature = "async"));
    println!(
        "link: start=0x{:02X} max_segment={} timeout_ms={} crc_poly=0x{:02X} baud={}",
        link.start_marker,
        link.max_segment_size,
        link.timeout.as_millis(),
        DEFAULT_POLYNOMIAL,
        DEFAULT_BAUD_RATE
    );

    Ok(SUCCESS)
}
