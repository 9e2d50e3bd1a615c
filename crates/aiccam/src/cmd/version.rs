use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("aiccam {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: aiccam");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("AICCAM_BUILD_TARGET"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "transport: {} (read timeout {:?})",
        aiccam_transport::LoopbackSocket::transport_name(),
        aiccam_transport::DEFAULT_READ_TIMEOUT
    );
    println!(
        "limits: max_query={} max_payload={}",
        aiccam_client::MAX_QUERY_LEN,
        aiccam_frame::DEFAULT_MAX_PAYLOAD
    );

    Ok(SUCCESS)
}
