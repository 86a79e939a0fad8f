//! `zonar-srv`: opens a session against a locally mounted filesystem and
//! serves zone/blockgroup/extent queries over the zonar wire protocol.

use clap::Parser;

use zonar_cli::cli::{ServerArgs, ServerMode};
use zonar_cli::{init_logging, mountinfo, signals};

fn main() {
    let args = ServerArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("zonar-srv: {e}");
        std::process::exit(1);
    }
}

fn run(args: &ServerArgs) -> Result<(), String> {
    let mode = args.mode()?;

    let mount_dir = match &mode {
        ServerMode::Listen { mount_dir, .. } => mount_dir,
        ServerMode::Connect { mount_dir, .. } => mount_dir,
    };

    let device_path = mountinfo::resolve_device(mount_dir)?;
    log::info!("resolved {} to device {}", mount_dir.display(), device_path.display());
    let session = zonar_core::open_local(mount_dir, &device_path).map_err(|e| e.to_string())?;

    let abort = signals::install().map_err(|e| e.to_string())?;

    match mode {
        ServerMode::Listen { port, .. } => {
            let addr = std::net::SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), port);
            zonar_core::transport::server::run(&session, addr, &abort).map_err(|e| e.to_string())
        }
        ServerMode::Connect { addr, .. } => {
            zonar_core::transport::server::run_reverse(&session, addr, &abort).map_err(|e| e.to_string())
        }
    }
}
