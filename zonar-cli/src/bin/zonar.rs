//! `zonar`: opens a session against a mounted filesystem — locally, or
//! against a remote `zonar-srv` — and prints a summary of its correlated
//! zone/blockgroup view.

use clap::Parser;

use zonar_cli::cli::{ClientArgs, Target};
use zonar_cli::{info, init_logging, mountinfo};

fn main() {
    let args = ClientArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("zonar: {e}");
        std::process::exit(1);
    }
}

fn run(args: &ClientArgs) -> Result<(), String> {
    let target = args.target()?;

    let session = match target {
        Target::Local { mount_dir } => {
            let device_path = mountinfo::resolve_device(&mount_dir)?;
            log::info!("resolved {} to device {}", mount_dir.display(), device_path.display());
            zonar_core::open_local(&mount_dir, &device_path).map_err(|e| e.to_string())?
        }
        Target::Connect { addr } => zonar_core::open_client(addr).map_err(|e| e.to_string())?,
        Target::Listen { port } => {
            let stream = zonar_core::transport::client::listen_for_server(port).map_err(|e| e.to_string())?;
            zonar_core::open_client_over(stream).map_err(|e| e.to_string())?
        }
    };

    info::print(&session);
    Ok(())
}
