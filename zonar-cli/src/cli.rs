//! Command-line argument definitions for the `zonar` (client/local) and
//! `zonar-srv` (server) binaries.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Default TCP port for the zonar wire protocol.
pub const DEFAULT_PORT: u16 = 49152;

fn parse_port(s: &str) -> Result<u16, String> {
    let n: i64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if n <= 0 || n >= 65535 {
        return Err(format!("port must be in 1..65534, got {n}"));
    }
    Ok(n as u16)
}

/// Where a session gets its data from, once arguments have been
/// validated against the mutual-exclusion rules below.
pub enum Target {
    /// Open `mount_dir` directly in this process.
    Local { mount_dir: PathBuf },
    /// Connect outward to a server already listening at `addr`.
    Connect { addr: SocketAddr },
    /// Wait for a server to connect in, on `port`.
    Listen { port: u16 },
}

/// `zonar`: open a session locally, or against a remote `zonar-srv`,
/// and print a summary of the correlated zone/blockgroup view.
#[derive(Parser, Debug)]
#[command(name = "zonar", version, about, long_about = None)]
pub struct ClientArgs {
    /// Mount directory to inspect. Required unless `--connect` or
    /// `--listen` is given.
    pub mount_dir: Option<PathBuf>,

    /// Enable verbose diagnostic output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Connect to a `zonar-srv` already listening at this IPv4 address.
    #[arg(short, long, conflicts_with_all = ["listen", "mount_dir"])]
    pub connect: Option<IpAddr>,

    /// Wait for a `zonar-srv` to connect in (reverse mode), instead of
    /// connecting out to one.
    #[arg(short, long, conflicts_with = "mount_dir")]
    pub listen: bool,

    /// TCP port to use with `--connect` or `--listen`.
    #[arg(short, long, value_parser = parse_port, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl ClientArgs {
    /// Resolves the parsed flags into one of the three mutually exclusive
    /// ways this run can reach its data: `--connect` and `--listen` and a
    /// bare mount directory are pairwise exclusive.
    pub fn target(&self) -> Result<Target, String> {
        match (&self.connect, self.listen, &self.mount_dir) {
            (Some(addr), false, None) => Ok(Target::Connect {
                addr: SocketAddr::new(*addr, self.port),
            }),
            (None, true, None) => Ok(Target::Listen { port: self.port }),
            (None, false, Some(mount_dir)) => Ok(Target::Local {
                mount_dir: mount_dir.clone(),
            }),
            (None, false, None) => {
                Err("a mount directory is required unless --connect or --listen is given".into())
            }
            _ => Err("--connect, --listen, and <mount_dir> are mutually exclusive".into()),
        }
    }
}

/// `zonar-srv`: serve zone/blockgroup/extent queries from a locally
/// mounted filesystem over the network.
#[derive(Parser, Debug)]
#[command(name = "zonar-srv", version, about, long_about = None)]
pub struct ServerArgs {
    /// Mount directory to serve. Required unless `--connect` is given.
    pub mount_dir: Option<PathBuf>,

    /// Enable verbose diagnostic output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Connect out to a waiting client at this IPv4 address (reverse
    /// mode), instead of listening for one.
    #[arg(short, long, conflicts_with = "mount_dir")]
    pub connect: Option<IpAddr>,

    /// TCP port to listen on, or to use with `--connect`.
    #[arg(short, long, value_parser = parse_port, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

/// How the server variant reaches its (required) mount directory, and
/// whether it actively connects out to a waiting client or passively
/// listens.
pub enum ServerMode {
    Listen { mount_dir: PathBuf, port: u16 },
    Connect { mount_dir: PathBuf, addr: SocketAddr },
}

impl ServerArgs {
    pub fn mode(&self) -> Result<ServerMode, String> {
        match (&self.mount_dir, &self.connect) {
            (Some(mount_dir), None) => Ok(ServerMode::Listen {
                mount_dir: mount_dir.clone(),
                port: self.port,
            }),
            (Some(mount_dir), Some(addr)) => Ok(ServerMode::Connect {
                mount_dir: mount_dir.clone(),
                addr: SocketAddr::new(*addr, self.port),
            }),
            (None, _) => Err("a mount directory is required".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn client_local_target() {
        let args = ClientArgs::parse_from(["zonar", "/mnt/data"]);
        assert!(matches!(args.target(), Ok(Target::Local { .. })));
    }

    #[test]
    fn client_connect_target() {
        let args = ClientArgs::parse_from(["zonar", "--connect", "10.0.0.5"]);
        match args.target().unwrap() {
            Target::Connect { addr } => assert_eq!(addr.port(), DEFAULT_PORT),
            _ => panic!("expected Connect"),
        }
    }

    #[test]
    fn client_requires_a_target() {
        let args = ClientArgs::parse_from(["zonar"]);
        assert!(args.target().is_err());
    }

    #[test]
    fn client_connect_and_mount_dir_conflict() {
        let result = ClientArgs::try_parse_from(["zonar", "--connect", "10.0.0.5", "/mnt/data"]);
        assert!(result.is_err());
    }

    #[test]
    fn port_out_of_range_is_rejected() {
        let result = ClientArgs::try_parse_from(["zonar", "/mnt/data", "--port", "0"]);
        assert!(result.is_err());
        let result = ClientArgs::try_parse_from(["zonar", "/mnt/data", "--port", "65535"]);
        assert!(result.is_err());
    }

    #[test]
    fn server_defaults_to_listen() {
        let args = ServerArgs::parse_from(["zonar-srv", "/mnt/data"]);
        assert!(matches!(args.mode(), Ok(ServerMode::Listen { .. })));
    }

    #[test]
    fn server_requires_mount_dir() {
        let args = ServerArgs::parse_from(["zonar-srv"]);
        assert!(args.mode().is_err());
    }
}
