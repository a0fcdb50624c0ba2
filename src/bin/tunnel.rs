//! `tunnel`: a standalone SSH local-forward tunnel, independent of the
//! database client.
//!
//! Ported from `cmd/tunnel/main.go`'s `flag.StringVar` set.

use clap::Parser;
use connect::tunnel::TunnelInfo;

#[derive(Parser)]
#[command(name = "tunnel", about = "SSH local-forward tunnel")]
struct Cli {
    /// Local address to accept connections on.
    #[arg(long, default_value = "127.0.0.1:1234")]
    local: String,

    /// SSH endpoint to dial, as `user@host[:port]`.
    #[arg(long, default_value = "user@host.addr:22")]
    ssh: String,

    /// Address to forward connections to, reached from the SSH server.
    #[arg(long, default_value = "/var/lib/docker.sock")]
    remote: String,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let Some((ssh_user, mut ssh_addr)) = cli.ssh.split_once('@').map(|(u, a)| (u.to_string(), a.to_string())) else {
        log::error!("malformed ssh address, expected user@host[:port]: {}", cli.ssh);
        std::process::exit(1);
    };
    if !ssh_addr.contains(':') {
        ssh_addr = format!("{ssh_addr}:22");
    }

    log::info!("starting tunnel on {} (ssh-user={ssh_user}, ssh-addr={ssh_addr})", cli.local);

    let info = TunnelInfo {
        ssh_user,
        ssh_addr,
        remote_addr: cli.remote,
        local_addr: cli.local,
    };

    if let Err(e) = info.start() {
        log::error!("tunnel failed: {e}");
        std::process::exit(1);
    }
}
