//! SSH local-forward tunnel: accept local connections and forward each one
//! over its own SSH session to a remote address.
//!
//! Ported from `pkg/tunnel.go`'s `TunnelInfo`/`Start`/`forward`/`AuthAgent`.
//! `libssh2` (the library `ssh2` binds) does not support driving one
//! `Session`/`Channel` from two OS threads at once, so unlike the original's
//! two `go`routines per connection, each accepted connection gets exactly one
//! thread, and that thread multiplexes both copy directions itself via a
//! non-blocking poll loop — see DESIGN.md for the full rationale.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::os::unix::net::{UnixListener, UnixStream};
use std::time::Duration;

use ssh2::{Channel, Session};

use crate::error::TunnelError;

/// Everything needed to dial one forwarded connection.
#[derive(Clone)]
pub struct TunnelInfo {
    pub ssh_user: String,
    pub ssh_addr: String,
    pub remote_addr: String,
    pub local_addr: String,
}

impl TunnelInfo {
    /// Accept connections on `local_addr` until the listener errors out.
    /// `local_addr` containing `/` binds a Unix domain socket; otherwise a
    /// TCP listener.
    pub fn start(&self) -> Result<(), TunnelError> {
        if self.local_addr.contains('/') {
            let listener = UnixListener::bind(&self.local_addr).map_err(TunnelError::Listen)?;
            for conn in listener.incoming() {
                let info = self.clone();
                match conn {
                    Ok(stream) => {
                        std::thread::spawn(move || info.run_unix(stream));
                    }
                    Err(e) => return Err(TunnelError::Listen(e)),
                }
            }
        } else {
            let listener = TcpListener::bind(&self.local_addr).map_err(TunnelError::Listen)?;
            for conn in listener.incoming() {
                let info = self.clone();
                match conn {
                    Ok(stream) => {
                        std::thread::spawn(move || info.run_tcp(stream));
                    }
                    Err(e) => return Err(TunnelError::Listen(e)),
                }
            }
        }
        Ok(())
    }

    fn run_tcp(&self, mut local: TcpStream) {
        if let Err(e) = local.set_nonblocking(true) {
            log::error!("forwarding failed: {e}");
            return;
        }
        if let Err(e) = self.forward(local) {
            log::error!("forwarding failed: {e}");
        }
    }

    fn run_unix(&self, mut local: UnixStream) {
        if let Err(e) = local.set_nonblocking(true) {
            log::error!("forwarding failed: {e}");
            return;
        }
        if let Err(e) = self.forward(local) {
            log::error!("forwarding failed: {e}");
        }
    }

    fn forward<S: Read + Write>(&self, mut local: S) -> Result<(), TunnelError> {
        let session = self.dial_and_authenticate()?;

        let (host, port) = split_host_port(&self.remote_addr)?;
        let mut channel = session
            .channel_direct_tcpip(&host, port, None)
            .map_err(TunnelError::RemoteDial)?;

        session.set_blocking(false);
        pump(&mut local, &mut channel)
    }

    /// Dial the SSH server and authenticate via the agent, without opening a
    /// forwarded channel. Used both by `forward` and by the eager startup
    /// probe that a caller runs before committing to a tunnel.
    fn dial_and_authenticate(&self) -> Result<Session, TunnelError> {
        let tcp = TcpStream::connect(&self.ssh_addr).map_err(TunnelError::SshDial)?;
        let mut session = Session::new().map_err(TunnelError::Handshake)?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(TunnelError::Handshake)?;

        session
            .userauth_agent(&self.ssh_user)
            .map_err(TunnelError::Handshake)?;
        if !session.authenticated() {
            return Err(TunnelError::AuthFailed);
        }

        Ok(session)
    }

    /// Synchronously verify the SSH agent is reachable and authenticates
    /// before any tunnel thread is spawned, so a dead agent is a startup
    /// failure rather than a silently logged per-connection one.
    pub fn probe_agent(&self) -> Result<(), TunnelError> {
        self.dial_and_authenticate().map(|_| ())
    }
}

/// Copy in both directions until either side closes, polling since both the
/// local stream and the (session-wide non-blocking) channel may return
/// `WouldBlock`.
fn pump<S: Read + Write>(local: &mut S, channel: &mut Channel) -> Result<(), TunnelError> {
    let mut from_local = [0u8; 8192];
    let mut from_remote = [0u8; 8192];

    loop {
        let mut made_progress = false;

        match local.read(&mut from_local) {
            Ok(0) => return Ok(()),
            Ok(n) => {
                channel.write_all(&from_local[..n])?;
                made_progress = true;
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e.into()),
        }

        match channel.read(&mut from_remote) {
            Ok(0) => return Ok(()),
            Ok(n) => {
                local.write_all(&from_remote[..n])?;
                made_progress = true;
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e.into()),
        }

        if channel.eof() {
            return Ok(());
        }
        if !made_progress {
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

fn split_host_port(addr: &str) -> Result<(String, u16), TunnelError> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| TunnelError::InvalidAddress(addr.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| TunnelError::InvalidAddress(addr.to_string()))?;
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_host_and_port() {
        assert_eq!(split_host_port("db.internal:3306").unwrap(), ("db.internal".to_string(), 3306));
    }

    #[test]
    fn rejects_missing_port() {
        assert!(split_host_port("db.internal").is_err());
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(split_host_port("db.internal:abc").is_err());
    }
}
