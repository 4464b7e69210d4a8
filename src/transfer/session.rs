use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::MirrorError;
use crate::config::ServerConfig;
use crate::transfer::sftp_like::{SftpLike, Ssh2Adapter};

/// Create and configure the TCP connection (connect, read and write timeouts).
fn create_tcp_connection(addr: &str) -> Result<TcpStream, MirrorError> {
    let mut addrs =
        addr.to_socket_addrs().map_err(|e| MirrorError::Connection(addr.to_string(), e))?;
    let sock = addrs.next().ok_or_else(|| {
        MirrorError::Connection(
            addr.to_string(),
            io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing"),
        )
    })?;
    let tcp = TcpStream::connect_timeout(&sock, Duration::from_secs(10))
        .map_err(|e| MirrorError::Connection(addr.to_string(), e))?;
    let _ = tcp.set_read_timeout(Some(Duration::from_secs(30)));
    let _ = tcp.set_write_timeout(Some(Duration::from_secs(30)));
    Ok(tcp)
}

/// Open an authenticated SSH session using password authentication.
///
/// The server's host key is not checked against any known_hosts file.
pub fn connect_session(server: &ServerConfig) -> Result<ssh2::Session, MirrorError> {
    let addr = server.addr();
    let tcp = create_tcp_connection(&addr)?;
    let mut sess =
        ssh2::Session::new().map_err(|e| MirrorError::SessionCreate(addr.clone(), e.to_string()))?;
    sess.set_tcp_stream(tcp);
    sess.handshake().map_err(|e| MirrorError::Connection(addr.clone(), e.into()))?;
    tracing::warn!("[session] host key verification is disabled for {}", addr);

    let who = format!("{}@{}", server.username, addr);
    sess.userauth_password(&server.username, &server.password)
        .map_err(|e| MirrorError::Authentication(who.clone(), e.to_string()))?;
    if !sess.authenticated() {
        return Err(MirrorError::Authentication(who, "server rejected credentials".to_string()));
    }
    tracing::info!("[session] authenticated as {}", who);
    Ok(sess)
}

/// Start the SFTP subsystem on an authenticated session.
pub fn open_sftp(sess: &ssh2::Session, addr: &str) -> Result<Ssh2Adapter, MirrorError> {
    sess.sftp()
        .map(Ssh2Adapter)
        .map_err(|e| MirrorError::SftpCreate(addr.to_string(), e.to_string()))
}

/// The directory relative remote paths are resolved against.
pub fn remote_working_dir(sftp: &dyn SftpLike) -> Result<String, MirrorError> {
    let cwd = sftp.realpath(std::path::Path::new(".")).map_err(MirrorError::WorkingDir)?;
    Ok(cwd.to_string_lossy().into_owned())
}
