// SFTP connector for multi-file sources.
// Blocking ssh2 calls; the pipeline runs one step at a time.

use crate::config::SftpConfig;
use crate::domain::ports::{RemoteConnector, RemoteSession};
use crate::utils::error::{EtlError, Result};
use ssh2::{Session, Sftp};
use std::fs::File;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SftpConnector {
    config: SftpConfig,
}

impl SftpConnector {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }

    fn authenticate(&self, sess: &Session) -> Result<()> {
        let user = &self.config.user;

        if let Some(key_path) = &self.config.private_key_path {
            debug!(username = %user, key_path = %key_path.display(), "Authenticating with SSH key");
            sess.userauth_pubkey_file(user, None, key_path, None)
                .map_err(|e| {
                    error!(error = %e, username = %user, "SSH key authentication failed");
                    EtlError::SftpError {
                        message: format!("SSH key authentication failed for user {}: {}", user, e),
                    }
                })?;
        } else if let Some(password) = &self.config.password {
            debug!(username = %user, "Authenticating with password");
            sess.userauth_password(user, password).map_err(|e| EtlError::SftpError {
                message: format!("Password authentication failed for user {}: {}", user, e),
            })?;
        } else {
            debug!(username = %user, "Authenticating with ssh-agent");
            sess.userauth_agent(user).map_err(|e| EtlError::SftpError {
                message: format!("Agent authentication failed for user {}: {}", user, e),
            })?;
        }

        if !sess.authenticated() {
            return Err(EtlError::SftpError {
                message: format!("Authentication failed for user {}", user),
            });
        }
        Ok(())
    }
}

impl RemoteConnector for SftpConnector {
    fn connect(&self) -> Result<Box<dyn RemoteSession>> {
        let host = &self.config.host;
        let port = self.config.port;
        info!(host = %host, port = %port, "Establishing SFTP connection");

        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let addr = (host.as_str(), port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| EtlError::SftpError {
                message: format!("{}:{} did not resolve to an address", host, port),
            })?;
        let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|e| EtlError::SftpError {
            message: format!("Failed to connect to {}:{}: {}", host, port, e),
        })?;
        tcp.set_read_timeout(Some(timeout))?;
        tcp.set_write_timeout(Some(timeout))?;

        let mut sess = Session::new()?;
        sess.set_tcp_stream(tcp);
        sess.handshake().map_err(|e| EtlError::SftpError {
            message: format!("SSH handshake with {} failed: {}", host, e),
        })?;
        self.authenticate(&sess)?;

        let sftp = sess.sftp()?;
        info!(host = %host, "SFTP connection established");

        Ok(Box::new(SftpSession {
            host: host.clone(),
            session: sess,
            sftp: Some(sftp),
        }))
    }
}

/// Open SFTP channel; disconnects when dropped.
pub struct SftpSession {
    host: String,
    session: Session,
    sftp: Option<Sftp>,
}

impl RemoteSession for SftpSession {
    fn get_file(&mut self, remote_path: &str, local_dir: &Path) -> Result<PathBuf> {
        let sftp = self.sftp.as_ref().ok_or_else(|| EtlError::SftpError {
            message: "SFTP channel already closed".to_string(),
        })?;

        let filename = Path::new(remote_path)
            .file_name()
            .ok_or_else(|| EtlError::SftpError {
                message: format!("{} does not name a file", remote_path),
            })?;
        let target = local_dir.join(filename);

        let mut remote = sftp.open(Path::new(remote_path)).map_err(|e| {
            error!(error = %e, remote_path = %remote_path, "Failed to open remote file");
            EtlError::SftpError {
                message: format!("Failed to open {}: {}", remote_path, e),
            }
        })?;
        let mut local = File::create(&target)?;
        let size = io::copy(&mut remote, &mut local)?;

        debug!(remote_path = %remote_path, size, "Downloaded {}", target.display());
        Ok(target)
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        self.sftp.take();
        if let Err(e) = self.session.disconnect(None, "fetch complete", None) {
            debug!(error = %e, "SFTP disconnect reported an error");
        }
        info!(host = %self.host, "SFTP connection closed");
    }
}
