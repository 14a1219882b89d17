// ── Remote command execution ──
//
// libssh2 is blocking, so every session lives on the blocking pool.
// One session per host; commands run on it one channel at a time.

use std::future::Future;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::CoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs shell commands on a device.
pub trait RemoteExec: Send + Sync {
    /// Run `commands` in order on `host`, one output per command.
    fn run(
        &self,
        host: &str,
        commands: &[String],
    ) -> impl Future<Output = Result<Vec<CommandOutput>, CoreError>> + Send;
}

/// Password-authenticated SSH.
#[derive(Debug, Clone)]
pub struct SshExec {
    username: String,
    password: SecretString,
    port: u16,
    timeout: Duration,
}

impl SshExec {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            port: 22,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Applies to connecting and to every read; must cover the longest
    /// command.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl RemoteExec for SshExec {
    async fn run(&self, host: &str, commands: &[String]) -> Result<Vec<CommandOutput>, CoreError> {
        let this = self.clone();
        let host_owned = host.to_owned();
        let commands = commands.to_vec();

        tokio::task::spawn_blocking(move || this.run_blocking(&host_owned, &commands))
            .await
            .map_err(|e| CoreError::Internal(format!("SSH task failed: {e}")))?
    }
}

/// Answers every keyboard-interactive prompt with the password.
struct PasswordPrompt<'a>(&'a str);

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt<'_> {
    fn prompt<'b>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'b>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.0.to_owned()).collect()
    }
}

impl SshExec {
    fn run_blocking(&self, host: &str, commands: &[String]) -> Result<Vec<CommandOutput>, CoreError> {
        let session = self.connect(host)?;
        commands
            .iter()
            .map(|command| exec(&session, host, command))
            .collect()
    }

    fn connect(&self, host: &str) -> Result<ssh2::Session, CoreError> {
        let err = |message: String| CoreError::Ssh {
            host: host.to_owned(),
            message,
        };

        let addr = (host, self.port)
            .to_socket_addrs()
            .map_err(|e| err(format!("cannot resolve: {e}")))?
            .next()
            .ok_or_else(|| err("no address".into()))?;
        let tcp = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| err(format!("TCP connection failed: {e}")))?;

        let mut session = ssh2::Session::new().map_err(|e| err(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
        session
            .handshake()
            .map_err(|e| err(format!("handshake failed: {e}")))?;

        let password = self.password.expose_secret();
        if session.userauth_password(&self.username, password).is_err() || !session.authenticated() {
            debug!(host, "password auth refused, trying keyboard-interactive");
            let mut prompt = PasswordPrompt(password);
            // Failure shows up in authenticated() below.
            let _ = session.userauth_keyboard_interactive(&self.username, &mut prompt);
        }
        if !session.authenticated() {
            return Err(err(format!("authentication failed for {}", self.username)));
        }
        debug!(host, "SSH session established");
        Ok(session)
    }
}

fn exec(session: &ssh2::Session, host: &str, command: &str) -> Result<CommandOutput, CoreError> {
    let err = |e: &dyn std::fmt::Display| CoreError::Ssh {
        host: host.to_owned(),
        message: format!("{command}: {e}"),
    };

    debug!(host, command, "exec");
    let mut channel = session.channel_session().map_err(|e| err(&e))?;
    channel.exec(command).map_err(|e| err(&e))?;

    let mut out = CommandOutput::default();
    channel.read_to_string(&mut out.stdout).map_err(|e| err(&e))?;
    channel
        .stderr()
        .read_to_string(&mut out.stderr)
        .map_err(|e| err(&e))?;
    channel.wait_close().map_err(|e| err(&e))?;
    Ok(out)
}
