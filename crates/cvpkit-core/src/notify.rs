// ── Report sinks ──
//
// A report is a subject plus one line per affected switch. Each sink
// renders it its own way: stdout gets the subject then the lines, mail
// gets one message, syslog gets one critical record per line.

use std::path::PathBuf;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use syslog::{Facility, Formatter3164};
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// Something to tell an operator about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub lines: Vec<String>,
}

impl Report {
    pub fn new(subject: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            lines,
        }
    }

    /// Subject line followed by every line, newline terminated.
    pub fn body(&self) -> String {
        let mut body = format!("{}\n", self.subject);
        for line in &self.lines {
            body.push_str(line);
            body.push('\n');
        }
        body
    }

    /// One syslog record per line: `"{subject} {line}"`.
    pub fn syslog_records(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| format!("{} {line}", self.subject))
            .collect()
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub server: String,
    pub port: u16,
    pub from: String,
    pub to: Vec<String>,
    /// Log in after STARTTLS. Without credentials the relay is used
    /// unauthenticated.
    pub credentials: Option<(String, SecretString)>,
    pub starttls: bool,
}

/// Where syslog records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyslogTarget {
    /// Local socket, `/dev/log` on most Linux systems.
    Unix(PathBuf),
    /// Remote collector as `host:port`.
    Udp(String),
}

impl Default for SyslogTarget {
    fn default() -> Self {
        Self::Unix(PathBuf::from("/dev/log"))
    }
}

impl SyslogTarget {
    /// `host:port` goes over UDP; anything else is taken as a socket path.
    pub fn parse(address: &str) -> Self {
        if address.starts_with('/') || !address.contains(':') {
            Self::Unix(PathBuf::from(address))
        } else {
            Self::Udp(address.to_owned())
        }
    }
}

#[derive(Debug, Clone)]
pub enum Sink {
    Print,
    Mail(MailSettings),
    Syslog(SyslogTarget),
}

impl Sink {
    fn name(&self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Mail(_) => "mail",
            Self::Syslog(_) => "syslog",
        }
    }
}

/// Fans a report out to every configured sink.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    sinks: Vec<Sink>,
}

impl Notifier {
    pub fn new(sinks: Vec<Sink>) -> Self {
        Self { sinks }
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn has_syslog(&self) -> bool {
        self.sinks.iter().any(|s| matches!(s, Sink::Syslog(_)))
    }

    /// Deliver to every sink. A failing sink does not stop the others;
    /// the first failure is returned once all have been tried.
    pub async fn send(&self, report: &Report) -> Result<(), CoreError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = deliver(sink, report).await {
                warn!(sink = sink.name(), error = %e, "notification failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Deliver to syslog sinks only (watcher start/stop announcements).
    pub async fn send_syslog(&self, report: &Report) -> Result<(), CoreError> {
        for sink in self.sinks.iter().filter(|s| matches!(s, Sink::Syslog(_))) {
            deliver(sink, report).await?;
        }
        Ok(())
    }
}

async fn deliver(sink: &Sink, report: &Report) -> Result<(), CoreError> {
    match sink {
        Sink::Print => {
            print!("{}", report.body());
            Ok(())
        }
        Sink::Mail(settings) => send_mail(settings, report).await,
        Sink::Syslog(target) => send_syslog(target, report),
    }
}

fn mail_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Notify {
        sink: "mail",
        message: e.to_string(),
    }
}

fn syslog_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Notify {
        sink: "syslog",
        message: e.to_string(),
    }
}

/// Build the message for `report`. Split out so tests can inspect it
/// without an SMTP server.
pub(crate) fn build_message(settings: &MailSettings, report: &Report) -> Result<Message, CoreError> {
    let from: Mailbox = settings.from.parse().map_err(mail_err)?;
    let mut builder = Message::builder().from(from).subject(report.subject.trim());
    for to in &settings.to {
        builder = builder.to(to.parse::<Mailbox>().map_err(mail_err)?);
    }
    builder
        .header(ContentType::TEXT_PLAIN)
        .body(report.body())
        .map_err(mail_err)
}

async fn send_mail(settings: &MailSettings, report: &Report) -> Result<(), CoreError> {
    let message = build_message(settings, report)?;

    let builder = if settings.starttls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server).map_err(mail_err)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.server)
    };
    let mut transport = builder.port(settings.port);
    if let Some((user, password)) = &settings.credentials {
        transport = transport.credentials(Credentials::new(
            user.clone(),
            password.expose_secret().to_owned(),
        ));
    }

    debug!(server = %settings.server, port = settings.port, "sending mail");
    transport.build().send(message).await.map_err(mail_err)?;
    info!(to = ?settings.to, "report mailed");
    Ok(())
}

fn send_syslog(target: &SyslogTarget, report: &Report) -> Result<(), CoreError> {
    let formatter = Formatter3164 {
        facility: Facility::LOG_USER,
        hostname: None,
        process: "cvpkit".into(),
        pid: std::process::id(),
    };

    let mut logger = match target {
        SyslogTarget::Unix(path) => syslog::unix_custom(formatter, path).map_err(syslog_err)?,
        SyslogTarget::Udp(server) => {
            syslog::udp(formatter, "0.0.0.0:0", server.as_str()).map_err(syslog_err)?
        }
    };

    for record in report.syslog_records() {
        logger.crit(&record).map_err(syslog_err)?;
    }
    debug!(?target, records = report.lines.len(), "syslog records sent");
    Ok(())
}
