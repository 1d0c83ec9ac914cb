use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use lettre::{
    message::{
        header::{ContentTransferEncoding, ContentType},
        Attachment, Body, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,
}

/// Sends the report to `recipient` in a single attempt. Every failure is
/// returned as an unsuccessful result carrying the underlying error text.
pub async fn dispatch(report: &Path, recipient: &str, smtp: &SmtpSettings) -> DispatchResult {
    let sent = match starttls_transport(smtp) {
        Ok(mailer) => send_report(&mailer, report, recipient, smtp, Local::now()).await,
        Err(error) => Err(error),
    };
    dispatch_result(report, recipient, sent)
}

fn dispatch_result(report: &Path, recipient: &str, sent: Result<()>) -> DispatchResult {
    match sent {
        Ok(()) => {
            tracing::info!(recipient, report = %report.display(), "report emailed");
            DispatchResult {
                success: true,
                message: "Email sent successfully!".to_string(),
            }
        }
        Err(error) => {
            tracing::warn!(recipient, error = %format!("{error:#}"), "email dispatch failed");
            DispatchResult {
                success: false,
                message: format!("Failed to send email: {error:#}"),
            }
        }
    }
}

fn credentials(smtp: &SmtpSettings) -> Result<(&str, &str)> {
    let sender = smtp
        .sender_email
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow!("sender email is not configured"))?;
    let password = smtp
        .sender_password
        .as_deref()
        .ok_or_else(|| anyhow!("sender password is not configured"))?;
    Ok((sender, password))
}

/// No connection pool: each `send` opens and closes its own session.
fn starttls_transport(smtp: &SmtpSettings) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let (sender, password) = credentials(smtp)?;
    Ok(AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)
        .with_context(|| format!("configuring STARTTLS for {}", smtp.server))?
        .port(smtp.port)
        .credentials(Credentials::new(sender.to_string(), password.to_string()))
        .timeout(Some(SMTP_TIMEOUT))
        .build())
}

async fn send_report(
    mailer: &AsyncSmtpTransport<Tokio1Executor>,
    report: &Path,
    recipient: &str,
    smtp: &SmtpSettings,
    at: DateTime<Local>,
) -> Result<()> {
    let (sender, _) = credentials(smtp)?;
    let contents =
        fs::read(report).with_context(|| format!("reading report {}", report.display()))?;
    let file_name = report
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.html".to_string());

    let message = build_message(sender, recipient, &file_name, contents, at)?;
    mailer
        .send(message)
        .await
        .with_context(|| format!("delivering via {}:{}", smtp.server, smtp.port))?;
    Ok(())
}

pub fn build_message(
    sender: &str,
    recipient: &str,
    file_name: &str,
    contents: Vec<u8>,
    at: DateTime<Local>,
) -> Result<Message> {
    let from: Mailbox = sender
        .parse()
        .with_context(|| format!("invalid sender address {sender}"))?;
    let to: Mailbox = recipient
        .parse()
        .with_context(|| format!("invalid recipient address {recipient}"))?;
    let stamp = at.format("%Y-%m-%d %H:%M:%S");

    let body = format!(
        "Hello,\n\n\
         Please find attached the test execution report.\n\n\
         Summary:\n\
         - Report generated successfully\n\
         - Timestamp: {stamp}\n\n\
         Best regards,\n\
         Test Automation Team\n"
    );

    let attachment_body = Body::new_with_encoding(contents, ContentTransferEncoding::Base64)
        .map_err(|_| anyhow!("encoding attachment {file_name}"))?;
    let attachment = Attachment::new(file_name.to_string()).body(
        attachment_body,
        ContentType::parse("application/octet-stream")?,
    );

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(format!("Test Execution Report - {stamp}"))
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body))
                .singlepart(attachment),
        )?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;
    use tempfile::tempdir;
    use tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        net::TcpListener,
    };

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap()
    }

    fn smtp(port: u16) -> SmtpSettings {
        SmtpSettings {
            server: "127.0.0.1".to_string(),
            port,
            sender_email: Some("qa@example.com".to_string()),
            sender_password: Some("wrong-password".to_string()),
        }
    }

    #[test]
    fn message_attaches_report_as_base64() -> Result<()> {
        let message = build_message(
            "qa@example.com",
            "lead@example.com",
            "report_20240203_040506.html",
            b"<html></html>".to_vec(),
            at(),
        )?;
        let raw = String::from_utf8(message.formatted())?;

        assert!(raw.contains("Subject: Test Execution Report - 2024-02-03 04:05:06"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("Timestamp: 2024-02-03 04:05:06"));
        assert!(raw.contains("application/octet-stream"));
        assert!(raw.contains("Content-Transfer-Encoding: base64"));
        assert!(raw.contains("report_20240203_040506.html"));
        assert!(raw.contains("PGh0bWw+PC9odG1sPg=="));
        Ok(())
    }

    #[test]
    fn message_rejects_bad_addresses() {
        let err = build_message("qa@example.com", "nobody", "r.html", vec![], at()).unwrap_err();
        assert!(err.to_string().contains("invalid recipient address"));
    }

    #[tokio::test]
    async fn unreachable_server_is_reported_not_raised() -> Result<()> {
        let temp = tempdir()?;
        let report = temp.path().join("report.html");
        fs::write(&report, "<html></html>")?;

        let result = dispatch(&report, "lead@example.com", &smtp(1)).await;
        assert!(!result.success);
        assert!(result.message.starts_with("Failed to send email:"));
        assert!(result.message.contains("delivering via 127.0.0.1:1: "));
        let cause = result
            .message
            .split("delivering via 127.0.0.1:1: ")
            .nth(1)
            .unwrap_or_default();
        assert!(!cause.trim().is_empty());
        Ok(())
    }

    /// Plain-text SMTP server that rejects every AUTH attempt.
    async fn rejecting_server() -> Result<u16> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();
            if write.write_all(b"220 localhost ESMTP\r\n").await.is_err() {
                return;
            }
            while let Ok(Some(line)) = lines.next_line().await {
                let command = line.to_ascii_uppercase();
                let reply: &[u8] = if command.starts_with("EHLO") || command.starts_with("HELO") {
                    b"250-localhost\r\n250 AUTH PLAIN LOGIN\r\n"
                } else if command.starts_with("AUTH") {
                    b"535 5.7.8 Authentication credentials invalid\r\n"
                } else if command.starts_with("QUIT") {
                    let _ = write.write_all(b"221 bye\r\n").await;
                    return;
                } else {
                    b"250 OK\r\n"
                };
                if write.write_all(reply).await.is_err() {
                    return;
                }
            }
        });
        Ok(port)
    }

    #[tokio::test]
    async fn rejected_credentials_are_reported() -> Result<()> {
        let temp = tempdir()?;
        let report = temp.path().join("report.html");
        fs::write(&report, "<html></html>")?;
        let port = rejecting_server().await?;
        let settings = smtp(port);

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("127.0.0.1")
            .port(port)
            .credentials(Credentials::new(
                "qa@example.com".to_string(),
                "wrong-password".to_string(),
            ))
            .timeout(Some(Duration::from_secs(5)))
            .build();
        let sent = send_report(&mailer, &report, "lead@example.com", &settings, at()).await;
        let result = dispatch_result(&report, "lead@example.com", sent);

        assert!(!result.success);
        assert!(result
            .message
            .contains(&format!("delivering via 127.0.0.1:{port}")));
        assert!(result.message.contains("535"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_report_and_credentials_fail_cleanly() {
        let result = dispatch(Path::new("absent.html"), "lead@example.com", &smtp(587)).await;
        assert!(!result.success);
        assert!(result.message.contains("reading report"));

        let mut no_sender = smtp(587);
        no_sender.sender_email = None;
        let result = dispatch(Path::new("absent.html"), "lead@example.com", &no_sender).await;
        assert!(!result.success);
        assert!(result.message.contains("sender email is not configured"));
    }
}
