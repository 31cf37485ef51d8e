//! SMTP transport via lettre.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;
use uuid::Uuid;

use super::{Mailer, MessageId, OutgoingEmail, SendError};
use crate::config::SmtpConfig;

/// Sends mail through an authenticated STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create a new SMTP mailer from configuration.
    ///
    /// No connection is made until the first message is sent.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid or `from_address` does not
    /// parse.
    pub fn new(config: &SmtpConfig, from_address: &str) -> Result<Self, SendError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from: parse_mailbox(from_address)?,
        })
    }

    fn build_message(&self, email: OutgoingEmail) -> Result<(Message, MessageId), SendError> {
        if email.to.is_empty() {
            return Err(SendError::NoRecipients);
        }
        if email.scheduled_at.is_some() {
            return Err(SendError::Unsupported("scheduled delivery"));
        }

        let message_id = MessageId(format!(
            "<{}@{}>",
            Uuid::new_v4(),
            self.from.email.domain()
        ));

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject)
            .message_id(Some(message_id.0.clone()));
        for to in &email.to {
            builder = builder.to(parse_mailbox(to)?);
        }
        for bcc in &email.bcc {
            builder = builder.bcc(parse_mailbox(bcc)?);
        }

        let message = match email.text {
            Some(text) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html),
                    ),
            )?,
            None => builder.header(ContentType::TEXT_HTML).body(email.html)?,
        };

        Ok((message, message_id))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<MessageId, SendError> {
        let subject = email.subject.clone();
        let (message, message_id) = self.build_message(email)?;

        self.transport.send(message).await?;

        tracing::info!(subject = %subject, message_id = %message_id, "Email sent via SMTP");
        Ok(message_id)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, SendError> {
    address
        .parse()
        .map_err(|_| SendError::InvalidAddress(address.to_string()))
}
