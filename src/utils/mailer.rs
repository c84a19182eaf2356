// src/utils/mailer.rs

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use crate::{config::Config, error::AppError};

/// Outgoing email collaborator.
///
/// With SMTP configured, verification codes go out as real mail. Without it
/// (local development, CI) the code is logged at info level instead so the
/// flow stays testable end to end.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let Some(host) = &config.smtp_host else {
            return Ok(Self {
                transport: None,
                from: None,
            });
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| AppError::InternalServerError(format!("Invalid SMTP host: {}", e)))?;

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config
            .smtp_from
            .as_deref()
            .unwrap_or("Math Club <no-reply@mathclub.local>")
            .parse::<Mailbox>()
            .map_err(|e| AppError::InternalServerError(format!("Invalid SMTP_FROM: {}", e)))?;

        Ok(Self {
            transport: Some(builder.build()),
            from: Some(from),
        })
    }

    /// Sends the email verification code to a freshly registered user.
    pub async fn send_verification_code(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        code: &str,
    ) -> Result<(), AppError> {
        let Some(transport) = &self.transport else {
            tracing::info!(
                "SMTP disabled; verification code for {}: {}",
                recipient_email,
                code
            );
            return Ok(());
        };

        let to = format!("{} <{}>", recipient_name, recipient_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {}", e)))?;

        let from = self
            .from
            .clone()
            .ok_or_else(|| AppError::InternalServerError("SMTP sender not configured".into()))?;

        let body = format!(
            "Hello {},\n\nYour verification code is: {}\n\nIt expires in 15 minutes.\n",
            recipient_name, code
        );

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject("Math Club email verification")
            .body(body)
            .map_err(|e| AppError::InternalServerError(format!("Failed to build email: {}", e)))?;

        transport
            .send(email)
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
