use escola_config::EmailConfig;
use escola_core::AppError;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::instrument;

/// Sends account mail over SMTP.
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    #[instrument(skip(self, temporary_password))]
    pub async fn send_credentials_email(
        &self,
        to_email: &str,
        to_name: &str,
        username: &str,
        temporary_password: &str,
    ) -> Result<(), AppError> {
        let login_url = self.config.login_url();
        let html_body = self.account_template(
            "Welcome to Escola",
            to_name,
            "An account has been created for you.",
            username,
            temporary_password,
            &login_url,
        );
        let text_body = format!(
            "Hi {to_name},\n\n\
             An account has been created for you.\n\n\
             Username: {username}\n\
             Temporary password: {temporary_password}\n\n\
             Sign in at {login_url}. You will be asked to choose a new password.\n\n\
             Best regards,\n\
             {}",
            self.config.from_name
        );

        self.send_email(to_email, "Your Escola account", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, temporary_password))]
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        username: &str,
        temporary_password: &str,
    ) -> Result<(), AppError> {
        let login_url = self.config.login_url();
        let html_body = self.account_template(
            "Password reset",
            to_name,
            "Your password has been reset.",
            username,
            temporary_password,
            &login_url,
        );
        let text_body = format!(
            "Hi {to_name},\n\n\
             Your password has been reset.\n\n\
             Username: {username}\n\
             Temporary password: {temporary_password}\n\n\
             Sign in at {login_url} and choose a new password.\n\
             If you did not request this, contact your school office.\n\n\
             Best regards,\n\
             {}",
            self.config.from_name
        );

        self.send_email(to_email, "Your Escola password was reset", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, html_body, text_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {e}")))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {e}")))?;

        let mailer = if self.config.has_credentials() {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| AppError::internal_error(format!("Failed to create SMTP relay: {e}")))?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {e}")))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {e}")))?;

        Ok(())
    }

    fn account_template(
        &self,
        title: &str,
        name: &str,
        intro: &str,
        username: &str,
        temporary_password: &str,
        login_url: &str,
    ) -> String {
        let brand = &self.config.from_name;
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f4f4f4; padding: 20px;">
        <tr>
            <td align="center">
                <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden;">
                    <tr>
                        <td style="background-color: #0F766E; padding: 30px; text-align: center;">
                            <h1 style="margin: 0; color: #ffffff; font-size: 28px;">{brand}</h1>
                        </td>
                    </tr>
                    <tr>
                        <td style="padding: 40px 30px;">
                            <h2 style="margin: 0 0 20px 0; color: #333333; font-size: 22px;">{title}</h2>
                            <p style="margin: 0 0 16px 0; color: #666666; font-size: 16px;">Hi {name},</p>
                            <p style="margin: 0 0 24px 0; color: #666666; font-size: 16px;">{intro}</p>
                            <table cellpadding="8" cellspacing="0" style="margin: 0 0 24px 0; background-color: #f9fafb; border-radius: 6px;">
                                <tr><td style="color: #333333;">Username</td><td style="font-family: monospace;">{username}</td></tr>
                                <tr><td style="color: #333333;">Temporary password</td><td style="font-family: monospace;">{temporary_password}</td></tr>
                            </table>
                            <p style="margin: 0 0 24px 0; text-align: center;">
                                <a href="{login_url}" style="display: inline-block; padding: 14px 32px; background-color: #0F766E; color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: bold;">Sign in</a>
                            </p>
                            <p style="margin: 0; color: #999999; font-size: 14px;">You will be asked to choose a new password after signing in.</p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#
        )
    }
}
