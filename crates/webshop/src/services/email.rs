//! Email service for discount files, order notifications and error reports.
//!
//! Uses SMTP via lettre for delivery with Askama templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{
        Attachment, Mailbox, MultiPart, SinglePart,
        header::{ContentType, ContentTypeErr},
    },
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use wtg_core::{Email, FileType, Login, OrderId};

use crate::config::EmailConfig;
use crate::error::ErrorReport;
use crate::models::{Address, OrderLine};

/// Subject of the error report mail.
pub const ERROR_REPORT_SUBJECT: &str = "[WTG Webshop] Whoops, looks like something went wrong";

#[derive(Template)]
#[template(path = "email/discountfile.txt")]
struct DiscountFileEmailText<'a> {
    company: &'a str,
    label: &'a str,
}

#[derive(Template)]
#[template(path = "email/discountfile.html")]
struct DiscountFileEmailHtml<'a> {
    company: &'a str,
    label: &'a str,
}

#[derive(Template)]
#[template(path = "email/order.txt")]
struct OrderEmailText<'a> {
    order: &'a OrderMail<'a>,
}

#[derive(Template)]
#[template(path = "email/order.html")]
struct OrderEmailHtml<'a> {
    order: &'a OrderMail<'a>,
}

#[derive(Template)]
#[template(path = "email/error_report.txt")]
struct ErrorReportEmailText<'a> {
    report: &'a ErrorReport,
    request: &'a str,
    login: &'a str,
}

/// A placed order as it is mailed to the shop.
#[derive(Debug)]
pub struct OrderMail<'a> {
    pub id: OrderId,
    pub login: &'a Login,
    pub company: &'a str,
    pub lines: &'a [OrderLine],
    pub address: Option<&'a Address>,
    pub comment: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Attachment content type could not be parsed.
    #[error("Invalid content type: {0}")]
    ContentType(#[from] ContentTypeErr),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a discount file as attachment.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_discount_file(
        &self,
        to: &Email,
        company: &str,
        file_type: FileType,
        file_name: String,
        content: Vec<u8>,
    ) -> Result<(), EmailError> {
        let label = file_type.label();
        let text = DiscountFileEmailText { company, label }.render()?;
        let html = DiscountFileEmailHtml { company, label }.render()?;

        let attachment = Attachment::new(file_name)
            .body(content, ContentType::parse(file_type.content_type())?);

        let body = MultiPart::mixed()
            .multipart(alternative(text, html))
            .singlepart(attachment);

        self.send(
            to.as_str(),
            &format!("WTG Webshop {label} kortingen"),
            body,
        )
        .await
    }

    /// Send a placed order to the sales mailbox.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order(&self, to: &str, order: &OrderMail<'_>) -> Result<(), EmailError> {
        let text = OrderEmailText { order }.render()?;
        let html = OrderEmailHtml { order }.render()?;

        self.send(
            to,
            &format!("Webshop order {} van {}", order.id, order.login),
            alternative(text, html),
        )
        .await
    }

    /// Send a server error report to the maintainer.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_error_report(
        &self,
        to: &str,
        report: &ErrorReport,
        request: &str,
        login: Option<&str>,
    ) -> Result<(), EmailError> {
        let text = ErrorReportEmailText {
            report,
            request,
            login: login.unwrap_or("-"),
        }
        .render()?;

        let email = self
            .builder(to)?
            .subject(ERROR_REPORT_SUBJECT)
            .singlepart(SinglePart::plain(text))?;

        self.mailer.send(email).await?;
        tracing::info!(to = %to, "Error report sent");
        Ok(())
    }

    fn builder(&self, to: &str) -> Result<lettre::message::MessageBuilder, EmailError> {
        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?;
        let to: Mailbox = to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(to.to_string()))?;

        Ok(Message::builder().from(from).to(to))
    }

    async fn send(&self, to: &str, subject: &str, body: MultiPart) -> Result<(), EmailError> {
        let email = self.builder(to)?.subject(subject).multipart(body)?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Plain text and HTML versions of the same message.
fn alternative(text_body: String, html_body: String) -> MultiPart {
    MultiPart::alternative()
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(text_body),
        )
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(html_body),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Severity;

    #[test]
    fn test_discount_file_text_mentions_format() {
        let text = DiscountFileEmailText {
            company: "Installatiebedrijf De Vries",
            label: "ICC",
        }
        .render()
        .unwrap();
        assert!(text.contains("Installatiebedrijf De Vries"));
        assert!(text.contains("ICC"));
    }

    #[test]
    fn test_order_text_lists_lines() {
        let login = Login::parse("13370").unwrap();
        let lines = vec![OrderLine {
            product: wtg_core::ProductNumber::parse("1234567").unwrap(),
            name: "Knelkoppeling 15mm".to_string(),
            quantity: 4,
        }];
        let order = OrderMail {
            id: OrderId::new(42),
            login: &login,
            company: "Loodgieter Jansen",
            lines: &lines,
            address: None,
            comment: "",
        };

        let text = OrderEmailText { order: &order }.render().unwrap();
        assert!(text.contains("1234567"));
        assert!(text.contains("Knelkoppeling 15mm"));
        assert!(text.contains("13370"));
    }

    #[test]
    fn test_error_report_text() {
        let report = ErrorReport {
            kind: "Database",
            message: "pool timed out".to_string(),
            severity: Severity::Server,
        };
        let text = ErrorReportEmailText {
            report: &report,
            request: "GET /account",
            login: "13370",
        }
        .render()
        .unwrap();
        assert!(text.contains("Database"));
        assert!(text.contains("pool timed out"));
        assert!(text.contains("GET /account"));
    }
}
