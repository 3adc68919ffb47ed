//! Emailing finished receipts to the client.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, Message, SmtpTransport, Transport};
use thiserror::Error;

use crate::domain::types::ReceiptNumber;
use crate::models::config::SmtpConfig;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("cannot build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("invalid content type: {0}")]
    ContentType(String),

    #[error("cannot read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Delivers a rendered receipt to a recipient.
pub trait ReceiptNotifier: Send + Sync {
    fn send_receipt(
        &self,
        to: &str,
        document: &Path,
        number: ReceiptNumber,
    ) -> Result<(), NotifyError>;
}

#[cfg(any(test, feature = "test-mocks"))]
mockall::mock! {
    pub Notifier {}

    impl ReceiptNotifier for Notifier {
        fn send_receipt(
            &self,
            to: &str,
            document: &Path,
            number: ReceiptNumber,
        ) -> Result<(), NotifyError>;
    }
}

pub fn receipt_subject(number: ReceiptNumber, timestamp: &str) -> String {
    format!("Boleta de Servicio N° {number} - {timestamp}")
}

pub fn receipt_body(number: ReceiptNumber, timestamp: &str) -> String {
    format!("Adjunto encontrarás la boleta número {number} generada el {timestamp}")
}

/// Sender identity and optional blind copy for outgoing receipts.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub from: Mailbox,
    pub bcc: Option<Mailbox>,
}

impl Envelope {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let address: Address = config
            .from_address
            .as_deref()
            .unwrap_or(&config.username)
            .parse()?;
        let bcc = match config.bcc.as_deref().map(str::trim) {
            Some(bcc) if !bcc.is_empty() => Some(Mailbox::new(None, bcc.parse()?)),
            _ => None,
        };
        Ok(Self {
            from: Mailbox::new(Some(config.from_name.clone()), address),
            bcc,
        })
    }
}

/// Assembles the receipt email with the PDF attached.
pub fn compose_receipt_email(
    envelope: &Envelope,
    to: &str,
    number: ReceiptNumber,
    pdf: Vec<u8>,
    timestamp: &str,
) -> Result<Message, NotifyError> {
    let recipient: Address = to.trim().parse()?;
    let pdf_type = ContentType::parse("application/pdf")
        .map_err(|e| NotifyError::ContentType(e.to_string()))?;

    let mut builder = Message::builder()
        .from(envelope.from.clone())
        .to(Mailbox::new(None, recipient))
        .subject(receipt_subject(number, timestamp));
    if let Some(bcc) = &envelope.bcc {
        builder = builder.bcc(bcc.clone());
    }

    let message = builder.multipart(
        MultiPart::mixed()
            .singlepart(SinglePart::plain(receipt_body(number, timestamp)))
            .singlepart(Attachment::new(number.document_name()).body(pdf, pdf_type)),
    )?;
    Ok(message)
}

/// Blocking SMTP delivery. Call from a blocking context.
pub struct SmtpNotifier {
    transport: SmtpTransport,
    envelope: Envelope,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let tls_parameters = TlsParameters::builder(config.host.clone())
            .dangerous_accept_invalid_certs(config.accept_invalid_certs)
            .build_rustls()?;
        let tls = if config.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder = SmtpTransport::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            envelope: Envelope::from_config(config)?,
        })
    }
}

impl ReceiptNotifier for SmtpNotifier {
    fn send_receipt(
        &self,
        to: &str,
        document: &Path,
        number: ReceiptNumber,
    ) -> Result<(), NotifyError> {
        let pdf = fs::read(document).map_err(|source| NotifyError::Attachment {
            path: document.to_path_buf(),
            source,
        })?;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let message = compose_receipt_email(&self.envelope, to, number, pdf, &timestamp)?;

        self.transport.send(&message)?;
        log::info!("Receipt {number} emailed to {to}");
        Ok(())
    }
}
