//! `[mail]` section configuration.
//!
//! Settings for contact-form mail delivery. Messages are handed to a
//! sendmail-compatible command rather than spoken over SMTP directly, so
//! the only hard requirement is that the configured command exists.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[mail]` section in folio.toml - contact form delivery.
///
/// # Example
/// ```toml
/// [mail]
/// enable = true
/// to = "emil@example.com"
/// command = ["sendmail", "-t"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// Enable the contact form endpoint.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Destination address for contact form submissions.
    /// Required when `enable = true`.
    #[serde(default)]
    pub to: String,

    /// Sendmail-compatible delivery command. The composed message is
    /// written to its stdin; `-t` makes sendmail take recipients from
    /// the message headers.
    #[serde(default = "defaults::mail::command")]
    #[educe(Default = defaults::mail::command())]
    pub command: Vec<String>,

    /// Subject line for contact form messages.
    #[serde(default = "defaults::mail::subject")]
    #[educe(Default = defaults::mail::subject())]
    pub subject: String,
}
