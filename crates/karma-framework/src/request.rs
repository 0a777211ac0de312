//! Per-message request resolution.
//!
//! A [`Request`] is built once per inbound message and never mutated after:
//! the sender lookup and the optional mention lookup each produce their own
//! value, and the request is assembled only after both have finished.

use std::sync::{Arc, LazyLock};

use futures::future::try_join;
use regex::Regex;
use tracing::trace;

use karma_core::{Directory, InboundMessage, User};

use crate::error::IdentityError;

/// A leading `@name` followed by the rest of the message.
static MENTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*@((?-u:\w)+)\s+(.+)$").expect("static regex"));

/// The resolved view of one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    channel: String,
    raw_message: String,
    message: String,
    from_user: User,
    to_user: Option<User>,
    to_own_user: bool,
}

impl Request {
    pub fn new(
        channel: impl Into<String>,
        raw_message: impl Into<String>,
        message: impl Into<String>,
        from_user: User,
        to_user: Option<User>,
        to_own_user: bool,
    ) -> Self {
        Self {
            channel: channel.into(),
            raw_message: raw_message.into(),
            message: message.into(),
            from_user,
            to_user,
            to_own_user,
        }
    }

    /// The channel the message arrived in.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The message exactly as received.
    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }

    /// The message with any leading `@mention` removed.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn from_user(&self) -> &User {
        &self.from_user
    }

    /// The user named by a leading `@mention`, if it resolved.
    pub fn to_user(&self) -> Option<&User> {
        self.to_user.as_ref()
    }

    /// Whether the leading `@mention` addressed the bot itself.
    pub fn to_own_user(&self) -> bool {
        self.to_own_user
    }
}

/// Resolves inbound messages into [`Request`]s.
#[derive(Clone)]
pub struct RequestBuilder {
    directory: Arc<dyn Directory>,
    own_user_id: i64,
}

impl RequestBuilder {
    /// `own_user_id` is the bot's own directory id, fixed for the lifetime of
    /// the builder.
    pub fn new(directory: Arc<dyn Directory>, own_user_id: i64) -> Self {
        Self {
            directory,
            own_user_id,
        }
    }

    pub fn own_user_id(&self) -> i64 {
        self.own_user_id
    }

    /// Looks up the sender and the mention target concurrently and builds the
    /// request once both lookups have finished.
    ///
    /// Fails if either lookup errors or if the sender is unknown. A mention
    /// that names nobody is not an error: the message is still stripped of
    /// the mention and `to_user` is `None`.
    pub async fn build(&self, inbound: &InboundMessage) -> Result<Request, IdentityError> {
        let mention = split_mention(&inbound.text);

        let sender = self.directory.find_by_display_name(&inbound.from);
        let target = async {
            match mention {
                Some((name, _)) => self.directory.find_by_mention_name(name).await,
                None => Ok(None),
            }
        };

        let (from_user, to_user) = try_join(sender, target).await?;
        let from_user = from_user.ok_or_else(|| IdentityError::UnknownSender {
            name: inbound.from.clone(),
        })?;

        let message = match mention {
            Some((_, rest)) => rest.to_string(),
            None => inbound.text.clone(),
        };
        let to_own_user = to_user
            .as_ref()
            .is_some_and(|user| user.id == self.own_user_id);

        trace!(
            from = from_user.id,
            to = ?to_user.as_ref().map(|u| u.id),
            to_own_user,
            "Request resolved"
        );

        Ok(Request {
            channel: inbound.channel.clone(),
            raw_message: inbound.text.clone(),
            message,
            from_user,
            to_user,
            to_own_user,
        })
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("own_user_id", &self.own_user_id)
            .finish_non_exhaustive()
    }
}

/// Splits `"@name rest"` into `("name", "rest")`.
fn split_mention(text: &str) -> Option<(&str, &str)> {
    let caps = MENTION_PATTERN.captures(text)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}
