//! `@bot echo <text>` replies with `<text>`.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use karma_framework::{Handler, MessageContext, Outcome};

/// Handler name used in configuration and logs.
pub const NAME: &str = "echo";

static ECHO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*echo\s+(.+)$").expect("static regex"));

/// Echoes text back when addressed to the bot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

impl Echo {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for Echo {
    fn name(&self) -> &str {
        NAME
    }

    async fn handle(&self, ctx: Arc<MessageContext>) -> Outcome {
        let request = ctx.request();
        if !request.to_own_user() {
            return Outcome::Continue;
        }
        let Some(text) = ECHO_PATTERN
            .captures(request.message())
            .and_then(|caps| caps.get(1))
        else {
            return Outcome::Continue;
        };

        ctx.respond(text.as_str()).await;
        Outcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karma_core::{RecordingTransport, User};
    use karma_framework::{Request, Response};

    fn ctx(message: &str, to_own_user: bool, transport: Arc<RecordingTransport>) -> Arc<MessageContext> {
        let user = User {
            id: 1,
            jid: "1_1@chat.example.com".into(),
            display_name: "Alice Liddell".into(),
            mention_name: "alice".into(),
        };
        let request = Request::new("lobby", message, message, user, None, to_own_user);
        Arc::new(MessageContext::new(request, Response::new("lobby", transport)))
    }

    #[tokio::test]
    async fn test_echo_to_bot() {
        let transport = Arc::new(RecordingTransport::new());
        let outcome = Echo.handle(ctx("ECHO hello  world", true, transport.clone())).await;
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(transport.texts(), vec!["hello  world".to_string()]);
    }

    #[tokio::test]
    async fn test_not_addressed_or_no_keyword_continues() {
        let transport = Arc::new(RecordingTransport::new());
        assert_eq!(
            Echo.handle(ctx("echo hi", false, transport.clone())).await,
            Outcome::Continue
        );
        assert_eq!(
            Echo.handle(ctx("echoes of the past", true, transport.clone())).await,
            Outcome::Continue
        );
        assert!(transport.sent().is_empty());
    }
}
