//! Catch-all remark for messages addressed to the bot that nothing else
//! handled. Register it last.

use std::sync::Arc;

use async_trait::async_trait;

use karma_core::{RandomPicker, TemplatePicker, choose};
use karma_framework::{Handler, MessageContext, Outcome};

/// Handler name used in configuration and logs.
pub const NAME: &str = "snark";

const REMARKS: [&str; 7] = [
    "that's so creative of you.",
    "you have such a way with words.",
    "you must really really like me!",
    "I'm not sure if I should dignify that with a response.",
    "I wuv you too.",
    "that just warms my the cockles of my CPU.",
    "do you need a time out?",
];

pub struct Snark {
    picker: Arc<dyn TemplatePicker>,
}

impl Snark {
    pub fn new() -> Self {
        Self {
            picker: Arc::new(RandomPicker::new()),
        }
    }

    pub fn with_picker(picker: Arc<dyn TemplatePicker>) -> Self {
        Self { picker }
    }
}

impl Default for Snark {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for Snark {
    fn name(&self) -> &str {
        NAME
    }

    async fn handle(&self, ctx: Arc<MessageContext>) -> Outcome {
        if !ctx.request().to_own_user() {
            return Outcome::Continue;
        }
        let remark = choose(self.picker.as_ref(), &REMARKS).copied().unwrap_or_default();
        let reply = format!("@{}, {remark}", ctx.request().from_user().mention_name);
        ctx.respond(&reply).await;
        Outcome::Handled
    }
}

impl std::fmt::Debug for Snark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snark").finish_non_exhaustive()
    }
}
