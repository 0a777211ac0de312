//! The `++` / `--` reputation handler.
//!
//! A message like `bob++` or `--@alice` runs through a strict pipeline; the
//! first step that fails ends it and its error text is the reply:
//!
//! 1. ensure the sender has a score row
//! 2. claim the sender's award slot, or reply with a throttle message
//! 3. resolve the target name through the fuzzy [`resolver`]
//! 4. refuse self-awards
//! 5. apply the delta through the [`ledger`] and read the new score back
//! 6. reply with a random bump or diss
//!
//! Messages without a token, or with both `++` and `--`, are passed on to
//! the next handler untouched.

pub mod ledger;
pub mod messages;
pub mod parser;
pub mod resolver;
pub mod throttle;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use karma_core::{Clock, Directory, RandomPicker, ScoreStore, SystemClock, TemplatePicker, User};
use karma_framework::{Handler, MessageContext, Outcome};

use crate::error::{AwardError, AwardResult};

pub use parser::{AwardParse, has_award_token, parse_award_command};
pub use throttle::{THROTTLE_LIMIT, ThrottleGate};

/// Handler name used in configuration and logs.
pub const NAME: &str = "plusplus";

/// The award handler.
pub struct PlusPlus {
    directory: Arc<dyn Directory>,
    scores: Arc<dyn ScoreStore>,
    clock: Arc<dyn Clock>,
    picker: Arc<dyn TemplatePicker>,
    gate: ThrottleGate,
}

impl PlusPlus {
    /// Creates the handler with the system clock, a random template picker
    /// and the default [`THROTTLE_LIMIT`].
    pub fn new(directory: Arc<dyn Directory>, scores: Arc<dyn ScoreStore>) -> Self {
        Self {
            directory,
            scores,
            clock: Arc::new(SystemClock),
            picker: Arc::new(RandomPicker::new()),
            gate: ThrottleGate::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_picker(mut self, picker: Arc<dyn TemplatePicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn with_throttle_secs(mut self, secs: i64) -> Self {
        self.gate = ThrottleGate::new(secs);
        self
    }

    pub fn throttle_secs(&self) -> i64 {
        self.gate.window_secs()
    }

    /// Runs the award pipeline and returns the success reply.
    pub async fn process_award(&self, from: &User, to_name: &str, delta: i64) -> AwardResult<String> {
        self.scores.ensure_record(from.id).await?;
        self.gate
            .admit(self.scores.as_ref(), from.id, self.clock.now_epoch())
            .await?;

        let target = resolver::resolve_user(self.directory.as_ref(), to_name).await?;
        if target.id == from.id {
            return Err(AwardError::SelfAward {
                mention_name: from.mention_name.clone(),
                action: messages::self_award_action(delta),
            });
        }

        let score = ledger::apply_award(self.scores.as_ref(), target.id, delta).await?;
        info!(from = from.id, to = target.id, delta, score, "Award applied");

        Ok(messages::award_reply(
            self.picker.as_ref(),
            delta,
            &target.mention_name,
            score,
        ))
    }
}

#[async_trait]
impl Handler for PlusPlus {
    fn name(&self) -> &str {
        NAME
    }

    async fn handle(&self, ctx: Arc<MessageContext>) -> Outcome {
        let text = ctx.request().raw_message();
        if !has_award_token(text) {
            return Outcome::Continue;
        }

        let (to_name, delta) = match parse_award_command(text) {
            AwardParse::Command { to_name, delta } => (to_name, delta),
            AwardParse::Ambiguous => {
                debug!("Both ++ and -- present, ignoring");
                return Outcome::Continue;
            }
            AwardParse::None => return Outcome::Continue,
        };

        let reply = match self
            .process_award(ctx.request().from_user(), &to_name, delta)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                debug!(to_name = %to_name, error = %e, "Award rejected");
                e.to_string()
            }
        };
        ctx.respond(&reply).await;
        Outcome::Handled
    }
}

impl std::fmt::Debug for PlusPlus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlusPlus")
            .field("throttle_secs", &self.gate.window_secs())
            .finish_non_exhaustive()
    }
}
