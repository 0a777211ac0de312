//! # Karma Plugins
//!
//! The handlers a karma bot ships with, in their usual chain order:
//!
//! | Handler | Name | Consumes |
//! |---------|------|----------|
//! | [`PlusPlus`] | `plusplus` | `name++` / `name--` award commands |
//! | [`Echo`] | `echo` | `@bot echo <text>` |
//! | [`Snark`] | `snark` | anything else addressed to the bot; keep it last |
//!
//! Every handler implements [`karma_framework::Handler`] and can be
//! registered on a [`karma_framework::Dispatcher`] directly.

pub mod echo;
pub mod error;
pub mod plusplus;
pub mod snark;

pub use echo::Echo;
pub use error::{AwardError, AwardResult};
pub use plusplus::{AwardParse, PlusPlus, THROTTLE_LIMIT, parse_award_command};
pub use snark::Snark;

/// Names of the built-in handlers, in default chain order.
pub const BUILTIN_HANDLERS: [&str; 3] = [plusplus::NAME, echo::NAME, snark::NAME];
