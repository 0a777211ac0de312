//! Reply templates.

use karma_core::{TemplatePicker, choose};

/// Escalating replies for throttled attempts, indexed by the attempt count.
pub const THROTTLE_MESSAGES: [&str; 3] = [
    "Sorry, you're trying to award too fast.",
    "Seriously, slow your roll.",
    "Now you're just embarassing yourself.",
];

const BUMPS: [&str; 10] = [
    "w00t!",
    "nice!",
    "suh-weet!",
    "well played!",
    "zing!",
    "you go girl!",
    "booyakasha!",
    "heyoooo!",
    "sweet!",
    "fist bump!",
];

const DISSES: [&str; 9] = [
    "ouch!",
    "daaaang!",
    "denied!",
    "ooooh!",
    "owie!",
    "awwww snap!",
    "ya dun goofed!",
    "boom!",
    "oh no you did not!",
];

/// The throttle reply for the attempt that had seen `tries` earlier
/// throttled attempts.
pub fn throttle_message(tries: u32) -> &'static str {
    THROTTLE_MESSAGES[tries as usize % THROTTLE_MESSAGES.len()]
}

/// The self-award verb phrase for a delta sign.
pub fn self_award_action(delta: i64) -> &'static str {
    if delta > 0 {
        "award yourself"
    } else {
        "decrement your own"
    }
}

/// A success reply: a random exclamation, then the target and new score.
pub fn award_reply(picker: &dyn TemplatePicker, delta: i64, mention_name: &str, score: i64) -> String {
    let pool: &[&str] = if delta > 0 { &BUMPS } else { &DISSES };
    let exclamation = choose(picker, pool).copied().unwrap_or_default();
    format!("{exclamation} @{mention_name} now at {score}!")
}
