//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Account commands: keys, overview, item search and progress
pub mod account;

/// Build template and chat link commands
pub mod build;

/// General utility commands
pub mod general;

/// Skill and trait lookup commands
pub mod skills;

/// World vs World commands
pub mod wvw;

pub use account::*;
pub use build::*;
pub use general::*;
pub use skills::*;
pub use wvw::*;

use crate::{bot::BotData, errors::Error};

/// Every command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        build(),
        character_build(),
        link(),
        skill(),
        trait_info(),
        account(),
        key_add(),
        key_remove(),
        search(),
        kp(),
        li(),
        bosses(),
        cats(),
        nodes(),
        wvw_info(),
        wvw_worlds(),
    ]
}
