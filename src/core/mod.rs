//! Framework-agnostic game logic.
//!
//! Nothing here depends on Discord; the bot layer renders what these modules compute.

/// Account key registration and summaries
pub mod account;
/// Build template decoding and encoding
pub mod build;
/// Chat link codec
pub mod chatcode;
/// Static game data documents and lookups
pub mod gamedata;
/// Home instance cats and nodes
pub mod home;
/// Item search across account storage
pub mod inventory;
/// Kill proof evaluation
pub mod progress;
/// Weekly raid progress
pub mod raids;
/// Text rendering of results
pub mod report;
/// Game data synchronization from the API
pub mod sync;
/// Raid trophy totals
pub mod trophies;
/// World vs World statistics
pub mod wvw;
