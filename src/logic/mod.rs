//! Tournament business logic: bracket construction, advancement, edits.

mod advancement;
mod builder;
mod edit;

pub use advancement::declare_winner;
pub use builder::create_tournament;
pub use edit::reopen_match;
