//! Pipeline entry points.
//!
//! - `Mirror`: the artist/post iterator over a list of page URLs
//! - `run_favorites`: mirror the cached favorites of one or both sites
//! - `run_user` / `run_user_file`: mirror creators looked up by username

pub mod favorites;
pub mod mirror;
pub mod run_state;
pub mod users;

pub use favorites::run_favorites;
pub use mirror::{Mirror, RunSummary};
pub use run_state::{ArtistRunState, FinishedRun, RunState, finished_runs};
pub use users::{read_usernames, run_user, run_user_file};
