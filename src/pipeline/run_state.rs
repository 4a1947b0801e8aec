// src/pipeline/run_state.rs

//! Artist-run boundary detection.
//!
//! An artist run is a maximal contiguous stretch of page URLs sharing one
//! artist id. Metadata is saved once per run, when the run ends: either the
//! next page belongs to another artist or the list is exhausted.
//!
//! ```text
//!            observe(a)              observe(b != a) -> Finished(a)
//! NoArtist ─────────────> InRun(a) ───────────────────────────────> InRun(b)
//!                            │
//!                            │ finish() -> Finished(a)
//!                            v
//!                         RunEnded
//! ```

use std::collections::HashSet;

/// Position of the iterator relative to artist runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    NoArtist,
    InRun {
        artist_id: String,
        last_url: String,
    },
    RunEnded,
}

/// A run that just ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRun {
    pub artist_id: String,
    /// Last page URL of the run, handed to the metadata save
    pub last_url: String,
}

/// Tracks artist runs and the usernames seen so far.
#[derive(Debug, Default)]
pub struct ArtistRunState {
    state: RunState,
    processed_usernames: HashSet<String>,
    current_artist_url: Option<String>,
}

impl ArtistRunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Record a processed page. Returns the previous run if this page
    /// starts a new one.
    pub fn observe(&mut self, artist_id: &str, url: &str) -> Option<FinishedRun> {
        let next = RunState::InRun {
            artist_id: artist_id.to_string(),
            last_url: url.to_string(),
        };

        match std::mem::replace(&mut self.state, next) {
            RunState::InRun {
                artist_id: previous,
                last_url,
            } if previous != artist_id => Some(FinishedRun {
                artist_id: previous,
                last_url,
            }),
            _ => None,
        }
    }

    /// End of the URL list. Returns the open run, if any.
    pub fn finish(&mut self) -> Option<FinishedRun> {
        match std::mem::replace(&mut self.state, RunState::RunEnded) {
            RunState::InRun {
                artist_id,
                last_url,
            } => Some(FinishedRun {
                artist_id,
                last_url,
            }),
            _ => None,
        }
    }

    /// Remember a username. The first sighting makes `url` the current
    /// artist URL; returns whether it was new.
    pub fn track_username(&mut self, username: &str, url: &str) -> bool {
        let first = self.processed_usernames.insert(username.to_string());
        if first {
            self.current_artist_url = Some(url.to_string());
        }
        first
    }

    /// First URL of the most recently seen username.
    pub fn current_artist_url(&self) -> Option<&str> {
        self.current_artist_url.as_deref()
    }
}

/// Every run in a sequence of `(artist_id, url)` pages, in order.
pub fn finished_runs<'a, I>(pages: I) -> Vec<FinishedRun>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let (mut state, mut runs) = pages.into_iter().fold(
        (ArtistRunState::new(), Vec::new()),
        |(mut state, mut runs), (artist_id, url)| {
            runs.extend(state.observe(artist_id, url));
            (state, runs)
        },
    );
    runs.extend(state.finish());
    runs
}
