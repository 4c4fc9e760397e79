//! Shared types and the queue engine for the pear-remote daemon.
//!
//! `normalize` turns whatever JSON the player backend returns into
//! [`normalize::CanonicalTrack`] records, `queue` decides which of them is
//! playing and whether the published view needs to change.

pub mod config;
pub mod links;
pub mod normalize;
pub mod platform;
pub mod protocol;
pub mod queue;
pub mod state;
