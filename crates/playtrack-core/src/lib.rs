//! playtrack-core: pure tracking logic.
//! Data model, URL matching, flush decisions, and wire protocol types.
//! No IO, no async runtime; every time-dependent function takes `now`.

pub mod matcher;
pub mod protocol;
pub mod session;
pub mod types;

pub use matcher::{match_mapping, normalize};
pub use protocol::{
    AddGameRequest, AddGameResponse, GetMappingRequest, TabFocusParams, TrackTimeRequest,
    TrackTimeResponse,
};
pub use session::{
    ActiveSession, DWELL_MIN_ELAPSED_MS, FLUSH_MIN_ELAPSED_MS, FlushDecision,
    PERIODIC_FLUSH_INTERVAL_SECS, REPORTER_FLUSH_INTERVAL_SECS,
};
pub use types::{GameMapping, PageMeta, Settings};
