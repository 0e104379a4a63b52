//! Multi-session mapping.
//!
//! [`MultiSessionMapper`] keeps an ordered set of capture sessions and a
//! running global map. Each new session is registered against the global
//! map; on success its alignment is stored, its trajectory is moved into
//! the global frame and the merged cloud replaces the global map.
//!
//! Sessions that fail to register are kept as rejected. When a later
//! session closes a loop and contributes the missing overlap, rejected
//! sessions are retried automatically (see
//! [`MapperConfig::retry_rejected_on_success`]) or on request.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod mapper;
mod record;

pub use config::MapperConfig;
pub use error::{Result, SessionError};
pub use mapper::MultiSessionMapper;
pub use record::{AlignmentTransform, SessionId, SessionOutcome, SessionRecord, SessionState};

/// Convenient imports.
pub mod prelude {
    pub use crate::{
        AlignmentTransform, MapperConfig, MultiSessionMapper, SessionId, SessionOutcome,
        SessionState,
    };
}
