//! The multi-session mapper.

use std::collections::BTreeMap;
use std::sync::Arc;

use map_registration::{Registrar, RegistrationStatus};
use map_types::{PointCloud, Session, Trajectory};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::MapperConfig;
use crate::error::{Result, SessionError};
use crate::record::{AlignmentTransform, SessionId, SessionOutcome, SessionRecord, SessionState};

struct SessionEntry {
    session: Arc<Session>,
    state: SessionState,
    alignment: Option<AlignmentTransform>,
    global_trajectory: Option<Trajectory>,
    last_status: RegistrationStatus,
    attempts: u32,
}

impl SessionEntry {
    fn pending(session: Session) -> Self {
        Self {
            session: Arc::new(session),
            state: SessionState::Pending,
            alignment: None,
            global_trajectory: None,
            last_status: RegistrationStatus::DidNotConverge,
            attempts: 0,
        }
    }

    fn record(&self, id: SessionId) -> SessionRecord {
        SessionRecord {
            id,
            state: self.state,
            alignment: self.alignment,
            last_status: self.last_status.clone(),
            attempts: self.attempts,
            points: self.session.cloud.len(),
            poses: self.session.trajectory.len(),
        }
    }
}

/// Folds capture sessions into one global map.
///
/// Each session is registered against the accumulated global map, not
/// against individual sessions. The first session to arrive defines the
/// global frame. A session that fails to register is kept as
/// [`SessionState::Rejected`] and can be retried once other sessions have
/// added the overlap it lacked.
///
/// The mapper is `Send + Sync`. Registrations are serialized among
/// themselves, but ICP runs outside the session table lock: queries such as
/// [`session_state`](Self::session_state) or [`sessions`](Self::sessions)
/// only wait for a table update, never for a merge. The global map is
/// published as an immutable snapshot, so readers see it either before or
/// after a merge and never in between.
///
/// # Example
///
/// ```
/// use map_sessions::{MapperConfig, MultiSessionMapper, SessionState};
/// use map_types::{PointCloud, Session};
/// use nalgebra::Point3;
///
/// let points: Vec<_> = (0..40)
///     .map(|i| {
///         let t = f64::from(i);
///         Point3::new((t * 1.1).sin() * 4.0, (t * 0.6).cos() * 4.0, (t * 2.3).sin())
///     })
///     .collect();
///
/// let mapper = MultiSessionMapper::new(MapperConfig::default()).unwrap();
/// let first = mapper.add_session(Session::from_cloud(PointCloud::from_positions(&points)));
/// assert_eq!(first.state, SessionState::Registered);
/// assert!(first.alignment.unwrap().transform.is_identity(1e-12));
/// assert_eq!(mapper.global_map().len(), 40);
/// ```
pub struct MultiSessionMapper {
    config: MapperConfig,
    registrar: Registrar,
    /// Held for the whole of a registration, retries included.
    writer: Mutex<()>,
    sessions: Mutex<Vec<SessionEntry>>,
    global: RwLock<Arc<PointCloud>>,
}

impl MultiSessionMapper {
    /// Creates an empty mapper.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: MapperConfig) -> Result<Self> {
        config.validate()?;
        let registrar = Registrar::new(config.registrar.clone())?;
        Ok(Self {
            config,
            registrar,
            writer: Mutex::new(()),
            sessions: Mutex::new(Vec::new()),
            global: RwLock::new(Arc::new(PointCloud::new())),
        })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The current global map snapshot.
    #[must_use]
    pub fn global_map(&self) -> Arc<PointCloud> {
        Arc::clone(&self.global.read())
    }

    /// Adds a session and registers it against the global map.
    ///
    /// If it registers and automatic retries are enabled, rejected sessions
    /// are re-attempted; any that now register are listed in
    /// [`SessionOutcome::recovered`].
    pub fn add_session(&self, session: Session) -> SessionOutcome {
        let _writer = self.writer.lock();
        let entry = SessionEntry::pending(session);
        let session = Arc::clone(&entry.session);
        let index = {
            let mut sessions = self.sessions.lock();
            sessions.push(entry);
            sessions.len() - 1
        };
        debug!(id = %session_id(index), points = session.cloud.len(), "session added");

        let mut outcome = self.register(index, &session);
        self.cascade(&mut outcome);
        outcome
    }

    /// Re-attempts every rejected session until no further session registers.
    ///
    /// Returns the final outcome of each session attempted, ordered by id.
    pub fn retry_rejected(&self) -> Vec<SessionOutcome> {
        let _writer = self.writer.lock();
        self.retry_all()
    }

    /// Re-attempts one session.
    ///
    /// A session that is already registered is not registered again; its
    /// current outcome is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownSession`] if `id` was never allocated.
    pub fn retry_session(&self, id: SessionId) -> Result<SessionOutcome> {
        let _writer = self.writer.lock();
        let (index, session) = {
            let sessions = self.sessions.lock();
            let index = entry_index(&sessions, id).ok_or(SessionError::UnknownSession(id))?;
            let entry = &sessions[index];
            if entry.state == SessionState::Registered {
                return Ok(SessionOutcome {
                    id,
                    state: entry.state,
                    alignment: entry.alignment,
                    status: entry.last_status.clone(),
                    map_points: self.global.read().len(),
                    recovered: Vec::new(),
                });
            }
            (index, Arc::clone(&entry.session))
        };

        let mut outcome = self.register(index, &session);
        self.cascade(&mut outcome);
        Ok(outcome)
    }

    /// The alignment of a registered session.
    #[must_use]
    pub fn session_transform(&self, id: SessionId) -> Option<AlignmentTransform> {
        let sessions = self.sessions.lock();
        entry_index(&sessions, id).and_then(|i| sessions[i].alignment)
    }

    /// The state of a session.
    #[must_use]
    pub fn session_state(&self, id: SessionId) -> Option<SessionState> {
        let sessions = self.sessions.lock();
        entry_index(&sessions, id).map(|i| sessions[i].state)
    }

    /// A registered session's trajectory in the global frame.
    #[must_use]
    pub fn session_trajectory(&self, id: SessionId) -> Option<Trajectory> {
        let sessions = self.sessions.lock();
        entry_index(&sessions, id).and_then(|i| sessions[i].global_trajectory.clone())
    }

    /// Summaries of all sessions, ordered by id.
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions
            .lock()
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.record(session_id(i)))
            .collect()
    }

    /// Number of sessions added.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.sessions
            .lock()
            .iter()
            .filter(|e| e.state == SessionState::Registered)
            .count()
    }

    /// Drops all sessions and empties the global map.
    ///
    /// Session ids restart from 0.
    pub fn reset(&self) {
        let _writer = self.writer.lock();
        let mut sessions = self.sessions.lock();
        sessions.clear();
        *self.global.write() = Arc::new(PointCloud::new());
        info!("mapper reset");
    }

    /// Registers the session at `index` and commits the result. The caller
    /// holds the writer lock; the session table is locked only to commit.
    fn register(&self, index: usize, session: &Session) -> SessionOutcome {
        let id = session_id(index);
        let current = self.global_map();

        let (status, alignment, merged) = if current.is_empty() {
            self.define_frame(&session.cloud)
        } else {
            let registration = self.registrar.merge(&current, &session.cloud, None);
            let alignment = registration.is_valid().then_some(AlignmentTransform {
                transform: registration.transform,
                quality: registration.quality,
            });
            (registration.status, alignment, registration.merged)
        };
        let global_trajectory =
            alignment.map(|a| session.trajectory.transformed(&a.transform));

        let mut sessions = self.sessions.lock();
        let entry = &mut sessions[index];
        entry.attempts += 1;
        entry.last_status = status.clone();
        let map_points = if let Some(alignment) = alignment {
            entry.state = SessionState::Registered;
            entry.alignment = Some(alignment);
            entry.global_trajectory = global_trajectory;
            let map_points = merged.len();
            *self.global.write() = Arc::new(merged);
            info!(
                %id,
                quality = alignment.quality,
                map_points,
                "session registered, global map replaced"
            );
            map_points
        } else {
            entry.state = SessionState::Rejected;
            warn!(%id, %status, attempts = entry.attempts, "session rejected");
            current.len()
        };

        SessionOutcome {
            id,
            state: entry.state,
            alignment: entry.alignment,
            status,
            map_points,
            recovered: Vec::new(),
        }
    }

    fn define_frame(
        &self,
        cloud: &PointCloud,
    ) -> (RegistrationStatus, Option<AlignmentTransform>, PointCloud) {
        if cloud.is_empty() {
            return (RegistrationStatus::EmptyCloud, None, PointCloud::new());
        }
        match cloud.voxel_downsample(self.config.registrar.voxel_size) {
            Ok(map) => (
                RegistrationStatus::Converged,
                Some(AlignmentTransform::reference()),
                map,
            ),
            Err(error) => (
                RegistrationStatus::InvalidInput {
                    reason: error.to_string(),
                },
                None,
                PointCloud::new(),
            ),
        }
    }

    fn cascade(&self, outcome: &mut SessionOutcome) {
        if !(outcome.is_registered() && self.config.retry_rejected_on_success) {
            return;
        }
        outcome.recovered = self
            .retry_all()
            .into_iter()
            .filter(SessionOutcome::is_registered)
            .map(|o| o.id)
            .collect();
        outcome.map_points = self.global.read().len();
    }

    /// Passes over the rejected sessions until one finds nothing new to
    /// register. The caller holds the writer lock.
    fn retry_all(&self) -> Vec<SessionOutcome> {
        let mut outcomes = BTreeMap::new();
        loop {
            let rejected: Vec<(usize, Arc<Session>)> = self
                .sessions
                .lock()
                .iter()
                .enumerate()
                .filter(|(_, e)| e.state == SessionState::Rejected)
                .map(|(i, e)| (i, Arc::clone(&e.session)))
                .collect();

            let mut progressed = false;
            for (index, session) in rejected {
                let outcome = self.register(index, &session);
                progressed |= outcome.is_registered();
                outcomes.insert(outcome.id, outcome);
            }
            if !progressed {
                break;
            }
        }
        outcomes.into_values().collect()
    }
}

fn session_id(index: usize) -> SessionId {
    SessionId(index as u64)
}

fn entry_index(sessions: &[SessionEntry], id: SessionId) -> Option<usize> {
    usize::try_from(id.0).ok().filter(|&i| i < sessions.len())
}
