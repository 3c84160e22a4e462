use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::ParticipantId;
use tracing::{debug, info};

use crate::peer::entry::{NegotiationState, PeerEntry};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("peer connection already registered for {0}")]
    AlreadyExists(ParticipantId),
}

/// Process-wide registry of live peer connections, one entry per
/// participant. Entries carry their own lock, so traffic for one
/// participant never blocks another's.
#[derive(Clone, Default)]
pub struct PeerRegistry {
    entries: Arc<DashMap<ParticipantId, Arc<PeerEntry>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh entry. Fails if the participant already has one;
    /// callers that tolerate an existing entry should `get` first.
    pub fn create(&self, entry: PeerEntry) -> Result<Arc<PeerEntry>, RegistryError> {
        let participant = entry.participant.clone();
        match self.entries.entry(participant.clone()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists(participant)),
            Entry::Vacant(slot) => {
                let entry = Arc::new(entry);
                slot.insert(Arc::clone(&entry));
                Ok(entry)
            }
        }
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<Arc<PeerEntry>> {
        self.entries.get(participant).map(|e| Arc::clone(&e))
    }

    /// Merge negotiation fields into an existing entry under its lock;
    /// no-op when the entry is absent.
    pub async fn update<F>(&self, participant: &ParticipantId, apply: F)
    where
        F: FnOnce(&mut NegotiationState),
    {
        let Some(entry) = self.get(participant) else {
            debug!(%participant, "update for unknown peer entry ignored");
            return;
        };
        let mut state = entry.negotiation.lock().await;
        apply(&mut state);
    }

    /// Close and drop a participant's connection. Safe to call twice; the
    /// second call finds nothing and does nothing.
    pub async fn remove(&self, participant: &ParticipantId) {
        let Some((_, entry)) = self.entries.remove(participant) else {
            return;
        };
        entry.abort_negotiation_timer().await;
        if let Err(e) = entry.connection.close().await {
            debug!(%participant, error = ?e, "closing peer connection failed");
        }
        info!(%participant, "peer connection removed");
    }
}
