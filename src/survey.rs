// src/survey.rs
use std::sync::Arc;

use crate::analytics::Analytics;
use crate::corpus::Corpus;
use crate::ledger::Ledger;
use crate::profile::Profiles;
use crate::ranking::Ranking;
use crate::store::{MemoryStore, SharedStore};

/// All components wired over one storage backend. Cheap to clone; used as the
/// HTTP application state.
#[derive(Clone)]
pub struct Survey {
    pub corpus: Corpus,
    pub ledger: Ledger,
    pub analytics: Analytics,
    pub ranking: Ranking,
    pub profiles: Profiles,
}

impl Survey {
    pub fn new(store: SharedStore) -> Self {
        let analytics = Analytics::new(store.clone());
        Self {
            corpus: Corpus::new(store.clone(), analytics.clone()),
            ledger: Ledger::new(store.clone(), analytics.clone()),
            ranking: Ranking::new(store.clone()),
            profiles: Profiles::new(store),
            analytics,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
