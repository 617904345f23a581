// src/profile.rs
use chrono::Utc;
use tracing::info;

use crate::corpus::require_text;
use crate::error::{Error, Result};
use crate::models::{ParticipantProfile, ProfileOutcome, ProfileRequest};
use crate::store::SharedStore;

const MIN_AGE: i32 = 10;
const MAX_AGE: i32 = 120;

#[derive(Clone)]
pub struct Profiles {
    store: SharedStore,
}

impl Profiles {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Store the participant's form once; later submissions change nothing.
    pub async fn submit(&self, participant_id: &str, form: &ProfileRequest) -> Result<ProfileOutcome> {
        let participant_id = require_text("participant_id", participant_id)?;
        if !(MIN_AGE..=MAX_AGE).contains(&form.age) {
            return Err(Error::validation(format!(
                "age must be between {MIN_AGE} and {MAX_AGE}"
            )));
        }

        let profile = ParticipantProfile {
            participant_id: participant_id.to_string(),
            country: form.country.trim().to_string(),
            age: form.age,
            sex: form.sex,
            occupation: form.occupation.trim().to_string(),
            created_at: Utc::now(),
        };

        if !self.store.insert_profile(&profile).await? {
            return Ok(ProfileOutcome::AlreadySubmitted);
        }
        info!(participant_id, "profile saved");
        Ok(ProfileOutcome::Saved { profile })
    }

    pub async fn get(&self, participant_id: &str) -> Result<ParticipantProfile> {
        self.store
            .get_profile(participant_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("profile of {participant_id}")))
    }
}
