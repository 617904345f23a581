//! Vote ledger.
//!
//! One vote per participant per question. The uniqueness check and the insert
//! are a single storage operation ([`Store::insert_vote`]); this module never
//! checks-then-inserts on its own.
//!
//! [`Store::insert_vote`]: crate::store::Store::insert_vote

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analytics::Analytics;
use crate::corpus::require_text;
use crate::error::{Error, Result};
use crate::models::{Idea, IdeaPair, Question, Tally, Vote, VoteOutcome};
use crate::store::SharedStore;

/// Progress of one participant on one question. `Voted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Participation {
    Unvoted,
    Voted,
}

/// Two distinct ideas drawn uniformly at random, or `None` below two ideas.
pub fn pick_pair<R: Rng + ?Sized>(ideas: &[Idea], rng: &mut R) -> Option<(Idea, Idea)> {
    let mut chosen = ideas.choose_multiple(rng, 2);
    match (chosen.next(), chosen.next()) {
        (Some(left), Some(right)) => Some((left.clone(), right.clone())),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Ledger {
    store: SharedStore,
    analytics: Analytics,
}

impl Ledger {
    pub fn new(store: SharedStore, analytics: Analytics) -> Self {
        Self { store, analytics }
    }

    async fn question(&self, question_id: Uuid) -> Result<Question> {
        self.store
            .get_question(question_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("question {question_id}")))
    }

    async fn idea_of(&self, question_id: Uuid, idea_id: Uuid) -> Result<Idea> {
        match self.store.get_idea(idea_id).await? {
            Some(idea) if idea.question_id == question_id => Ok(idea),
            _ => Err(Error::validation(format!(
                "idea {idea_id} does not belong to question {question_id}"
            ))),
        }
    }

    /// Record `winner_id` beating `loser_id`. A participant who already voted
    /// on the question gets [`VoteOutcome::AlreadyVoted`] and nothing changes.
    pub async fn cast_vote(
        &self,
        participant_id: &str,
        question_id: Uuid,
        winner_id: Uuid,
        loser_id: Uuid,
    ) -> Result<VoteOutcome> {
        let participant_id = require_text("participant_id", participant_id)?;
        if winner_id == loser_id {
            return Err(Error::validation("winner and loser must be different ideas"));
        }
        self.question(question_id).await?;
        self.idea_of(question_id, winner_id).await?;
        self.idea_of(question_id, loser_id).await?;

        let vote = Vote {
            id: Uuid::new_v4(),
            participant_id: participant_id.to_string(),
            question_id,
            winner_id,
            loser_id,
            created_at: Utc::now(),
        };

        if !self.store.insert_vote(&vote).await? {
            info!(%question_id, participant_id, "already voted");
            return Ok(VoteOutcome::AlreadyVoted);
        }

        info!(%question_id, vote_id = %vote.id, "vote recorded");
        self.analytics.refresh_after_write(question_id).await;
        Ok(VoteOutcome::Recorded { vote })
    }

    /// Wins and losses of one idea, counted over its question's votes.
    pub async fn tally(&self, idea_id: Uuid) -> Result<Tally> {
        let idea = self
            .store
            .get_idea(idea_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("idea {idea_id}")))?;
        let votes = self.store.list_votes(idea.question_id).await?;

        Ok(Tally {
            idea_id,
            wins: votes.iter().filter(|v| v.winner_id == idea_id).count() as i64,
            losses: votes.iter().filter(|v| v.loser_id == idea_id).count() as i64,
        })
    }

    pub async fn participation(&self, participant_id: &str, question_id: Uuid) -> Result<Participation> {
        let voted = self.store.voted_question_ids(participant_id).await?;
        Ok(if voted.contains(&question_id) {
            Participation::Voted
        } else {
            Participation::Unvoted
        })
    }

    /// Questions the participant has not voted on yet, oldest first.
    pub async fn open_questions(&self, participant_id: &str) -> Result<Vec<Question>> {
        let participant_id = require_text("participant_id", participant_id)?;
        let voted = self.store.voted_question_ids(participant_id).await?;
        let mut questions = self.store.list_questions().await?;
        questions.reverse();
        questions.retain(|q| !voted.contains(&q.id));
        Ok(questions)
    }

    /// A fresh random pair on every call. Pairs shown without a vote are not
    /// remembered, so the same pair may come back.
    pub async fn next_pair(&self, participant_id: &str, question_id: Uuid) -> Result<Option<IdeaPair>> {
        let participant_id = require_text("participant_id", participant_id)?;
        self.question(question_id).await?;
        if self.participation(participant_id, question_id).await? == Participation::Voted {
            return Ok(None);
        }

        let ideas = self.store.list_ideas(question_id).await?;
        let pair = pick_pair(&ideas, &mut rand::thread_rng());
        Ok(pair.map(|(left, right)| IdeaPair {
            question_id,
            left,
            right,
        }))
    }
}
