//! Storage seam.
//!
//! Every component talks to persistence through [`Store`]. The vote uniqueness
//! invariant lives here, not in callers: [`Store::insert_vote`] must be an
//! atomic check-and-insert on `(participant_id, question_id)`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Comment, Idea, ParticipantProfile, Question, SentimentSnapshot, SentimentStats, Vote,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a question together with its seed ideas in one unit.
    async fn insert_question(&self, question: &Question, seeds: &[Idea]) -> Result<()>;
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>>;
    /// Newest first.
    async fn list_questions(&self) -> Result<Vec<Question>>;

    async fn insert_idea(&self, idea: &Idea) -> Result<()>;
    async fn get_idea(&self, id: Uuid) -> Result<Option<Idea>>;
    /// Insertion order.
    async fn list_ideas(&self, question_id: Uuid) -> Result<Vec<Idea>>;

    async fn insert_comment(&self, comment: &Comment) -> Result<()>;
    /// Insertion order.
    async fn list_comments(&self, question_id: Uuid) -> Result<Vec<Comment>>;

    /// Returns `false` when a vote for the same participant and question
    /// already exists; nothing is written in that case.
    async fn insert_vote(&self, vote: &Vote) -> Result<bool>;
    async fn list_votes(&self, question_id: Uuid) -> Result<Vec<Vote>>;
    async fn voted_question_ids(&self, participant_id: &str) -> Result<Vec<Uuid>>;
    async fn latest_vote_at(&self, question_id: Uuid) -> Result<Option<DateTime<Utc>>>;

    /// Grouping primitive over the ideas of a question.
    async fn idea_sentiment_stats(&self, question_id: Uuid) -> Result<SentimentStats>;
    /// Grouping primitive over the comments of a question.
    async fn comment_sentiment_stats(&self, question_id: Uuid) -> Result<SentimentStats>;

    async fn upsert_snapshot(&self, snapshot: &SentimentSnapshot) -> Result<()>;
    async fn get_snapshot(&self, question_id: Uuid) -> Result<Option<SentimentSnapshot>>;
    async fn mark_snapshot_stale(&self, question_id: Uuid) -> Result<()>;
    /// Snapshots joined with their question, by question creation.
    async fn list_snapshots(&self) -> Result<Vec<(Question, SentimentSnapshot)>>;

    /// Returns `false` when the participant already has a profile.
    async fn insert_profile(&self, profile: &ParticipantProfile) -> Result<bool>;
    async fn get_profile(&self, participant_id: &str) -> Result<Option<ParticipantProfile>>;
}

pub type SharedStore = Arc<dyn Store>;
