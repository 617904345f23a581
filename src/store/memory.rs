// store/memory.rs
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Store;
use crate::error::{Error, Result};
use crate::models::{
    Comment, Idea, ParticipantProfile, Question, Sentiment, SentimentSnapshot, SentimentStats,
    Vote,
};

#[derive(Default)]
struct Collections {
    questions: Vec<Question>,
    ideas: Vec<Idea>,
    comments: Vec<Comment>,
    votes: Vec<Vote>,
    /// Unique key (participant_id, question_id) of `votes`.
    vote_keys: HashSet<(String, Uuid)>,
    snapshots: HashMap<Uuid, SentimentSnapshot>,
    profiles: HashMap<String, ParticipantProfile>,
}

/// In-process backend. One lock guards every collection, so each trait call
/// is atomic with respect to every other call.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        self.inner
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".into()))
    }
}

fn stats<'a>(items: impl Iterator<Item = (&'a Sentiment, DateTime<Utc>)>) -> SentimentStats {
    let mut out = SentimentStats::default();
    let mut sum = 0.0;
    for (sentiment, at) in items {
        sum += sentiment.score;
        out.counts.add(sentiment.label);
        out.latest = out.latest.max(Some(at));
    }
    let n = out.counts.total();
    if n > 0 {
        out.mean = Some(sum / n as f64);
    }
    out
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_question(&self, question: &Question, seeds: &[Idea]) -> Result<()> {
        let mut c = self.lock()?;
        c.questions.push(question.clone());
        c.ideas.extend(seeds.iter().cloned());
        Ok(())
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
        Ok(self.lock()?.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn list_questions(&self) -> Result<Vec<Question>> {
        let c = self.lock()?;
        Ok(c.questions.iter().rev().cloned().collect())
    }

    async fn insert_idea(&self, idea: &Idea) -> Result<()> {
        self.lock()?.ideas.push(idea.clone());
        Ok(())
    }

    async fn get_idea(&self, id: Uuid) -> Result<Option<Idea>> {
        Ok(self.lock()?.ideas.iter().find(|i| i.id == id).cloned())
    }

    async fn list_ideas(&self, question_id: Uuid) -> Result<Vec<Idea>> {
        let c = self.lock()?;
        Ok(c.ideas
            .iter()
            .filter(|i| i.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.lock()?.comments.push(comment.clone());
        Ok(())
    }

    async fn list_comments(&self, question_id: Uuid) -> Result<Vec<Comment>> {
        let c = self.lock()?;
        Ok(c.comments
            .iter()
            .filter(|cm| cm.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<bool> {
        let mut c = self.lock()?;
        if !c
            .vote_keys
            .insert((vote.participant_id.clone(), vote.question_id))
        {
            return Ok(false);
        }
        c.votes.push(vote.clone());
        Ok(true)
    }

    async fn list_votes(&self, question_id: Uuid) -> Result<Vec<Vote>> {
        let c = self.lock()?;
        Ok(c.votes
            .iter()
            .filter(|v| v.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn voted_question_ids(&self, participant_id: &str) -> Result<Vec<Uuid>> {
        let c = self.lock()?;
        Ok(c.votes
            .iter()
            .filter(|v| v.participant_id == participant_id)
            .map(|v| v.question_id)
            .collect())
    }

    async fn latest_vote_at(&self, question_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let c = self.lock()?;
        Ok(c.votes
            .iter()
            .filter(|v| v.question_id == question_id)
            .map(|v| v.created_at)
            .max())
    }

    async fn idea_sentiment_stats(&self, question_id: Uuid) -> Result<SentimentStats> {
        let c = self.lock()?;
        Ok(stats(
            c.ideas
                .iter()
                .filter(|i| i.question_id == question_id)
                .map(|i| (&i.sentiment, i.created_at)),
        ))
    }

    async fn comment_sentiment_stats(&self, question_id: Uuid) -> Result<SentimentStats> {
        let c = self.lock()?;
        Ok(stats(
            c.comments
                .iter()
                .filter(|cm| cm.question_id == question_id)
                .map(|cm| (&cm.sentiment, cm.created_at)),
        ))
    }

    async fn upsert_snapshot(&self, snapshot: &SentimentSnapshot) -> Result<()> {
        self.lock()?
            .snapshots
            .insert(snapshot.question_id, snapshot.clone());
        Ok(())
    }

    async fn get_snapshot(&self, question_id: Uuid) -> Result<Option<SentimentSnapshot>> {
        Ok(self.lock()?.snapshots.get(&question_id).cloned())
    }

    async fn mark_snapshot_stale(&self, question_id: Uuid) -> Result<()> {
        if let Some(snapshot) = self.lock()?.snapshots.get_mut(&question_id) {
            snapshot.stale = true;
        }
        Ok(())
    }

    async fn list_snapshots(&self) -> Result<Vec<(Question, SentimentSnapshot)>> {
        let c = self.lock()?;
        Ok(c.questions
            .iter()
            .filter_map(|q| c.snapshots.get(&q.id).map(|s| (q.clone(), s.clone())))
            .collect())
    }

    async fn insert_profile(&self, profile: &ParticipantProfile) -> Result<bool> {
        let mut c = self.lock()?;
        if c.profiles.contains_key(&profile.participant_id) {
            return Ok(false);
        }
        c.profiles
            .insert(profile.participant_id.clone(), profile.clone());
        Ok(true)
    }

    async fn get_profile(&self, participant_id: &str) -> Result<Option<ParticipantProfile>> {
        Ok(self.lock()?.profiles.get(participant_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(participant: &str, question_id: Uuid) -> Vote {
        Vote {
            id: Uuid::new_v4(),
            participant_id: participant.to_string(),
            question_id,
            winner_id: Uuid::new_v4(),
            loser_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn second_vote_for_same_key_is_rejected() {
        let store = MemoryStore::new();
        let q = Uuid::new_v4();

        assert!(store.insert_vote(&vote("p1", q)).await.unwrap());
        assert!(!store.insert_vote(&vote("p1", q)).await.unwrap());
        assert!(store.insert_vote(&vote("p2", q)).await.unwrap());
        assert!(store.insert_vote(&vote("p1", Uuid::new_v4())).await.unwrap());

        assert_eq!(store.list_votes(q).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stats_of_empty_collection_have_no_mean() {
        let store = MemoryStore::new();
        let stats = store.idea_sentiment_stats(Uuid::new_v4()).await.unwrap();
        assert_eq!(stats.mean, None);
        assert_eq!(stats.counts.total(), 0);
        assert_eq!(stats.latest, None);
    }
}
