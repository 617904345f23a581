//! Per-question sentiment aggregation.
//!
//! A [`SentimentSnapshot`] is a cache: it is recomputed from scratch out of
//! the stored ideas, comments and votes after every write to its question,
//! and a read never trusts a snapshot flagged stale.

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    ItemKind, QuestionComparison, QuestionOverview, SentimentItem, SentimentSnapshot,
};
use crate::sentiment;
use crate::store::SharedStore;

const REFRESH_ATTEMPTS: u32 = 2;

#[derive(Clone)]
pub struct Analytics {
    store: SharedStore,
}

impl Analytics {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Recompute and persist the snapshot of one question.
    ///
    /// Pure over the stored data: two calls with no write in between produce
    /// equal snapshots, `last_updated` included.
    pub async fn refresh(&self, question_id: Uuid) -> Result<SentimentSnapshot> {
        let question = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("question {question_id}")))?;

        let ideas = self.store.idea_sentiment_stats(question_id).await?;
        let comments = self.store.comment_sentiment_stats(question_id).await?;
        let latest_vote = self.store.latest_vote_at(question_id).await?;

        let last_updated = [ideas.latest, comments.latest, latest_vote]
            .into_iter()
            .flatten()
            .fold(question.created_at, |acc, at| acc.max(at));

        let snapshot = SentimentSnapshot {
            question_id,
            mean_idea_sentiment: ideas.mean,
            mean_comment_sentiment: comments.mean,
            idea_counts: ideas.counts,
            comment_counts: comments.counts,
            last_updated,
            stale: false,
        };

        self.store.upsert_snapshot(&snapshot).await?;
        debug!(%question_id, ideas = ideas.counts.total(), comments = comments.counts.total(), "sentiment snapshot refreshed");
        Ok(snapshot)
    }

    /// Called after a committed write. The write has already succeeded, so a
    /// refresh failure is not reported to the caller: it is retried, then the
    /// snapshot is flagged stale and rebuilt on its next read.
    pub(crate) async fn refresh_after_write(&self, question_id: Uuid) {
        for attempt in 1..=REFRESH_ATTEMPTS {
            match self.refresh(question_id).await {
                Ok(_) => return,
                Err(e) => warn!(%question_id, attempt, error = %e, "snapshot refresh failed"),
            }
        }
        if let Err(e) = self.store.mark_snapshot_stale(question_id).await {
            error!(%question_id, error = %e, "could not flag snapshot stale; next write will rebuild it");
        }
    }

    /// Current snapshot, rebuilt first when missing or stale.
    pub async fn snapshot(&self, question_id: Uuid) -> Result<SentimentSnapshot> {
        match self.store.get_snapshot(question_id).await? {
            Some(snapshot) if !snapshot.stale => Ok(snapshot),
            _ => self.refresh(question_id).await,
        }
    }

    /// Every snapshot joined with its question text, by question creation.
    pub async fn compare_questions(&self) -> Result<Vec<QuestionComparison>> {
        let mut out = Vec::new();
        for (question, cached) in self.store.list_snapshots().await? {
            let snapshot = if cached.stale {
                self.refresh(question.id).await?
            } else {
                cached
            };
            let (ideas, comments) = (snapshot.idea_counts, snapshot.comment_counts);
            out.push(QuestionComparison {
                question_id: question.id,
                question: question.text,
                mean_idea_sentiment: snapshot.mean_idea_sentiment,
                mean_comment_sentiment: snapshot.mean_comment_sentiment,
                total_positive: ideas.positive + comments.positive,
                total_negative: ideas.negative + comments.negative,
                total_neutral: ideas.neutral + comments.neutral,
            });
        }
        Ok(out)
    }

    /// Sentiment of every text of a question plus the sentiment of all of
    /// them read as one text.
    pub async fn overview(&self, question_id: Uuid) -> Result<QuestionOverview> {
        let question = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("question {question_id}")))?;
        let ideas = self.store.list_ideas(question_id).await?;
        let comments = self.store.list_comments(question_id).await?;

        let combined = ideas
            .iter()
            .map(|i| i.text.as_str())
            .chain(comments.iter().map(|c| c.text.as_str()))
            .collect::<Vec<_>>()
            .join(" ");

        let items = ideas
            .iter()
            .map(|i| SentimentItem {
                kind: ItemKind::Idea,
                text: i.text.clone(),
                origin: Some(i.origin),
                sentiment: i.sentiment,
            })
            .chain(comments.iter().map(|c| SentimentItem {
                kind: ItemKind::Comment,
                text: c.text.clone(),
                origin: None,
                sentiment: c.sentiment,
            }))
            .collect();

        Ok(QuestionOverview {
            question,
            idea_count: ideas.len(),
            comment_count: comments.len(),
            global: sentiment::classify(&combined),
            items,
        })
    }
}
