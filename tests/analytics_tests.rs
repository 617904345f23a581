//! Snapshot consistency, idempotence and recovery after failed refreshes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use wiki_survey::models::{
    Comment, Idea, LabelCounts, Origin, ParticipantProfile, Question, SentimentLabel,
    SentimentSnapshot, SentimentStats, Vote,
};
use wiki_survey::store::{MemoryStore, SharedStore, Store};
use wiki_survey::{Error, Result, Survey};

fn recount(labels: impl Iterator<Item = SentimentLabel>) -> LabelCounts {
    let mut counts = LabelCounts::default();
    labels.for_each(|l| counts.add(l));
    counts
}

#[tokio::test]
async fn snapshot_matches_fresh_recount_after_every_write() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let survey = Survey::new(store.clone());
    let created = survey
        .corpus
        .create_question("How to improve the market?", "c", "Clean stalls", "A terrible fee")
        .await
        .unwrap();
    let q = created.question_id;

    let texts = [
        "More shade would be nice",
        "The roads are bad",
        "Open on sundays",
        "Very good lighting",
    ];
    for (n, text) in texts.iter().enumerate() {
        if n % 2 == 0 {
            survey.corpus.submit_idea(q, text, Origin::UserSubmitted).await.unwrap();
        } else {
            survey.corpus.submit_comment(q, "p1", text).await.unwrap();
        }

        let snapshot = store.get_snapshot(q).await.unwrap().unwrap();
        let ideas = store.list_ideas(q).await.unwrap();
        let comments = store.list_comments(q).await.unwrap();
        assert_eq!(snapshot.idea_counts, recount(ideas.iter().map(|i| i.sentiment.label)));
        assert_eq!(
            snapshot.comment_counts,
            recount(comments.iter().map(|c| c.sentiment.label))
        );
    }

    let (a, b) = (created.ideas[0].id, created.ideas[1].id);
    survey.ledger.cast_vote("p9", q, a, b).await.unwrap();
    let votes = store.list_votes(q).await.unwrap();
    let snapshot = store.get_snapshot(q).await.unwrap().unwrap();
    assert_eq!(snapshot.last_updated, votes[0].created_at);
}

#[tokio::test]
async fn means_are_null_without_texts() {
    let survey = Survey::in_memory();
    let q = survey
        .corpus
        .create_question("Q", "c", "good", "bad")
        .await
        .unwrap()
        .question_id;

    let snapshot = survey.analytics.snapshot(q).await.unwrap();
    assert_eq!(snapshot.mean_comment_sentiment, None);
    let mean = snapshot.mean_idea_sentiment.unwrap();
    assert!((mean - 0.0).abs() < 1e-9, "good (0.7) and bad (-0.7) average to zero");

    let json = serde_json::to_value(&snapshot).unwrap();
    assert!(json["mean_comment_sentiment"].is_null());
}

#[tokio::test]
async fn refresh_is_idempotent() {
    let survey = Survey::in_memory();
    let q = survey
        .corpus
        .create_question("Q", "c", "great", "poor")
        .await
        .unwrap()
        .question_id;
    survey.corpus.submit_comment(q, "p", "nice").await.unwrap();

    let first = survey.analytics.refresh(q).await.unwrap();
    let second = survey.analytics.refresh(q).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test]
async fn refresh_of_unknown_question_is_not_found() {
    let survey = Survey::in_memory();
    let err = survey.analytics.refresh(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn comparison_joins_question_text() {
    let survey = Survey::in_memory();
    let first = survey
        .corpus
        .create_question("First", "c", "wonderful", "fine")
        .await
        .unwrap()
        .question_id;
    let second = survey
        .corpus
        .create_question("Second", "c", "horrible", "ugly")
        .await
        .unwrap()
        .question_id;
    survey.corpus.submit_comment(second, "p", "sad").await.unwrap();

    let rows = survey.analytics.compare_questions().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].question_id, first);
    assert_eq!(rows[0].question, "First");
    assert_eq!(rows[0].total_positive, 2);
    assert_eq!(rows[1].question, "Second");
    assert_eq!(rows[1].total_negative, 3);
    assert!(rows[1].mean_comment_sentiment.unwrap() < 0.0);
}

#[tokio::test]
async fn overview_lists_every_text() {
    let survey = Survey::in_memory();
    let q = survey
        .corpus
        .create_question("Q", "c", "excellent plan", "awesome plan")
        .await
        .unwrap()
        .question_id;
    survey.corpus.submit_comment(q, "p", "love it").await.unwrap();

    let overview = survey.analytics.overview(q).await.unwrap();
    assert_eq!(overview.idea_count, 2);
    assert_eq!(overview.comment_count, 1);
    assert_eq!(overview.items.len(), 3);
    assert_eq!(overview.global.label, SentimentLabel::Positive);
}

// ---------------------------------------------------------------------------
// Store whose snapshot writes can be switched off
// ---------------------------------------------------------------------------

struct FlakySnapshots {
    inner: MemoryStore,
    fail: AtomicBool,
}

impl FlakySnapshots {
    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(Error::Storage(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for FlakySnapshots {
    async fn insert_question(&self, q: &Question, seeds: &[Idea]) -> Result<()> {
        self.inner.insert_question(q, seeds).await
    }
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
        self.inner.get_question(id).await
    }
    async fn list_questions(&self) -> Result<Vec<Question>> {
        self.inner.list_questions().await
    }
    async fn insert_idea(&self, idea: &Idea) -> Result<()> {
        self.inner.insert_idea(idea).await
    }
    async fn get_idea(&self, id: Uuid) -> Result<Option<Idea>> {
        self.inner.get_idea(id).await
    }
    async fn list_ideas(&self, q: Uuid) -> Result<Vec<Idea>> {
        self.inner.list_ideas(q).await
    }
    async fn insert_comment(&self, c: &Comment) -> Result<()> {
        self.inner.insert_comment(c).await
    }
    async fn list_comments(&self, q: Uuid) -> Result<Vec<Comment>> {
        self.inner.list_comments(q).await
    }
    async fn insert_vote(&self, v: &Vote) -> Result<bool> {
        self.inner.insert_vote(v).await
    }
    async fn list_votes(&self, q: Uuid) -> Result<Vec<Vote>> {
        self.inner.list_votes(q).await
    }
    async fn voted_question_ids(&self, p: &str) -> Result<Vec<Uuid>> {
        self.inner.voted_question_ids(p).await
    }
    async fn latest_vote_at(&self, q: Uuid) -> Result<Option<DateTime<Utc>>> {
        self.inner.latest_vote_at(q).await
    }
    async fn idea_sentiment_stats(&self, q: Uuid) -> Result<SentimentStats> {
        self.inner.idea_sentiment_stats(q).await
    }
    async fn comment_sentiment_stats(&self, q: Uuid) -> Result<SentimentStats> {
        self.inner.comment_sentiment_stats(q).await
    }
    async fn upsert_snapshot(&self, s: &SentimentSnapshot) -> Result<()> {
        self.check()?;
        self.inner.upsert_snapshot(s).await
    }
    async fn get_snapshot(&self, q: Uuid) -> Result<Option<SentimentSnapshot>> {
        self.inner.get_snapshot(q).await
    }
    async fn mark_snapshot_stale(&self, q: Uuid) -> Result<()> {
        self.inner.mark_snapshot_stale(q).await
    }
    async fn list_snapshots(&self) -> Result<Vec<(Question, SentimentSnapshot)>> {
        self.inner.list_snapshots().await
    }
    async fn insert_profile(&self, p: &ParticipantProfile) -> Result<bool> {
        self.inner.insert_profile(p).await
    }
    async fn get_profile(&self, p: &str) -> Result<Option<ParticipantProfile>> {
        self.inner.get_profile(p).await
    }
}

#[tokio::test]
async fn failed_refresh_marks_stale_and_read_rebuilds() {
    let flaky = Arc::new(FlakySnapshots {
        inner: MemoryStore::new(),
        fail: AtomicBool::new(false),
    });
    let survey = Survey::new(flaky.clone());
    let q = survey
        .corpus
        .create_question("Q", "c", "a", "b")
        .await
        .unwrap()
        .question_id;

    flaky.fail.store(true, Ordering::SeqCst);
    // The write itself still succeeds.
    survey
        .corpus
        .submit_idea(q, "This is terrible", Origin::UserSubmitted)
        .await
        .unwrap();

    let cached = flaky.get_snapshot(q).await.unwrap().unwrap();
    assert!(cached.stale);
    assert_eq!(cached.idea_counts.negative, 0);

    flaky.fail.store(false, Ordering::SeqCst);
    let snapshot = survey.analytics.snapshot(q).await.unwrap();
    assert!(!snapshot.stale);
    assert_eq!(snapshot.idea_counts.negative, 1);
    assert!(!flaky.get_snapshot(q).await.unwrap().unwrap().stale);
}

#[tokio::test]
async fn comparison_rebuilds_stale_rows() {
    let flaky = Arc::new(FlakySnapshots {
        inner: MemoryStore::new(),
        fail: AtomicBool::new(false),
    });
    let survey = Survey::new(flaky.clone());
    let q = survey
        .corpus
        .create_question("Q", "c", "good", "fine")
        .await
        .unwrap()
        .question_id;

    flaky.fail.store(true, Ordering::SeqCst);
    survey.corpus.submit_comment(q, "p", "terrible").await.unwrap();
    assert!(flaky.get_snapshot(q).await.unwrap().unwrap().stale);

    flaky.fail.store(false, Ordering::SeqCst);
    let rows = survey.analytics.compare_questions().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_positive, 2);
    assert_eq!(rows[0].total_negative, 1);
    assert!(rows[0].mean_comment_sentiment.unwrap() < 0.0);
    assert!(!flaky.get_snapshot(q).await.unwrap().unwrap().stale);
}
