// store/postgres.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::Store;
use crate::error::{Error, Result};
use crate::models::{
    Comment, Idea, LabelCounts, ParticipantProfile, Question, Sentiment, SentimentSnapshot,
    SentimentStats, Vote,
};

/// Postgres backend. Uniqueness of votes, snapshots and profiles is enforced
/// by table constraints (see `db::SCHEMA`).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: Uuid,
    text: String,
    creator_id: String,
    created_at: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(r: QuestionRow) -> Self {
        Question {
            id: r.id,
            text: r.text,
            creator_id: r.creator_id,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct IdeaRow {
    id: Uuid,
    question_id: Uuid,
    text: String,
    origin: String,
    sentiment_score: f64,
    sentiment_label: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdeaRow> for Idea {
    type Error = Error;

    fn try_from(r: IdeaRow) -> Result<Self> {
        Ok(Idea {
            id: r.id,
            question_id: r.question_id,
            text: r.text,
            origin: r.origin.parse()?,
            sentiment: Sentiment {
                score: r.sentiment_score,
                label: r.sentiment_label.parse()?,
            },
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    question_id: Uuid,
    participant_id: String,
    text: String,
    sentiment_score: f64,
    sentiment_label: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = Error;

    fn try_from(r: CommentRow) -> Result<Self> {
        Ok(Comment {
            id: r.id,
            question_id: r.question_id,
            participant_id: r.participant_id,
            text: r.text,
            sentiment: Sentiment {
                score: r.sentiment_score,
                label: r.sentiment_label.parse()?,
            },
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    id: Uuid,
    participant_id: String,
    question_id: Uuid,
    winner_id: Uuid,
    loser_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<VoteRow> for Vote {
    fn from(r: VoteRow) -> Self {
        Vote {
            id: r.id,
            participant_id: r.participant_id,
            question_id: r.question_id,
            winner_id: r.winner_id,
            loser_id: r.loser_id,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    participant_id: String,
    country: String,
    age: i32,
    sex: String,
    occupation: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for ParticipantProfile {
    type Error = Error;

    fn try_from(r: ProfileRow) -> Result<Self> {
        Ok(ParticipantProfile {
            participant_id: r.participant_id,
            country: r.country,
            age: r.age,
            sex: r.sex.parse()?,
            occupation: r.occupation,
            created_at: r.created_at,
        })
    }
}

const SNAPSHOT_COLUMNS: &str = "question_id, mean_idea_sentiment, mean_comment_sentiment, \
     idea_positive, idea_neutral, idea_negative, \
     comment_positive, comment_neutral, comment_negative, last_updated, stale";

fn snapshot_from_row(row: &sqlx::postgres::PgRow) -> std::result::Result<SentimentSnapshot, sqlx::Error> {
    Ok(SentimentSnapshot {
        question_id: row.try_get("question_id")?,
        mean_idea_sentiment: row.try_get("mean_idea_sentiment")?,
        mean_comment_sentiment: row.try_get("mean_comment_sentiment")?,
        idea_counts: LabelCounts {
            positive: row.try_get("idea_positive")?,
            neutral: row.try_get("idea_neutral")?,
            negative: row.try_get("idea_negative")?,
        },
        comment_counts: LabelCounts {
            positive: row.try_get("comment_positive")?,
            neutral: row.try_get("comment_neutral")?,
            negative: row.try_get("comment_negative")?,
        },
        last_updated: row.try_get("last_updated")?,
        stale: row.try_get("stale")?,
    })
}

/// `table` is one of the two fixed collection names, never user input.
async fn sentiment_stats(pool: &PgPool, table: &str, question_id: Uuid) -> Result<SentimentStats> {
    let sql = format!(
        "SELECT AVG(sentiment_score) AS mean, \
                COUNT(*) FILTER (WHERE sentiment_label = 'Positive') AS positive, \
                COUNT(*) FILTER (WHERE sentiment_label = 'Neutral') AS neutral, \
                COUNT(*) FILTER (WHERE sentiment_label = 'Negative') AS negative, \
                MAX(created_at) AS latest \
         FROM {table} WHERE question_id = $1"
    );
    let row = sqlx::query(&sql)
        .bind(question_id)
        .fetch_one(pool)
        .await?;

    Ok(SentimentStats {
        mean: row.try_get("mean")?,
        counts: LabelCounts {
            positive: row.try_get("positive")?,
            neutral: row.try_get("neutral")?,
            negative: row.try_get("negative")?,
        },
        latest: row.try_get("latest")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn insert_question(&self, question: &Question, seeds: &[Idea]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO questions (id, text, creator_id, created_at) VALUES ($1, $2, $3, $4)")
            .bind(question.id)
            .bind(&question.text)
            .bind(&question.creator_id)
            .bind(question.created_at)
            .execute(&mut *tx)
            .await?;

        for idea in seeds {
            insert_idea_query(idea).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, text, creator_id, created_at FROM questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Question::from))
    }

    async fn list_questions(&self) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, text, creator_id, created_at FROM questions ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn insert_idea(&self, idea: &Idea) -> Result<()> {
        insert_idea_query(idea).execute(&self.pool).await?;
        Ok(())
    }

    async fn get_idea(&self, id: Uuid) -> Result<Option<Idea>> {
        sqlx::query_as::<_, IdeaRow>(
            "SELECT id, question_id, text, origin, sentiment_score, sentiment_label, created_at \
             FROM ideas WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Idea::try_from)
        .transpose()
    }

    async fn list_ideas(&self, question_id: Uuid) -> Result<Vec<Idea>> {
        sqlx::query_as::<_, IdeaRow>(
            "SELECT id, question_id, text, origin, sentiment_score, sentiment_label, created_at \
             FROM ideas WHERE question_id = $1 ORDER BY seq",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Idea::try_from)
        .collect()
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments \
             (id, question_id, participant_id, text, sentiment_score, sentiment_label, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(comment.id)
        .bind(comment.question_id)
        .bind(&comment.participant_id)
        .bind(&comment.text)
        .bind(comment.sentiment.score)
        .bind(comment.sentiment.label.as_str())
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_comments(&self, question_id: Uuid) -> Result<Vec<Comment>> {
        sqlx::query_as::<_, CommentRow>(
            "SELECT id, question_id, participant_id, text, sentiment_score, sentiment_label, created_at \
             FROM comments WHERE question_id = $1 ORDER BY seq",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Comment::try_from)
        .collect()
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO votes (id, participant_id, question_id, winner_id, loser_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (participant_id, question_id) DO NOTHING",
        )
        .bind(vote.id)
        .bind(&vote.participant_id)
        .bind(vote.question_id)
        .bind(vote.winner_id)
        .bind(vote.loser_id)
        .bind(vote.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_votes(&self, question_id: Uuid) -> Result<Vec<Vote>> {
        let rows = sqlx::query_as::<_, VoteRow>(
            "SELECT id, participant_id, question_id, winner_id, loser_id, created_at \
             FROM votes WHERE question_id = $1 ORDER BY created_at, id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Vote::from).collect())
    }

    async fn voted_question_ids(&self, participant_id: &str) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT question_id FROM votes WHERE participant_id = $1")
            .bind(participant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("question_id")).collect())
    }

    async fn latest_vote_at(&self, question_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let latest = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MAX(created_at) FROM votes WHERE question_id = $1",
        )
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(latest)
    }

    async fn idea_sentiment_stats(&self, question_id: Uuid) -> Result<SentimentStats> {
        sentiment_stats(&self.pool, "ideas", question_id).await
    }

    async fn comment_sentiment_stats(&self, question_id: Uuid) -> Result<SentimentStats> {
        sentiment_stats(&self.pool, "comments", question_id).await
    }

    async fn upsert_snapshot(&self, s: &SentimentSnapshot) -> Result<()> {
        sqlx::query(
            "INSERT INTO sentiment_snapshots \
             (question_id, mean_idea_sentiment, mean_comment_sentiment, \
              idea_positive, idea_neutral, idea_negative, \
              comment_positive, comment_neutral, comment_negative, last_updated, stale) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (question_id) DO UPDATE SET \
              mean_idea_sentiment = EXCLUDED.mean_idea_sentiment, \
              mean_comment_sentiment = EXCLUDED.mean_comment_sentiment, \
              idea_positive = EXCLUDED.idea_positive, \
              idea_neutral = EXCLUDED.idea_neutral, \
              idea_negative = EXCLUDED.idea_negative, \
              comment_positive = EXCLUDED.comment_positive, \
              comment_neutral = EXCLUDED.comment_neutral, \
              comment_negative = EXCLUDED.comment_negative, \
              last_updated = EXCLUDED.last_updated, \
              stale = EXCLUDED.stale",
        )
        .bind(s.question_id)
        .bind(s.mean_idea_sentiment)
        .bind(s.mean_comment_sentiment)
        .bind(s.idea_counts.positive)
        .bind(s.idea_counts.neutral)
        .bind(s.idea_counts.negative)
        .bind(s.comment_counts.positive)
        .bind(s.comment_counts.neutral)
        .bind(s.comment_counts.negative)
        .bind(s.last_updated)
        .bind(s.stale)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_snapshot(&self, question_id: Uuid) -> Result<Option<SentimentSnapshot>> {
        let sql = format!("SELECT {SNAPSHOT_COLUMNS} FROM sentiment_snapshots WHERE question_id = $1");
        let row = sqlx::query(&sql)
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(snapshot_from_row).transpose()?)
    }

    async fn mark_snapshot_stale(&self, question_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sentiment_snapshots SET stale = TRUE WHERE question_id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_snapshots(&self) -> Result<Vec<(Question, SentimentSnapshot)>> {
        let rows = sqlx::query(
            "SELECT q.id, q.text, q.creator_id, q.created_at, \
                    s.question_id, s.mean_idea_sentiment, s.mean_comment_sentiment, \
                    s.idea_positive, s.idea_neutral, s.idea_negative, \
                    s.comment_positive, s.comment_neutral, s.comment_negative, \
                    s.last_updated, s.stale \
             FROM sentiment_snapshots s \
             JOIN questions q ON q.id = s.question_id \
             ORDER BY q.created_at, q.id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let question = Question {
                id: row.try_get("id")?,
                text: row.try_get("text")?,
                creator_id: row.try_get("creator_id")?,
                created_at: row.try_get("created_at")?,
            };
            out.push((question, snapshot_from_row(row)?));
        }
        Ok(out)
    }

    async fn insert_profile(&self, p: &ParticipantProfile) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO participant_profiles \
             (participant_id, country, age, sex, occupation, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (participant_id) DO NOTHING",
        )
        .bind(&p.participant_id)
        .bind(&p.country)
        .bind(p.age)
        .bind(p.sex.as_str())
        .bind(&p.occupation)
        .bind(p.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_profile(&self, participant_id: &str) -> Result<Option<ParticipantProfile>> {
        sqlx::query_as::<_, ProfileRow>(
            "SELECT participant_id, country, age, sex, occupation, created_at \
             FROM participant_profiles WHERE participant_id = $1",
        )
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?
        .map(ParticipantProfile::try_from)
        .transpose()
    }
}

fn insert_idea_query(idea: &Idea) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        "INSERT INTO ideas \
         (id, question_id, text, origin, sentiment_score, sentiment_label, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(idea.id)
    .bind(idea.question_id)
    .bind(&idea.text)
    .bind(idea.origin.as_str())
    .bind(idea.sentiment.score)
    .bind(idea.sentiment.label.as_str())
    .bind(idea.created_at)
}
