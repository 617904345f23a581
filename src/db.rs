// src/db.rs
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::config::Config;

/// Idempotent schema. `seq` columns keep insertion order for ideas and comments.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS questions (
        id UUID PRIMARY KEY,
        text TEXT NOT NULL,
        creator_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ideas (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        question_id UUID NOT NULL REFERENCES questions (id),
        text TEXT NOT NULL,
        origin TEXT NOT NULL DEFAULT 'Seed',
        sentiment_score DOUBLE PRECISION NOT NULL DEFAULT 0,
        sentiment_label TEXT NOT NULL DEFAULT 'Neutral',
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS ideas_question_id_idx ON ideas (question_id)",
    "CREATE TABLE IF NOT EXISTS comments (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        question_id UUID NOT NULL REFERENCES questions (id),
        participant_id TEXT NOT NULL,
        text TEXT NOT NULL,
        sentiment_score DOUBLE PRECISION NOT NULL DEFAULT 0,
        sentiment_label TEXT NOT NULL DEFAULT 'Neutral',
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS comments_question_id_idx ON comments (question_id)",
    "CREATE TABLE IF NOT EXISTS votes (
        id UUID PRIMARY KEY,
        participant_id TEXT NOT NULL,
        question_id UUID NOT NULL REFERENCES questions (id),
        winner_id UUID NOT NULL REFERENCES ideas (id),
        loser_id UUID NOT NULL REFERENCES ideas (id),
        created_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT votes_participant_question_key UNIQUE (participant_id, question_id),
        CONSTRAINT votes_distinct_ideas CHECK (winner_id <> loser_id)
    )",
    "CREATE INDEX IF NOT EXISTS votes_question_id_idx ON votes (question_id)",
    "CREATE TABLE IF NOT EXISTS sentiment_snapshots (
        question_id UUID PRIMARY KEY REFERENCES questions (id),
        mean_idea_sentiment DOUBLE PRECISION,
        mean_comment_sentiment DOUBLE PRECISION,
        idea_positive BIGINT NOT NULL,
        idea_neutral BIGINT NOT NULL,
        idea_negative BIGINT NOT NULL,
        comment_positive BIGINT NOT NULL,
        comment_neutral BIGINT NOT NULL,
        comment_negative BIGINT NOT NULL,
        last_updated TIMESTAMPTZ NOT NULL,
        stale BOOLEAN NOT NULL DEFAULT FALSE
    )",
    "CREATE TABLE IF NOT EXISTS participant_profiles (
        participant_id TEXT PRIMARY KEY,
        country TEXT NOT NULL,
        age INTEGER NOT NULL,
        sex TEXT NOT NULL,
        occupation TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
];

pub async fn create_pool(config: &Config) -> Result<Pool<Postgres>, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

pub async fn init_schema(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!(statements = SCHEMA.len(), "database schema ready");
    Ok(())
}
