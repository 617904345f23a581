//! Questions, ideas and comments.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::analytics::Analytics;
use crate::error::{Error, Result};
use crate::models::{Comment, CreatedQuestion, Idea, Origin, Question, Submitted};
use crate::sentiment;
use crate::store::SharedStore;

/// Trimmed text, or a validation error naming the field.
pub(crate) fn require_text<'a>(field: &str, text: &'a str) -> Result<&'a str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} must not be blank")));
    }
    Ok(trimmed)
}

fn new_idea(question_id: Uuid, text: &str, origin: Origin) -> Idea {
    Idea {
        id: Uuid::new_v4(),
        question_id,
        text: text.to_string(),
        origin,
        sentiment: sentiment::classify(text),
        created_at: Utc::now(),
    }
}

#[derive(Clone)]
pub struct Corpus {
    store: SharedStore,
    analytics: Analytics,
}

impl Corpus {
    pub fn new(store: SharedStore, analytics: Analytics) -> Self {
        Self { store, analytics }
    }

    /// Create a question with its two seed ideas.
    pub async fn create_question(
        &self,
        text: &str,
        creator_id: &str,
        idea1: &str,
        idea2: &str,
    ) -> Result<CreatedQuestion> {
        let text = require_text("question", text)?;
        let creator_id = require_text("creator_id", creator_id)?;
        let idea1 = require_text("idea1", idea1)?;
        let idea2 = require_text("idea2", idea2)?;

        let question = Question {
            id: Uuid::new_v4(),
            text: text.to_string(),
            creator_id: creator_id.to_string(),
            created_at: Utc::now(),
        };
        let seeds = vec![
            new_idea(question.id, idea1, Origin::Seed),
            new_idea(question.id, idea2, Origin::Seed),
        ];

        self.store.insert_question(&question, &seeds).await?;
        info!(question_id = %question.id, creator_id, "question created");
        self.analytics.refresh_after_write(question.id).await;

        Ok(CreatedQuestion {
            question_id: question.id,
            ideas: seeds,
        })
    }

    pub async fn get_question(&self, question_id: Uuid) -> Result<Question> {
        self.store
            .get_question(question_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("question {question_id}")))
    }

    pub async fn list_questions(&self) -> Result<Vec<Question>> {
        self.store.list_questions().await
    }

    pub async fn submit_idea(&self, question_id: Uuid, text: &str, origin: Origin) -> Result<Submitted> {
        let text = require_text("idea", text)?;
        self.get_question(question_id).await?;

        let idea = new_idea(question_id, text, origin);
        self.store.insert_idea(&idea).await?;
        info!(%question_id, idea_id = %idea.id, label = %idea.sentiment.label, "idea submitted");
        self.analytics.refresh_after_write(question_id).await;

        Ok(Submitted {
            id: idea.id,
            score: idea.sentiment.score,
            label: idea.sentiment.label,
        })
    }

    pub async fn submit_comment(
        &self,
        question_id: Uuid,
        participant_id: &str,
        text: &str,
    ) -> Result<Submitted> {
        let text = require_text("comment", text)?;
        let participant_id = require_text("participant_id", participant_id)?;
        self.get_question(question_id).await?;

        let comment = Comment {
            id: Uuid::new_v4(),
            question_id,
            participant_id: participant_id.to_string(),
            text: text.to_string(),
            sentiment: sentiment::classify(text),
            created_at: Utc::now(),
        };
        self.store.insert_comment(&comment).await?;
        info!(%question_id, comment_id = %comment.id, label = %comment.sentiment.label, "comment submitted");
        self.analytics.refresh_after_write(question_id).await;

        Ok(Submitted {
            id: comment.id,
            score: comment.sentiment.score,
            label: comment.sentiment.label,
        })
    }

    pub async fn list_ideas(&self, question_id: Uuid) -> Result<Vec<Idea>> {
        self.get_question(question_id).await?;
        self.store.list_ideas(question_id).await
    }

    pub async fn list_comments(&self, question_id: Uuid) -> Result<Vec<Comment>> {
        self.get_question(question_id).await?;
        self.store.list_comments(question_id).await
    }
}
