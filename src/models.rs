// models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Coarse three-way classification derived from a polarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Boundaries are exclusive: exactly 0.1 or -0.1 stays Neutral.
    pub fn from_score(score: f64) -> Self {
        if score > 0.1 {
            SentimentLabel::Positive
        } else if score < -0.1 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Positive" => Ok(SentimentLabel::Positive),
            "Neutral" => Ok(SentimentLabel::Neutral),
            "Negative" => Ok(SentimentLabel::Negative),
            other => Err(Error::Internal(format!("unknown sentiment label '{other}'"))),
        }
    }
}

/// Polarity score plus its label. Unclassified text defaults to (0.0, Neutral).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: f64,
    pub label: SentimentLabel,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
        }
    }
}

/// Where an idea came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Entered together with the question by its creator.
    #[default]
    Seed,
    /// Proposed later by a participant.
    UserSubmitted,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Seed => "Seed",
            Origin::UserSubmitted => "UserSubmitted",
        }
    }
}

impl FromStr for Origin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Seed" => Ok(Origin::Seed),
            "UserSubmitted" => Ok(Origin::UserSubmitted),
            other => Err(Error::Internal(format!("unknown idea origin '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub origin: Origin,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub question_id: Uuid,
    pub participant_id: String,
    pub text: String,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub participant_id: String,
    pub question_id: Uuid,
    pub winner_id: Uuid,
    pub loser_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Per-label counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

impl LabelCounts {
    pub fn add(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> i64 {
        self.positive + self.neutral + self.negative
    }
}

/// Result of the storage grouping primitive over one collection of a question.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SentimentStats {
    pub mean: Option<f64>,
    pub counts: LabelCounts,
    pub latest: Option<DateTime<Utc>>,
}

/// Cached aggregate sentiment of one question. Derived data only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub question_id: Uuid,
    pub mean_idea_sentiment: Option<f64>,
    pub mean_comment_sentiment: Option<f64>,
    pub idea_counts: LabelCounts,
    pub comment_counts: LabelCounts,
    pub last_updated: DateTime<Utc>,
    #[serde(skip)]
    pub stale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Other => "Other",
        }
    }
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Sex::Male),
            "Female" => Ok(Sex::Female),
            "Other" => Ok(Sex::Other),
            other => Err(Error::Internal(format!("unknown sex '{other}'"))),
        }
    }
}

/// Short demographic form a participant fills once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub participant_id: String,
    pub country: String,
    pub age: i32,
    pub sex: Sex,
    pub occupation: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub text: String,
    pub creator_id: String,
    pub idea1: String,
    pub idea2: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedQuestion {
    pub question_id: Uuid,
    pub ideas: Vec<Idea>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIdeaRequest {
    pub text: String,
    #[serde(default = "user_submitted")]
    pub origin: Origin,
}

fn user_submitted() -> Origin {
    Origin::UserSubmitted
}

#[derive(Debug, Deserialize)]
pub struct SubmitCommentRequest {
    pub text: String,
}

/// Id and sentiment of a freshly stored text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Submitted {
    pub id: Uuid,
    pub score: f64,
    pub label: SentimentLabel,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub winner_id: Uuid,
    pub loser_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VoteOutcome {
    Recorded { vote: Vote },
    AlreadyVoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub idea_id: Uuid,
    pub wins: i64,
    pub losses: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedIdea {
    pub idea_id: Uuid,
    pub text: String,
    pub origin: Origin,
    pub sentiment: Sentiment,
    pub win_percentage: f64,
    pub wins: i64,
    pub losses: i64,
    pub total_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteStatistics {
    pub question_id: Uuid,
    pub total_votes: i64,
    pub idea_count: usize,
    pub best_idea: Option<RankedIdea>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    Idea,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentItem {
    pub kind: ItemKind,
    pub text: String,
    pub origin: Option<Origin>,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOverview {
    pub question: Question,
    pub idea_count: usize,
    pub comment_count: usize,
    pub global: Sentiment,
    pub items: Vec<SentimentItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionComparison {
    pub question_id: Uuid,
    pub question: String,
    pub mean_idea_sentiment: Option<f64>,
    pub mean_comment_sentiment: Option<f64>,
    pub total_positive: i64,
    pub total_negative: i64,
    pub total_neutral: i64,
}

#[derive(Debug, Serialize)]
pub struct IdeaPair {
    pub question_id: Uuid,
    pub left: Idea,
    pub right: Idea,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub country: String,
    pub age: i32,
    pub sex: Sex,
    pub occupation: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProfileOutcome {
    Saved { profile: ParticipantProfile },
    AlreadySubmitted,
}
