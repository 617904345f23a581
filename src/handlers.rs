// handlers.rs
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::context::ParticipantContext;
use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::models::{
    Comment, CreateQuestionRequest, CreatedQuestion, Idea, ParticipantProfile, ProfileOutcome,
    ProfileRequest, Question, QuestionComparison, QuestionOverview, RankedIdea,
    SentimentSnapshot, SubmitCommentRequest, SubmitIdeaRequest, Submitted, Tally, VoteOutcome,
    VoteRequest, VoteStatistics,
};
use crate::survey::Survey;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Fetch all questions, newest first
pub async fn list_questions(State(survey): State<Survey>) -> Result<Json<Vec<Question>>> {
    Ok(Json(survey.corpus.list_questions().await?))
}

/// Create a question with its two seed ideas
pub async fn create_question(
    State(survey): State<Survey>,
    ApiJson(req): ApiJson<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<CreatedQuestion>)> {
    let created = survey
        .corpus
        .create_question(&req.text, &req.creator_id, &req.idea1, &req.idea2)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_ideas(
    State(survey): State<Survey>,
    ApiPath(question_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Idea>>> {
    Ok(Json(survey.corpus.list_ideas(question_id).await?))
}

pub async fn submit_idea(
    State(survey): State<Survey>,
    ApiPath(question_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SubmitIdeaRequest>,
) -> Result<(StatusCode, Json<Submitted>)> {
    let submitted = survey
        .corpus
        .submit_idea(question_id, &req.text, req.origin)
        .await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

pub async fn list_comments(
    State(survey): State<Survey>,
    ApiPath(question_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Comment>>> {
    Ok(Json(survey.corpus.list_comments(question_id).await?))
}

pub async fn submit_comment(
    State(survey): State<Survey>,
    ctx: ParticipantContext,
    ApiPath(question_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SubmitCommentRequest>,
) -> Result<(StatusCode, Json<Submitted>)> {
    let submitted = survey
        .corpus
        .submit_comment(question_id, &ctx.participant_id, &req.text)
        .await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// Random pair of ideas to choose between; `pair` is null once the
/// participant has voted or while the question has fewer than two ideas
pub async fn next_pair(
    State(survey): State<Survey>,
    ctx: ParticipantContext,
    ApiPath(question_id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    let status = survey
        .ledger
        .participation(&ctx.participant_id, question_id)
        .await?;
    let pair = survey
        .ledger
        .next_pair(&ctx.participant_id, question_id)
        .await?;
    Ok(Json(json!({ "status": status, "pair": pair })))
}

/// Vote for one idea of a pair
pub async fn vote(
    State(survey): State<Survey>,
    ctx: ParticipantContext,
    ApiPath(question_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<VoteRequest>,
) -> Result<Json<VoteOutcome>> {
    let outcome = survey
        .ledger
        .cast_vote(&ctx.participant_id, question_id, req.winner_id, req.loser_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn ranking(
    State(survey): State<Survey>,
    ApiPath(question_id): ApiPath<Uuid>,
) -> Result<Json<Vec<RankedIdea>>> {
    Ok(Json(survey.ranking.rank(question_id).await?))
}

pub async fn statistics(
    State(survey): State<Survey>,
    ApiPath(question_id): ApiPath<Uuid>,
) -> Result<Json<VoteStatistics>> {
    Ok(Json(survey.ranking.statistics(question_id).await?))
}

pub async fn sentiment(
    State(survey): State<Survey>,
    ApiPath(question_id): ApiPath<Uuid>,
) -> Result<Json<SentimentSnapshot>> {
    Ok(Json(survey.analytics.snapshot(question_id).await?))
}

pub async fn overview(
    State(survey): State<Survey>,
    ApiPath(question_id): ApiPath<Uuid>,
) -> Result<Json<QuestionOverview>> {
    Ok(Json(survey.analytics.overview(question_id).await?))
}

pub async fn tally(
    State(survey): State<Survey>,
    ApiPath(idea_id): ApiPath<Uuid>,
) -> Result<Json<Tally>> {
    Ok(Json(survey.ledger.tally(idea_id).await?))
}

/// Sentiment of every question side by side
pub async fn comparison(State(survey): State<Survey>) -> Result<Json<Vec<QuestionComparison>>> {
    Ok(Json(survey.analytics.compare_questions().await?))
}

/// Questions still waiting for this participant's vote
pub async fn open_questions(
    State(survey): State<Survey>,
    ctx: ParticipantContext,
) -> Result<Json<Vec<Question>>> {
    Ok(Json(survey.ledger.open_questions(&ctx.participant_id).await?))
}

pub async fn get_profile(
    State(survey): State<Survey>,
    ctx: ParticipantContext,
) -> Result<Json<ParticipantProfile>> {
    Ok(Json(survey.profiles.get(&ctx.participant_id).await?))
}

pub async fn submit_profile(
    State(survey): State<Survey>,
    ctx: ParticipantContext,
    ApiJson(form): ApiJson<ProfileRequest>,
) -> Result<Json<ProfileOutcome>> {
    Ok(Json(survey.profiles.submit(&ctx.participant_id, &form).await?))
}
