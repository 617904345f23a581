// routes.rs
use axum::{
    routing::{get, post},
    Router,
};
use http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::PARTICIPANT_HEADER;
use crate::handlers;
use crate::survey::Survey;

pub fn create_routes(survey: Survey) -> Router {
    let api = Router::new()
        .route(
            "/questions",
            get(handlers::list_questions).post(handlers::create_question),
        )
        .route(
            "/questions/{id}/ideas",
            get(handlers::list_ideas).post(handlers::submit_idea),
        )
        .route(
            "/questions/{id}/comments",
            get(handlers::list_comments).post(handlers::submit_comment),
        )
        .route("/questions/{id}/pair", get(handlers::next_pair))
        .route("/questions/{id}/votes", post(handlers::vote))
        .route("/questions/{id}/ranking", get(handlers::ranking))
        .route("/questions/{id}/statistics", get(handlers::statistics))
        .route("/questions/{id}/sentiment", get(handlers::sentiment))
        .route("/questions/{id}/overview", get(handlers::overview))
        .route("/ideas/{id}/tally", get(handlers::tally))
        .route("/analytics/comparison", get(handlers::comparison))
        .route("/participants/me/questions", get(handlers::open_questions))
        .route(
            "/participants/me/profile",
            get(handlers::get_profile).put(handlers::submit_profile),
        );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(PARTICIPANT_HEADER)]);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(survey)
}
