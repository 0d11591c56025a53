//! Bracket REST server.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT (see `ServerConfig`).
//! The caller's identity comes from the auth proxy in `X-User-Id` / `X-User-Role`.

use actix_web::{
    error::{InternalError, JsonPayloadError},
    get,
    http::StatusCode,
    post, put,
    web::{self, Data, Json, JsonConfig, Path},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use bracket_engine::identity::{USER_ID_HEADER, USER_ROLE_HEADER};
use bracket_engine::{
    Actor, BracketService, HeaderIdentity, IdentityProvider, InMemoryStore, MatchId, MatchResult,
    Revision, Score, ServerConfig, ServiceError, Slot, StoreError, Tournament, TournamentError,
    TournamentId, TournamentState, Versioned,
};
use serde::{Deserialize, Serialize};

type AppState = Data<BracketService<InMemoryStore>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    sport: String,
    entrants: Vec<String>,
}

#[derive(Deserialize)]
struct SubmitResultBody {
    winner: Slot,
    #[serde(default)]
    score: Option<Score>,
    #[serde(default)]
    note: Option<String>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and match id
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

/// Tournament as returned by the API: document plus revision and derived state.
#[derive(Serialize)]
struct TournamentView {
    revision: Revision,
    state: TournamentState,
    tournament: Tournament,
}

impl From<Versioned> for TournamentView {
    fn from(v: Versioned) -> Self {
        Self {
            revision: v.revision,
            state: v.tournament.state(),
            tournament: v.tournament,
        }
    }
}

fn current_actor(req: &HttpRequest) -> Result<Actor, HttpResponse> {
    let headers = req.headers();
    let identity = HeaderIdentity {
        user_id: headers.get(USER_ID_HEADER).and_then(|v| v.to_str().ok()),
        role: headers.get(USER_ROLE_HEADER).and_then(|v| v.to_str().ok()),
    };
    identity.current_user().map_err(|e| {
        HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": e.to_string(), "kind": "unauthenticated" }))
    })
}

fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Tournament(e) => match e {
            TournamentError::MatchNotFound(_) => StatusCode::NOT_FOUND,
            TournamentError::Forbidden(_) => StatusCode::FORBIDDEN,
            TournamentError::AlreadyDecided(_) | TournamentError::TournamentComplete => {
                StatusCode::CONFLICT
            }
            TournamentError::IncompleteMatch(_)
            | TournamentError::ScoreMismatch { .. }
            | TournamentError::InvalidEntrantCount(_)
            | TournamentError::EmptyName
            | TournamentError::DuplicateEntrant(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TournamentError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ServiceError::Store(e) => match e {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists(_) | StoreError::Conflict { .. } => StatusCode::CONFLICT,
            // Engine produced a document the store refuses
            StoreError::Malformed(_) | StoreError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

fn error_response(err: &ServiceError) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        log::error!("Request failed: {}", err);
    } else {
        log::debug!("Request rejected ({}): {}", err.kind(), err);
    }
    HttpResponse::build(status)
        .json(serde_json::json!({ "error": err.client_message(), "kind": err.kind() }))
}

/// Body extraction failures get the same JSON error shape as every other rejection.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let status = match err {
        JsonPayloadError::Deserialize(_) => StatusCode::UNPROCESSABLE_ENTITY,
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        _ => StatusCode::BAD_REQUEST,
    };
    log::debug!("Rejected request body: {}", err);
    let resp = HttpResponse::build(status)
        .json(serde_json::json!({ "error": err.to_string(), "kind": "invalid_body" }));
    InternalError::from_response(err, resp).into()
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bracket-engine",
    })
}

/// Create a tournament owned by the caller.
#[post("/api/tournaments")]
async fn api_create_tournament(
    state: AppState,
    req: HttpRequest,
    body: Json<CreateTournamentBody>,
) -> HttpResponse {
    let actor = match current_actor(&req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match state.create_tournament(&body.name, &body.sport, &body.entrants, &actor) {
        Ok(stored) => HttpResponse::Created().json(TournamentView::from(stored)),
        Err(e) => error_response(&e),
    }
}

/// Get a tournament by id (404 if not found).
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.get_tournament(path.id) {
        Ok(stored) => HttpResponse::Ok().json(TournamentView::from(stored)),
        Err(e) => error_response(&e),
    }
}

/// Matches with both entrants known and no result yet.
#[get("/api/tournaments/{id}/matches/ready")]
async fn api_ready_matches(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.ready_matches(path.id) {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => error_response(&e),
    }
}

/// Record the result of one match and advance the winner.
#[put("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_submit_result(
    state: AppState,
    req: HttpRequest,
    path: Path<TournamentMatchPath>,
    body: Json<SubmitResultBody>,
) -> HttpResponse {
    let actor = match current_actor(&req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let body = body.into_inner();
    let result = MatchResult {
        winner: body.winner,
        score: body.score,
        note: body.note,
    };
    match state.submit_result(path.id, path.match_id, result, &actor) {
        Ok(stored) => HttpResponse::Ok().json(TournamentView::from(stored)),
        Err(e) => error_response(&e),
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(json_error))
        .service(api_health)
        .service(api_create_tournament)
        .service(api_get_tournament)
        .service(api_ready_matches)
        .service(api_submit_result);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let bind = (config.host.as_str(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state: AppState = Data::new(
        BracketService::new(InMemoryStore::new()).with_max_retries(config.max_conflict_retries),
    );

    // Background task: periodically drop tournaments nobody has touched for a while
    let state_cleanup = state.clone();
    let (interval, timeout) = (config.cleanup_interval, config.inactivity_timeout);
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = state_cleanup.store().purge_inactive(timeout) {
                log::error!("Cleanup failed: {}", e);
            }
        }
    });

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(bind)?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use uuid::Uuid;

    fn state() -> AppState {
        Data::new(BracketService::new(InMemoryStore::new()))
    }

    fn create_request(creator: Uuid) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/tournaments")
            .insert_header((USER_ID_HEADER, creator.to_string()))
            .set_json(serde_json::json!({
                "name": "Friday 5-a-side",
                "sport": "football",
                "entrants": ["Reds", "Blues", "Greens", "Golds"]
            }))
    }

    #[actix_web::test]
    async fn health_is_ok() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn create_requires_identity() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/tournaments")
            .set_json(serde_json::json!({ "name": "Cup", "entrants": ["A", "B"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn create_rejects_odd_entrant_count() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/tournaments")
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .set_json(serde_json::json!({ "name": "Cup", "entrants": ["A", "B", "C"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "invalid_entrant_count");
    }

    #[actix_web::test]
    async fn submit_result_checks_identity_and_advances() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let creator = Uuid::new_v4();
        let created: serde_json::Value =
            test::call_and_read_body_json(&app, create_request(creator).to_request()).await;
        let id = created["tournament"]["id"].as_str().unwrap().to_string();
        let match_id = created["tournament"]["rounds"][0]["matches"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();
        let uri = format!("/api/tournaments/{id}/matches/{match_id}/result");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .set_json(serde_json::json!({ "winner": "a" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((USER_ID_HEADER, creator.to_string()))
            .set_json(serde_json::json!({ "winner": "b", "score": { "a": 1, "b": 3 } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["revision"], 2);
        assert_eq!(body["state"], "in_progress");
        assert_eq!(body["tournament"]["rounds"][1]["matches"][0]["slot_a"]["name"], "Blues");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((USER_ID_HEADER, creator.to_string()))
            .set_json(serde_json::json!({ "winner": "a" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "already_decided");
    }

    #[actix_web::test]
    async fn ready_matches_and_unknown_tournament() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let created: serde_json::Value =
            test::call_and_read_body_json(&app, create_request(Uuid::new_v4()).to_request()).await;
        let id = created["tournament"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/tournaments/{id}/matches/ready"))
            .to_request();
        let ready: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ready.as_array().map(Vec::len), Some(2));

        let req = test::TestRequest::get()
            .uri(&format!("/api/tournaments/{}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn get_tournament_returns_view() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let created: serde_json::Value =
            test::call_and_read_body_json(&app, create_request(Uuid::new_v4()).to_request()).await;
        let id = created["tournament"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/tournaments/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["revision"], 1);
        assert_eq!(body["state"], "in_progress");
        assert_eq!(body["tournament"]["name"], "Friday 5-a-side");
        assert_eq!(body["tournament"]["rounds"].as_array().map(Vec::len), Some(2));
    }

    #[actix_web::test]
    async fn final_before_semis_is_incomplete() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let creator = Uuid::new_v4();
        let created: serde_json::Value =
            test::call_and_read_body_json(&app, create_request(creator).to_request()).await;
        let id = created["tournament"]["id"].as_str().unwrap().to_string();
        let final_id = created["tournament"]["rounds"][1]["matches"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/tournaments/{id}/matches/{final_id}/result"))
            .insert_header((USER_ID_HEADER, creator.to_string()))
            .set_json(serde_json::json!({ "winner": "a" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "incomplete_match");
    }

    #[actix_web::test]
    async fn submit_after_final_is_tournament_complete() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let creator = Uuid::new_v4();
        let req = test::TestRequest::post()
            .uri("/api/tournaments")
            .insert_header((USER_ID_HEADER, creator.to_string()))
            .set_json(serde_json::json!({ "name": "Decider", "entrants": ["Reds", "Blues"] }))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = created["tournament"]["id"].as_str().unwrap().to_string();
        let final_id = created["tournament"]["rounds"][0]["matches"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();
        let uri = format!("/api/tournaments/{id}/matches/{final_id}/result");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((USER_ID_HEADER, creator.to_string()))
            .set_json(serde_json::json!({ "winner": "a" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "complete");
        assert_eq!(body["tournament"]["winner"]["name"], "Reds");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((USER_ID_HEADER, creator.to_string()))
            .set_json(serde_json::json!({ "winner": "b" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "tournament_complete");
    }

    #[actix_web::test]
    async fn bad_body_is_json_error() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let creator = Uuid::new_v4();
        let created: serde_json::Value =
            test::call_and_read_body_json(&app, create_request(creator).to_request()).await;
        let id = created["tournament"]["id"].as_str().unwrap().to_string();
        let match_id = created["tournament"]["rounds"][0]["matches"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/tournaments/{id}/matches/{match_id}/result"))
            .insert_header((USER_ID_HEADER, creator.to_string()))
            .set_json(serde_json::json!({ "winner": "c" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "invalid_body");
    }

    #[actix_web::test]
    async fn rejected_document_is_internal() {
        let err = ServiceError::Store(StoreError::Malformed(TournamentError::Malformed(
            "round 1 has 3 matches".to_string(),
        )));
        let resp = error_response(&err);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "internal");
        assert_eq!(err.client_message(), "Internal server error");

        let err = ServiceError::Tournament(TournamentError::IncompleteMatch(Uuid::new_v4()));
        assert_eq!(status_for(&err), StatusCode::UNPROCESSABLE_ENTITY);
        let err = ServiceError::Store(StoreError::Poisoned);
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
