use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;
use warp::Reply;
use warp::http::StatusCode;
use warp::reply::Response;

use crate::lobby_manager::LobbyManager;
use heardle_persistence::repositories::{GuessRepository, NewGuess};
use heardle_types::{
    AnnounceTrackRequest, CreateLobbyRequest, ErrorResponse, GuessResponse, JoinLobbyRequest,
    LobbyError, SubmitGuessRequest, TrackReference,
};

pub mod config;
pub mod lobby_manager;
pub mod rate_limiter;

#[derive(Deserialize)]
struct LobbyStateQuery {
    player_id: Option<Uuid>,
}

pub fn create_routes(
    lobby_manager: Arc<LobbyManager>,
    guess_repository: Arc<GuessRepository>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let lobby_manager_filter = warp::any().map({
        let lobby_manager = lobby_manager.clone();
        move || lobby_manager.clone()
    });

    let guess_repository_filter = warp::any().map({
        let guess_repository = guess_repository.clone();
        move || guess_repository.clone()
    });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let create_lobby = warp::path!("lobbies")
        .and(warp::post())
        .and(warp::body::json())
        .and(lobby_manager_filter.clone())
        .and_then(handle_create_lobby);

    let lobby_state = warp::path!("lobbies" / String)
        .and(warp::get())
        .and(warp::query::<LobbyStateQuery>())
        .and(lobby_manager_filter.clone())
        .and_then(handle_lobby_state);

    let close_lobby = warp::path!("lobbies" / String)
        .and(warp::delete())
        .and(warp::header::optional::<String>("x-host-key"))
        .and(lobby_manager_filter.clone())
        .and_then(handle_close_lobby);

    let join_lobby = warp::path!("lobbies" / String / "players")
        .and(warp::post())
        .and(warp::body::json())
        .and(lobby_manager_filter.clone())
        .and_then(handle_join_lobby);

    let leave_lobby = warp::path!("lobbies" / String / "players" / String)
        .and(warp::delete())
        .and(lobby_manager_filter.clone())
        .and_then(handle_leave_lobby);

    // Host announces the track that is now playing
    let announce_track = warp::path!("lobbies" / String / "track")
        .and(warp::put())
        .and(warp::header::optional::<String>("x-host-key"))
        .and(warp::body::json())
        .and(lobby_manager_filter.clone())
        .and_then(handle_announce_track);

    let submit_guess = warp::path!("lobbies" / String / "guesses")
        .and(warp::post())
        .and(warp::body::json())
        .and(lobby_manager_filter.clone())
        .and(guess_repository_filter.clone())
        .and_then(handle_submit_guess);

    let guess_log = warp::path!("lobbies" / String / "guesses")
        .and(warp::get())
        .and(lobby_manager_filter.clone())
        .and(guess_repository_filter.clone())
        .and_then(handle_guess_log);

    let leaderboard = warp::path!("lobbies" / String / "leaderboard")
        .and(warp::get())
        .and(lobby_manager_filter.clone())
        .and(guess_repository_filter.clone())
        .and_then(handle_leaderboard);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "x-host-key"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    health
        .or(create_lobby)
        .or(lobby_state)
        .or(close_lobby)
        .or(join_lobby)
        .or(leave_lobby)
        .or(announce_track)
        .or(submit_guess)
        .or(guess_log)
        .or(leaderboard)
        .with(cors)
        .with(warp::log("heardle"))
}

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

pub fn status_for_error(err: &LobbyError) -> StatusCode {
    match err {
        LobbyError::LobbyNotFound { .. } | LobbyError::PlayerNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        LobbyError::NotHost => StatusCode::FORBIDDEN,
        LobbyError::InvalidDisplayName { .. } | LobbyError::DuplicateDisplayName { .. } => {
            StatusCode::BAD_REQUEST
        }
        LobbyError::LobbyFull { .. } | LobbyError::Engine(_) => StatusCode::CONFLICT,
        LobbyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
    }
}

fn error_reply(err: &LobbyError) -> Response {
    json_reply(&ErrorResponse::from(err), status_for_error(err))
}

fn bad_request(message: &str) -> Response {
    json_reply(&ErrorResponse::message(message), StatusCode::BAD_REQUEST)
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| bad_request(&format!("Invalid {} format", what)))
}

/// A missing or malformed key is treated the same as a wrong one.
fn parse_host_key(header: Option<String>) -> Result<Uuid, Response> {
    header
        .and_then(|key| Uuid::parse_str(key.trim()).ok())
        .ok_or_else(|| error_reply(&LobbyError::NotHost))
}

async fn handle_create_lobby(
    request: CreateLobbyRequest,
    lobby_manager: Arc<LobbyManager>,
) -> Result<Response, warp::Rejection> {
    if request.host_id.trim().is_empty() {
        return Ok(bad_request("host_id must not be empty"));
    }

    let response = lobby_manager.create_lobby(request.host_id).await;
    Ok(json_reply(&response, StatusCode::CREATED))
}

async fn handle_lobby_state(
    lobby_id: String,
    query: LobbyStateQuery,
    lobby_manager: Arc<LobbyManager>,
) -> Result<Response, warp::Rejection> {
    let lobby_id = match parse_uuid(&lobby_id, "lobby ID") {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };

    match lobby_manager.get_state(lobby_id, query.player_id).await {
        Ok(state) => Ok(json_reply(&state, StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_close_lobby(
    lobby_id: String,
    host_key: Option<String>,
    lobby_manager: Arc<LobbyManager>,
) -> Result<Response, warp::Rejection> {
    let (lobby_id, host_key) = match (parse_uuid(&lobby_id, "lobby ID"), parse_host_key(host_key)) {
        (Ok(lobby_id), Ok(host_key)) => (lobby_id, host_key),
        (Err(reply), _) | (_, Err(reply)) => return Ok(reply),
    };

    match lobby_manager.close_lobby(lobby_id, host_key).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_join_lobby(
    lobby_id: String,
    request: JoinLobbyRequest,
    lobby_manager: Arc<LobbyManager>,
) -> Result<Response, warp::Rejection> {
    let lobby_id = match parse_uuid(&lobby_id, "lobby ID") {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };

    match lobby_manager.join_lobby(lobby_id, &request.display_name).await {
        Ok(response) => Ok(json_reply(&response, StatusCode::CREATED)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_leave_lobby(
    lobby_id: String,
    player_id: String,
    lobby_manager: Arc<LobbyManager>,
) -> Result<Response, warp::Rejection> {
    let (lobby_id, player_id) = match (
        parse_uuid(&lobby_id, "lobby ID"),
        parse_uuid(&player_id, "player ID"),
    ) {
        (Ok(lobby_id), Ok(player_id)) => (lobby_id, player_id),
        (Err(reply), _) | (_, Err(reply)) => return Ok(reply),
    };

    match lobby_manager.leave_lobby(lobby_id, player_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_announce_track(
    lobby_id: String,
    host_key: Option<String>,
    request: AnnounceTrackRequest,
    lobby_manager: Arc<LobbyManager>,
) -> Result<Response, warp::Rejection> {
    let (lobby_id, host_key) = match (parse_uuid(&lobby_id, "lobby ID"), parse_host_key(host_key)) {
        (Ok(lobby_id), Ok(host_key)) => (lobby_id, host_key),
        (Err(reply), _) | (_, Err(reply)) => return Ok(reply),
    };

    let track = TrackReference::from_credits(request.track_title, &request.artists);
    match lobby_manager.announce_track(lobby_id, host_key, track).await {
        Ok(snapshot) => Ok(json_reply(&snapshot, StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_submit_guess(
    lobby_id: String,
    request: SubmitGuessRequest,
    lobby_manager: Arc<LobbyManager>,
    guess_repository: Arc<GuessRepository>,
) -> Result<Response, warp::Rejection> {
    let lobby_id = match parse_uuid(&lobby_id, "lobby ID") {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };

    let submitted = match lobby_manager
        .submit_guess(lobby_id, request.player_id, &request.text)
        .await
    {
        Ok(submitted) => submitted,
        Err(err) => return Ok(error_reply(&err)),
    };

    let outcome = &submitted.outcome;
    let persisted = match guess_repository
        .record_guess(NewGuess {
            lobby_id,
            player_id: outcome.player_id,
            display_name: outcome.display_name.clone(),
            text: outcome.text.clone(),
            round_number: outcome.round_number,
            match_class: outcome.scored.match_class,
            points: outcome.scored.points,
            submitted_at: outcome.submitted_at,
        })
        .await
    {
        Ok(_) => true,
        Err(err) => {
            tracing::error!(
                "Failed to record guess by {} in lobby {}: {}",
                outcome.player_id,
                lobby_id,
                err
            );
            false
        }
    };

    let response = GuessResponse {
        scored: outcome.scored,
        total_points: outcome.total_points,
        round: submitted.round,
        persisted,
    };
    Ok(json_reply(&response, StatusCode::OK))
}

/// Where a lobby's guess log can be read from.
enum LogVisibility {
    /// Lobby is live; guesses from `open_round` stay hidden until it locks.
    Live { open_round: Option<u32> },
    /// Lobby is gone from memory; only its persisted log remains.
    Closed,
}

async fn log_visibility(lobby_manager: &LobbyManager, lobby_id: Uuid) -> LogVisibility {
    match lobby_manager.open_round_number(lobby_id).await {
        Ok(open_round) => LogVisibility::Live { open_round },
        Err(_) => LogVisibility::Closed,
    }
}

fn lobby_not_found(lobby_id: Uuid) -> Response {
    error_reply(&LobbyError::LobbyNotFound {
        lobby_id: lobby_id.to_string(),
    })
}

async fn handle_guess_log(
    lobby_id: String,
    lobby_manager: Arc<LobbyManager>,
    guess_repository: Arc<GuessRepository>,
) -> Result<Response, warp::Rejection> {
    let lobby_id = match parse_uuid(&lobby_id, "lobby ID") {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    let visibility = log_visibility(&lobby_manager, lobby_id).await;

    match guess_repository.find_by_lobby(lobby_id).await {
        Ok(records) => match visibility {
            LogVisibility::Closed if records.is_empty() => Ok(lobby_not_found(lobby_id)),
            LogVisibility::Closed => Ok(json_reply(&records, StatusCode::OK)),
            LogVisibility::Live { open_round } => {
                let settled: Vec<_> = records
                    .into_iter()
                    .filter(|record| Some(record.round_number) != open_round)
                    .collect();
                Ok(json_reply(&settled, StatusCode::OK))
            }
        },
        Err(err) => {
            tracing::error!("Failed to fetch guess log for lobby {}: {}", lobby_id, err);
            Ok(json_reply(
                &ErrorResponse::message("Failed to fetch guess log"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_leaderboard(
    lobby_id: String,
    lobby_manager: Arc<LobbyManager>,
    guess_repository: Arc<GuessRepository>,
) -> Result<Response, warp::Rejection> {
    let lobby_id = match parse_uuid(&lobby_id, "lobby ID") {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    let visibility = log_visibility(&lobby_manager, lobby_id).await;

    // Totals carry no guess text and points only come from matches, which lock the round
    match guess_repository.lobby_totals(lobby_id).await {
        Ok(leaderboard) if leaderboard.is_empty() && matches!(visibility, LogVisibility::Closed) => {
            Ok(lobby_not_found(lobby_id))
        }
        Ok(leaderboard) => Ok(json_reply(&leaderboard, StatusCode::OK)),
        Err(err) => {
            tracing::error!("Failed to fetch leaderboard for lobby {}: {}", lobby_id, err);
            Ok(json_reply(
                &ErrorResponse::message("Failed to fetch leaderboard"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
