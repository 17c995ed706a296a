use crate::core::{AppError, AppState};
use crate::entities::Participant;
use axum::extract::State;
use axum::{body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::Error as JwtError;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// claims issued by the identity provider; `id` is the external user id
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i64,
}

#[instrument(skip(secret), fields(id = %id))]
pub fn encode_jwt(id: i64, secret: &str) -> Result<String, JwtError> {
    debug!("Encoding JWT token");
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(24);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims { iat, exp, id };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .inspect(|_| info!("JWT token encoded successfully"))
    .inspect_err(|e| error!("Failed to encode JWT token: {:?}", e))
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, JwtError> {
    debug!("Decoding JWT token");
    decode::<Claims>(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .inspect(|data| debug!("JWT token decoded for identity {}", data.claims.id))
    .inspect_err(|e| warn!("Failed to decode JWT token: {:?}", e))
}

/// Resolves the caller into a `Participant` and stores it in the request
/// extensions. The participant is created on first sight.
#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let auth_header = match req.headers().get(http::header::AUTHORIZATION) {
        Some(header) => header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::forbidden("Empty header is not allowed")
        })?,
        None => {
            warn!("Missing authorization header");
            return Err(AppError::forbidden(
                "Please add the JWT token to the header",
            ));
        }
    };

    let mut header = auth_header.split_whitespace();
    let token = match (header.next(), header.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => token.to_string(),
        _ => {
            warn!("Authorization header is not a bearer token");
            return Err(AppError::forbidden("Expected a Bearer token"));
        }
    };

    let token_data = decode_jwt(&token, &state.jwt_secret)
        .map_err(|_| AppError::unauthorized("Unable to decode token"))?;

    if token_data.claims.id <= 0 {
        warn!("Token carries an invalid identity: {}", token_data.claims.id);
        return Err(AppError::unauthorized("You are not an authorized user"));
    }

    let participant = state
        .identities
        .resolve(&state.participants, token_data.claims.id)
        .await?;

    info!("Participant authenticated: {}", participant.participant_id);
    req.extensions_mut().insert(participant);
    Ok(next.run(req).await)
}

/// Checks that the current participant belongs to the thread in the path.
///
/// Membership is historical: a participant who left the thread still passes.
#[instrument(skip(state, req, next))]
pub async fn thread_membership_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running thread membership middleware");
    let current = req
        .extensions()
        .get::<Participant>()
        .copied()
        .ok_or_else(|| {
            warn!("Participant not found in request extensions");
            AppError::unauthorized("Participant not authenticated")
        })?;

    let thread_id: i64 = req
        .uri()
        .path()
        .split('/')
        .find_map(|segment| segment.parse::<i64>().ok())
        .ok_or_else(|| {
            warn!("Thread ID not found in path: {}", req.uri().path());
            AppError::bad_request("Thread ID not found in path")
        })?;

    // 404 before 403, the thread has to exist first
    state.threads.thread(thread_id).await?;

    if !state
        .ledger
        .is_participant(thread_id, current.participant_id)
        .await?
    {
        warn!(
            "Participant {} is not a member of thread {}",
            current.participant_id, thread_id
        );
        return Err(AppError::forbidden("You are not a participant of this thread"));
    }

    debug!(
        "Participant {} verified as member of thread {}",
        current.participant_id, thread_id
    );
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip_keeps_identity() {
        let token = encode_jwt(12, "secret").unwrap();
        let data = decode_jwt(&token, "secret").unwrap();

        assert_eq!(data.claims.id, 12);
    }

    #[test]
    fn test_jwt_with_wrong_secret_is_rejected() {
        let token = encode_jwt(12, "secret").unwrap();

        assert!(decode_jwt(&token, "another secret").is_err());
    }
}
