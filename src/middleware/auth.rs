use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Token claims issued by the external auth collaborator. This service only
/// consumes them; there is no login or registration endpoint here.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub hotel_id: Option<Uuid>,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    Waiter,
}

impl Role {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "waiter" => Some(Role::Waiter),
            _ => None,
        }
    }

    /// Actor kind recorded on wallet transaction rows.
    pub fn actor_kind(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Waiter => "MANAGER",
        }
    }
}

/// Request-scoped actor context. Every staff operation takes this
/// explicitly; the core never reads ambient session state.
#[derive(Debug, Clone)]
pub struct Actor {
    pub actor_id: Uuid,
    pub hotel_id: Option<Uuid>,
    pub role: Role,
}

impl Actor {
    /// Tenant scope for hotel-bound actors. Admins have no hotel of their
    /// own and must address one explicitly.
    pub fn hotel_id(&self) -> Result<Uuid, AppError> {
        self.hotel_id.ok_or(AppError::Forbidden)
    }

    /// Reject operations that target another hotel's data. Admins bypass.
    pub fn ensure_hotel(&self, hotel_id: Uuid) -> Result<(), AppError> {
        if self.role == Role::Admin {
            return Ok(());
        }
        if self.hotel_id == Some(hotel_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

pub fn ensure_admin(actor: &Actor) -> Result<(), AppError> {
    if actor.role != Role::Admin {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::BadRequest("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::BadRequest("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::BadRequest("Invalid or expired token".into()))?;

        let actor_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::BadRequest("Invalid actor id in token".into()))?;

        let role = Role::parse(&decoded.claims.role)
            .ok_or_else(|| AppError::BadRequest("Unknown role in token".into()))?;

        Ok(Actor {
            actor_id,
            hotel_id: decoded.claims.hotel_id,
            role,
        })
    }
}
