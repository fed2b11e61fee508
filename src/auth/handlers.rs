use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, CoachRegisterRequest, LoginRequest, PublicUser, RegisteredCoach,
            SetupResponse,
        },
        extract::{ActiveCoach, AdminUser},
        is_valid_email,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{self, Account, AccountKind, NewAccount},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/setup", post(setup))
        .route("/auth/login", post(staff_login))
        .route("/auth/me", get(staff_me))
}

pub fn coach_routes() -> Router<AppState> {
    Router::new()
        .route("/coach/register", post(coach_register))
        .route("/coach/login", post(coach_login))
        .route("/coach/me", get(coach_me))
}

/// One-time bootstrap: creates the first admin account if and only if the
/// staff table is empty. Safe to call on every deploy. Two racing instances
/// can both observe an empty table; the duplicate-email check makes the
/// losing insert fail instead of double-creating.
#[instrument(skip(state))]
pub async fn setup(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SetupResponse>), ApiError> {
    let existing = repo::count(state.store.as_ref(), AccountKind::Staff).await?;
    if existing > 0 {
        return Ok((
            StatusCode::OK,
            Json(SetupResponse {
                created: false,
                message: "setup already complete".into(),
                admin_email: None,
                admin_password: None,
                warning: None,
            }),
        ));
    }

    let bootstrap = &state.config.bootstrap;
    let admin = repo::create(
        state.store.as_ref(),
        AccountKind::Staff,
        NewAccount {
            email: bootstrap.admin_email.trim().to_lowercase(),
            password_hash: hash_password(&bootstrap.admin_password)?,
            is_active: true,
            is_verified: true,
            name: Some("System Administrator".into()),
            school: None,
            title: None,
            state: None,
        },
    )
    .await?;

    info!(admin_id = %admin.id, "initial admin account created");
    Ok((
        StatusCode::CREATED,
        Json(SetupResponse {
            created: true,
            message: "initial admin account created".into(),
            admin_email: Some(admin.email),
            admin_password: Some(bootstrap.admin_password.clone()),
            warning: Some("change this password immediately after first login".into()),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn staff_login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("invalid email".into()));
    }

    let account = repo::find_by_email(state.store.as_ref(), AccountKind::Staff, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "staff login for unknown email");
            ApiError::Unauthorized("invalid email or password")
        })?;

    if !verify_password(&payload.password, &account.password_hash) {
        warn!(account_id = %account.id, "staff login with invalid password");
        return Err(ApiError::Unauthorized("invalid email or password"));
    }
    if !account.is_active {
        return Err(ApiError::Unauthorized("account is disabled"));
    }

    respond_with_token(&state, account)
}

#[instrument(skip(state, payload))]
pub async fn coach_register(
    State(state): State<AppState>,
    Json(mut payload): Json<CoachRegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredCoach>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation("password too short".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }
    if payload.school.trim().is_empty() {
        return Err(ApiError::Validation("school is required".into()));
    }

    let coach = repo::create(
        state.store.as_ref(),
        AccountKind::Coach,
        NewAccount {
            email: payload.email,
            password_hash: hash_password(&payload.password)?,
            is_active: true,
            is_verified: false,
            name: Some(payload.name.trim().to_string()),
            school: Some(payload.school.trim().to_string()),
            title: payload.title,
            state: payload.state,
        },
    )
    .await?;

    info!(coach_id = %coach.id, "coach registered, pending verification");
    Ok((
        StatusCode::CREATED,
        Json(RegisteredCoach {
            id: coach.id,
            email: coach.email,
            name: coach.name,
            school: coach.school,
            message: "registration successful; your account is pending verification".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn coach_login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("invalid email".into()));
    }

    let account = repo::find_by_email(state.store.as_ref(), AccountKind::Coach, &payload.email)
        .await?
        .ok_or(ApiError::Unauthorized("invalid email or password"))?;

    if !verify_password(&payload.password, &account.password_hash) {
        warn!(account_id = %account.id, "coach login with invalid password");
        return Err(ApiError::Unauthorized("invalid email or password"));
    }
    if !account.is_active {
        return Err(ApiError::Unauthorized("account is disabled"));
    }
    // Login succeeds with a clear message while the account is unverified;
    // coach resources still reject the token at the gate.
    if state.config.require_coach_verification && !account.is_verified {
        return Err(ApiError::Forbidden(
            "account pending verification; wait for admin approval",
        ));
    }

    respond_with_token(&state, account)
}

#[instrument(skip(state))]
pub async fn staff_me(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
) -> Result<Json<Account>, ApiError> {
    let account = repo::find_by_id(state.store.as_ref(), AccountKind::Staff, claims.sub)
        .await?
        .ok_or(ApiError::NotFound("user not found"))?;
    Ok(Json(account))
}

#[instrument(skip_all)]
pub async fn coach_me(coach: ActiveCoach) -> Json<Account> {
    Json(coach.account)
}

fn respond_with_token(state: &AppState, account: Account) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(account.id, &account.email, account.role)?;
    info!(account_id = %account.id, role = ?account.role, "login successful");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser {
            id: account.id,
            email: account.email,
            role: account.role,
            name: account.name,
            school: account.school,
        },
    }))
}
