//! # 身份验证路由控制器
//!
//! 实现注册与登录接口。

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

use stockboard_core::store::error::StoreError;
use stockboard_core::store::port::User;

use crate::types::{ApiResponse, Claims, LoginRequest, LoginResponse, SignupRequest, UserResponse};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;

const JWT_EXPIRES_IN: i64 = 86400 * 7; // 7 days
const MIN_PASSWORD_LEN: usize = 6;

/// 用户注册
///
/// 邮箱统一转为小写，密码以 bcrypt 哈希保存。
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "鉴权 (Auth)",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "注册成功", body = ApiResponse<UserResponse>),
        (status = 400, description = "参数缺失、密码过短或邮箱已注册")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest("Password must be at least 6 characters".into()));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|_| ApiError::Internal("Failed to hash password".into()))?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        password_hash,
        created_at: Utc::now(),
    };

    match state.system_store.create_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::BadRequest("Email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!("New account created: {}", user.id);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(UserResponse::from(&user)))))
}

/// 用户登录
///
/// 验证邮箱和密码，颁发 JWT Token。
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "鉴权 (Auth)",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = ApiResponse<LoginResponse>),
        (status = 400, description = "邮箱或密码缺失"),
        (status = 401, description = "邮箱或密码错误")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }

    // 1. 获取用户
    let user = state
        .system_store
        .get_user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".into()))?;

    // 2. 验证密码
    let valid = bcrypt::verify(&req.password, &user.password_hash)
        .unwrap_or(false);

    if !valid {
        tracing::warn!("Failed login attempt for user {}", user.id);
        return Err(ApiError::Unauthorized("Invalid email or password".into()));
    }

    // 3. 生成 JWT
    let exp = u64::try_from((Utc::now() + Duration::seconds(JWT_EXPIRES_IN)).timestamp())
        .map_err(|_| ApiError::Internal("System clock before epoch".into()))?;
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.app_config.server.jwt_secret.as_bytes()),
    )
    .map_err(|_| ApiError::Internal("Failed to generate token".into()))?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        token,
        expires_in: JWT_EXPIRES_IN.unsigned_abs(),
        user: UserResponse::from(&user),
    })))
}
