use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Spin ticket already executed")]
    AlreadyExecuted,

    #[error("Spin ticket already finalized")]
    AlreadyFinalized,

    #[error("Spin ticket expired")]
    RewardExpired,

    #[error("No rewards available")]
    NoRewardsAvailable,

    #[error("All rewards exhausted")]
    AllRewardsExhausted,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// 稳定的机器可读错误码，调用方据此分支处理
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PermissionDenied => "FORBIDDEN",
            AppError::AlreadyExecuted => "ALREADY_EXECUTED",
            AppError::AlreadyFinalized => "ALREADY_FINALIZED",
            AppError::RewardExpired => "REWARD_EXPIRED",
            AppError::NoRewardsAvailable => "NO_REWARDS_AVAILABLE",
            AppError::AllRewardsExhausted => "ALL_REWARDS_EXHAUSTED",
            AppError::JwtError(_) => "AUTH_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (StatusCode::UNAUTHORIZED, msg.clone())
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::PermissionDenied => {
                log::warn!("Permission denied");
                (StatusCode::FORBIDDEN, "Permission denied".to_string())
            }
            AppError::AlreadyExecuted => {
                log::warn!("Rejected repeated spin execution");
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::AlreadyFinalized => {
                log::warn!("Rejected claim of finalized ticket");
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::RewardExpired => {
                log::warn!("Rejected operation on expired ticket");
                (StatusCode::GONE, self.to_string())
            }
            // 两类售罄在日志与错误码上保持区分:
            // NO_REWARDS_AVAILABLE = 候选集为空; ALL_REWARDS_EXHAUSTED = 重试期间被抢光
            AppError::NoRewardsAvailable => {
                log::warn!("Spin rejected: no eligible rewards");
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::AllRewardsExhausted => {
                log::warn!("Spin rejected: rewards exhausted during retries");
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message
            }
        }))
    }
}
