/// 관리자 인증 경계
/// 인증 자체는 외부 협력자 영역이라 단순 비밀번호-고정 토큰 방식의 최소 구현만 둔다.
/// 비딩 엔진 코어는 이 모듈이 어떤 방식으로 토큰을 발급하는지 알지 못한다.
// region:    --- Imports
use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Admin Auth
pub const ADMIN_TOKEN: &str = "admin-authenticated";

#[derive(Debug, Deserialize)]
pub struct AuthCommand {
    pub password: Option<String>,
}

/// 비밀번호 검증 후 관리자 토큰 발급
pub async fn handle_admin_auth(
    State((_, ctx)): State<AppState>,
    Json(cmd): Json<AuthCommand>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if cmd.password.as_deref() == Some(ctx.admin_password.as_str()) {
        info!("{:<12} --> 관리자 인증 성공", "Auth");
        Ok(Json(serde_json::json!({
            "success": true,
            "token": ADMIN_TOKEN,
        })))
    } else {
        Err(ApiError::Unauthorized(
            "비밀번호가 올바르지 않습니다.".to_string(),
        ))
    }
}

/// 관리자 라우트 가드 미들웨어
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {ADMIN_TOKEN}"))
        .unwrap_or(false);

    if !authorized {
        return Err(ApiError::Unauthorized(
            "관리자 인증이 필요합니다.".to_string(),
        ));
    }
    Ok(next.run(req).await)
}
// endregion: --- Admin Auth
