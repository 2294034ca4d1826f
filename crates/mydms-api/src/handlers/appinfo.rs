use crate::auth::AuthUser;
use axum::{response::IntoResponse, Json};
use mydms_core::models::{AppInfo, UserInfo, VersionInfo};

fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_number: option_env!("MYDMS_BUILD_NUMBER")
            .unwrap_or("local")
            .to_string(),
        build_date: option_env!("MYDMS_BUILD_DATE").unwrap_or("-").to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/appinfo",
    tag = "appinfo",
    responses(
        (status = 200, description = "Current user and build information", body = AppInfo)
    )
)]
pub async fn get_appinfo(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(AppInfo {
        user_info: UserInfo {
            display_name: user.display_name,
            user_id: user.user_id,
            user_name: user.username,
            email: user.email,
            roles: user.roles,
        },
        version_info: version_info(),
    })
}
