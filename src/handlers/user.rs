use crate::error::AppError;
use crate::middlewares::current_user_id;
use crate::models::*;
use crate::services::{ClaimService, LuckyDrawService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/user/rewards",
    tag = "user",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20, 最大100)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取中奖记录成功", body = UserRewardPageResponse),
        (status = 401, description = "未授权")
    )
)]
/// 分页获取用户中奖记录（倒序, 状态含 expired）
pub async fn get_rewards(
    service: web::Data<ClaimService>,
    req: HttpRequest,
    query: web::Query<UserRewardQuery>,
) -> Result<HttpResponse> {
    let Some(user_id) = current_user_id(&req) else {
        return Ok(AppError::AuthError("Unauthorized".into()).error_response());
    };
    match service.list_user_rewards(user_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/user/stats",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取抽奖统计成功", body = UserRewardStats),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_stats(
    service: web::Data<LuckyDrawService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(user_id) = current_user_id(&req) else {
        return Ok(AppError::AuthError("Unauthorized".into()).error_response());
    };
    match service.user_stats(user_id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/rewards", web::get().to(get_rewards))
            .route("/stats", web::get().to(get_stats)),
    );
}
