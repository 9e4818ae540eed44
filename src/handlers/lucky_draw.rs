use crate::error::AppError;
use crate::middlewares::current_user_id;
use crate::models::*;
use crate::services::{ClaimService, LuckyDrawService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/lucky-draw/spin",
    tag = "lucky_draw",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抽奖完成（中奖或未中奖）", body = SpinResponse),
        (status = 401, description = "未授权"),
        (status = 429, description = "今日抽奖次数已用完"),
        (status = 503, description = "奖池为空")
    )
)]
/// 进行一次抽奖:
/// 1. 原子登记当日次数（超过上限返回 429）
/// 2. 按权重选择奖品（过滤停用 / 无库存奖品）
/// 3. 限量奖品条件扣减库存
/// 4. 实物奖品生成兑换码并返回结果
pub async fn spin(service: web::Data<LuckyDrawService>, req: HttpRequest) -> Result<HttpResponse> {
    let Some(user_id) = current_user_id(&req) else {
        return Ok(AppError::AuthError("Unauthorized".into()).error_response());
    };
    match service.spin(user_id).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/lucky-draw/claim",
    tag = "lucky_draw",
    request_body = ClaimRewardRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "兑奖成功", body = ClaimRewardResponse),
        (status = 400, description = "兑换码为空或奖品已过期"),
        (status = 401, description = "未授权"),
        (status = 404, description = "兑换码无效或已兑换"),
        (status = 409, description = "并发兑换冲突")
    )
)]
/// 使用兑换码兑奖
pub async fn claim(
    service: web::Data<ClaimService>,
    req: HttpRequest,
    body: web::Json<ClaimRewardRequest>,
) -> Result<HttpResponse> {
    let Some(user_id) = current_user_id(&req) else {
        return Ok(AppError::AuthError("Unauthorized".into()).error_response());
    };
    match service.claim(user_id, &body.claim_code).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/lucky-draw/rewards",
    tag = "lucky_draw",
    responses(
        (status = 200, description = "获取奖品列表成功", body = [RewardResponse])
    )
)]
/// 获取当前启用的奖品（公开接口）
pub async fn get_rewards(service: web::Data<LuckyDrawService>) -> Result<HttpResponse> {
    match service.list_rewards().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/lucky-draw/remaining-spins",
    tag = "lucky_draw",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取今日剩余次数成功", body = RemainingSpinsResponse),
        (status = 401, description = "未授权")
    )
)]
/// 今日剩余抽奖次数（按参考时区计算自然日）
pub async fn get_remaining_spins(
    service: web::Data<LuckyDrawService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(user_id) = current_user_id(&req) else {
        return Ok(AppError::AuthError("Unauthorized".into()).error_response());
    };
    match service.remaining_spins(user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/lucky-draw/history",
    tag = "lucky_draw",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取抽奖历史成功", body = [SpinHistoryItem]),
        (status = 401, description = "未授权")
    )
)]
/// 最近若干天的每日抽奖记录（倒序）
pub async fn get_history(
    service: web::Data<LuckyDrawService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(user_id) = current_user_id(&req) else {
        return Ok(AppError::AuthError("Unauthorized".into()).error_response());
    };
    match service.spin_history(user_id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn lucky_draw_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lucky-draw")
            .route("/spin", web::post().to(spin))
            .route("/claim", web::post().to(claim))
            .route("/rewards", web::get().to(get_rewards))
            .route("/remaining-spins", web::get().to(get_remaining_spins))
            .route("/history", web::get().to(get_history)),
    );
}
