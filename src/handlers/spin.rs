use crate::models::*;
use crate::services::{RewardService, SpinService};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 从请求扩展中获取用户ID（中间件在鉴权后注入）
fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/spin/rewards",
    tag = "spin",
    params(
        ("event_id" = Option<i64>, Query, description = "限定活动ID (省略则跨所有开放中的活动)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取奖品列表成功", body = [EligibleRewardResponse]),
        (status = 401, description = "未授权")
    )
)]
/// 获取当前可抽取的奖品列表（启用 + 活动开放 + 仍有库存），带剩余数量
pub async fn get_rewards(
    service: web::Data<RewardService>,
    query: web::Query<RewardQuery>,
) -> Result<HttpResponse> {
    match service.list_eligible(query.event_id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/spin/tickets",
    tag = "spin",
    params(
        ("status" = Option<String>, Query, description = "状态过滤 (pending / claimed / expired)"),
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取抽奖券列表成功", body = PaginatedResponse<SpinTicketResponse>),
        (status = 401, description = "未授权")
    )
)]
/// 分页获取当前用户的抽奖券（倒序，可按状态过滤）
pub async fn get_tickets(
    service: web::Data<SpinService>,
    req: HttpRequest,
    query: web::Query<TicketQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.list_tickets(user_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/spin/tickets/{id}/execute",
    tag = "spin",
    params(
        ("id" = i64, Path, description = "抽奖券ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抽奖成功，奖品已绑定待领取", body = SpinResultResponse),
        (status = 401, description = "未授权"),
        (status = 403, description = "券不属于当前用户"),
        (status = 404, description = "券不存在"),
        (status = 409, description = "券已使用 / 奖池无可用奖品"),
        (status = 410, description = "券已过期")
    )
)]
/// 用一张抽奖券执行一次抽奖:
/// 1. 校验券的归属与状态（pending 且未绑定奖品）
/// 2. 按权重在可抽取集合中随机选中一个奖品
/// 3. 原子条件更新预占库存，并发抢空时按退避重试
/// 4. 奖品绑定到券（状态仍为 pending，需另行领取）
pub async fn execute(
    service: web::Data<SpinService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let ticket_id = path.into_inner();
    match service.execute_spin(user_id, ticket_id).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/spin/tickets/{id}/claim",
    tag = "spin",
    params(
        ("id" = i64, Path, description = "抽奖券ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "领取成功", body = SpinTicketResponse),
        (status = 400, description = "券尚未抽奖"),
        (status = 401, description = "未授权"),
        (status = 403, description = "券不属于当前用户"),
        (status = 404, description = "券不存在"),
        (status = 409, description = "券已领取或已过期"),
        (status = 410, description = "领取截止时间已过")
    )
)]
/// 领取已抽中的奖品（把券从 pending+奖品 置为 claimed）
pub async fn claim(
    service: web::Data<SpinService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let ticket_id = path.into_inner();
    match service.claim(user_id, ticket_id).await {
        Ok(ticket) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": ticket }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn spin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/spin")
            .route("/rewards", web::get().to(get_rewards))
            .route("/tickets", web::get().to(get_tickets))
            .route("/tickets/{id}/execute", web::post().to(execute))
            .route("/tickets/{id}/claim", web::post().to(claim)),
    );
}
