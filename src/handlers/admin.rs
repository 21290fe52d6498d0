use crate::models::*;
use crate::services::SpinService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 从请求扩展中获取用户ID（中间件在鉴权后注入）
fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/admin/tickets/grant",
    tag = "admin",
    request_body = GrantTicketsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "发券成功", body = GrantTicketsResponse),
        (status = 400, description = "数量不合法"),
        (status = 401, description = "未授权")
    )
)]
/// 为指定用户批量发放抽奖券（记录发放人与可选的领取截止时间）
pub async fn grant_tickets(
    service: web::Data<SpinService>,
    req: HttpRequest,
    body: web::Json<GrantTicketsRequest>,
) -> Result<HttpResponse> {
    let admin_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.grant_tickets(admin_id, &body.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": result,
            "message": "Tickets granted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/admin").route("/tickets/grant", web::post().to(grant_tickets)));
}
