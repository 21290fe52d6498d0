use crate::models::*;
use crate::services::EventService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/events",
    tag = "event",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取活动列表成功", body = [EventResponse]),
        (status = 401, description = "未授权")
    )
)]
/// 获取启用的活动列表（含当前是否开放），按开始时间倒序
pub async fn get_events(service: web::Data<EventService>) -> Result<HttpResponse> {
    match service.list_events().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn event_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/events").route("", web::get().to(get_events)));
}
