use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::event_entity;

/// 活动信息响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventResponse {
    /// 活动ID
    pub id: i64,
    /// 活动名称
    pub name: String,
    /// 活动描述
    pub description: Option<String>,
    /// 开始时间
    pub start_date: DateTime<Utc>,
    /// 结束时间 (None = 不设截止)
    pub end_date: Option<DateTime<Utc>>,
    /// 是否启用
    pub is_active: bool,
    /// 当前时刻是否处于开放窗口
    pub is_live: bool,
}

impl From<event_entity::Model> for EventResponse {
    fn from(m: event_entity::Model) -> Self {
        let is_live = m.is_live(Utc::now());
        EventResponse {
            id: m.id,
            name: m.name,
            description: m.description,
            start_date: m.start_date,
            end_date: m.end_date,
            is_active: m.is_active,
            is_live,
        }
    }
}

/// 活动列表响应
pub type EventListResponse = Vec<EventResponse>;
