use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{TicketStatus, spin_ticket_entity};

use super::PaginatedResponse;
use super::reward::WonRewardResponse;

/// 抽奖券查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TicketQuery {
    /// 按状态过滤 (pending / claimed / expired)
    pub status: Option<TicketStatus>,
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}

/// 抽奖券响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinTicketResponse {
    /// 券ID
    pub id: i64,
    /// 所属用户ID
    pub user_id: i64,
    /// 状态
    pub status: TicketStatus,
    /// 已绑定的奖品ID (未抽为 None)
    pub reward_id: Option<i64>,
    /// 领取截止时间 (None = 不过期)
    pub expired_at: Option<DateTime<Utc>>,
    /// 领取时间
    pub claimed_at: Option<DateTime<Utc>>,
    /// 发放时间
    pub created_at: DateTime<Utc>,
}

impl From<spin_ticket_entity::Model> for SpinTicketResponse {
    fn from(m: spin_ticket_entity::Model) -> Self {
        SpinTicketResponse {
            id: m.id,
            user_id: m.user_id,
            status: m.status,
            reward_id: m.reward_id,
            expired_at: m.expired_at,
            claimed_at: m.claimed_at,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 抽奖（执行）结果响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinResultResponse {
    /// 抽奖后的券（reward_id 已绑定，状态仍为 pending 待领取）
    pub ticket: SpinTicketResponse,
    /// 抽中的奖品
    pub reward: WonRewardResponse,
}

/// 发券请求（管理端）
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct GrantTicketsRequest {
    /// 目标用户ID
    pub user_id: i64,
    /// 发放张数 (1-1000)
    pub count: i64,
    /// 领取截止时间 (None = 不过期)
    pub expired_at: Option<DateTime<Utc>>,
    /// 备注
    pub notes: Option<String>,
}

/// 发券结果响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GrantTicketsResponse {
    /// 实际发放张数
    pub granted: i64,
    /// 新发放的券ID列表
    pub ticket_ids: Vec<i64>,
}

/// 抽奖券分页响应
pub type TicketPageResponse = PaginatedResponse<SpinTicketResponse>;
