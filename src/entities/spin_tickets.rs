use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "spin_ticket_status")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "claimed")]
    Claimed,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Pending => write!(f, "pending"),
            TicketStatus::Claimed => write!(f, "claimed"),
            TicketStatus::Expired => write!(f, "expired"),
        }
    }
}

/// 抽奖券台账实体
/// 概念说明:
/// - 一行代表一次可用的抽奖机会，由管理端发放（created_by_id 记录发放人）
/// - 两阶段设计: 先抽（绑定 reward_id，状态仍为 pending）后领（claimed）
/// - expired_at 为领取截止时间，过期在触达时惰性落库（无后台扫描）
/// - 状态只允许前向迁移: pending -> pending+reward -> claimed，
///   或从任意 pending 态 -> expired
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "spin_tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 持券用户ID
    pub user_id: i64,
    pub status: TicketStatus,
    /// 抽中的奖品ID (指向 spin_rewards.id)，抽取成功前为 NULL
    pub reward_id: Option<i64>,
    /// 领取截止时间 (NULL = 不过期)
    pub expired_at: Option<DateTime<Utc>>,
    /// 领取时间，领取成功时一次性写入
    pub claimed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// 发放人ID
    pub created_by_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 券生命周期的标签化视图。业务前置校验对它做模式匹配，
/// 使 "claimed 却没有奖品" 这类非法状态在领域层不可表达。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketState {
    /// 尚未抽取
    Pending,
    /// 已抽中待领取
    Assigned { reward_id: i64 },
    /// 已领取
    Claimed {
        reward_id: i64,
        claimed_at: DateTime<Utc>,
    },
    /// 已过期（抽中与否都可能过期）
    Expired { reward_id: Option<i64> },
}

impl Model {
    /// 从行数据推导标签化状态。
    /// 行数据异常（如 claimed 却缺奖品）归入最接近的合法状态并以日志暴露。
    pub fn state(&self) -> TicketState {
        match self.status {
            TicketStatus::Pending => match self.reward_id {
                None => TicketState::Pending,
                Some(reward_id) => TicketState::Assigned { reward_id },
            },
            TicketStatus::Claimed => match (self.reward_id, self.claimed_at) {
                (Some(reward_id), Some(claimed_at)) => TicketState::Claimed {
                    reward_id,
                    claimed_at,
                },
                _ => {
                    log::error!(
                        "Spin ticket {} is claimed but missing reward/claim fields",
                        self.id
                    );
                    TicketState::Expired {
                        reward_id: self.reward_id,
                    }
                }
            },
            TicketStatus::Expired => TicketState::Expired {
                reward_id: self.reward_id,
            },
        }
    }

    /// 领取截止时间是否已过
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.expired_at.map_or(false, |deadline| now > deadline)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
