use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::entities::{RewardKind, reward_entity};

/// 奖品列表查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RewardQuery {
    /// 限定活动ID (省略则跨所有开放中的活动)
    pub event_id: Option<i64>,
}

/// 可抽取奖品（转盘展示用）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EligibleRewardResponse {
    /// 奖品ID
    pub id: i64,
    /// 所属活动ID
    pub event_id: i64,
    /// 奖品名称
    pub name: String,
    /// 奖品描述
    pub description: Option<String>,
    /// 奖品类型
    pub kind: RewardKind,
    /// 类型相关负载 (cash 金额 / item SKU / points 点数)
    #[schema(value_type = Object)]
    pub value: Option<Value>,
    /// 相对权重
    pub weight: f64,
    /// 转盘扇区颜色
    pub color: Option<String>,
    /// 转盘扇区图标
    pub icon: Option<String>,
    /// 展示顺序
    pub display_order: i32,
    /// 剩余可发放数量 (None = 无限)
    pub stock_remaining: Option<i64>,
}

impl From<reward_entity::Model> for EligibleRewardResponse {
    fn from(m: reward_entity::Model) -> Self {
        let stock_remaining = m.remaining();
        EligibleRewardResponse {
            id: m.id,
            event_id: m.event_id,
            name: m.name,
            description: m.description,
            kind: m.kind,
            value: m.value,
            weight: m.weight,
            color: m.color,
            icon: m.icon,
            display_order: m.display_order,
            stock_remaining,
        }
    }
}

/// 抽中后返回给用户的奖品（隐藏库存与权重字段）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WonRewardResponse {
    /// 奖品ID
    pub id: i64,
    /// 奖品名称
    pub name: String,
    /// 奖品类型
    pub kind: RewardKind,
    /// 类型相关负载
    #[schema(value_type = Object)]
    pub value: Option<Value>,
    /// 转盘扇区颜色
    pub color: Option<String>,
    /// 转盘扇区图标
    pub icon: Option<String>,
}

impl From<reward_entity::Model> for WonRewardResponse {
    fn from(m: reward_entity::Model) -> Self {
        WonRewardResponse {
            id: m.id,
            name: m.name,
            kind: m.kind,
            value: m.value,
            color: m.color,
            icon: m.icon,
        }
    }
}

/// 奖品列表响应
pub type EligibleRewardListResponse = Vec<EligibleRewardResponse>;
