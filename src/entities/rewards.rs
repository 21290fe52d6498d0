use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 奖品类型标签。`value` 字段按类型携带各自的负载:
/// cash -> {"amount_cents": ...}, item -> {"sku": ...},
/// points -> {"points": ...}, none -> 无负载（谢谢参与）
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reward_kind")]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "item")]
    Item,
    #[sea_orm(string_value = "points")]
    Points,
    #[sea_orm(string_value = "none")]
    None,
}

impl std::fmt::Display for RewardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardKind::Cash => write!(f, "cash"),
            RewardKind::Item => write!(f, "item"),
            RewardKind::Points => write!(f, "points"),
            RewardKind::None => write!(f, "none"),
        }
    }
}

/// 奖品配置实体
/// 概念说明:
/// - weight: 相对权重（非负浮点），引擎按当前候选集合计归一化，不要求合计为 1
/// - max_quantity: 发放总量上限 (NULL = 无限)
/// - current_quantity: 已发放数量，仅允许经带守卫条件的原子 UPDATE 递增
/// - version: 每次成功发放 +1，仅做审计追踪，守卫条件本身保证不超发
/// - display_order: 仅用于列表展示顺序，不参与抽取逻辑
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spin_rewards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 所属活动ID (指向 spin_events.id)
    pub event_id: i64,
    /// 奖品名称 (同一活动内唯一)
    pub name: String,
    pub description: Option<String>,
    pub kind: RewardKind,
    /// 类型相关的负载 (JSON)
    pub value: Option<Json>,
    /// 抽取权重
    pub weight: f64,
    /// 转盘扇区颜色
    pub color: Option<String>,
    /// 转盘扇区图标
    pub icon: Option<String>,
    /// 是否启用
    pub is_active: bool,
    /// 库存上限 (NULL = 无限)
    pub max_quantity: Option<i64>,
    /// 已发放数量
    pub current_quantity: i64,
    /// 发放审计版本号
    pub version: i64,
    pub display_order: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 剩余可发放数量 (None = 无限)
    pub fn remaining(&self) -> Option<i64> {
        self.max_quantity
            .map(|max| (max - self.current_quantity).max(0))
    }

    /// 是否还有可发放库存 (无限库存或已发放数未达上限)
    pub fn has_capacity(&self) -> bool {
        match self.max_quantity {
            None => true,
            Some(max) => self.current_quantity < max,
        }
    }

    /// 是否是限量奖品
    pub fn is_limited(&self) -> bool {
        self.max_quantity.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward(max_quantity: Option<i64>, current_quantity: i64) -> Model {
        Model {
            id: 1,
            event_id: 1,
            name: "Test Reward".to_string(),
            description: None,
            kind: RewardKind::Points,
            value: None,
            weight: 1.0,
            color: None,
            icon: None,
            is_active: true,
            max_quantity,
            current_quantity,
            version: 0,
            display_order: 0,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_unlimited_reward_always_has_capacity() {
        let r = reward(None, 1_000_000);
        assert!(r.has_capacity());
        assert_eq!(r.remaining(), None);
        assert!(!r.is_limited());
    }

    #[test]
    fn test_capped_reward_capacity() {
        let r = reward(Some(5), 4);
        assert!(r.has_capacity());
        assert_eq!(r.remaining(), Some(1));
        assert!(r.is_limited());
    }

    #[test]
    fn test_exhausted_reward_has_no_capacity() {
        let r = reward(Some(5), 5);
        assert!(!r.has_capacity());
        assert_eq!(r.remaining(), Some(0));
    }

    #[test]
    fn test_remaining_never_negative() {
        // 理论上不应出现，但守卫计算不应返回负数
        let r = reward(Some(5), 7);
        assert_eq!(r.remaining(), Some(0));
    }
}
