use chrono::{DateTime, Utc};
use sea_orm::Condition;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 活动窗口实体
/// 概念说明:
/// - 一个奖品恰好属于一个活动，只有活动处于 live 状态时奖品才可被抽取
/// - end_date 为 NULL 表示不设截止（开放式活动）
/// - live 判定: is_active 且 now ∈ [start_date, end_date 或 +inf)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "spin_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 活动名称 (唯一)
    pub name: String,
    pub description: Option<String>,
    /// 生效时间（含）
    pub start_date: DateTime<Utc>,
    /// 截止时间（不含），NULL = 不设截止
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 活动当前是否处于 live 状态
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date <= now
            && self.end_date.map_or(true, |end| now < end)
    }
}

/// 构造 live 活动的查询条件（与 `Model::is_live` 语义一致，供资格查询复用）
pub fn live_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(Column::IsActive.eq(true))
        .add(Column::StartDate.lte(now))
        .add(
            Condition::any()
                .add(Column::EndDate.is_null())
                .add(Column::EndDate.gt(now)),
        )
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(start_offset_hours: i64, end_offset_hours: Option<i64>, is_active: bool) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            name: "Test Event".to_string(),
            description: None,
            start_date: now + Duration::hours(start_offset_hours),
            end_date: end_offset_hours.map(|h| now + Duration::hours(h)),
            is_active,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_open_ended_event_is_live() {
        let e = event(-1, None, true);
        assert!(e.is_live(Utc::now()));
    }

    #[test]
    fn test_bounded_event_is_live_inside_window() {
        let e = event(-1, Some(1), true);
        assert!(e.is_live(Utc::now()));
    }

    #[test]
    fn test_event_not_live_before_start() {
        let e = event(1, Some(2), true);
        assert!(!e.is_live(Utc::now()));
    }

    #[test]
    fn test_event_not_live_after_end() {
        let e = event(-2, Some(-1), true);
        assert!(!e.is_live(Utc::now()));
    }

    #[test]
    fn test_inactive_event_never_live() {
        let e = event(-1, None, false);
        assert!(!e.is_live(Utc::now()));
    }

    #[test]
    fn test_end_date_is_exclusive() {
        let now = Utc::now();
        let e = Model {
            end_date: Some(now),
            ..event(-1, Some(0), true)
        };
        assert!(!e.is_live(now));
    }
}
