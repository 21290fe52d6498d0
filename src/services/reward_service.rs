use crate::database::DbPool;
use crate::entities::{event_entity as events, reward_entity as rewards};
use crate::error::AppResult;
use crate::models::EligibleRewardResponse;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

#[derive(Clone)]
pub struct RewardService {
    pool: DbPool,
}

impl RewardService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 当前可抽取的奖品集合。抽奖引擎与列表展示共用这一个查询。
    ///
    /// 资格条件: 奖品启用 + 所属活动处于开放窗口 + 仍有额度
    /// (max_quantity IS NULL OR current_quantity < max_quantity)。
    /// 库存条件放在 SQL 里而非内存过滤，保证与守卫更新看到同一判定。
    /// 排序固定为 display_order, id，累计遍历顺序因此稳定。
    pub async fn eligible_models<C: ConnectionTrait>(
        conn: &C,
        event_id: Option<i64>,
    ) -> AppResult<Vec<rewards::Model>> {
        let now = Utc::now();

        let live_ids: Vec<i64> = events::Entity::find()
            .filter(events::live_condition(now))
            .all(conn)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();

        if live_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut condition = Condition::all()
            .add(rewards::Column::IsActive.eq(true))
            .add(rewards::Column::EventId.is_in(live_ids))
            .add(
                Condition::any()
                    .add(rewards::Column::MaxQuantity.is_null())
                    .add(
                        Expr::col(rewards::Column::CurrentQuantity)
                            .lt(Expr::col(rewards::Column::MaxQuantity)),
                    ),
            );

        if let Some(id) = event_id {
            condition = condition.add(rewards::Column::EventId.eq(id));
        }

        let list = rewards::Entity::find()
            .filter(condition)
            .order_by_asc(rewards::Column::DisplayOrder)
            .order_by_asc(rewards::Column::Id)
            .all(conn)
            .await?;

        Ok(list)
    }

    /// 奖品列表（转盘展示），带剩余额度
    pub async fn list_eligible(
        &self,
        event_id: Option<i64>,
    ) -> AppResult<Vec<EligibleRewardResponse>> {
        let txn = self.pool.begin().await?;
        let list = Self::eligible_models(&txn, event_id).await?;
        txn.commit().await?;

        Ok(list.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RewardKind;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn live_event(id: i64) -> events::Model {
        events::Model {
            id,
            name: format!("Event {id}"),
            description: None,
            start_date: Utc::now() - Duration::hours(1),
            end_date: None,
            is_active: true,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn reward(id: i64, event_id: i64, max_quantity: Option<i64>) -> rewards::Model {
        rewards::Model {
            id,
            event_id,
            name: format!("Reward {id}"),
            description: None,
            kind: RewardKind::Points,
            value: Some(json!({"points": 100})),
            weight: 10.0,
            color: Some("#ff6b6b".to_string()),
            icon: None,
            is_active: true,
            max_quantity,
            current_quantity: 3,
            version: 3,
            display_order: 0,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_no_live_events_short_circuits() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<events::Model>::new()])
            .into_connection();

        let list = RewardService::eligible_models(&db, None).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_list_eligible_annotates_remaining() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![reward(1, 1, Some(10)), reward(2, 1, None)]])
            .into_connection();

        let list = RewardService::new(Arc::new(db))
            .list_eligible(None)
            .await
            .unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].stock_remaining, Some(7));
        assert_eq!(list[1].stock_remaining, None, "unlimited reward has no count");
    }
}
