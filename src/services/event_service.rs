use crate::database::DbPool;
use crate::entities::event_entity as events;
use crate::error::AppResult;
use crate::models::EventResponse;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

#[derive(Clone)]
pub struct EventService {
    pool: DbPool,
}

impl EventService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 获取启用的活动列表（按开始时间倒序），is_live 按当前时刻计算。
    /// 活动配置由外部系统维护，此处只读。
    pub async fn list_events(&self) -> AppResult<Vec<EventResponse>> {
        let list = events::Entity::find()
            .filter(events::Column::IsActive.eq(true))
            .order_by_desc(events::Column::StartDate)
            .all(self.pool.as_ref())
            .await?;

        Ok(list.into_iter().map(Into::into).collect())
    }
}
