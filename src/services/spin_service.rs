use crate::config::SpinConfig;
use crate::database::DbPool;
use crate::entities::{
    TicketState, TicketStatus, reward_entity as rewards, spin_ticket_entity as tickets,
};
use crate::error::{AppError, AppResult};
use crate::external::Broadcaster;
use crate::models::{
    GrantTicketsRequest, GrantTicketsResponse, PaginatedResponse, PaginationParams,
    SpinResultResponse, SpinTicketResponse, TicketPageResponse, TicketQuery,
};
use crate::services::RewardService;
use crate::utils::pick_weighted;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    UpdateResult,
};
use serde_json::json;
use std::time::Duration;

/// 单次发券数量上限
const MAX_GRANT_BATCH: i64 = 1000;

#[derive(Clone)]
pub struct SpinService {
    pool: DbPool,
    config: SpinConfig,
    broadcaster: Broadcaster,
}

impl SpinService {
    pub fn new(pool: DbPool, config: SpinConfig, broadcaster: Broadcaster) -> Self {
        Self {
            pool,
            config,
            broadcaster,
        }
    }

    /// 执行抽奖 (Execute)
    ///
    /// 逻辑:
    /// 1. 事务内重抓券并校验: 存在、归属、pending 且未绑定奖品、未过截止
    /// 2. 事务内读取候选集合（启用 + 活动开放 + 有余量）
    /// 3. 按权重随机选中一个候选
    /// 4. 原子条件更新预占库存（单条带守卫的 UPDATE，不做读后写），
    ///    零行生效视为并发竞争，回滚整轮并按退避重试
    /// 5. 同一事务内以带守卫的单条 UPDATE 把奖品绑定到券（仍要求
    ///    pending 且未绑定），零行生效说明券已被并发占用，整个事务
    ///    回滚（预占的库存随之退回）并报 AlreadyExecuted；绑定后
    ///    状态仍为 pending，领取是独立阶段
    /// 6. 提交后广播中奖事件
    pub async fn execute_spin(
        &self,
        user_id: i64,
        ticket_id: i64,
    ) -> AppResult<SpinResultResponse> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff_ms = self.config.initial_backoff_ms;

        for attempt in 1..=max_attempts {
            let txn = self.pool.begin().await?;

            // 每轮重抓券并重验前置条件，同一张券的并发调用只有一个能通过
            let ticket = Self::fetch_owned_ticket(&txn, user_id, ticket_id).await?;

            if ticket.status == TicketStatus::Pending && ticket.is_past_deadline(Utc::now()) {
                Self::persist_expiration(txn, ticket.id).await?;
                return Err(AppError::RewardExpired);
            }

            match ticket.state() {
                TicketState::Pending => {}
                TicketState::Assigned { .. } | TicketState::Claimed { .. } => {
                    return Err(AppError::AlreadyExecuted);
                }
                TicketState::Expired { .. } => return Err(AppError::RewardExpired),
            }

            // 候选集合在本事务内读取，与守卫更新基于同一判定
            let candidates = RewardService::eligible_models(&txn, None).await?;
            if candidates.is_empty() {
                // 第一轮为空是奖池空档；重试轮为空说明奖池刚被并发抽干
                return if attempt == 1 {
                    Err(AppError::NoRewardsAvailable)
                } else {
                    Err(AppError::AllRewardsExhausted)
                };
            }

            let weights: Vec<f64> = candidates.iter().map(|r| r.weight).collect();
            let selected = {
                let mut rng = rand::thread_rng();
                pick_weighted(&mut rng, &weights)
            };
            let chosen = match selected {
                Some(idx) => &candidates[idx],
                None => return Err(AppError::NoRewardsAvailable),
            };

            let update_result: UpdateResult = rewards::Entity::update_many()
                .col_expr(
                    rewards::Column::CurrentQuantity,
                    Expr::col(rewards::Column::CurrentQuantity).add(1),
                )
                .col_expr(
                    rewards::Column::Version,
                    Expr::col(rewards::Column::Version).add(1),
                )
                .filter(rewards::Column::Id.eq(chosen.id))
                .filter(rewards::Column::IsActive.eq(true))
                .filter(
                    Condition::any()
                        .add(rewards::Column::MaxQuantity.is_null())
                        .add(
                            Expr::col(rewards::Column::CurrentQuantity)
                                .lt(Expr::col(rewards::Column::MaxQuantity)),
                        ),
                )
                .exec(&txn)
                .await?;

            if update_result.rows_affected == 0 {
                // 选中的奖品在快照与写入之间被并发赢家抽干
                let chosen_id = chosen.id;
                txn.rollback().await?;

                if attempt == max_attempts {
                    // 重试额度用尽，按奖池现状归类
                    let still_eligible =
                        RewardService::eligible_models(self.pool.as_ref(), None).await?;
                    return if still_eligible.is_empty() {
                        Err(AppError::AllRewardsExhausted)
                    } else {
                        Err(AppError::InternalError(format!(
                            "Reward reservation still contended after {} attempts",
                            max_attempts
                        )))
                    };
                }

                log::info!(
                    "Reward {} contended on attempt {}/{}, retrying in {}ms",
                    chosen_id,
                    attempt,
                    max_attempts,
                    backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = backoff_ms.saturating_mul(2);
                continue;
            }

            // 预占成功：重读最新库存，并在同一事务里绑定到券
            let secured = rewards::Entity::find_by_id(chosen.id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError(
                        "Reward disappeared after successful reservation".into(),
                    )
                })?;

            // 券侧同样是带守卫的单条 UPDATE，同一张券的并发调用只有一个能绑定
            let bind_result: UpdateResult = tickets::Entity::update_many()
                .set(tickets::ActiveModel {
                    reward_id: Set(Some(secured.id)),
                    updated_at: Set(Some(Utc::now())),
                    ..Default::default()
                })
                .filter(tickets::Column::Id.eq(ticket.id))
                .filter(tickets::Column::Status.eq(TicketStatus::Pending))
                .filter(tickets::Column::RewardId.is_null())
                .exec(&txn)
                .await?;

            if bind_result.rows_affected == 0 {
                // 回滚让预占的那一件库存退回奖池
                txn.rollback().await?;
                return Err(AppError::AlreadyExecuted);
            }

            let bound = tickets::Entity::find_by_id(ticket.id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError("Spin ticket disappeared after binding".into())
                })?;

            txn.commit().await?;

            // 提交之后才对外广播，回滚的预占不发事件
            self.broadcaster.notify(
                "spin.reward-won",
                json!({
                    "user_id": user_id,
                    "ticket_id": bound.id,
                    "reward_id": secured.id,
                    "reward_name": secured.name,
                    "reward_kind": secured.kind,
                }),
            );

            log::info!(
                "User {} won reward {} ({}) with ticket {}",
                user_id,
                secured.id,
                secured.name,
                bound.id
            );

            return Ok(SpinResultResponse {
                ticket: bound.into(),
                reward: secured.into(),
            });
        }

        Err(AppError::InternalError(
            "Spin retry loop exited without a result".into(),
        ))
    }

    /// 领取已抽中的奖品
    ///
    /// 终态券（claimed / expired）拒绝；截止时间已过先落库过期再报错；
    /// 未抽过的券不可领取。定格动作是带守卫的单条 UPDATE（仍要求
    /// pending 且已绑定奖品），并发领取只有一个能生效。
    /// 领取不触碰库存，库存在抽取阶段已经提交。
    pub async fn claim(&self, user_id: i64, ticket_id: i64) -> AppResult<SpinTicketResponse> {
        let txn = self.pool.begin().await?;

        let ticket = Self::fetch_owned_ticket(&txn, user_id, ticket_id).await?;
        let now = Utc::now();

        match ticket.state() {
            TicketState::Claimed { .. } | TicketState::Expired { .. } => {
                Err(AppError::AlreadyFinalized)
            }
            TicketState::Pending | TicketState::Assigned { .. }
                if ticket.is_past_deadline(now) =>
            {
                Self::persist_expiration(txn, ticket.id).await?;
                Err(AppError::RewardExpired)
            }
            TicketState::Pending => Err(AppError::ValidationError(
                "Spin ticket has no reward to claim yet".into(),
            )),
            TicketState::Assigned { .. } => {
                let update_result: UpdateResult = tickets::Entity::update_many()
                    .set(tickets::ActiveModel {
                        status: Set(TicketStatus::Claimed),
                        claimed_at: Set(Some(now)),
                        updated_at: Set(Some(now)),
                        ..Default::default()
                    })
                    .filter(tickets::Column::Id.eq(ticket.id))
                    .filter(tickets::Column::Status.eq(TicketStatus::Pending))
                    .filter(tickets::Column::RewardId.is_not_null())
                    .exec(&txn)
                    .await?;

                // 零行生效说明另一并发调用已抢先把券置为终态
                if update_result.rows_affected == 0 {
                    txn.rollback().await?;
                    return Err(AppError::AlreadyFinalized);
                }

                let claimed = tickets::Entity::find_by_id(ticket.id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        AppError::InternalError("Spin ticket disappeared after claim".into())
                    })?;
                txn.commit().await?;

                log::info!("User {} claimed spin ticket {}", user_id, claimed.id);
                Ok(claimed.into())
            }
        }
    }

    /// 获取当前用户的抽奖券（分页，可按状态过滤）
    pub async fn list_tickets(
        &self,
        user_id: i64,
        query: &TicketQuery,
    ) -> AppResult<TicketPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);
        let offset = params.get_offset();
        let limit = params.get_limit();

        let mut base_query = tickets::Entity::find().filter(tickets::Column::UserId.eq(user_id));
        if let Some(status) = &query.status {
            base_query = base_query.filter(tickets::Column::Status.eq(status.clone()));
        }

        let total = base_query.clone().count(self.pool.as_ref()).await? as i64;

        let items_models = base_query
            .order_by(tickets::Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.pool.as_ref())
            .await?;

        let items: Vec<SpinTicketResponse> = items_models.into_iter().map(Into::into).collect();

        Ok(PaginatedResponse::new(
            items,
            params.get_page(),
            limit,
            total,
        ))
    }

    /// 为用户发放抽奖券（管理端触发），一个事务内批量插入
    pub async fn grant_tickets(
        &self,
        admin_id: i64,
        req: &GrantTicketsRequest,
    ) -> AppResult<GrantTicketsResponse> {
        if req.count <= 0 {
            return Err(AppError::ValidationError(
                "Count to grant must be positive".into(),
            ));
        }
        if req.count > MAX_GRANT_BATCH {
            return Err(AppError::ValidationError(format!(
                "Count to grant must not exceed {MAX_GRANT_BATCH}"
            )));
        }

        let txn = self.pool.begin().await?;

        let mut ticket_ids = Vec::with_capacity(req.count as usize);
        for _ in 0..req.count {
            let created = tickets::ActiveModel {
                user_id: Set(req.user_id),
                status: Set(TicketStatus::Pending),
                expired_at: Set(req.expired_at),
                notes: Set(req.notes.clone()),
                created_by_id: Set(Some(admin_id)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            ticket_ids.push(created.id);
        }

        txn.commit().await?;

        log::info!(
            "Granted {} spin tickets to user {} by admin {}",
            req.count,
            req.user_id,
            admin_id
        );

        Ok(GrantTicketsResponse {
            granted: req.count,
            ticket_ids,
        })
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    async fn fetch_owned_ticket<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        ticket_id: i64,
    ) -> AppResult<tickets::Model> {
        let ticket = tickets::Entity::find_by_id(ticket_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Spin ticket {} not found", ticket_id)))?;

        if ticket.user_id != user_id {
            return Err(AppError::PermissionDenied);
        }

        Ok(ticket)
    }

    /// 把过期状态落库并提交；调用方随后返回 RewardExpired。
    /// 守卫在 pending 上，已被并发置为终态的行不再改写。
    /// 该写入独立于失败的主操作持久化。
    async fn persist_expiration(txn: DatabaseTransaction, ticket_id: i64) -> AppResult<()> {
        let result: UpdateResult = tickets::Entity::update_many()
            .set(tickets::ActiveModel {
                status: Set(TicketStatus::Expired),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(tickets::Column::Id.eq(ticket_id))
            .filter(tickets::Column::Status.eq(TicketStatus::Pending))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        if result.rows_affected == 1 {
            log::info!("Spin ticket {} expired lazily", ticket_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BroadcastConfig;
    use crate::entities::{RewardKind, event_entity as events};
    use chrono::Duration as ChronoDuration;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn pending_ticket(id: i64, user_id: i64) -> tickets::Model {
        tickets::Model {
            id,
            user_id,
            status: TicketStatus::Pending,
            reward_id: None,
            expired_at: None,
            claimed_at: None,
            notes: None,
            created_by_id: Some(1),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn live_event(id: i64) -> events::Model {
        events::Model {
            id,
            name: format!("Event {id}"),
            description: None,
            start_date: Utc::now() - ChronoDuration::hours(1),
            end_date: None,
            is_active: true,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn capped_reward(id: i64, event_id: i64) -> rewards::Model {
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
            max_quantity: Some(10),
            current_quantity: 3,
            version: 3,
            display_order: 0,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn service(db: DatabaseConnection) -> SpinService {
        SpinService::new(
            Arc::new(db),
            SpinConfig {
                max_attempts: 3,
                initial_backoff_ms: 1,
            },
            Broadcaster::new(BroadcastConfig::default()),
        )
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn exec_contended() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }
    }

    #[tokio::test]
    async fn test_execute_spin_binds_reward_and_keeps_pending() {
        let ticket = pending_ticket(10, 7);
        let reward = capped_reward(5, 1);
        let mut reserved = reward.clone();
        reserved.current_quantity = 4;
        reserved.version = 4;
        let mut bound = ticket.clone();
        bound.reward_id = Some(5);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket]])
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![reward]])
            // 库存预占 + 绑定券，两条守卫 UPDATE 都生效
            .append_exec_results([exec_ok(), exec_ok()])
            .append_query_results([vec![reserved]])
            .append_query_results([vec![bound]])
            .into_connection();

        let result = service(db).execute_spin(7, 10).await.unwrap();

        assert_eq!(result.ticket.reward_id, Some(5));
        assert_eq!(result.ticket.status, TicketStatus::Pending, "claim is a separate phase");
        assert_eq!(result.reward.id, 5);
    }

    #[tokio::test]
    async fn test_execute_spin_retries_after_contention() {
        let ticket = pending_ticket(10, 7);
        let reward = capped_reward(5, 1);
        let mut reserved = reward.clone();
        reserved.current_quantity = 10;
        let mut bound = ticket.clone();
        bound.reward_id = Some(5);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // 第一轮：守卫更新零行生效
            .append_query_results([vec![ticket.clone()]])
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![reward.clone()]])
            // 第二轮：预占与绑定都成功
            .append_query_results([vec![ticket]])
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![reward]])
            .append_query_results([vec![reserved]])
            .append_query_results([vec![bound]])
            .append_exec_results([exec_contended(), exec_ok(), exec_ok()])
            .into_connection();

        let result = service(db).execute_spin(7, 10).await.unwrap();
        assert_eq!(result.ticket.reward_id, Some(5));
    }

    #[tokio::test]
    async fn test_execute_spin_rejects_ticket_bound_concurrently() {
        // 库存预占成功，但绑定券的守卫零行生效：
        // 另一并发调用已用掉这张券，本次必须整体回滚而不是重试
        let ticket = pending_ticket(10, 7);
        let reward = capped_reward(5, 1);
        let mut reserved = reward.clone();
        reserved.current_quantity = 4;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket]])
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![reward]])
            .append_query_results([vec![reserved]])
            .append_exec_results([exec_ok(), exec_contended()])
            .into_connection();

        let result = service(db).execute_spin(7, 10).await;
        assert!(matches!(result, Err(AppError::AlreadyExecuted)));
    }

    #[tokio::test]
    async fn test_execute_spin_exhausted_when_pool_drains_under_contention() {
        let ticket = pending_ticket(10, 7);
        let reward = capped_reward(5, 1);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket.clone()]])
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![reward.clone()]])
            .append_query_results([vec![ticket]])
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![reward]])
            // 重试额度用尽后的归类读取：奖池已空
            .append_query_results([vec![live_event(1)]])
            .append_query_results([Vec::<rewards::Model>::new()])
            .append_exec_results([exec_contended(), exec_contended()])
            .into_connection();

        let svc = SpinService::new(
            Arc::new(db),
            SpinConfig {
                max_attempts: 2,
                initial_backoff_ms: 1,
            },
            Broadcaster::new(BroadcastConfig::default()),
        );

        let result = svc.execute_spin(7, 10).await;
        assert!(matches!(result, Err(AppError::AllRewardsExhausted)));
    }

    #[tokio::test]
    async fn test_execute_spin_internal_error_when_pool_still_stocked() {
        let ticket = pending_ticket(10, 7);
        let reward = capped_reward(5, 1);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket.clone()]])
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![reward.clone()]])
            .append_query_results([vec![ticket]])
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![reward.clone()]])
            // 奖池里还有别的货，归类为内部重试失败而非售罄
            .append_query_results([vec![live_event(1)]])
            .append_query_results([vec![capped_reward(6, 1)]])
            .append_exec_results([exec_contended(), exec_contended()])
            .into_connection();

        let svc = SpinService::new(
            Arc::new(db),
            SpinConfig {
                max_attempts: 2,
                initial_backoff_ms: 1,
            },
            Broadcaster::new(BroadcastConfig::default()),
        );

        let result = svc.execute_spin(7, 10).await;
        assert!(matches!(result, Err(AppError::InternalError(_))));
    }

    #[tokio::test]
    async fn test_execute_spin_no_rewards_available() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending_ticket(10, 7)]])
            .append_query_results([Vec::<events::Model>::new()])
            .into_connection();

        let result = service(db).execute_spin(7, 10).await;
        assert!(matches!(result, Err(AppError::NoRewardsAvailable)));
    }

    #[tokio::test]
    async fn test_execute_spin_missing_ticket() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<tickets::Model>::new()])
            .into_connection();

        let result = service(db).execute_spin(7, 10).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_execute_spin_rejects_foreign_ticket() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending_ticket(10, 99)]])
            .into_connection();

        let result = service(db).execute_spin(7, 10).await;
        assert!(matches!(result, Err(AppError::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_execute_spin_rejects_already_assigned_ticket() {
        let mut ticket = pending_ticket(10, 7);
        ticket.reward_id = Some(3);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket]])
            .into_connection();

        let result = service(db).execute_spin(7, 10).await;
        assert!(matches!(result, Err(AppError::AlreadyExecuted)));
    }

    #[tokio::test]
    async fn test_execute_spin_expires_lapsed_ticket() {
        let mut ticket = pending_ticket(10, 7);
        ticket.expired_at = Some(Utc::now() - ChronoDuration::hours(1));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket]])
            // 过期状态经守卫 UPDATE 落库
            .append_exec_results([exec_ok()])
            .into_connection();

        let result = service(db).execute_spin(7, 10).await;
        assert!(matches!(result, Err(AppError::RewardExpired)));
    }

    #[tokio::test]
    async fn test_claim_sets_claimed_at() {
        let mut ticket = pending_ticket(10, 7);
        ticket.reward_id = Some(5);
        let mut claimed = ticket.clone();
        claimed.status = TicketStatus::Claimed;
        claimed.claimed_at = Some(Utc::now());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket]])
            .append_exec_results([exec_ok()])
            .append_query_results([vec![claimed]])
            .into_connection();

        let result = service(db).claim(7, 10).await.unwrap();

        assert_eq!(result.status, TicketStatus::Claimed);
        assert!(result.claimed_at.is_some());
        assert_eq!(result.reward_id, Some(5));
    }

    #[tokio::test]
    async fn test_claim_rejects_when_finalized_concurrently() {
        // 快照里券还可领取，定格守卫却零行生效：
        // 另一并发领取已抢先提交，本次得到终态冲突而不是改写 claimed_at
        let mut ticket = pending_ticket(10, 7);
        ticket.reward_id = Some(5);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket]])
            .append_exec_results([exec_contended()])
            .into_connection();

        let result = service(db).claim(7, 10).await;
        assert!(matches!(result, Err(AppError::AlreadyFinalized)));
    }

    #[tokio::test]
    async fn test_claim_twice_already_finalized() {
        let mut ticket = pending_ticket(10, 7);
        ticket.reward_id = Some(5);
        ticket.status = TicketStatus::Claimed;
        ticket.claimed_at = Some(Utc::now());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket]])
            .into_connection();

        let result = service(db).claim(7, 10).await;
        assert!(matches!(result, Err(AppError::AlreadyFinalized)));
    }

    #[tokio::test]
    async fn test_claim_past_deadline_expires_instead_of_claiming() {
        let mut ticket = pending_ticket(10, 7);
        ticket.reward_id = Some(5);
        ticket.expired_at = Some(Utc::now() - ChronoDuration::minutes(1));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket]])
            .append_exec_results([exec_ok()])
            .into_connection();

        let result = service(db).claim(7, 10).await;
        assert!(matches!(result, Err(AppError::RewardExpired)));
    }

    #[tokio::test]
    async fn test_claim_unexecuted_ticket_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending_ticket(10, 7)]])
            .into_connection();

        let result = service(db).claim(7, 10).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_claim_db_expired_ticket_already_finalized() {
        let mut ticket = pending_ticket(10, 7);
        ticket.status = TicketStatus::Expired;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket]])
            .into_connection();

        let result = service(db).claim(7, 10).await;
        assert!(matches!(result, Err(AppError::AlreadyFinalized)));
    }

    #[tokio::test]
    async fn test_grant_tickets_requires_positive_count() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let req = GrantTicketsRequest {
            user_id: 7,
            count: 0,
            expired_at: None,
            notes: None,
        };

        let result = service(db).grant_tickets(1, &req).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_grant_tickets_rejects_oversized_batch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let req = GrantTicketsRequest {
            user_id: 7,
            count: i64::MAX,
            expired_at: None,
            notes: None,
        };

        let result = service(db).grant_tickets(1, &req).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_grant_tickets_inserts_batch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending_ticket(101, 7)], vec![pending_ticket(102, 7)]])
            .into_connection();

        let req = GrantTicketsRequest {
            user_id: 7,
            count: 2,
            expired_at: Some(Utc::now() + ChronoDuration::days(7)),
            notes: Some("campaign batch".to_string()),
        };

        let result = service(db).grant_tickets(1, &req).await.unwrap();

        assert_eq!(result.granted, 2);
        assert_eq!(result.ticket_ids, vec![101, 102]);
    }

    #[tokio::test]
    async fn test_list_tickets_paginates() {
        let mut count_row = BTreeMap::new();
        count_row.insert("num_items", sea_orm::Value::BigInt(Some(2)));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row]])
            .append_query_results([vec![pending_ticket(11, 7), pending_ticket(10, 7)]])
            .into_connection();

        let query = TicketQuery {
            status: None,
            page: Some(1),
            per_page: Some(20),
        };
        let page = service(db).list_tickets(7, &query).await.unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.data[0].id, 11);
    }

    #[tokio::test]
    async fn test_list_tickets_normalizes_zero_paging() {
        let mut count_row = BTreeMap::new();
        count_row.insert("num_items", sea_orm::Value::BigInt(Some(1)));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row]])
            .append_query_results([vec![pending_ticket(10, 7)]])
            .into_connection();

        let query = TicketQuery {
            status: None,
            page: Some(0),
            per_page: Some(0),
        };
        let page = service(db).list_tickets(7, &query).await.unwrap();

        assert_eq!(page.page, 1, "page 0 reads as the first page");
        assert_eq!(page.page_size, 1);
        assert_eq!(page.total_pages, 1);
    }
}
