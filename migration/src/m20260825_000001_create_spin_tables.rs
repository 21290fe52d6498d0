use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

/// Spin Events (活动窗口表)
#[derive(DeriveIden)]
enum SpinEvents {
    Table,
    Id,
    Name,
    Description,
    StartDate,
    EndDate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// Spin Rewards (奖品配置表)
#[derive(DeriveIden)]
enum SpinRewards {
    Table,
    Id,
    EventId,
    Name,
    Description,
    Kind,
    Value,
    Weight,
    Color,
    Icon,
    IsActive,
    MaxQuantity,
    CurrentQuantity,
    Version,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}

/// Spin Tickets (抽奖券台账)
#[derive(DeriveIden)]
enum SpinTickets {
    Table,
    Id,
    UserId,
    Status,
    RewardId,
    ExpiredAt,
    ClaimedAt,
    Notes,
    CreatedById,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 初始表结构:
/// - spin_events: 时间窗口，end_date 为 NULL 表示不设截止
/// - spin_rewards: weight 为浮点权重（引擎内部归一化，不要求合计为 1）
///   max_quantity NULL = 无限库存; current_quantity 为已发放数量,
///   仅允许通过带守卫条件的原子 UPDATE 递增; version 每次发放 +1 仅做审计
/// - spin_tickets: 一行一次抽奖机会; pending + reward_id 非空表示
///   已抽中待领取（两阶段: 先抽后领）
///
/// 种子数据: 一个不设截止的 Launch Event 及五个奖品
/// （仅 Grand Prize 与 Coffee Voucher 限量）
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // enums
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("reward_kind"))
                    .values(vec![
                        Alias::new("cash"),
                        Alias::new("item"),
                        Alias::new("points"),
                        Alias::new("none"),
                    ])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("spin_ticket_status"))
                    .values(vec![
                        Alias::new("pending"),
                        Alias::new("claimed"),
                        Alias::new("expired"),
                    ])
                    .to_owned(),
            )
            .await?;

        // 活动窗口表
        manager
            .create_table(
                Table::create()
                    .table(SpinEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpinEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SpinEvents::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SpinEvents::Description).text().null())
                    .col(
                        ColumnDef::new(SpinEvents::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpinEvents::EndDate)
                            .timestamp_with_time_zone()
                            .null(), // NULL = 不设截止
                    )
                    .col(
                        ColumnDef::new(SpinEvents::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SpinEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(SpinEvents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 活动名称唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spin_events_name_unique")
                    .table(SpinEvents::Table)
                    .col(SpinEvents::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 奖品表
        manager
            .create_table(
                Table::create()
                    .table(SpinRewards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpinRewards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SpinRewards::Description).text().null())
                    .col(
                        ColumnDef::new(SpinRewards::Kind)
                            .custom(Alias::new("reward_kind"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(SpinRewards::Value).json_binary().null())
                    .col(ColumnDef::new(SpinRewards::Weight).double().not_null())
                    .col(ColumnDef::new(SpinRewards::Color).string_len(32).null())
                    .col(ColumnDef::new(SpinRewards::Icon).string_len(255).null())
                    .col(
                        ColumnDef::new(SpinRewards::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::MaxQuantity)
                            .big_integer()
                            .null(), // NULL = 无限库存
                    )
                    .col(
                        ColumnDef::new(SpinRewards::CurrentQuantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一活动内奖品名唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spin_rewards_event_name_unique")
                    .table(SpinRewards::Table)
                    .col(SpinRewards::EventId)
                    .col(SpinRewards::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spin_rewards_event")
                    .table(SpinRewards::Table)
                    .col(SpinRewards::EventId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(SpinRewards::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_spin_reward_event")
                            .from_tbl(SpinRewards::Table)
                            .from_col(SpinRewards::EventId)
                            .to_tbl(SpinEvents::Table)
                            .to_col(SpinEvents::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 抽奖券台账表
        manager
            .create_table(
                Table::create()
                    .table(SpinTickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpinTickets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SpinTickets::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpinTickets::Status)
                            .custom(Alias::new("spin_ticket_status"))
                            .not_null()
                            .default(Expr::cust("'pending'::spin_ticket_status")),
                    )
                    .col(ColumnDef::new(SpinTickets::RewardId).big_integer().null())
                    .col(
                        ColumnDef::new(SpinTickets::ExpiredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SpinTickets::ClaimedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SpinTickets::Notes).text().null())
                    .col(
                        ColumnDef::new(SpinTickets::CreatedById)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SpinTickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(SpinTickets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 用户查询券索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spin_tickets_user")
                    .table(SpinTickets::Table)
                    .col(SpinTickets::UserId)
                    .to_owned(),
            )
            .await?;

        // 奖品外键索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spin_tickets_reward")
                    .table(SpinTickets::Table)
                    .col(SpinTickets::RewardId)
                    .to_owned(),
            )
            .await?;

        // 外键（不加 ON DELETE CASCADE，台账须保留历史）
        manager
            .alter_table(
                Table::alter()
                    .table(SpinTickets::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_spin_ticket_reward")
                            .from_tbl(SpinTickets::Table)
                            .from_col(SpinTickets::RewardId)
                            .to_tbl(SpinRewards::Table)
                            .to_col(SpinRewards::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 初始化活动与奖品数据
        // 权重为相对值（引擎按总和归一化），仅两个实物奖限量
        let conn = manager.get_connection();
        let seed_event_sql = r#"
INSERT INTO spin_events (name, description, start_date, end_date, is_active)
VALUES ('Launch Event', 'Default open-ended spin event', NOW(), NULL, TRUE)
ON CONFLICT (name) DO NOTHING;
"#;
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            seed_event_sql.to_string(),
        ))
        .await?;

        let seed_rewards_sql = r#"
INSERT INTO spin_rewards (event_id, name, kind, value, weight, color, max_quantity, display_order)
SELECT e.id, r.name, r.kind::reward_kind, r.value::jsonb, r.weight, r.color, r.max_quantity, r.display_order
FROM spin_events e
CROSS JOIN (VALUES
 ('Grand Prize', 'cash', '{"amount_cents": 10000}', 0.5, '#f59e0b', 3::bigint, 0),          -- 大奖（限量3）
 ('Coffee Voucher', 'item', '{"sku": "coffee-voucher"}', 8.0, '#10b981', 200::bigint, 1),   -- 咖啡券（限量200）
 ('500 Points', 'points', '{"points": 500}', 15.0, '#3b82f6', NULL, 2),
 ('100 Points', 'points', '{"points": 100}', 30.0, '#8b5cf6', NULL, 3),
 ('Better Luck Next Time', 'none', NULL, 46.5, '#6b7280', NULL, 4)                          -- 谢谢参与
) AS r(name, kind, value, weight, color, max_quantity, display_order)
WHERE e.name = 'Launch Event'
ON CONFLICT (event_id, name) DO NOTHING;
"#;
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            seed_rewards_sql.to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：券 -> 奖品 -> 活动 -> 枚举
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(SpinTickets::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(SpinRewards::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(SpinEvents::Table).to_owned())
            .await?;

        manager
            .drop_type(
                Type::drop()
                    .name(Alias::new("spin_ticket_status"))
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("reward_kind")).to_owned())
            .await?;

        Ok(())
    }
}
