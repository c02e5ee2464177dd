use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Guesses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Guesses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Guesses::LobbyId).uuid().not_null())
                    .col(ColumnDef::new(Guesses::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(Guesses::DisplayName).string().not_null())
                    .col(ColumnDef::new(Guesses::Text).string().not_null())
                    .col(ColumnDef::new(Guesses::RoundNumber).integer().not_null())
                    .col(ColumnDef::new(Guesses::MatchClass).string().not_null())
                    .col(
                        ColumnDef::new(Guesses::Points)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Guesses::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Guess log and leaderboard are always read per lobby
        manager
            .create_index(
                Index::create()
                    .name("idx_guesses_lobby_id")
                    .table(Guesses::Table)
                    .col(Guesses::LobbyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Guesses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Guesses {
    Table,
    Id,
    LobbyId,
    PlayerId,
    DisplayName,
    Text,
    RoundNumber,
    MatchClass,
    Points,
    SubmittedAt,
}
