//! Create vote table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::PollId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::OptionId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::VoterName).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Vote::VoterEmail)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Vote::VoteValue).string_len(8).not_null())
                    .col(ColumnDef::new(Vote::Comment).text())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_poll")
                            .from(Vote::Table, Vote::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_option")
                            .from(Vote::Table, Vote::OptionId)
                            .to(PollOption::Table, PollOption::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vote_poll_id")
                    .table(Vote::Table)
                    .col(Vote::PollId)
                    .to_owned(),
            )
            .await?;

        // All of a voter's rows in one poll are read and replaced together
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_poll_voter")
                    .table(Vote::Table)
                    .col(Vote::PollId)
                    .col(Vote::VoterEmail)
                    .to_owned(),
            )
            .await?;

        // At most one row per (poll, option, voter)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_poll_option_voter_unique")
                    .table(Vote::Table)
                    .col(Vote::PollId)
                    .col(Vote::OptionId)
                    .col(Vote::VoterEmail)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    PollId,
    OptionId,
    VoterName,
    VoterEmail,
    #[iden = "vote"]
    VoteValue,
    Comment,
    CreatedAt,
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
}

#[derive(Iden)]
enum PollOption {
    Table,
    Id,
}
