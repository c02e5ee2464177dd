use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{guesses, prelude::*};
use heardle_types::{GuessRecord, LeaderboardEntry, LobbyId, MatchClass, PlayerId};

/// A scored guess as handed over by the lobby, before it has a row id.
#[derive(Debug, Clone)]
pub struct NewGuess {
    pub lobby_id: LobbyId,
    pub player_id: PlayerId,
    pub display_name: String,
    pub text: String,
    pub round_number: u32,
    pub match_class: MatchClass,
    pub points: i32,
    pub submitted_at: DateTime<Utc>,
}

pub struct GuessRepository {
    db: DatabaseConnection,
}

impl GuessRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_record(model: guesses::Model) -> Result<GuessRecord> {
        let match_class = MatchClass::parse(&model.match_class)
            .ok_or_else(|| anyhow!("Unknown match class '{}' in guess {}", model.match_class, model.id))?;

        Ok(GuessRecord {
            id: model.id,
            lobby_id: model.lobby_id,
            player_id: model.player_id,
            display_name: model.display_name,
            text: model.text,
            round_number: model.round_number.max(0) as u32,
            match_class,
            points: model.points,
            submitted_at: model.submitted_at.to_rfc3339(),
        })
    }

    pub async fn record_guess(&self, guess: NewGuess) -> Result<GuessRecord> {
        let id = Uuid::new_v4();
        let guess_model = guesses::ActiveModel {
            id: sea_orm::ActiveValue::Set(id),
            lobby_id: sea_orm::ActiveValue::Set(guess.lobby_id),
            player_id: sea_orm::ActiveValue::Set(guess.player_id),
            display_name: sea_orm::ActiveValue::Set(guess.display_name),
            text: sea_orm::ActiveValue::Set(guess.text),
            round_number: sea_orm::ActiveValue::Set(guess.round_number as i32),
            match_class: sea_orm::ActiveValue::Set(guess.match_class.as_str().to_string()),
            points: sea_orm::ActiveValue::Set(guess.points),
            submitted_at: sea_orm::ActiveValue::Set(guess.submitted_at.into()),
        };

        Guesses::insert(guess_model).exec(&self.db).await?;

        let saved = Guesses::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("Failed to retrieve recorded guess"))?;

        Self::model_to_record(saved)
    }

    /// Every guess made in a lobby, oldest first.
    pub async fn find_by_lobby(&self, lobby_id: LobbyId) -> Result<Vec<GuessRecord>> {
        let models = Guesses::find()
            .filter(guesses::Column::LobbyId.eq(lobby_id))
            .order_by_asc(guesses::Column::SubmittedAt)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::model_to_record).collect()
    }

    /// Per-player point totals for a lobby, highest first.
    pub async fn lobby_totals(&self, lobby_id: LobbyId) -> Result<Vec<LeaderboardEntry>> {
        let records = self.find_by_lobby(lobby_id).await?;

        let mut totals: HashMap<PlayerId, LeaderboardEntry> = HashMap::new();
        for record in records {
            let entry = totals.entry(record.player_id).or_insert_with(|| LeaderboardEntry {
                player_id: record.player_id,
                display_name: record.display_name.clone(),
                points: 0,
                guesses: 0,
            });
            entry.points += record.points;
            entry.guesses += 1;
        }

        let mut totals: Vec<LeaderboardEntry> = totals.into_values().collect();
        totals.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        Ok(totals)
    }
}
