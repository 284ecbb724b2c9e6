use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::{
    game_store::couchdb::error::CouchDaoError,
    models::{GameEntity, PlayerEntity},
};

pub const GAME_PREFIX: &str = "game::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Minimal projection used to read the current revision of a document.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub game: GameBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBody {
    pub question_number: i64,
    pub players: Vec<PlayerEntity>,
    #[serde(default)]
    pub buzz_order: Vec<String>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl From<(GameEntity, Option<String>)> for CouchGameDocument {
    fn from((game, rev): (GameEntity, Option<String>)) -> Self {
        Self {
            id: game_doc_id(&game.id),
            rev,
            game: GameBody {
                question_number: game.question_number,
                players: game.players,
                buzz_order: game.buzz_order,
                created_at: game.created_at,
                updated_at: game.updated_at,
            },
        }
    }
}

impl TryFrom<CouchGameDocument> for GameEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchGameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_game_id(&doc.id)?,
            question_number: doc.game.question_number,
            players: doc.game.players,
            buzz_order: doc.game.buzz_order,
            created_at: doc.game.created_at,
            updated_at: doc.game.updated_at,
        })
    }
}

pub fn game_doc_id(id: &str) -> String {
    format!("{GAME_PREFIX}{id}")
}

pub fn extract_game_id(doc_id: &str) -> Result<String, CouchDaoError> {
    match doc_id.strip_prefix(GAME_PREFIX) {
        Some(id) if !id.is_empty() => Ok(id.to_owned()),
        Some(_) => Err(CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_owned(),
            kind: "empty game id",
        }),
        None => Err(CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_owned(),
            kind: "missing game prefix",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_ids_round_trip_through_prefix() {
        let doc_id = game_doc_id("ABCDEFGH");
        assert_eq!(doc_id, "game::ABCDEFGH");
        assert_eq!(extract_game_id(&doc_id).unwrap(), "ABCDEFGH");
    }

    #[test]
    fn foreign_doc_ids_are_rejected() {
        assert!(matches!(
            extract_game_id("playlist::X"),
            Err(CouchDaoError::InvalidDocId { .. })
        ));
        assert!(matches!(
            extract_game_id("game::"),
            Err(CouchDaoError::InvalidDocId { .. })
        ));
    }
}
