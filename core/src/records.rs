//! Game records stored alongside combats
//!
//! Plain rows with an owner, a visibility flag and timestamps. Edits replace
//! fields directly and bump `updated_at` through `touch`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type GameId = Uuid;

/// Who is looking at a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub is_game_master: bool,
}

impl Viewer {
    pub fn game_master(user_id: UserId) -> Self {
        Self {
            user_id,
            is_game_master: true,
        }
    }

    pub fn player(user_id: UserId) -> Self {
        Self {
            user_id,
            is_game_master: false,
        }
    }
}

pub trait Visible {
    fn is_visible_to(&self, viewer: &Viewer) -> bool;
}

/// Records `viewer` may see, in their original order
pub fn visible_to<'a, T: Visible>(records: &'a [T], viewer: &Viewer) -> Vec<&'a T> {
    records.iter().filter(|r| r.is_visible_to(viewer)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    GameMaster,
    Player,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub game_master_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new(name: impl Into<String>, game_master_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            game_master_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Viewer for `user_id` with GM rights resolved against this game
    pub fn viewer(&self, user_id: UserId) -> Viewer {
        Viewer {
            user_id,
            is_game_master: user_id == self.game_master_id,
        }
    }
}

/// Membership row (`game_players`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePlayer {
    pub game_id: GameId,
    pub user_id: UserId,
    pub role: PlayerRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: Uuid,
    pub game_id: GameId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(default)]
    pub max_hp: Option<i32>,
    #[serde(default)]
    pub armor_class: Option<i32>,
    /// Shown to the whole party
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    pub fn new(game_id: GameId, owner_id: UserId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            game_id,
            owner_id,
            name: name.into(),
            max_hp: None,
            armor_class: None,
            is_public: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Visible for Character {
    fn is_visible_to(&self, viewer: &Viewer) -> bool {
        viewer.is_game_master || self.is_public || self.owner_id == viewer.user_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub game_id: GameId,
    pub owner_id: UserId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Public notes are handouts
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(game_id: GameId, owner_id: UserId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            game_id,
            owner_id,
            title: title.into(),
            body: String::new(),
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_handout(&self) -> bool {
        self.is_public
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.touch();
    }

    pub fn publish(&mut self, is_public: bool) {
        self.is_public = is_public;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Visible for Note {
    fn is_visible_to(&self, viewer: &Viewer) -> bool {
        self.is_public || self.owner_id == viewer.user_id || viewer.is_game_master
    }
}

/// Chat message; whispers are only seen by sender, recipient and GM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub game_id: GameId,
    pub sender_id: UserId,
    pub body: String,
    #[serde(default)]
    pub whisper_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(game_id: GameId, sender_id: UserId, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            game_id,
            sender_id,
            body: body.into(),
            whisper_to: None,
            created_at: Utc::now(),
        }
    }

    pub fn whisper(mut self, recipient: UserId) -> Self {
        self.whisper_to = Some(recipient);
        self
    }
}

impl Visible for Message {
    fn is_visible_to(&self, viewer: &Viewer) -> bool {
        match self.whisper_to {
            None => true,
            Some(recipient) => {
                viewer.is_game_master
                    || viewer.user_id == recipient
                    || viewer.user_id == self.sender_id
            }
        }
    }
}
