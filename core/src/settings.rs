//! Player-chosen game settings.

use crate::types::Millis;
use serde::{Deserialize, Serialize};

pub const PET_NAME_MAX_CHARS: usize = 15;

/// The pet's skin. Stored as 1..=3.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    #[default]
    A,
    B,
    C,
}

impl Character {
    pub fn id(self) -> i64 {
        match self {
            Self::A => 1,
            Self::B => 2,
            Self::C => 3,
        }
    }

    /// Unknown ids fall back to the default skin.
    pub fn from_id(id: i64) -> Self {
        match id {
            2 => Self::B,
            3 => Self::C,
            1 => Self::A,
            other => {
                log::warn!("unknown character id {other}, using default");
                Self::default()
            }
        }
    }
}

/// How often decay applies. Stored as 0 (Medium) or 1 (Fast).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameSpeed {
    #[default]
    Medium,
    Fast,
}

impl GameSpeed {
    pub const ALL: [GameSpeed; 2] = [GameSpeed::Medium, GameSpeed::Fast];

    pub fn id(self) -> i64 {
        match self {
            Self::Medium => 0,
            Self::Fast => 1,
        }
    }

    /// Unknown ids fall back to Medium.
    pub fn from_id(id: i64) -> Self {
        match id {
            1 => Self::Fast,
            0 => Self::Medium,
            other => {
                log::warn!("unknown game speed {other}, using default");
                Self::default()
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "RawSettings")]
pub struct GameSettings {
    pet_name: String,
    pub character: Character,
    pub game_speed: GameSpeed,
    /// Cached for persistence round-trips only. GameState owns the live value.
    pub elapsed_ms: Millis,
}

#[derive(Deserialize)]
struct RawSettings {
    pet_name: String,
    character: Character,
    game_speed: GameSpeed,
    elapsed_ms: Millis,
}

impl From<RawSettings> for GameSettings {
    fn from(raw: RawSettings) -> Self {
        let mut settings = Self {
            pet_name: String::new(),
            character: raw.character,
            game_speed: raw.game_speed,
            elapsed_ms: raw.elapsed_ms,
        };
        settings.set_pet_name(&raw.pet_name);
        settings
    }
}

impl GameSettings {
    pub fn pet_name(&self) -> &str {
        &self.pet_name
    }

    /// Strips tab and line-break characters and keeps at most
    /// PET_NAME_MAX_CHARS characters.
    pub fn set_pet_name(&mut self, name: &str) {
        self.pet_name = sanitize_pet_name(name);
    }
}

pub fn sanitize_pet_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .take(PET_NAME_MAX_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pet_name_is_sanitized() {
        let mut s = GameSettings::default();
        s.set_pet_name("Mo\tchi\r\n");
        assert_eq!(s.pet_name(), "Mochi");

        s.set_pet_name("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(s.pet_name(), "abcdefghijklmno");
    }

    #[test]
    fn deserialized_names_are_sanitized() {
        let s: GameSettings = serde_json::from_str(
            r#"{"pet_name":"Pickle\nthe Grand Duke","character":"b","game_speed":"fast","elapsed_ms":0}"#,
        )
        .unwrap();
        assert_eq!(s.pet_name(), "Picklethe Grand");
        assert_eq!(s.character, Character::B);
        assert_eq!(s.game_speed, GameSpeed::Fast);
    }

    #[test]
    fn pet_name_limit_counts_chars_not_bytes() {
        let name = "ääääääääääääääääää";
        assert_eq!(sanitize_pet_name(name).chars().count(), PET_NAME_MAX_CHARS);
    }

    #[test]
    fn enum_ids_round_trip_and_fall_back() {
        for c in [Character::A, Character::B, Character::C] {
            assert_eq!(Character::from_id(c.id()), c);
        }
        for s in GameSpeed::ALL {
            assert_eq!(GameSpeed::from_id(s.id()), s);
        }
        assert_eq!(Character::from_id(9), Character::A);
        assert_eq!(Character::from_id(0), Character::A);
        assert_eq!(GameSpeed::from_id(-1), GameSpeed::Medium);
        assert_eq!(GameSpeed::from_id(7), GameSpeed::Medium);
    }
}
