use crate::settings::{Character, GameSpeed};
use serde::{Deserialize, Serialize};

/// All commands the presentation layer may issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Care ──────────────────────────────────────
    Feed,
    Wash,
    Play,
    Rest,

    // ── Lifecycle ─────────────────────────────────
    Pause,
    Resume,
    Reset,
    SaveGame,
    SaveBestTimeNow,

    // ── Settings ──────────────────────────────────
    SetPetName { name: String },
    SetCharacter { character: Character },
    SetGameSpeed { speed: GameSpeed },
    SaveSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_json() {
        let cmd: PlayerCommand = serde_json::from_str(r#"{"cmd":"feed"}"#).unwrap();
        assert_eq!(cmd, PlayerCommand::Feed);

        let cmd: PlayerCommand =
            serde_json::from_str(r#"{"cmd":"set_game_speed","speed":"fast"}"#).unwrap();
        assert_eq!(
            cmd,
            PlayerCommand::SetGameSpeed {
                speed: GameSpeed::Fast
            }
        );

        let cmd: PlayerCommand =
            serde_json::from_str(r#"{"cmd":"set_pet_name","name":"Pip"}"#).unwrap();
        assert_eq!(cmd, PlayerCommand::SetPetName { name: "Pip".into() });
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(serde_json::from_str::<PlayerCommand>(r#"{"cmd":"teleport"}"#).is_err());
    }
}
