//! Raw key edges to discrete game actions (local side only)

use serde::{Deserialize, Serialize};

/// Hold time separating a short hop from a full jump
pub const JUMP_CHARGE_MS: u64 = 120;

/// One press or release of a physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEdge {
    pub key: char,
    pub pressed: bool,
    /// ms since match start
    pub at_ms: u64,
}

impl KeyEdge {
    /// Parse a `+k` / `-k` line into an edge
    pub fn parse(line: &str, at_ms: u64) -> Option<Self> {
        let mut chars = line.trim().chars();
        let pressed = match chars.next()? {
            '+' => true,
            '-' => false,
            _ => return None,
        };
        let key = chars.next()?.to_ascii_lowercase();
        if chars.next().is_some() {
            return None;
        }
        Some(Self {
            key,
            pressed,
            at_ms,
        })
    }
}

/// Discrete action set understood by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InputAction {
    /// Continuous flag; true while held
    MoveLeft { held: bool },
    MoveRight { held: bool },
    JumpPress,
    JumpRelease { held_ms: u64 },
    Block,
    LightAttack,
    HeavyAttack,
    SpecialAttack,
    SuperAttack,
    TagPrev,
    TagNext,
}

impl InputAction {
    /// Jump releases held past the charge time launch at full height
    pub fn is_full_jump(held_ms: u64) -> bool {
        held_ms > JUMP_CHARGE_MS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub left: char,
    pub right: char,
    pub jump: char,
    pub block: char,
    pub light: char,
    pub heavy: char,
    pub special: char,
    pub super_attack: char,
    pub tag_prev: char,
    pub tag_next: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left: 'a',
            right: 'd',
            jump: 'w',
            block: 's',
            light: 'j',
            heavy: 'k',
            special: 'l',
            super_attack: 'i',
            tag_prev: 'q',
            tag_next: 'e',
        }
    }
}

/// Edge-triggered mapper; remembers when the jump key went down
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    bindings: KeyBindings,
    jump_pressed_at: Option<u64>,
}

impl InputMapper {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            jump_pressed_at: None,
        }
    }

    pub fn translate(&mut self, edge: KeyEdge) -> Option<InputAction> {
        let b = &self.bindings;
        let key = edge.key;

        if key == b.left {
            return Some(InputAction::MoveLeft { held: edge.pressed });
        }
        if key == b.right {
            return Some(InputAction::MoveRight { held: edge.pressed });
        }
        if key == b.jump {
            return if edge.pressed {
                // Auto-repeat must not restart the charge
                if self.jump_pressed_at.is_some() {
                    return None;
                }
                self.jump_pressed_at = Some(edge.at_ms);
                Some(InputAction::JumpPress)
            } else {
                let start = self.jump_pressed_at.take()?;
                Some(InputAction::JumpRelease {
                    held_ms: edge.at_ms.saturating_sub(start),
                })
            };
        }

        // Everything else fires on press only
        if !edge.pressed {
            return None;
        }
        let action = if key == b.block {
            InputAction::Block
        } else if key == b.light {
            InputAction::LightAttack
        } else if key == b.heavy {
            InputAction::HeavyAttack
        } else if key == b.special {
            InputAction::SpecialAttack
        } else if key == b.super_attack {
            InputAction::SuperAttack
        } else if key == b.tag_prev {
            InputAction::TagPrev
        } else if key == b.tag_next {
            InputAction::TagNext
        } else {
            return None;
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(key: char, at_ms: u64) -> KeyEdge {
        KeyEdge {
            key,
            pressed: true,
            at_ms,
        }
    }

    fn release(key: char, at_ms: u64) -> KeyEdge {
        KeyEdge {
            key,
            pressed: false,
            at_ms,
        }
    }

    #[test]
    fn movement_keys_are_continuous() {
        let mut mapper = InputMapper::default();
        assert_eq!(
            mapper.translate(press('a', 0)),
            Some(InputAction::MoveLeft { held: true })
        );
        assert_eq!(
            mapper.translate(release('a', 10)),
            Some(InputAction::MoveLeft { held: false })
        );
        assert_eq!(
            mapper.translate(press('d', 20)),
            Some(InputAction::MoveRight { held: true })
        );
    }

    #[test]
    fn jump_charge_measures_hold() {
        let mut mapper = InputMapper::default();
        assert_eq!(mapper.translate(press('w', 1_000)), Some(InputAction::JumpPress));
        // key repeat
        assert_eq!(mapper.translate(press('w', 1_050)), None);
        assert_eq!(
            mapper.translate(release('w', 1_200)),
            Some(InputAction::JumpRelease { held_ms: 200 })
        );
        // release without a press
        assert_eq!(mapper.translate(release('w', 1_300)), None);
    }

    #[test]
    fn charge_threshold_is_exclusive() {
        assert!(!InputAction::is_full_jump(80));
        assert!(!InputAction::is_full_jump(JUMP_CHARGE_MS));
        assert!(InputAction::is_full_jump(JUMP_CHARGE_MS + 1));
    }

    #[test]
    fn attacks_and_tags_fire_on_press_only() {
        let mut mapper = InputMapper::default();
        let expected = [
            ('s', InputAction::Block),
            ('j', InputAction::LightAttack),
            ('k', InputAction::HeavyAttack),
            ('l', InputAction::SpecialAttack),
            ('i', InputAction::SuperAttack),
            ('q', InputAction::TagPrev),
            ('e', InputAction::TagNext),
        ];
        for (key, action) in expected {
            assert_eq!(mapper.translate(press(key, 0)), Some(action));
            assert_eq!(mapper.translate(release(key, 5)), None);
        }
        assert_eq!(mapper.translate(press('z', 0)), None);
    }

    #[test]
    fn parses_edge_lines() {
        assert_eq!(KeyEdge::parse("+J", 7), Some(press('j', 7)));
        assert_eq!(KeyEdge::parse(" -a \n", 9), Some(release('a', 9)));
        assert_eq!(KeyEdge::parse("j", 0), None);
        assert_eq!(KeyEdge::parse("+jk", 0), None);
        assert_eq!(KeyEdge::parse("", 0), None);
    }

    #[test]
    fn custom_bindings() {
        let mut mapper = InputMapper::new(KeyBindings {
            light: 'u',
            ..KeyBindings::default()
        });
        assert_eq!(mapper.translate(press('u', 0)), Some(InputAction::LightAttack));
        assert_eq!(mapper.translate(press('j', 0)), None);
    }
}
