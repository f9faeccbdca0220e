//! Slot templates. Slot names are roles, not classes; every slot must be filled.

use crate::domain::model::{Focus, KitingStyle, Slot, TwoBoxMode};
use crate::utils::error::{PlannerError, Result};

use Slot::{Cc, Dps, Healer, Slow, Tank};

const BASE_TEMPLATES: [&[Slot]; 5] = [
    &[Tank, Healer],
    &[Tank, Healer, Dps],
    &[Tank, Healer, Slow, Dps],
    &[Tank, Healer, Slow, Dps, Dps],
    &[Tank, Healer, Slow, Cc, Dps, Dps],
];

const LEVELING_6BOX: &[Slot] = &[Tank, Healer, Cc, Dps, Dps, Dps];

// Hardcore: tank, Cleric, Shaman and Bard are mandatory; 5- and 6-box add dps.
const HARDCORE_TEMPLATES: [&[Slot]; 3] = [
    &[Tank, Healer, Slow, Cc],
    &[Tank, Healer, Slow, Cc, Dps],
    &[Tank, Healer, Slow, Cc, Dps, Dps],
];

pub const MIN_BOX: usize = 2;
pub const MAX_BOX: usize = 6;

pub fn get_template(box_size: usize, focus: Focus) -> Result<Vec<Slot>> {
    if !(MIN_BOX..=MAX_BOX).contains(&box_size) {
        return Err(PlannerError::UnsupportedBoxSize(box_size));
    }
    let slots = if focus == Focus::SoloRaid && box_size >= 4 {
        HARDCORE_TEMPLATES[box_size - 4]
    } else if box_size == 6 && focus == Focus::Leveling {
        LEVELING_6BOX
    } else {
        BASE_TEMPLATES[box_size - MIN_BOX]
    };
    Ok(slots.to_vec())
}

/// Final slot layout after 2-box play style and 3-box charm overrides.
pub fn resolve_slots(
    box_size: usize,
    focus: Focus,
    two_box_mode: TwoBoxMode,
    kiting_style: KitingStyle,
    require_charm: bool,
) -> Result<Vec<Slot>> {
    let template = get_template(box_size, focus)?;
    let slots = match (box_size, two_box_mode, kiting_style) {
        (2, TwoBoxMode::Traditional, _) => vec![Slot::Tank, Slot::Healer],
        (2, TwoBoxMode::PetTank, _) => vec![Slot::PetTank, Slot::PetPartner],
        (2, TwoBoxMode::EnchCharmTank, _) => vec![Slot::CharmTank, Slot::CharmPartner],
        (2, TwoBoxMode::Kiting, KitingStyle::Swarm) => {
            vec![Slot::KiterSwarm, Slot::KitePartnerSwarm]
        }
        (2, TwoBoxMode::Kiting, KitingStyle::FearSnare) => {
            vec![Slot::KiterFearSnare, Slot::KitePartnerFearSnare]
        }
        // The Enchanter tanks with a charmed pet; the third slot stays flexible.
        (3, _, _) if require_charm => vec![Slot::CharmTank, Slot::Healer, Slot::Dps],
        _ => template,
    };
    Ok(slots)
}
