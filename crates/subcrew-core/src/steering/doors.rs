//! Opening doors on the way and closing them behind.

use log::debug;
use subcrew_logic::access::AccessLevel;
use subcrew_logic::config::SteeringTuning;
use subcrew_logic::doors::{button_on_approach_side, button_on_node_side, should_be_open, DoorState};
use subcrew_logic::geometry::Vec2;

use super::{IndoorSteering, SteeringContext};
use crate::components::{Character, Door, DoorId};
use crate::events::{AgentAction, AiEvent};

/// Path nodes behind the cursor whose doors are still looked after.
const DOOR_LOOKBACK: usize = 5;

fn permitted(character: &Character, level: AccessLevel, lockdown: bool) -> bool {
    character.clearance.can_operate(level, lockdown).is_ok()
}

/// Whether `character`, coming from `from`, could open `door` by hand.
pub(super) fn can_access(character: &Character, door: &Door, from: Vec2, lockdown: bool, tuning: &SteeringTuning) -> bool {
    if !character.can_open_doors() || !door.powered || !door.state.can_toggle() {
        return false;
    }
    if door.integrated_buttons && permitted(character, door.access, lockdown) {
        return true;
    }
    door.buttons.iter().any(|b| {
        b.position.distance(&door.position) <= tuning.button_reach
            && button_on_node_side(door.passage, door.position, b.position, from)
            && permitted(character, b.access, lockdown)
    })
}

/// Button the character would press to open `door` on the way to `towards`.
fn opening_button(character: &Character, door: &Door, towards: Vec2, lockdown: bool, tuning: &SteeringTuning) -> Option<Vec2> {
    if !character.can_open_doors() || !door.powered || !door.state.can_toggle() {
        return None;
    }
    if door.integrated_buttons && permitted(character, door.access, lockdown) {
        return Some(door.position);
    }
    door.buttons
        .iter()
        .filter(|b| {
            b.position.distance(&door.position) <= tuning.button_reach
                && button_on_approach_side(door.passage, door.position, b.position, towards)
                && permitted(character, b.access, lockdown)
        })
        .map(|b| b.position)
        .min_by(|a, b| {
            a.distance(&character.position)
                .total_cmp(&b.distance(&character.position))
        })
}

/// Button on the character's own side, for closing a door behind them.
fn closing_button(character: &Character, door: &Door, lockdown: bool) -> Option<Vec2> {
    if !character.can_open_doors() || !door.powered || !door.state.can_toggle() {
        return None;
    }
    if door.integrated_buttons && permitted(character, door.access, lockdown) {
        return Some(door.position);
    }
    door.buttons
        .iter()
        .find(|b| {
            button_on_node_side(door.passage, door.position, b.position, character.position)
                && permitted(character, b.access, lockdown)
        })
        .map(|b| b.position)
}

fn press(steering: &mut IndoorSteering, ctx: &mut SteeringContext<'_>, door: DoorId, open: bool) {
    let changed = ctx.sub.door_mut(door).map(|d| d.operate(open)).unwrap_or(false);
    steering.button_timer = ctx.tuning.button_press_cooldown;
    steering.opened_door = if open { Some(door) } else { None };
    if changed {
        debug!(
            "{} {} door {door}",
            ctx.character.name,
            if open { "opens" } else { "closes" }
        );
        ctx.events.push(
            ctx.now,
            AiEvent::DoorInteraction {
                agent: ctx.entity,
                door,
                open,
            },
        );
    }
}

/// Walk the doors around the path cursor, opening the one ahead and closing
/// the one this agent left open behind. Handles at most one door per call.
pub(super) fn check_doors_in_path(steering: &mut IndoorSteering, ctx: &mut SteeringContext<'_>, target: Vec2) {
    let Some(path) = steering.path.as_ref() else {
        return;
    };
    if path.is_unreachable() {
        return;
    }
    let cursor = path.cursor();
    let agent = ctx.character.position;
    let margin = ctx.character.collider_radius * 2.0;
    let lockdown = ctx.sub.lockdown;

    for index in (cursor.saturating_sub(DOOR_LOOKBACK)..=cursor).rev() {
        let Some((node, _)) = path.node_at(index) else {
            continue;
        };
        let Some(door_id) = ctx.sub.waypoint(node).ok().and_then(|w| w.door) else {
            continue;
        };
        let Ok(door) = ctx.sub.door(door_id) else {
            continue;
        };
        if door.state == DoorState::Broken {
            continue;
        }
        let towards = path.node_at(index + 1).map_or(target, |(_, p)| p);
        let wanted_open = should_be_open(door.passage, door.position, agent, towards, margin);
        let is_open = door.state == DoorState::Open;
        if wanted_open == is_open {
            continue;
        }

        if !wanted_open {
            if steering.opened_door != Some(door_id) || steering.button_timer > 0.0 {
                continue;
            }
            let reachable = closing_button(ctx.character, door, lockdown)
                .is_some_and(|b| b.distance(&agent) <= ctx.tuning.button_reach);
            if reachable {
                press(steering, ctx, door_id, false);
                return;
            }
            continue;
        }

        match opening_button(ctx.character, door, towards, lockdown, ctx.tuning) {
            Some(button) => {
                if steering.button_timer <= 0.0 && button.distance(&agent) <= ctx.tuning.button_reach {
                    press(steering, ctx, door_id, true);
                }
            }
            None if ctx.character.can_break_doors() => {
                if steering.button_timer <= 0.0 && door.position.distance(&agent) <= margin + ctx.character.collider_radius + 1.0 {
                    steering.button_timer = ctx.tuning.button_press_cooldown;
                    ctx.events.push(
                        ctx.now,
                        AiEvent::Action {
                            agent: ctx.entity,
                            action: AgentAction::BreakDoor { door: door_id },
                        },
                    );
                }
            }
            None => {
                debug!("{}: door {door_id} can't be opened, giving up on path", ctx.character.name);
                if let Some(path) = steering.path.as_mut() {
                    path.mark_unreachable();
                }
            }
        }
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subcrew_logic::access::Department;
    use subcrew_logic::doors::Passage;

    use crate::components::ButtonPanel;

    fn door() -> Door {
        Door::new(0, Vec2::new(10.0, 0.0), Passage::Horizontal, [Some(0), Some(1)])
    }

    #[test]
    fn test_integrated_buttons_follow_access() {
        let tuning = SteeringTuning::default();
        let mut d = door();
        d.access = AccessLevel::Department(Department::Engineering);
        let engineer = Character::crew("Eng", Department::Engineering, 1);
        let cook = Character::crew("Cook", Department::Operations, 1);
        assert!(can_access(&engineer, &d, Vec2::new(8.0, 0.0), false, &tuning));
        assert!(!can_access(&cook, &d, Vec2::new(8.0, 0.0), false, &tuning));
    }

    #[test]
    fn test_panel_must_be_on_approach_side() {
        let tuning = SteeringTuning::default();
        let mut d = door();
        d.integrated_buttons = false;
        d.buttons.push(ButtonPanel {
            position: Vec2::new(9.0, 1.0),
            access: AccessLevel::Public,
        });
        let mate = Character::crew("Mate", Department::Operations, 1).at(Vec2::new(8.0, 0.0));
        assert!(can_access(&mate, &d, Vec2::new(8.0, 0.0), false, &tuning));
        assert!(!can_access(&mate, &d, Vec2::new(12.0, 0.0), false, &tuning));
        assert_eq!(
            opening_button(&mate, &d, Vec2::new(12.0, 0.0), false, &tuning),
            Some(Vec2::new(9.0, 1.0))
        );
        assert_eq!(opening_button(&mate, &d, Vec2::new(5.0, 0.0), false, &tuning), None);
    }

    #[test]
    fn test_creatures_never_press_buttons() {
        let tuning = SteeringTuning::default();
        let beast = Character::creature("Crawler");
        assert!(!can_access(&beast, &door(), Vec2::new(8.0, 0.0), false, &tuning));
        assert_eq!(closing_button(&beast, &door(), false), None);
    }

    #[test]
    fn test_lockdown_denies_ordinary_crew() {
        let tuning = SteeringTuning::default();
        let mate = Character::crew("Mate", Department::Operations, 1);
        let guard = Character::crew("Guard", Department::Security, 1);
        assert!(!can_access(&mate, &door(), Vec2::new(8.0, 0.0), true, &tuning));
        assert!(can_access(&guard, &door(), Vec2::new(8.0, 0.0), true, &tuning));
    }
}
