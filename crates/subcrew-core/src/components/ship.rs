//! The submarine: rooms (hulls), doors, ladders, waypoints, devices and containers.
//!
//! Ids are indices into the submarine's own tables and are handed out by the
//! `add_*` methods. Lookups return [`AiError`] for ids the submarine never issued.

use serde::{Deserialize, Serialize};
use subcrew_logic::access::AccessLevel;
use subcrew_logic::doors::{DoorState, Passage};
use subcrew_logic::geometry::{Rect, Vec2};
use subcrew_logic::hazard::{oxygen, FireSource, HullConditions};
use subcrew_logic::path::NodeId;
use subcrew_logic::pathfinding::WaypointGraph;

use super::character::Team;
use super::item::{Item, ItemId, ItemKind};
use crate::error::AiError;

pub type HullId = u32;
pub type DoorId = u32;
pub type LadderId = u32;
pub type DeviceId = u32;
pub type ContainerId = u32;

/// Door open/close speed (fraction per second).
const DOOR_SPEED: f32 = 3.0;
/// Devices below this condition need repair.
pub const REPAIR_THRESHOLD: f32 = 50.0;
/// Offset above the feet used to find which room a character stands in.
const FEET_OFFSET: f32 = 0.1;

/// A hole letting water in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breach {
    pub position: Vec2,
    /// 0 (sealed) to 1 (wide open).
    pub open: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hull {
    pub id: HullId,
    pub name: String,
    pub rect: Rect,
    /// Oxygen fraction (0.21 is normal air).
    pub oxygen: f32,
    /// 0..=100.
    pub water_percentage: f32,
    pub fires: Vec<FireSource>,
    pub breaches: Vec<Breach>,
    pub lethal_pressure: bool,
}

impl Hull {
    pub fn new(id: HullId, name: impl Into<String>, rect: Rect) -> Self {
        Self {
            id,
            name: name.into(),
            rect,
            oxygen: oxygen::NORMAL,
            water_percentage: 0.0,
            fires: Vec::new(),
            breaches: Vec::new(),
            lethal_pressure: false,
        }
    }

    pub fn water_surface(&self) -> f32 {
        self.rect.min_y() + self.rect.height * (self.water_percentage / 100.0).clamp(0.0, 1.0)
    }

    pub fn water_depth_at(&self, y: f32) -> f32 {
        (self.water_surface() - y).max(0.0)
    }

    pub fn fire_size(&self) -> f32 {
        self.fires.iter().map(|f| f.size).sum()
    }

    pub fn has_fire(&self) -> bool {
        !self.fires.is_empty()
    }

    pub fn open_breaches(&self) -> impl Iterator<Item = (usize, &Breach)> {
        self.breaches.iter().enumerate().filter(|(_, b)| b.open > 0.0)
    }
}

/// A separate button panel wired to a door.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonPanel {
    pub position: Vec2,
    pub access: AccessLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Door {
    pub id: DoorId,
    pub position: Vec2,
    pub passage: Passage,
    pub state: DoorState,
    /// Animation progress, 0 (shut) to 1 (fully open).
    pub open_amount: f32,
    /// Extent of the doorway along the wall/floor.
    pub size: f32,
    /// Hulls on either side; `None` is the open sea.
    pub hulls: [Option<HullId>; 2],
    pub powered: bool,
    /// Can be operated directly, without a separate panel.
    pub integrated_buttons: bool,
    /// Access level of the integrated buttons.
    pub access: AccessLevel,
    pub buttons: Vec<ButtonPanel>,
    /// 0..=100; smashed open at zero.
    pub integrity: f32,
}

impl Door {
    pub fn new(id: DoorId, position: Vec2, passage: Passage, hulls: [Option<HullId>; 2]) -> Self {
        Self {
            id,
            position,
            passage,
            state: DoorState::Closed,
            open_amount: 0.0,
            size: 2.0,
            hulls,
            powered: true,
            integrated_buttons: true,
            access: AccessLevel::Public,
            buttons: Vec::new(),
            integrity: 100.0,
        }
    }

    pub fn is_passable(&self) -> bool {
        self.state.passable()
    }

    pub fn is_fully_open(&self) -> bool {
        self.state == DoorState::Broken || (self.state == DoorState::Open && self.open_amount >= 0.9)
    }

    /// Press a button: set the door opening or closing. Returns whether anything changed.
    pub fn operate(&mut self, open: bool) -> bool {
        if !self.powered || !self.state.can_toggle() {
            return false;
        }
        let wanted = if open { DoorState::Open } else { DoorState::Closed };
        let changed = self.state != wanted;
        self.state = wanted;
        changed
    }

    pub fn break_open(&mut self) {
        self.state = DoorState::Broken;
        self.integrity = 0.0;
        self.open_amount = 1.0;
    }

    /// Batter the door. Returns `true` on the blow that breaks it.
    pub fn damage(&mut self, amount: f32) -> bool {
        if self.state == DoorState::Broken {
            return false;
        }
        self.integrity = (self.integrity - amount).max(0.0);
        if self.integrity <= 0.0 {
            self.break_open();
            return true;
        }
        false
    }

    pub fn connects(&self, hull: HullId) -> bool {
        self.hulls.contains(&Some(hull))
    }

    pub fn other_side(&self, hull: HullId) -> Option<HullId> {
        match self.hulls {
            [Some(a), b] if a == hull => b,
            [a, Some(b)] if b == hull => a,
            _ => None,
        }
    }

    fn animate(&mut self, dt: f32) {
        let target = match self.state {
            DoorState::Open | DoorState::Broken => 1.0,
            DoorState::Closed => 0.0,
            DoorState::Jammed | DoorState::Stuck => return,
        };
        if self.state == DoorState::Broken {
            self.open_amount = 1.0;
            return;
        }
        if !self.powered {
            return;
        }
        let step = DOOR_SPEED * dt;
        if self.open_amount < target {
            self.open_amount = (self.open_amount + step).min(target);
        } else {
            self.open_amount = (self.open_amount - step).max(target);
        }
    }
}

/// A doorless passage between two hulls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub position: Vec2,
    pub hulls: [Option<HullId>; 2],
    /// A closed opening is blocked by something that can't be operated.
    pub open: bool,
}

impl Opening {
    pub fn connects(&self, hull: HullId) -> bool {
        self.hulls.contains(&Some(hull))
    }

    pub fn other_side(&self, hull: HullId) -> Option<HullId> {
        match self.hulls {
            [Some(a), b] if a == hull => b,
            [a, Some(b)] if b == hull => a,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ladder {
    pub id: LadderId,
    pub x: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Ladder {
    pub fn spans(&self, y: f32) -> bool {
        y >= self.bottom - FEET_OFFSET && y <= self.top + FEET_OFFSET
    }
}

/// A navigation waypoint with what's at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: NodeId,
    pub position: Vec2,
    pub hull: Option<HullId>,
    pub door: Option<DoorId>,
    /// Index into the submarine's openings.
    pub opening: Option<usize>,
    pub ladder: Option<LadderId>,
    pub stairs: bool,
    pub links: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub hull: HullId,
    pub position: Vec2,
    /// 0..=100.
    pub condition: f32,
}

impl Device {
    pub fn needs_repair(&self) -> bool {
        self.condition < REPAIR_THRESHOLD
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub hull: HullId,
    pub position: Vec2,
    pub capacity: usize,
    pub items: Vec<Item>,
}

impl Container {
    pub fn has_room(&self) -> bool {
        self.items.len() < self.capacity
    }

    pub fn holds(&self, kind: ItemKind) -> bool {
        self.items.iter().any(|i| i.kind == kind)
    }

    pub fn take(&mut self, kind: ItemKind) -> Option<Item> {
        let index = self.items.iter().position(|i| i.kind == kind)?;
        Some(self.items.remove(index))
    }

    /// Put an item in; hands it back if full.
    pub fn put(&mut self, item: Item) -> Result<(), Item> {
        if !self.has_room() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }
}

/// An item lying loose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorItem {
    pub item: Item,
    pub hull: Option<HullId>,
    pub position: Vec2,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submarine {
    hulls: Vec<Hull>,
    doors: Vec<Door>,
    openings: Vec<Opening>,
    ladders: Vec<Ladder>,
    waypoints: Vec<Waypoint>,
    devices: Vec<Device>,
    containers: Vec<Container>,
    pub floor_items: Vec<FloorItem>,
    /// Ship-wide lockdown: only security and officers may use buttons.
    pub lockdown: bool,
    /// Team that owns the vessel and polices misconduct aboard it.
    pub owner: Team,
    next_item_id: ItemId,
}

impl Submarine {
    pub fn new() -> Self {
        Self::default()
    }

    // --- construction ---

    pub fn add_hull(&mut self, name: impl Into<String>, rect: Rect) -> HullId {
        let id = self.hulls.len() as HullId;
        self.hulls.push(Hull::new(id, name, rect));
        id
    }

    /// Add a door between two hulls. Returns its id; tweak it via [`door_mut`](Self::door_mut).
    pub fn add_door(&mut self, position: Vec2, passage: Passage, hulls: [Option<HullId>; 2]) -> DoorId {
        let id = self.doors.len() as DoorId;
        self.doors.push(Door::new(id, position, passage, hulls));
        id
    }

    pub fn add_opening(&mut self, position: Vec2, hulls: [Option<HullId>; 2]) -> usize {
        self.openings.push(Opening {
            position,
            hulls,
            open: true,
        });
        self.openings.len() - 1
    }

    pub fn add_ladder(&mut self, x: f32, bottom: f32, top: f32) -> LadderId {
        let id = self.ladders.len() as LadderId;
        self.ladders.push(Ladder { id, x, bottom, top });
        id
    }

    /// Add a plain waypoint; the hull is inferred from the position.
    pub fn add_waypoint(&mut self, position: Vec2) -> NodeId {
        let id = self.waypoints.len() as NodeId;
        let hull = self.hull_at_feet(position);
        self.waypoints.push(Waypoint {
            id,
            position,
            hull,
            door: None,
            opening: None,
            ladder: None,
            stairs: false,
            links: Vec::new(),
        });
        id
    }

    pub fn add_door_waypoint(&mut self, door: DoorId) -> Result<NodeId, AiError> {
        let position = self.door(door)?.position;
        let id = self.add_waypoint(position);
        self.waypoints[id as usize].door = Some(door);
        Ok(id)
    }

    pub fn add_opening_waypoint(&mut self, opening: usize) -> Result<NodeId, AiError> {
        let position = self
            .openings
            .get(opening)
            .ok_or(AiError::IndexOutOfRange {
                what: "opening",
                index: opening,
                len: self.openings.len(),
            })?
            .position;
        let id = self.add_waypoint(position);
        self.waypoints[id as usize].opening = Some(opening);
        Ok(id)
    }

    pub fn add_ladder_waypoint(&mut self, ladder: LadderId, y: f32) -> Result<NodeId, AiError> {
        let x = self.ladder(ladder)?.x;
        let id = self.add_waypoint(Vec2::new(x, y));
        self.waypoints[id as usize].ladder = Some(ladder);
        Ok(id)
    }

    pub fn link_waypoints(&mut self, a: NodeId, b: NodeId) -> Result<(), AiError> {
        self.waypoint(a)?;
        self.waypoint(b)?;
        if !self.waypoints[a as usize].links.contains(&b) {
            self.waypoints[a as usize].links.push(b);
        }
        if !self.waypoints[b as usize].links.contains(&a) {
            self.waypoints[b as usize].links.push(a);
        }
        Ok(())
    }

    pub fn add_device(&mut self, name: impl Into<String>, position: Vec2) -> Result<DeviceId, AiError> {
        let hull = self
            .hull_at_feet(position)
            .ok_or(AiError::IndexOutOfRange {
                what: "device outside every hull",
                index: self.devices.len(),
                len: self.hulls.len(),
            })?;
        let id = self.devices.len() as DeviceId;
        self.devices.push(Device {
            id,
            name: name.into(),
            hull,
            position,
            condition: 100.0,
        });
        Ok(id)
    }

    pub fn add_container(&mut self, position: Vec2, capacity: usize) -> Result<ContainerId, AiError> {
        let hull = self
            .hull_at_feet(position)
            .ok_or(AiError::IndexOutOfRange {
                what: "container outside every hull",
                index: self.containers.len(),
                len: self.hulls.len(),
            })?;
        let id = self.containers.len() as ContainerId;
        self.containers.push(Container {
            id,
            hull,
            position,
            capacity,
            items: Vec::new(),
        });
        Ok(id)
    }

    /// Mint a new item with a fresh id.
    pub fn new_item(&mut self, kind: ItemKind) -> Item {
        self.next_item_id += 1;
        Item::new(self.next_item_id, kind)
    }

    pub fn drop_item(&mut self, item: Item, position: Vec2) {
        let hull = self.hull_at_feet(position);
        self.floor_items.push(FloorItem {
            item,
            hull,
            position,
        });
    }

    /// Build the reference path-finder from the waypoints.
    pub fn waypoint_graph(&self) -> WaypointGraph {
        let mut graph = WaypointGraph::new();
        for wp in &self.waypoints {
            graph.add_node(wp.id, wp.position);
        }
        for wp in &self.waypoints {
            for &other in &wp.links {
                graph.link(wp.id, other);
            }
        }
        graph
    }

    // --- lookups ---

    pub fn hulls(&self) -> &[Hull] {
        &self.hulls
    }
    pub fn doors(&self) -> &[Door] {
        &self.doors
    }
    pub fn openings(&self) -> &[Opening] {
        &self.openings
    }
    pub fn ladders(&self) -> &[Ladder] {
        &self.ladders
    }
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn hull(&self, id: HullId) -> Result<&Hull, AiError> {
        self.hulls.get(id as usize).ok_or(AiError::UnknownHull(id))
    }

    pub fn hull_mut(&mut self, id: HullId) -> Result<&mut Hull, AiError> {
        self.hulls.get_mut(id as usize).ok_or(AiError::UnknownHull(id))
    }

    pub fn door(&self, id: DoorId) -> Result<&Door, AiError> {
        self.doors.get(id as usize).ok_or(AiError::UnknownDoor(id))
    }

    pub fn door_mut(&mut self, id: DoorId) -> Result<&mut Door, AiError> {
        self.doors.get_mut(id as usize).ok_or(AiError::UnknownDoor(id))
    }

    pub fn opening_mut(&mut self, index: usize) -> Result<&mut Opening, AiError> {
        let len = self.openings.len();
        self.openings.get_mut(index).ok_or(AiError::IndexOutOfRange {
            what: "opening",
            index,
            len,
        })
    }

    pub fn ladder(&self, id: LadderId) -> Result<&Ladder, AiError> {
        self.ladders.get(id as usize).ok_or(AiError::UnknownLadder(id))
    }

    pub fn waypoint(&self, id: NodeId) -> Result<&Waypoint, AiError> {
        self.waypoints.get(id as usize).ok_or(AiError::UnknownNode(id))
    }

    pub fn device(&self, id: DeviceId) -> Result<&Device, AiError> {
        self.devices.get(id as usize).ok_or(AiError::UnknownDevice(id))
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Result<&mut Device, AiError> {
        self.devices.get_mut(id as usize).ok_or(AiError::UnknownDevice(id))
    }

    pub fn container(&self, id: ContainerId) -> Result<&Container, AiError> {
        self.containers.get(id as usize).ok_or(AiError::UnknownContainer(id))
    }

    pub fn container_mut(&mut self, id: ContainerId) -> Result<&mut Container, AiError> {
        self.containers
            .get_mut(id as usize)
            .ok_or(AiError::UnknownContainer(id))
    }

    /// Which hull a point is in.
    pub fn hull_at(&self, point: Vec2) -> Option<HullId> {
        self.hulls
            .iter()
            .find(|h| h.rect.contains(point, 0.0))
            .map(|h| h.id)
    }

    /// Which hull a character standing at `feet` is in.
    pub fn hull_at_feet(&self, feet: Vec2) -> Option<HullId> {
        self.hull_at(Vec2::new(feet.x, feet.y + FEET_OFFSET))
    }

    /// The hull itself plus every hull joined to it through an open or
    /// broken door or an unobstructed opening.
    pub fn visible_hulls(&self, hull: HullId) -> Vec<HullId> {
        let mut visible = vec![hull];
        let through_doors = self
            .doors
            .iter()
            .filter(|d| d.is_passable())
            .filter_map(|d| d.other_side(hull));
        let through_openings = self
            .openings
            .iter()
            .filter(|o| o.open)
            .filter_map(|o| o.other_side(hull));
        for other in through_doors.chain(through_openings) {
            if !visible.contains(&other) {
                visible.push(other);
            }
        }
        visible
    }

    /// Whether a dangerous item lies loose or stored in the hull.
    pub fn has_dangerous_item(&self, hull: HullId) -> bool {
        self.floor_items
            .iter()
            .any(|f| f.hull == Some(hull) && f.item.dangerous)
            || self
                .containers
                .iter()
                .any(|c| c.hull == hull && c.items.iter().any(|i| i.dangerous))
    }

    pub fn hull_conditions(&self, hull: HullId) -> Result<HullConditions<'_>, AiError> {
        let h = self.hull(hull)?;
        Ok(HullConditions {
            oxygen: h.oxygen,
            water_percentage: h.water_percentage,
            width: h.rect.width,
            fires: &h.fires,
            lethal_pressure: h.lethal_pressure,
            dangerous_item: self.has_dangerous_item(hull),
        })
    }

    /// Door blocking a straight move from `from` to `to`, if any.
    pub fn blocking_door(&self, from: Vec2, to: Vec2) -> Option<&Door> {
        self.doors.iter().find(|d| {
            if d.is_fully_open() {
                return false;
            }
            match d.passage {
                // Wall doors stand on the floor at `position` and are `size` tall
                Passage::Horizontal => {
                    let crosses = (from.x - d.position.x) * (to.x - d.position.x) < 0.0;
                    crosses && from.y >= d.position.y - 0.5 && from.y <= d.position.y + d.size
                }
                // Hatches are centred on `position` and `size` wide
                Passage::Vertical => {
                    let crosses = (from.y - d.position.y) * (to.y - d.position.y) < 0.0;
                    crosses && (from.x - d.position.x).abs() <= d.size / 2.0
                }
            }
        })
    }

    // --- runtime ---

    /// Advance door animations.
    pub fn update_doors(&mut self, dt: f32) {
        for door in &mut self.doors {
            door.animate(dt);
        }
    }

    pub fn add_fire(&mut self, hull: HullId, fire: FireSource) -> Result<(), AiError> {
        self.hull_mut(hull)?.fires.push(fire);
        Ok(())
    }

    /// Shrink the fires in a hull by `amount` metres each; burnt-out ones go away.
    pub fn extinguish(&mut self, hull: HullId, amount: f32) -> Result<(), AiError> {
        let h = self.hull_mut(hull)?;
        for fire in &mut h.fires {
            fire.size -= amount;
        }
        h.fires.retain(|f| f.size > 0.0);
        Ok(())
    }

    pub fn add_breach(&mut self, hull: HullId, breach: Breach) -> Result<(), AiError> {
        self.hull_mut(hull)?.breaches.push(breach);
        Ok(())
    }

    pub fn weld_breach(&mut self, hull: HullId, index: usize, amount: f32) -> Result<(), AiError> {
        let h = self.hull_mut(hull)?;
        let len = h.breaches.len();
        let breach = h.breaches.get_mut(index).ok_or(AiError::IndexOutOfRange {
            what: "breach",
            index,
            len,
        })?;
        breach.open = (breach.open - amount).max(0.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rooms() -> (Submarine, HullId, HullId, DoorId) {
        let mut sub = Submarine::new();
        let a = sub.add_hull("Galley", Rect::new(0.0, 0.0, 10.0, 3.0));
        let b = sub.add_hull("Bridge", Rect::new(10.0, 0.0, 10.0, 3.0));
        let d = sub.add_door(Vec2::new(10.0, 0.0), Passage::Horizontal, [Some(a), Some(b)]);
        (sub, a, b, d)
    }

    #[test]
    fn test_hull_lookup_and_errors() {
        let (sub, a, b, _) = two_rooms();
        assert_eq!(sub.hull_at_feet(Vec2::new(2.0, 0.0)), Some(a));
        assert_eq!(sub.hull_at_feet(Vec2::new(12.0, 0.0)), Some(b));
        assert_eq!(sub.hull_at_feet(Vec2::new(25.0, 0.0)), None);
        assert_eq!(sub.hull(9).unwrap_err(), AiError::UnknownHull(9));
    }

    #[test]
    fn test_visible_hulls_follow_door_state() {
        let (mut sub, a, b, d) = two_rooms();
        assert_eq!(sub.visible_hulls(a), vec![a]);
        sub.door_mut(d).unwrap().operate(true);
        assert_eq!(sub.visible_hulls(a), vec![a, b]);
        sub.door_mut(d).unwrap().operate(false);
        sub.door_mut(d).unwrap().break_open();
        assert_eq!(sub.visible_hulls(b), vec![b, a]);
    }

    #[test]
    fn test_unpowered_door_ignores_buttons() {
        let (mut sub, _, _, d) = two_rooms();
        let door = sub.door_mut(d).unwrap();
        door.powered = false;
        assert!(!door.operate(true));
        assert_eq!(door.state, DoorState::Closed);
    }

    #[test]
    fn test_battered_door_breaks_once() {
        let (mut sub, _, _, d) = two_rooms();
        let door = sub.door_mut(d).unwrap();
        assert!(!door.damage(60.0));
        assert!(door.damage(60.0));
        assert_eq!(door.state, DoorState::Broken);
        assert!(door.is_passable());
        assert!(!door.damage(10.0));
    }

    #[test]
    fn test_door_animation_and_blocking() {
        let (mut sub, _, _, d) = two_rooms();
        let from = Vec2::new(9.5, 0.0);
        let to = Vec2::new(10.5, 0.0);
        assert!(sub.blocking_door(from, to).is_some());
        sub.door_mut(d).unwrap().operate(true);
        sub.update_doors(0.1);
        assert!(sub.blocking_door(from, to).is_some());
        sub.update_doors(1.0);
        assert!(sub.door(d).unwrap().is_fully_open());
        assert!(sub.blocking_door(from, to).is_none());
    }

    #[test]
    fn test_fire_and_breach_upkeep() {
        let (mut sub, a, _, _) = two_rooms();
        sub.add_fire(a, FireSource { position: Vec2::new(3.0, 0.0), size: 1.0 }).unwrap();
        sub.extinguish(a, 0.4).unwrap();
        assert!(sub.hull(a).unwrap().has_fire());
        sub.extinguish(a, 1.0).unwrap();
        assert!(!sub.hull(a).unwrap().has_fire());

        sub.add_breach(a, Breach { position: Vec2::new(1.0, 1.0), open: 0.5 }).unwrap();
        assert_eq!(sub.hull(a).unwrap().open_breaches().count(), 1);
        sub.weld_breach(a, 0, 1.0).unwrap();
        assert_eq!(sub.hull(a).unwrap().open_breaches().count(), 0);
        assert!(sub.weld_breach(a, 3, 1.0).is_err());
    }

    #[test]
    fn test_dangerous_items_and_conditions() {
        let (mut sub, a, _, _) = two_rooms();
        assert!(!sub.hull_conditions(a).unwrap().dangerous_item);
        let bomb = sub.new_item(ItemKind::Explosive);
        sub.drop_item(bomb, Vec2::new(4.0, 0.0));
        assert!(sub.hull_conditions(a).unwrap().dangerous_item);
    }

    #[test]
    fn test_waypoint_graph_mirrors_links() {
        let (mut sub, _, _, d) = two_rooms();
        let w1 = sub.add_waypoint(Vec2::new(5.0, 0.0));
        let wd = sub.add_door_waypoint(d).unwrap();
        let w2 = sub.add_waypoint(Vec2::new(15.0, 0.0));
        sub.link_waypoints(w1, wd).unwrap();
        sub.link_waypoints(wd, w2).unwrap();
        assert!(sub.link_waypoints(w1, 99).is_err());

        let graph = sub.waypoint_graph();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.node(wd).unwrap().links.len(), 2);
        assert_eq!(sub.waypoint(wd).unwrap().door, Some(d));
    }

    #[test]
    fn test_container_capacity() {
        let (mut sub, _, _, _) = two_rooms();
        let c = sub.add_container(Vec2::new(1.0, 0.0), 1).unwrap();
        let suit = sub.new_item(ItemKind::DivingSuit);
        let mask = sub.new_item(ItemKind::DivingMask);
        let cabinet = sub.container_mut(c).unwrap();
        assert!(cabinet.put(suit).is_ok());
        assert!(cabinet.put(mask).is_err());
        assert!(cabinet.take(ItemKind::DivingSuit).is_some());
        assert!(cabinet.has_room());
    }
}
