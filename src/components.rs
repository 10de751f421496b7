//! Components used by the drift demo

use crate::ecs::Component;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Component for Position {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

impl Velocity {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

impl Component for Velocity {}

/// Remaining ticks before the entity expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifetime {
    pub ticks_left: u32,
}

impl Lifetime {
    pub fn new(ticks_left: u32) -> Self {
        Self { ticks_left }
    }
}

impl Component for Lifetime {}

/// Marks an entity that no longer moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Anchored;

impl Component for Anchored {}
