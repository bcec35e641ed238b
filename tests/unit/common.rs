//! Shared host types for the integration tests.

use std::cell::Cell;

use scriptbind::{ClassBuilder, Context, MetaMethod, NativeClass};

thread_local! {
    static DROPPED: Cell<u32> = const { Cell::new(0) };
}

/// Number of `Tracked` values dropped on this thread.
pub fn dropped() -> u32 {
    DROPPED.with(Cell::get)
}

/// A value counting its own drops.
#[derive(Debug, Default)]
pub struct Tracked {
    pub id: u32,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        DROPPED.with(|d| d.set(d.get() + 1));
    }
}

impl NativeClass for Tracked {
    const NAME: &'static str = "Tracked";
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl NativeClass for Vec3 {
    const NAME: &'static str = "Vec3";
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pub name: String,
    pub position: Vec3,
}

impl NativeClass for Entity {
    const NAME: &'static str = "Entity";
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub entity: Entity,
    pub score: i64,
}

impl NativeClass for Player {
    const NAME: &'static str = "Player";
}

pub fn vec3_class() -> ClassBuilder<Vec3> {
    ClassBuilder::<Vec3>::new()
        .constructor(|| Vec3::default())
        .constructor(Vec3::new)
        .attribute("x", |v: &Vec3| v.x, |v: &mut Vec3, x: f64| v.x = x)
        .attribute("y", |v: &Vec3| v.y, |v: &mut Vec3, y: f64| v.y = y)
        .attribute("z", |v: &Vec3| v.z, |v: &mut Vec3, z: f64| v.z = z)
        .method("length", |v: &Vec3| v.length())
        .operator(MetaMethod::Add, |a: &Vec3, b: Vec3| {
            Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z)
        })
        .operator(MetaMethod::Mul, |a: &Vec3, s: f64| Vec3::new(a.x * s, a.y * s, a.z * s))
        .operator(MetaMethod::Eq, |a: &Vec3, b: Vec3| *a == b)
        .operator(MetaMethod::ToString, |v: &Vec3| {
            format!("Vec3({}, {}, {})", v.x, v.y, v.z)
        })
}

pub fn entity_class() -> ClassBuilder<Entity> {
    ClassBuilder::<Entity>::new()
        .constructor(|name: String| Entity {
            name,
            ..Entity::default()
        })
        .readonly_attribute("name", |e: &Entity| e.name.clone())
        .attribute_ref("position", |e| &e.position, |e| &mut e.position)
        .method("describe", |e: &Entity| format!("entity {}", e.name))
        .method("kind", |_: &Entity| "entity")
}

pub fn player_class() -> ClassBuilder<Player> {
    ClassBuilder::<Player>::new()
        .base::<Entity>(|p| &p.entity, |p| &mut p.entity)
        .constructor(|name: String, score: i64| Player {
            entity: Entity {
                name,
                ..Entity::default()
            },
            score,
        })
        .attribute("score", |p: &Player| p.score, |p: &mut Player, s: i64| p.score = s)
        .method("kind", |_: &Player| "player")
}

/// A context with `Vec3`, `Entity` and `Player` registered.
pub fn game_context() -> Context {
    let mut ctx = Context::new();
    ctx.register_class(vec3_class()).unwrap();
    ctx.register_class(entity_class()).unwrap();
    ctx.register_class(player_class()).unwrap();
    ctx
}
