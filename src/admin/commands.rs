use crate::relocation::request::ActorId;
use crate::world::board::GroupId;
use crate::world::position::{AreaCoordinate, Location, WorldId};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Join { actor: ActorId, location: Location },
    Move { actor: ActorId, location: Location },
    Leave { actor: ActorId },
    Fund { actor: ActorId, amount: u64 },
    Stuck { actor: ActorId },
    Cancel { actor: ActorId },
    Status { actor: ActorId },
    Claim { tile: AreaCoordinate, group: GroupId },
    Unclaim { tile: AreaCoordinate },
    Fill { center: AreaCoordinate, radius: u32, group: GroupId },
    Claims { group: GroupId },
    Owner { tile: AreaCoordinate },
    Level { group: GroupId, level: u32 },
    Spawn { tile: AreaCoordinate, base_delay: u32 },
    Height { world: WorldId, x: i32, z: i32, y: i32 },
    Reject { enabled: bool },
    Tick { count: u64 },
    Shutdown,
    Unknown(String),
}

pub fn parse_console_command(message: &str) -> Result<Option<ConsoleCommand>, String> {
    let trimmed = message.trim();
    if !trimmed.starts_with('!') {
        return Ok(None);
    }

    let mut parts = trimmed[1..].split_whitespace();
    let command = parts
        .next()
        .ok_or_else(|| "console command missing name".to_string())?;
    let command = command.to_ascii_lowercase();
    let parsed = match command.as_str() {
        "join" => ConsoleCommand::Join {
            actor: parse_actor(parts.next())?,
            location: parse_location(&mut parts)?,
        },
        "move" | "tp" => ConsoleCommand::Move {
            actor: parse_actor(parts.next())?,
            location: parse_location(&mut parts)?,
        },
        "leave" | "quit" => ConsoleCommand::Leave {
            actor: parse_actor(parts.next())?,
        },
        "fund" => ConsoleCommand::Fund {
            actor: parse_actor(parts.next())?,
            amount: parse_value(parts.next(), "amount")?,
        },
        "stuck" | "halp!" => ConsoleCommand::Stuck {
            actor: parse_actor(parts.next())?,
        },
        "cancel" => ConsoleCommand::Cancel {
            actor: parse_actor(parts.next())?,
        },
        "status" => ConsoleCommand::Status {
            actor: parse_actor(parts.next())?,
        },
        "claim" => ConsoleCommand::Claim {
            tile: parse_tile(&mut parts)?,
            group: GroupId(parse_value(parts.next(), "group")?),
        },
        "unclaim" => ConsoleCommand::Unclaim {
            tile: parse_tile(&mut parts)?,
        },
        "fill" => ConsoleCommand::Fill {
            center: parse_tile(&mut parts)?,
            radius: parse_value(parts.next(), "radius")?,
            group: GroupId(parse_value(parts.next(), "group")?),
        },
        "claims" => ConsoleCommand::Claims {
            group: GroupId(parse_value(parts.next(), "group")?),
        },
        "owner" | "who" => ConsoleCommand::Owner {
            tile: parse_tile(&mut parts)?,
        },
        "level" => ConsoleCommand::Level {
            group: GroupId(parse_value(parts.next(), "group")?),
            level: parse_value(parts.next(), "level")?,
        },
        "spawn" => ConsoleCommand::Spawn {
            tile: parse_tile(&mut parts)?,
            base_delay: parse_value(parts.next(), "base delay")?,
        },
        "height" => ConsoleCommand::Height {
            world: WorldId(parse_value(parts.next(), "world")?),
            x: parse_value(parts.next(), "x")?,
            z: parse_value(parts.next(), "z")?,
            y: parse_value(parts.next(), "y")?,
        },
        "reject" => ConsoleCommand::Reject {
            enabled: parse_switch(parts.next())?,
        },
        "tick" => ConsoleCommand::Tick {
            count: match parts.next() {
                Some(value) => parse_value(Some(value), "tick count")?,
                None => 1,
            },
        },
        "shutdown" | "exit" => ConsoleCommand::Shutdown,
        _ => ConsoleCommand::Unknown(command),
    };
    Ok(Some(parsed))
}

fn parse_value<T: FromStr>(value: Option<&str>, label: &str) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("console command missing {label}"))?;
    value
        .parse::<T>()
        .map_err(|_| format!("console command has invalid {label} '{value}'"))
}

fn parse_actor(value: Option<&str>) -> Result<ActorId, String> {
    parse_value(value, "actor").map(ActorId)
}

fn parse_tile<'a, I>(parts: &mut I) -> Result<AreaCoordinate, String>
where
    I: Iterator<Item = &'a str>,
{
    let world = WorldId(parse_value(parts.next(), "world")?);
    let x = parse_value(parts.next(), "tile x")?;
    let z = parse_value(parts.next(), "tile z")?;
    Ok(AreaCoordinate::new(world, x, z))
}

fn parse_location<'a, I>(parts: &mut I) -> Result<Location, String>
where
    I: Iterator<Item = &'a str>,
{
    let world = WorldId(parse_value(parts.next(), "world")?);
    let x = parse_value(parts.next(), "x")?;
    let y = parse_value(parts.next(), "y")?;
    let z = parse_value(parts.next(), "z")?;
    Ok(Location::new(world, x, y, z))
}

fn parse_switch(value: Option<&str>) -> Result<bool, String> {
    match value.map(|value| value.to_ascii_lowercase()) {
        Some(value) if value == "on" || value == "true" => Ok(true),
        Some(value) if value == "off" || value == "false" => Ok(false),
        Some(value) => Err(format!("console command expected on/off, got '{value}'")),
        None => Err("console command missing on/off".to_string()),
    }
}
