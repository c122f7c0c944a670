//! Departure and arrival definitions of a vehicle.
//!
//! Two encodings exist on the wire: `add` sends literals where a negative
//! value selects a symbolic procedure by index, `addFull` sends strings.

use traci_core::protocol::Color;

use super::SimTime;

const NUMERICAL_EPS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DepartTime {
    At(SimTime),
    Triggered,
    ContainerTriggered,
    Now,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepartLane {
    #[default]
    Default,
    Given(u32),
    Random,
    Free,
    AllowedFree,
    BestFree,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DepartPos {
    #[default]
    Default,
    Given(f64),
    Random,
    RandomFree,
    Free,
    Base,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DepartSpeed {
    #[default]
    Default,
    Given(f64),
    Random,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrivalLane {
    #[default]
    Default,
    Given(u32),
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ArrivalPos {
    #[default]
    Default,
    Given(f64),
    Random,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ArrivalSpeed {
    #[default]
    Default,
    Given(f64),
    Current,
}

// Procedure indices follow the declaration order above; index 0 of the
// departure time and 1 of the others is the literal ("given") form, which a
// negative sentinel can never select.

impl DepartTime {
    pub fn from_sentinel(value: i32) -> Option<Self> {
        if value >= 0 {
            return Some(DepartTime::At(SimTime::from(value)));
        }
        match value.checked_neg()? {
            1 => Some(DepartTime::Triggered),
            2 => Some(DepartTime::ContainerTriggered),
            3 => Some(DepartTime::Now),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "triggered" => Some(DepartTime::Triggered),
            "containerTriggered" => Some(DepartTime::ContainerTriggered),
            "now" => Some(DepartTime::Now),
            _ => parse_seconds(s).map(DepartTime::At),
        }
    }
}

impl DepartLane {
    pub fn from_sentinel(value: i8) -> Option<Self> {
        if value >= 0 {
            return Some(DepartLane::Given(value as u32));
        }
        match -(value as i32) {
            2 => Some(DepartLane::Random),
            3 => Some(DepartLane::Free),
            4 => Some(DepartLane::AllowedFree),
            5 => Some(DepartLane::BestFree),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(DepartLane::Default),
            "random" => Some(DepartLane::Random),
            "free" => Some(DepartLane::Free),
            "allowed" => Some(DepartLane::AllowedFree),
            "best" => Some(DepartLane::BestFree),
            _ => s.parse::<u32>().ok().map(DepartLane::Given),
        }
    }
}

impl DepartPos {
    /// Non-integral negative values are rejected.
    pub fn from_sentinel(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        if value >= 0.0 {
            return Some(DepartPos::Given(value));
        }
        let proc = (-value).trunc();
        if (proc + value).abs() > NUMERICAL_EPS {
            return None;
        }
        match proc as i64 {
            2 => Some(DepartPos::Random),
            3 => Some(DepartPos::RandomFree),
            4 => Some(DepartPos::Free),
            5 => Some(DepartPos::Base),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(DepartPos::Default),
            "random" => Some(DepartPos::Random),
            "random_free" => Some(DepartPos::RandomFree),
            "free" => Some(DepartPos::Free),
            "base" => Some(DepartPos::Base),
            _ => parse_finite(s).map(DepartPos::Given),
        }
    }
}

impl DepartSpeed {
    pub fn from_sentinel(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        if value >= 0.0 {
            return Some(DepartSpeed::Given(value));
        }
        match (-value) as i64 {
            2 => Some(DepartSpeed::Random),
            3 => Some(DepartSpeed::Max),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(DepartSpeed::Default),
            "random" => Some(DepartSpeed::Random),
            "max" => Some(DepartSpeed::Max),
            _ => parse_finite(s).filter(|v| *v >= 0.0).map(DepartSpeed::Given),
        }
    }
}

impl ArrivalLane {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(ArrivalLane::Default),
            "current" => Some(ArrivalLane::Current),
            _ => s.parse::<u32>().ok().map(ArrivalLane::Given),
        }
    }
}

impl ArrivalPos {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(ArrivalPos::Default),
            "random" => Some(ArrivalPos::Random),
            "max" => Some(ArrivalPos::Max),
            _ => parse_finite(s).map(ArrivalPos::Given),
        }
    }
}

impl ArrivalSpeed {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(ArrivalSpeed::Default),
            "current" => Some(ArrivalSpeed::Current),
            _ => parse_finite(s).filter(|v| *v >= 0.0).map(ArrivalSpeed::Given),
        }
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Seconds as text -> milliseconds.
fn parse_seconds(s: &str) -> Option<SimTime> {
    let secs = parse_finite(s).filter(|v| *v >= 0.0)?;
    Some((secs * 1000.0).round() as SimTime)
}

/// Everything needed to build a vehicle besides its type and route.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleParams {
    pub id: String,
    pub depart: DepartTime,
    pub depart_lane: DepartLane,
    pub depart_pos: DepartPos,
    pub depart_speed: DepartSpeed,
    pub arrival_lane: ArrivalLane,
    pub arrival_pos: ArrivalPos,
    pub arrival_speed: ArrivalSpeed,
    pub from_taz: String,
    pub to_taz: String,
    pub line: String,
    pub person_capacity: i32,
    pub person_number: i32,
    pub color: Color,
}

impl VehicleParams {
    pub fn new(id: impl Into<String>, depart: DepartTime) -> Self {
        Self {
            id: id.into(),
            depart,
            depart_lane: DepartLane::Default,
            depart_pos: DepartPos::Default,
            depart_speed: DepartSpeed::Default,
            arrival_lane: ArrivalLane::Default,
            arrival_pos: ArrivalPos::Default,
            arrival_speed: ArrivalSpeed::Default,
            from_taz: String::new(),
            to_taz: String::new(),
            line: String::new(),
            person_capacity: 0,
            person_number: 0,
            color: Color::YELLOW,
        }
    }
}
