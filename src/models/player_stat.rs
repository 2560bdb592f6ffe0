//! Normalized per-player and per-team stat lines.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which slice of a stats blob a stat line covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatCategory {
    Performance,
    Weapons,
    Resources,
}

impl StatCategory {
    pub const ALL: [StatCategory; 3] = [
        StatCategory::Performance,
        StatCategory::Weapons,
        StatCategory::Resources,
    ];
}

impl FromStr for StatCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "performance" | "perf" => Ok(StatCategory::Performance),
            "weapons" | "weapon" => Ok(StatCategory::Weapons),
            "resources" | "items" => Ok(StatCategory::Resources),
            other => Err(format!("unknown stat category: {}", other)),
        }
    }
}

impl std::fmt::Display for StatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatCategory::Performance => write!(f, "performance"),
            StatCategory::Weapons => write!(f, "weapons"),
            StatCategory::Resources => write!(f, "resources"),
        }
    }
}

/// The closed set of tracked weapons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weapon {
    Sg,
    Ssg,
    Ng,
    Sng,
    Gl,
    Rl,
    Lg,
}

impl Weapon {
    pub const ALL: [Weapon; 7] = [
        Weapon::Sg,
        Weapon::Ssg,
        Weapon::Ng,
        Weapon::Sng,
        Weapon::Gl,
        Weapon::Rl,
        Weapon::Lg,
    ];

    /// Key used in the raw stats document.
    pub fn key(self) -> &'static str {
        match self {
            Weapon::Sg => "sg",
            Weapon::Ssg => "ssg",
            Weapon::Ng => "ng",
            Weapon::Sng => "sng",
            Weapon::Gl => "gl",
            Weapon::Rl => "rl",
            Weapon::Lg => "lg",
        }
    }
}

/// The closed set of tracked armor tiers, megahealth and powerups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    Ga,
    Ya,
    Ra,
    Mh,
    Q,
    P,
    R,
}

impl Item {
    pub const ALL: [Item; 7] = [
        Item::Ga,
        Item::Ya,
        Item::Ra,
        Item::Mh,
        Item::Q,
        Item::P,
        Item::R,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Item::Ga => "ga",
            Item::Ya => "ya",
            Item::Ra => "ra",
            Item::Mh => "mh",
            Item::Q => "q",
            Item::P => "p",
            Item::R => "r",
        }
    }
}

/// Frags, deaths, damage and the derived efficiency figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLine {
    pub frags: i64,
    pub deaths: u64,
    pub kills: u64,
    pub team_kills: u64,
    pub suicides: u64,
    pub spawn_frags: u64,
    pub damage_given: u64,
    pub damage_taken: u64,
    /// kills / (kills + deaths) * 100
    pub efficiency: f64,
    /// Average damage taken per death
    pub to_die: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponLine {
    pub weapon: Weapon,
    pub attacks: u64,
    pub hits: u64,
    /// hits / attacks * 100
    pub accuracy: f64,
    pub kills: u64,
    pub pickups: u64,
    pub drops: u64,
    pub damage: u64,
}

impl WeaponLine {
    pub fn empty(weapon: Weapon) -> Self {
        Self {
            weapon,
            attacks: 0,
            hits: 0,
            accuracy: 0.0,
            kills: 0,
            pickups: 0,
            drops: 0,
            damage: 0,
        }
    }
}

/// One line per weapon in `Weapon::ALL` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponsLine {
    pub weapons: Vec<WeaponLine>,
}

impl WeaponsLine {
    pub fn get(&self, weapon: Weapon) -> Option<&WeaponLine> {
        self.weapons.iter().find(|w| w.weapon == weapon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCount {
    pub item: Item,
    pub took: u64,
}

/// Pickup counts plus the damage economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcesLine {
    /// One entry per item in `Item::ALL` order
    pub items: Vec<ItemCount>,
    pub health_pickups: u64,
    pub damage_given: u64,
    pub damage_taken: u64,
}

impl ResourcesLine {
    pub fn took(&self, item: Item) -> u64 {
        self.items
            .iter()
            .find(|c| c.item == item)
            .map(|c| c.took)
            .unwrap_or(0)
    }
}

/// A stat line for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum StatLine {
    Performance(PerformanceLine),
    Weapons(WeaponsLine),
    Resources(ResourcesLine),
}

impl StatLine {
    pub fn category(&self) -> StatCategory {
        match self {
            StatLine::Performance(_) => StatCategory::Performance,
            StatLine::Weapons(_) => StatCategory::Weapons,
            StatLine::Resources(_) => StatCategory::Resources,
        }
    }
}

/// One player's stat line within one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStat {
    pub name: String,
    pub team: String,
    pub line: StatLine,
}

/// A team's combined stat line for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAggregate {
    pub team: String,
    pub players: usize,
    pub line: StatLine,
}
