//! Player extraction and team aggregation.
//!
//! Count fields are summed across the team. Rate fields are never averaged:
//! they are recomputed from the summed numerator and denominator, otherwise
//! a player with three rockets fired would weigh as much as one with three
//! hundred. `to_die` is the one deliberate exception and is a per-player
//! mean.

use crate::models::{
    Item, ItemCount, Loadable, PerformanceLine, PlayerGameStat, RawPlayer, ResourcesLine,
    StatCategory, StatLine, StatsBlob, TeamAggregate, Weapon, WeaponLine, WeaponsLine,
};

use super::rate;

/// Pull one category's stat line out of a raw player record.
pub fn extract_player_stat(raw: &RawPlayer, category: StatCategory) -> PlayerGameStat {
    let line = match category {
        StatCategory::Performance => StatLine::Performance(extract_performance(raw)),
        StatCategory::Weapons => StatLine::Weapons(extract_weapons(raw)),
        StatCategory::Resources => StatLine::Resources(extract_resources(raw)),
    };

    PlayerGameStat {
        name: raw.name.clone(),
        team: raw.team.clone(),
        line,
    }
}

fn extract_performance(raw: &RawPlayer) -> PerformanceLine {
    let s = &raw.stats;
    let to_die = match raw.dmg.taken_to_die {
        Some(v) if v.is_finite() => v,
        _ => rate(raw.dmg.taken, s.deaths) / 100.0,
    };

    PerformanceLine {
        frags: s.frags,
        deaths: s.deaths,
        kills: s.kills,
        team_kills: s.tk,
        suicides: s.suicides,
        spawn_frags: s.spawn_frags,
        damage_given: raw.dmg.given,
        damage_taken: raw.dmg.taken,
        efficiency: rate(s.kills, s.kills + s.deaths),
        to_die,
    }
}

fn extract_weapons(raw: &RawPlayer) -> WeaponsLine {
    let weapons = Weapon::ALL
        .iter()
        .map(|&weapon| match raw.weapons.get(weapon.key()) {
            Some(w) => WeaponLine {
                weapon,
                attacks: w.acc.attacks,
                hits: w.acc.hits,
                accuracy: rate(w.acc.hits, w.acc.attacks),
                kills: w.kills.total,
                pickups: w.pickups.taken,
                drops: w.pickups.dropped,
                damage: w.damage.enemy,
            },
            None => WeaponLine::empty(weapon),
        })
        .collect();

    WeaponsLine { weapons }
}

fn extract_resources(raw: &RawPlayer) -> ResourcesLine {
    let items = Item::ALL
        .iter()
        .map(|&item| ItemCount {
            item,
            took: raw.items.get(item.key()).map(|i| i.took).unwrap_or(0),
        })
        .collect();

    let health_pickups = raw
        .items
        .iter()
        .filter(|(key, _)| key.starts_with("health"))
        .map(|(_, i)| i.took)
        .sum();

    ResourcesLine {
        items,
        health_pickups,
        damage_given: raw.dmg.given,
        damage_taken: raw.dmg.taken,
    }
}

/// Combine a team's player lines into one aggregate row.
///
/// Returns `None` when there is nothing to aggregate, so callers render
/// "no data" instead of a row of zeros. Lines from another category are
/// ignored.
pub fn aggregate_team(players: &[PlayerGameStat], category: StatCategory) -> Option<TeamAggregate> {
    let matching: Vec<&PlayerGameStat> = players
        .iter()
        .filter(|p| p.line.category() == category)
        .collect();

    let first = matching.first()?;

    let line = match category {
        StatCategory::Performance => StatLine::Performance(combine_performance(
            matching.iter().filter_map(|p| match &p.line {
                StatLine::Performance(l) => Some(l),
                _ => None,
            }),
        )),
        StatCategory::Weapons => StatLine::Weapons(combine_weapons(matching.iter().filter_map(
            |p| match &p.line {
                StatLine::Weapons(l) => Some(l),
                _ => None,
            },
        ))),
        StatCategory::Resources => StatLine::Resources(combine_resources(
            matching.iter().filter_map(|p| match &p.line {
                StatLine::Resources(l) => Some(l),
                _ => None,
            }),
        )),
    };

    Some(TeamAggregate {
        team: first.team.clone(),
        players: matching.len(),
        line,
    })
}

fn combine_performance<'a>(lines: impl Iterator<Item = &'a PerformanceLine>) -> PerformanceLine {
    let mut total = PerformanceLine::default();
    let mut to_die_sum = 0.0;
    let mut count = 0u64;

    for l in lines {
        total.frags += l.frags;
        total.deaths += l.deaths;
        total.kills += l.kills;
        total.team_kills += l.team_kills;
        total.suicides += l.suicides;
        total.spawn_frags += l.spawn_frags;
        total.damage_given += l.damage_given;
        total.damage_taken += l.damage_taken;
        to_die_sum += l.to_die;
        count += 1;
    }

    total.efficiency = rate(total.kills, total.kills + total.deaths);
    total.to_die = if count > 0 {
        to_die_sum / count as f64
    } else {
        0.0
    };
    total
}

fn combine_weapons<'a>(lines: impl Iterator<Item = &'a WeaponsLine>) -> WeaponsLine {
    let mut weapons: Vec<WeaponLine> = Weapon::ALL.iter().map(|&w| WeaponLine::empty(w)).collect();

    for line in lines {
        for w in &line.weapons {
            if let Some(slot) = weapons.iter_mut().find(|s| s.weapon == w.weapon) {
                slot.attacks += w.attacks;
                slot.hits += w.hits;
                slot.kills += w.kills;
                slot.pickups += w.pickups;
                slot.drops += w.drops;
                slot.damage += w.damage;
            }
        }
    }

    for slot in &mut weapons {
        slot.accuracy = rate(slot.hits, slot.attacks);
    }

    WeaponsLine { weapons }
}

fn combine_resources<'a>(lines: impl Iterator<Item = &'a ResourcesLine>) -> ResourcesLine {
    let mut items: Vec<ItemCount> = Item::ALL
        .iter()
        .map(|&item| ItemCount { item, took: 0 })
        .collect();
    let mut health_pickups = 0;
    let mut damage_given = 0;
    let mut damage_taken = 0;

    for line in lines {
        for c in &line.items {
            if let Some(slot) = items.iter_mut().find(|s| s.item == c.item) {
                slot.took += c.took;
            }
        }
        health_pickups += line.health_pickups;
        damage_given += line.damage_given;
        damage_taken += line.damage_taken;
    }

    ResourcesLine {
        items,
        health_pickups,
        damage_given,
        damage_taken,
    }
}

/// Participants -> extract -> aggregate, for one team of one game.
///
/// `Absent` means the blob holds no participating player for `team`.
pub fn team_aggregate(blob: &StatsBlob, team: &str, category: StatCategory) -> Loadable<TeamAggregate> {
    let players: Vec<PlayerGameStat> = blob
        .participants_for(team)
        .map(|p| extract_player_stat(p, category))
        .collect();

    Loadable::from_option(aggregate_team(&players, category))
}

/// Per-player lines for one team, in blob order.
pub fn player_lines(blob: &StatsBlob, team: &str, category: StatCategory) -> Vec<PlayerGameStat> {
    blob.participants_for(team)
        .map(|p| extract_player_stat(p, category))
        .collect()
}
