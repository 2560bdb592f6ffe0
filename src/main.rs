use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_analytics::api::{build_router, cors_layer, state::AppState};
use match_analytics::calculate::aggregate::team_aggregate;
use match_analytics::calculate::filter::SortColumn;
use match_analytics::config::AppConfig;
use match_analytics::directory::{StaticTeamDirectory, TeamDirectory};
use match_analytics::fetch::HubClient;
use match_analytics::models::{Item, Loadable, MatchResult, StatCategory, StatLine, Weapon};
use match_analytics::session::{ComparisonSession, ListView, SessionInit, SessionView, SubMode};
use match_analytics::source::{MockSource, StatsSource};

#[derive(Parser)]
#[command(name = "match-analytics")]
#[command(about = "Team match analytics and head-to-head comparisons")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); defaults to the config value
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Use the built-in demo data instead of the statistics service
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Compare two teams
    Compare {
        team_a: String,
        team_b: String,

        /// Lookback in months
        #[arg(long)]
        months: Option<u32>,

        /// head-to-head, form or maps
        #[arg(long, default_value = "head-to-head")]
        mode: String,
    },

    /// Show a team's match history
    History {
        team: String,

        /// Lookback in months
        #[arg(long)]
        months: Option<u32>,

        /// Only games on this map
        #[arg(long)]
        map: Option<String>,

        /// Only games against this opponent
        #[arg(long)]
        opponent: Option<String>,

        /// Sort column (date, map, our-score, opponent-score, opponent, result)
        #[arg(long, default_value = "date")]
        sort: String,
    },

    /// Show per-team aggregates for one game
    GameStats {
        stats_ref: String,

        /// performance, weapons or resources
        #[arg(long, default_value = "performance")]
        category: String,
    },
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(AppConfig::default())
    }
}

fn build_source(offline: bool, config: &AppConfig) -> Result<Arc<dyn StatsSource>> {
    if offline {
        return Ok(Arc::new(MockSource::demo()));
    }
    Ok(Arc::new(HubClient::new(config.hub_client_config())?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    // Initialize tracing
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting match-analytics v{}", env!("CARGO_PKG_VERSION"));

    let source = build_source(cli.offline, &config)?;
    let directory: Arc<dyn TeamDirectory> = Arc::new(StaticTeamDirectory::new(config.teams.clone()));
    let settings = config.session_settings();

    match cli.command {
        Commands::Serve { host, port } => {
            let state = AppState::new(source, directory, settings);
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));
            let addr = format!(
                "{}:{}",
                host.unwrap_or(config.server.host),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Compare {
            team_a,
            team_b,
            months,
            mode,
        } => {
            let mode: SubMode = mode.parse().map_err(anyhow::Error::msg)?;
            let session = ComparisonSession::open(
                source,
                directory,
                settings,
                SessionInit {
                    team_a,
                    team_b: Some(team_b),
                    period_months: months,
                    sub_mode: Some(mode),
                },
            )
            .await?;
            print_comparison(&session.snapshot().await);
        }
        Commands::History {
            team,
            months,
            map,
            opponent,
            sort,
        } => {
            let column: SortColumn = sort.parse().map_err(anyhow::Error::msg)?;
            let session = ComparisonSession::open(
                source,
                directory,
                settings,
                SessionInit {
                    team_a: team,
                    period_months: months,
                    ..Default::default()
                },
            )
            .await?;
            session.filter_by_map(map).await;
            session.filter_by_opponent(opponent).await;
            if column != SortColumn::Date {
                session.sort_by_column(column).await;
            }
            print_history(&session.snapshot().await);
        }
        Commands::GameStats {
            stats_ref,
            category,
        } => {
            let category: StatCategory = category.parse().map_err(anyhow::Error::msg)?;
            let blob = source.game_stats(&stats_ref).await?;

            let mut teams = blob.teams.clone();
            if teams.is_empty() {
                for p in blob.participants() {
                    if !teams.contains(&p.team) {
                        teams.push(p.team.clone());
                    }
                }
            }

            println!("=== {} on {} ({}) ===", stats_ref, blob.map, category);
            for team in &teams {
                match team_aggregate(&blob, team, category) {
                    Loadable::Present(agg) => {
                        println!("\n{} ({} players)", agg.team, agg.players);
                        print_line(&agg.line);
                    }
                    _ => println!("\n{}: no participating players", team),
                }
            }
        }
    }

    Ok(())
}

fn label(view: &SessionView, tag: &str) -> String {
    match view.labels.get(tag) {
        Some(Loadable::Present(info)) => format!("{} [{}]", info.name, info.tag),
        _ => tag.to_string(),
    }
}

fn status_note<T>(list: &ListView<T>) -> Option<String> {
    list.error.as_ref().map(|e| format!("  (failed: {})", e))
}

fn print_games(games: &[MatchResult]) {
    for g in games {
        println!(
            "  {}  {:<10} {:>3}-{:<3} {}  vs {}",
            g.played_at.format("%Y-%m-%d"),
            g.map,
            g.our_score,
            g.opponent_score,
            g.result,
            g.opponent_tag
        );
    }
}

fn print_comparison(view: &SessionView) {
    let tag_b = view.team_b.clone().unwrap_or_default();
    println!(
        "=== {} vs {} ({} months) ===",
        label(view, &view.team_a),
        label(view, &tag_b),
        view.period_months
    );

    match view.sub_mode {
        SubMode::HeadToHead => {
            let h2h = &view.head_to_head;
            if let Some(note) = status_note(&h2h.list) {
                println!("{}", note);
            }
            print_games(&h2h.list.items);
            println!(
                "\n{}: {}W {}L {}D, {:.1}% ({:+} frags)",
                view.team_a,
                h2h.summary.wins,
                h2h.summary.losses,
                h2h.summary.draws,
                h2h.summary.win_rate,
                h2h.summary.frag_diff()
            );
        }
        SubMode::Form => {
            for side in std::iter::once(&view.side_a).chain(view.side_b.as_ref()) {
                println!("\n{}  form {}", side.team, side.form_string);
                if let Some(note) = status_note(&side.form) {
                    println!("{}", note);
                }
                print_games(&side.form.items);
                println!(
                    "  {}W {}L {}D, {:.1}%",
                    side.form_summary.wins, side.form_summary.losses, side.form_summary.draws, side.form_summary.win_rate
                );
                let players: Vec<String> = side
                    .roster
                    .items
                    .iter()
                    .map(|p| format!("{} ({})", p.player, p.games))
                    .collect();
                println!("  roster: {}", players.join(", "));
            }
        }
        SubMode::Maps => {
            println!(
                "\n  {:<12} {:>14} {:>14}  label",
                "map", view.team_a, tag_b
            );
            for row in &view.merged_maps {
                let cell = |s: &Option<match_analytics::models::MapStat>| match s {
                    Some(s) => format!("{:>3}g {:>5.1}%", s.games, s.win_rate),
                    None => "-".to_string(),
                };
                println!(
                    "  {:<12} {:>14} {:>14}  {}",
                    row.map,
                    cell(&row.team_a),
                    cell(&row.team_b),
                    row.label
                );
            }
        }
    }
}

fn print_history(view: &SessionView) {
    let results = &view.results;
    println!(
        "=== {} history ({} months) ===",
        label(view, &view.team_a),
        view.period_months
    );
    if let Some(note) = status_note(&results.list) {
        println!("{}", note);
    }
    print_games(&results.list.items);
    println!(
        "\n{} games: {}W {}L {}D, {:.1}%",
        results.summary.games,
        results.summary.wins,
        results.summary.losses,
        results.summary.draws,
        results.summary.win_rate
    );

    println!("\nWeekly activity:");
    for bin in &results.activity {
        println!("  {}  {}", bin.week_start, "#".repeat(bin.games as usize));
    }
}

fn print_line(line: &StatLine) {
    match line {
        StatLine::Performance(p) => {
            println!(
                "  frags {}  kills {}  deaths {}  tk {}  suicides {}  spawns {}",
                p.frags, p.kills, p.deaths, p.team_kills, p.suicides, p.spawn_frags
            );
            println!(
                "  damage {}/{}  efficiency {:.1}%  to-die {:.0}",
                p.damage_given, p.damage_taken, p.efficiency, p.to_die
            );
        }
        StatLine::Weapons(w) => {
            for weapon in Weapon::ALL {
                if let Some(l) = w.get(weapon) {
                    if l.attacks == 0 && l.kills == 0 && l.pickups == 0 {
                        continue;
                    }
                    println!(
                        "  {:<4} {:>5.1}% ({}/{})  kills {}  pickups {}  drops {}  dmg {}",
                        weapon.key(),
                        l.accuracy,
                        l.hits,
                        l.attacks,
                        l.kills,
                        l.pickups,
                        l.drops,
                        l.damage
                    );
                }
            }
        }
        StatLine::Resources(r) => {
            let items: Vec<String> = Item::ALL
                .iter()
                .map(|i| format!("{} {}", i.key(), r.took(*i)))
                .collect();
            println!("  {}", items.join("  "));
            println!(
                "  health {}  damage {}/{}",
                r.health_pickups, r.damage_given, r.damage_taken
            );
        }
    }
}
