use std::io::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use sqlx::SqlitePool;

use crate::{
    cli::SessionCmd,
    engine::SessionEngine,
    storage::{SessionGateway, SqliteGateway},
    timer::{RestTick, session_elapsed_seconds},
    types::{Config, OutputFmt, emit},
    utils,
};

pub async fn handle(cmd: SessionCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    let cfg = Config::load(&utils::config_path()?)?;
    let user = cfg.user();
    let day = Local::now().date_naive();
    let gateway = SqliteGateway::new(pool.clone());

    match cmd {
        SessionCmd::Start { plan } => {
            if gateway.load_active_session(&user, day).await?.is_some() {
                println!(
                    "{} there is already an active session for today",
                    "error:".red().bold()
                );
                return Ok(());
            }

            let Some((_, plan)) = super::plan::resolve_plan(pool, &plan).await? else {
                return Ok(());
            };

            let engine = match SessionEngine::start(&plan, cfg.rest_secs()) {
                Ok(engine) => engine,
                Err(e) => {
                    println!("{} {}", "error:".red().bold(), e);
                    return Ok(());
                }
            };

            println!("{}", "Exercises:".cyan().bold());
            for (i, ex) in plan.exercises.iter().enumerate() {
                let idx = format!("{}", i + 1).yellow();
                println!("{} • {} — {} sets ({})", idx, ex.name.bold(), ex.sets, ex.reps);
            }

            write_through(&gateway, &user, day, &engine).await;
            println!(
                "\n{} session started ({})",
                "ok:".green().bold(),
                engine.session().workout
            );
        }

        SessionCmd::Log {
            weight,
            reps,
            exercise,
        } => {
            let Some(mut engine) = load_engine(&gateway, &user, day, &cfg).await? else {
                return Ok(());
            };

            let Some(weight) = utils::parse_weight(&weight) else {
                println!("{} invalid weight: {}", "error:".red().bold(), weight);
                return Ok(());
            };

            let Some(ex_index) = target_index(&engine, exercise) else {
                return Ok(());
            };

            let set_no = engine.session().current_set_index + 1;
            if let Err(e) = engine.log_set(ex_index, reps, weight) {
                println!("{} {}", "error:".red().bold(), e);
                return Ok(());
            }

            write_through(&gateway, &user, day, &engine).await;

            let s = engine.session();
            println!(
                "{} logged set {} of {} ({} × {})",
                "ok:".green().bold(),
                set_no,
                s.current_exercise().exercise.name.bold(),
                utils::display_weight(weight),
                reps
            );
            if s.rest_timer.active {
                println!(
                    "{} rest timer running: {}s (run `session rest` to count it down)",
                    "info:".blue().bold(),
                    s.rest_timer.remaining_seconds
                );
            }
        }

        SessionCmd::Skip { exercise } => {
            let Some(mut engine) = load_engine(&gateway, &user, day, &cfg).await? else {
                return Ok(());
            };

            let Some(ex_index) = target_index(&engine, exercise) else {
                return Ok(());
            };

            if let Err(e) = engine.skip_set(ex_index) {
                println!("{} {}", "error:".red().bold(), e);
                return Ok(());
            }

            write_through(&gateway, &user, day, &engine).await;
            println!(
                "{} skipped a set of {}",
                "ok:".green().bold(),
                engine.session().current_exercise().exercise.name.bold()
            );
        }

        SessionCmd::Next => {
            navigate(&gateway, &user, day, &cfg, |e| e.next_exercise()).await?;
        }

        SessionCmd::Prev => {
            navigate(&gateway, &user, day, &cfg, |e| e.prev_exercise()).await?;
        }

        SessionCmd::Goto { exercise } => {
            let Some(index) = exercise.checked_sub(1) else {
                println!("{} exercise index must be ≥ 1", "error:".red().bold());
                return Ok(());
            };
            navigate(&gateway, &user, day, &cfg, |e| e.jump_to_exercise(index)).await?;
        }

        SessionCmd::Rest { secs, stop } => {
            let Some(mut engine) = load_engine(&gateway, &user, day, &cfg).await? else {
                return Ok(());
            };

            if stop {
                if let Err(e) = engine.stop_rest_timer() {
                    println!("{} {}", "error:".red().bold(), e);
                    return Ok(());
                }
                write_through(&gateway, &user, day, &engine).await;
                println!("{} rest timer stopped", "ok:".green().bold());
                return Ok(());
            }

            // An explicit duration replaces whatever is running; otherwise
            // pick up the active countdown or fall back to the config.
            let run_existing = secs.is_none() && engine.session().rest_timer.active;
            if !run_existing {
                let Some(duration) = secs.or_else(|| cfg.rest_secs()) else {
                    println!(
                        "{} no duration given and no `rest_secs` configured",
                        "error:".red().bold()
                    );
                    return Ok(());
                };
                if duration == 0 {
                    println!("{} rest duration must be at least 1 second", "error:".red().bold());
                    return Ok(());
                }
                if let Err(e) = engine.start_rest_timer(duration) {
                    println!("{} {}", "error:".red().bold(), e);
                    return Ok(());
                }
                write_through(&gateway, &user, day, &engine).await;
            }

            run_countdown(&mut engine).await?;
            write_through(&gateway, &user, day, &engine).await;
        }

        SessionCmd::Show => {
            let Some(engine) = load_engine(&gateway, &user, day, &cfg).await? else {
                return Ok(());
            };
            emit(fmt, engine.session(), || pretty_print_session(&engine));
        }

        SessionCmd::Cancel => {
            let Some(mut engine) = load_engine(&gateway, &user, day, &cfg).await? else {
                return Ok(());
            };

            if let Err(e) = engine.cancel_session() {
                println!("{} {}", "error:".red().bold(), e);
                return Ok(());
            }

            // The engine never auto-persists on cancel; discarding the
            // partial document is this caller's job.
            if let Err(e) = gateway.discard_active(&user, day).await {
                println!("{} {}", "warning:".yellow().bold(), e);
            }
            println!(
                "{} session cancelled ({})",
                "ok:".green().bold(),
                engine.session().workout
            );
        }

        SessionCmd::Finish { rating, note } => {
            let Some(mut engine) = load_engine(&gateway, &user, day, &cfg).await? else {
                return Ok(());
            };

            if !engine.session().is_finishable() {
                println!(
                    "{} not every set is done – finishing early anyway",
                    "info:".blue().bold()
                );
            }

            let summary = match engine.complete_session(rating, note) {
                Ok(summary) => summary,
                Err(e) => {
                    println!("{} {}", "error:".red().bold(), e);
                    return Ok(());
                }
            };

            if let Err(e) = gateway
                .archive_completed(&user, day, engine.session(), &summary)
                .await
            {
                println!("{} {}", "warning:".yellow().bold(), e);
            }

            emit(fmt, &summary, || {
                let s = engine.session();
                println!("{} session finished ({})", "ok:".green().bold(), s.workout);
                println!(
                    "  duration:  {}",
                    utils::format_duration(chrono::Duration::seconds(summary.duration_seconds))
                );
                println!(
                    "  exercises: {}/{} completed",
                    summary.completed_exercises,
                    s.exercises.len()
                );
                println!("  volume:    {:.1}", summary.total_volume);
                println!("  calories:  ~{}", summary.estimated_calories);
                if let Some(r) = summary.rating {
                    println!("  rating:    {}/5", r);
                }
                if let Some(n) = &summary.note {
                    println!("  note:      {}", n);
                }
            });
        }
    }

    Ok(())
}

/// Resumes today's session through the gateway, or reports the absence.
async fn load_engine(
    gateway: &SqliteGateway,
    user: &str,
    day: NaiveDate,
    cfg: &Config,
) -> Result<Option<SessionEngine>> {
    match gateway.load_active_session(user, day).await? {
        Some(session) => match SessionEngine::resume(session, cfg.rest_secs()) {
            Ok(engine) => Ok(Some(engine)),
            Err(e) => {
                println!("{} {}", "error:".red().bold(), e);
                Ok(None)
            }
        },
        None => {
            println!("{} no active session", "error:".red().bold());
            Ok(None)
        }
    }
}

/// Write-through save. A failure is a warning, never a rollback: the
/// in-memory session stays the source of truth.
async fn write_through(gateway: &SqliteGateway, user: &str, day: NaiveDate, engine: &SessionEngine) {
    if let Err(e) = gateway.save_session(user, day, engine.session()).await {
        println!("{} {}", "warning:".yellow().bold(), e);
    }
}

/// Maps the optional 1-based CLI index to the engine's 0-based one,
/// defaulting to the cursor.
fn target_index(engine: &SessionEngine, arg: Option<usize>) -> Option<usize> {
    match arg {
        None => Some(engine.session().current_exercise_index),
        Some(n) => match n.checked_sub(1) {
            Some(i) => Some(i),
            None => {
                println!("{} exercise index must be ≥ 1", "error:".red().bold());
                None
            }
        },
    }
}

async fn navigate(
    gateway: &SqliteGateway,
    user: &str,
    day: NaiveDate,
    cfg: &Config,
    op: impl FnOnce(&mut SessionEngine) -> Result<(), crate::error::EngineError>,
) -> Result<()> {
    let Some(mut engine) = load_engine(gateway, user, day, cfg).await? else {
        return Ok(());
    };

    if let Err(e) = op(&mut engine) {
        println!("{} {}", "error:".red().bold(), e);
        return Ok(());
    }

    write_through(gateway, user, day, &engine).await;

    let s = engine.session();
    println!(
        "{} now at {} ({} of {})",
        "ok:".green().bold(),
        s.current_exercise().exercise.name.bold(),
        s.current_exercise_index + 1,
        s.exercises.len()
    );
    Ok(())
}

/// Hosts the one-second tick loop; the engine itself never sleeps.
async fn run_countdown(engine: &mut SessionEngine) -> Result<()> {
    let remaining = engine.session().rest_timer.remaining_seconds;
    if remaining == 0 {
        println!("{} no rest timer running", "error:".red().bold());
        return Ok(());
    }

    loop {
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        match engine.tick_rest_timer() {
            Ok(RestTick::Running(left)) => {
                print!("\r  resting… {:>3}s ", left);
                std::io::stdout().flush().ok();
            }
            Ok(RestTick::Finished) => {
                println!("\r{} rest over – next set!   ", "ok:".green().bold());
                break;
            }
            Ok(RestTick::Idle) => break,
            Err(e) => {
                println!("{} {}", "error:".red().bold(), e);
                break;
            }
        }
    }
    Ok(())
}

fn pretty_print_session(engine: &SessionEngine) {
    let s = engine.session();
    let elapsed = session_elapsed_seconds(s.started_at, Local::now());

    println!(
        "{} {} (started {}, elapsed {})",
        "Session:".cyan().bold(),
        s.workout.bold(),
        s.started_at.format("%H:%M"),
        utils::format_duration(chrono::Duration::seconds(elapsed))
    );
    if s.rest_timer.active {
        println!(
            "{} resting: {}s of {}s left",
            "info:".blue().bold(),
            s.rest_timer.remaining_seconds,
            s.rest_timer.total_seconds
        );
    }
    if s.is_finishable() {
        println!("{} all sets done – `session finish` awaits", "info:".blue().bold());
    }

    println!("\n{}", "Exercises:".cyan().bold());
    for (i, progress) in s.exercises.iter().enumerate() {
        let ex = &progress.exercise;
        let marker = if i == s.current_exercise_index {
            "→".green().bold().to_string()
        } else {
            " ".to_string()
        };
        let idx = format!("{}", i + 1).yellow();
        let target = match ex.weight {
            Some(w) => format!("{} × {} @ {}kg", ex.sets, ex.reps, w),
            None => format!("{} × {} (bodyweight)", ex.sets, ex.reps),
        };
        println!(
            "{} {} • {} [{}] — {}",
            marker,
            idx,
            ex.name.bold(),
            ex.muscle,
            target.dimmed()
        );

        for set in &progress.sets {
            let cursor = if i == s.current_exercise_index && set.index == s.current_set_index {
                "›"
            } else {
                " "
            };
            let set_no = format!("{}", set.index + 1).yellow();
            let logged = if set.completed {
                match (set.reps, set.weight) {
                    (Some(0), Some(w)) if w == 0.0 => "skipped".dimmed().to_string(),
                    (Some(r), Some(w)) => {
                        format!("{} × {}", utils::display_weight(w), r).green().to_string()
                    }
                    _ => "logged".to_string(),
                }
            } else {
                "·".dimmed().to_string()
            };
            println!("   {} {} • {}", cursor, set_no, logged);
        }

        if i == s.current_exercise_index && !ex.tip.is_empty() {
            println!("     tip: {}", ex.tip.dimmed());
        }
    }
}
