use std::collections::HashSet;
use std::fs::read_to_string;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Deserialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::{
    cli::PlanCmd,
    models::{Exercise, WorkoutPlan},
    types::{self, OutputFmt, emit},
};

#[derive(Debug, Deserialize)]
struct PlanToml {
    name: String,
    description: Option<String>,
    exercise: Vec<ExerciseToml>,
}

#[derive(Debug, Deserialize)]
struct ExerciseToml {
    name: String,
    muscle: String,
    sets: u32,
    reps: String,
    weight: Option<f32>,
    instructions: Option<String>,
    tip: Option<String>,
    alternatives: Option<Vec<String>>,
}

#[derive(serde::Serialize)]
struct PlanJson {
    idx: i64,
    name: String,
    description: String,
    exercises: usize,
    created_at: String,
}

pub async fn handle(cmd: PlanCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    match cmd {
        PlanCmd::Import { files } => {
            if files.is_empty() {
                println!("{} no plan file provided", "warning:".yellow().bold());
            }
            for f in files {
                match import_single_plan(pool, &f).await {
                    Ok(()) => {}
                    Err(e) => {
                        if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
                            if io_err.kind() == std::io::ErrorKind::NotFound {
                                println!(
                                    "{} cannot open file `{}` – file not found",
                                    "error:".red().bold(),
                                    f
                                );
                                continue;
                            }
                        }
                        return Err(e);
                    }
                }
            }
        }

        PlanCmd::List => {
            let rows = sqlx::query(
                r#"
                SELECT ROW_NUMBER() OVER (ORDER BY name) AS idx,
                       name, payload, created_at
                FROM   plans
                ORDER  BY idx
                "#,
            )
            .fetch_all(pool)
            .await?;

            let mut plans = Vec::<PlanJson>::new();
            for r in &rows {
                let payload: String = r.get("payload");
                let plan: WorkoutPlan = serde_json::from_str(&payload)?;
                plans.push(PlanJson {
                    idx: r.get("idx"),
                    name: r.get("name"),
                    description: plan.description.unwrap_or_default(),
                    exercises: plan.exercises.len(),
                    created_at: r.get("created_at"),
                });
            }

            emit(fmt, &plans, || pretty_print(&plans));
        }

        PlanCmd::Show { plan } => {
            let Some((_, plan)) = resolve_plan(pool, &plan).await? else {
                return Ok(());
            };
            emit(fmt, &plan, || pretty_print_plan(&plan));
        }

        PlanCmd::Delete { plan } => {
            let Some((id, plan)) = resolve_plan(pool, &plan).await? else {
                return Ok(());
            };
            sqlx::query("DELETE FROM plans WHERE id = ?")
                .bind(&id)
                .execute(pool)
                .await?;
            println!("{} deleted `{}`", "ok:".green().bold(), plan.name);
        }
    }
    Ok(())
}

/// Resolves a plan by list index or exact name, the same way the session
/// commands do. Prints its own error and returns None when nothing matches.
pub async fn resolve_plan(pool: &SqlitePool, arg: &str) -> Result<Option<(String, WorkoutPlan)>> {
    let row: Option<(String, String)> = if let Ok(idx) = arg.parse::<i64>() {
        sqlx::query_as(
            r#"
            SELECT id, payload
            FROM (
              SELECT id, payload, ROW_NUMBER() OVER (ORDER BY name) AS rn
              FROM plans
            ) t
            WHERE t.rn = ?
            "#,
        )
        .bind(idx)
        .fetch_optional(pool)
        .await?
    } else {
        sqlx::query_as("SELECT id, payload FROM plans WHERE name = ?")
            .bind(arg)
            .fetch_optional(pool)
            .await?
    };

    match row {
        Some((id, payload)) => {
            let plan = serde_json::from_str(&payload)
                .with_context(|| format!("corrupt plan document `{}`", arg))?;
            Ok(Some((id, plan)))
        }
        None => {
            println!("{} no plan matching `{}`", "error:".red().bold(), arg);
            Ok(None)
        }
    }
}

async fn import_single_plan(pool: &SqlitePool, file: &str) -> Result<()> {
    let toml_str = read_to_string(file).with_context(|| format!("reading `{file}`"))?;
    let plan: PlanToml = toml::from_str(&toml_str).with_context(|| format!("parsing `{file}`"))?;

    if plan.exercise.is_empty() {
        println!(
            "{} plan `{}` has no exercises – skipped",
            "warning:".yellow().bold(),
            plan.name
        );
        return Ok(());
    }

    // Duplicate exercise names make cursor positions ambiguous.
    let mut seen = HashSet::new();
    let dup: Vec<&str> = plan
        .exercise
        .iter()
        .filter(|e| !seen.insert(e.name.as_str()))
        .map(|e| e.name.as_str())
        .collect();
    if !dup.is_empty() {
        println!(
            "{} plan `{}` has duplicate exercises: {} – skipped",
            "warning:".yellow().bold(),
            plan.name,
            dup.join(", ")
        );
        return Ok(());
    }

    let mut exercises = Vec::with_capacity(plan.exercise.len());
    for ex in &plan.exercise {
        if ex.sets == 0 {
            println!(
                "{} exercise `{}` prescribes zero sets – plan `{}` skipped",
                "warning:".yellow().bold(),
                ex.name,
                plan.name
            );
            return Ok(());
        }
        if let Some(w) = ex.weight {
            if w < 0.0 {
                println!(
                    "{} exercise `{}` has a negative weight – plan `{}` skipped",
                    "warning:".yellow().bold(),
                    ex.name,
                    plan.name
                );
                return Ok(());
            }
        }

        let Some(muscle) = types::canonical_muscle(&ex.muscle) else {
            match types::best_muscle_suggestion(&ex.muscle) {
                Some(s) => println!(
                    "{} unknown muscle `{}` in `{}` – did you mean `{}`?",
                    "error:".red().bold(),
                    ex.muscle,
                    ex.name,
                    s
                ),
                None => println!(
                    "{} unknown muscle `{}` in `{}`",
                    "error:".red().bold(),
                    ex.muscle,
                    ex.name
                ),
            }
            return Ok(());
        };

        exercises.push(Exercise {
            name: ex.name.clone(),
            muscle,
            sets: ex.sets,
            reps: ex.reps.clone(),
            weight: ex.weight,
            instructions: ex.instructions.clone().unwrap_or_default(),
            tip: ex.tip.clone().unwrap_or_default(),
            alternatives: ex.alternatives.clone().unwrap_or_default(),
        });
    }

    let doc = WorkoutPlan {
        name: plan.name.clone(),
        description: plan.description.clone(),
        exercises,
    };
    let payload = serde_json::to_string(&doc)?;

    let res = sqlx::query(
        r#"INSERT INTO plans (id, name, payload, created_at)
           VALUES (?1, ?2, ?3, datetime('now'))"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&doc.name)
    .bind(&payload)
    .execute(pool)
    .await;

    if let Err(sqlx::Error::Database(db_err)) = &res {
        if db_err.code() == Some("2067".into()) {
            println!(
                "{} plan `{}` already exists – skipping",
                "warning:".yellow().bold(),
                doc.name
            );
            return Ok(());
        }
    }
    res?;

    println!("{} `{}`", "ok:".green().bold(), doc.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::TempDir;

    async fn pool_in(dir: &TempDir) -> SqlitePool {
        let path = dir.path().join("plans.db");
        db::open(path.to_str().unwrap()).await.unwrap()
    }

    fn write_plan(dir: &TempDir, file: &str, body: &str) -> String {
        let path = dir.path().join(file);
        std::fs::write(&path, body).unwrap();
        path.to_str().unwrap().to_string()
    }

    async fn plan_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM plans")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn import_stores_a_valid_plan_once() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_in(&dir).await;
        let file = write_plan(
            &dir,
            "push.toml",
            r#"
            name = "Push Day"
            description = "Chest focus"

            [[exercise]]
            name = "Bench Press"
            muscle = "Chest"
            sets = 3
            reps = "8-10"
            weight = 60.0
            "#,
        );

        import_single_plan(&pool, &file).await.unwrap();
        assert_eq!(plan_count(&pool).await, 1);

        let (_, plan) = resolve_plan(&pool, "Push Day").await.unwrap().unwrap();
        assert_eq!(plan.exercises.len(), 1);
        // Muscle names are stored canonicalized.
        assert_eq!(plan.exercises[0].muscle, "chest");
        assert_eq!(plan.exercises[0].sets, 3);

        // Re-importing the same name is skipped, not duplicated.
        import_single_plan(&pool, &file).await.unwrap();
        assert_eq!(plan_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn import_rejects_a_plan_without_exercises() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_in(&dir).await;
        let file = write_plan(
            &dir,
            "empty.toml",
            r#"
            name = "Empty Day"
            exercise = []
            "#,
        );

        import_single_plan(&pool, &file).await.unwrap();
        assert_eq!(plan_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn import_rejects_duplicate_exercise_names() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_in(&dir).await;
        let file = write_plan(
            &dir,
            "dup.toml",
            r#"
            name = "Doubled"

            [[exercise]]
            name = "Squat"
            muscle = "legs"
            sets = 3
            reps = "5"

            [[exercise]]
            name = "Squat"
            muscle = "legs"
            sets = 3
            reps = "5"
            "#,
        );

        import_single_plan(&pool, &file).await.unwrap();
        assert_eq!(plan_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn import_rejects_zero_set_exercises() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_in(&dir).await;
        let file = write_plan(
            &dir,
            "zero.toml",
            r#"
            name = "Zero Sets"

            [[exercise]]
            name = "Deadlift"
            muscle = "back"
            sets = 0
            reps = "5"
            "#,
        );

        import_single_plan(&pool, &file).await.unwrap();
        assert_eq!(plan_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn import_rejects_unknown_muscles() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_in(&dir).await;
        let file = write_plan(
            &dir,
            "typo.toml",
            r#"
            name = "Typo Day"

            [[exercise]]
            name = "Bench Press"
            muscle = "chets"
            sets = 3
            reps = "8"
            "#,
        );

        import_single_plan(&pool, &file).await.unwrap();
        assert_eq!(plan_count(&pool).await, 0);
    }
}

fn pretty_print(plans: &[PlanJson]) {
    if plans.is_empty() {
        println!("{}", "  (no plans found)".dimmed());
        return;
    }

    println!("{}", "Plans:".cyan().bold());
    let idx_w = plans
        .iter()
        .map(|p| p.idx.to_string().len())
        .max()
        .unwrap_or(1);

    for p in plans {
        let idx = format!("{:>width$}", p.idx, width = idx_w).yellow();
        let desc = if p.description.is_empty() {
            String::new()
        } else {
            format!("– {}", p.description).dimmed().to_string()
        };
        println!(
            " {} • {} ({} exercises) {} {}",
            idx,
            p.name.bold(),
            p.exercises,
            desc,
            format!("added {}", &p.created_at[..10]).dimmed()
        );
    }
}

fn pretty_print_plan(plan: &WorkoutPlan) {
    println!("{} {}", "Plan:".cyan().bold(), plan.name.bold());
    if let Some(desc) = &plan.description {
        println!("{}", desc.dimmed());
    }

    for (i, ex) in plan.exercises.iter().enumerate() {
        let idx = format!("{}", i + 1).yellow();
        let weight = ex
            .weight
            .map(|w| format!(" @ {}kg", w))
            .unwrap_or_else(|| " (bodyweight)".to_string());
        println!(
            "{} • {} [{}] — {} × {}{}",
            idx,
            ex.name.bold(),
            ex.muscle,
            ex.sets,
            ex.reps,
            weight.dimmed()
        );
        if !ex.instructions.is_empty() {
            println!("     {}", ex.instructions.dimmed());
        }
        if !ex.tip.is_empty() {
            println!("     tip: {}", ex.tip.dimmed());
        }
        if !ex.alternatives.is_empty() {
            println!("     alternatives: {}", ex.alternatives.join(", ").dimmed());
        }
    }
}
