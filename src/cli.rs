use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "setflow", version, about = "Guided workout session engine")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Session-scoped commands
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Workout plan management
    #[command(subcommand, visible_alias = "p")]
    Plan(PlanCmd),

    /// View or edit setflow config
    #[command(subcommand)]
    Config(ConfigCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start a guided session from a plan
    #[command(visible_alias = "s")]
    Start {
        /// Plan index (from `p list`) or exact name
        plan: String,
    },

    /// Log the current set - Usage: session log WEIGHT REPS
    #[command(visible_alias = "l")]
    #[command(override_usage = "session log <WEIGHT> <REPS>")]
    Log {
        /// Weight used (use "bw" for bodyweight exercises)
        #[arg(value_name = "WEIGHT")]
        weight: String,

        /// Number of reps performed
        #[arg(value_name = "REPS")]
        reps: u32,

        /// 1-based exercise index; must match the session cursor
        /// (defaults to the current exercise)
        #[arg(long, short = 'e')]
        exercise: Option<usize>,
    },

    /// Skip the current set (counts as done with zero reps and weight)
    Skip {
        /// 1-based exercise index; must match the session cursor
        #[arg(long, short = 'e')]
        exercise: Option<usize>,
    },

    /// Move to the next exercise
    #[command(visible_alias = "n")]
    Next,

    /// Move to the previous exercise
    Prev,

    /// Jump straight to an exercise
    #[command(visible_alias = "g")]
    Goto {
        /// 1-based exercise index
        #[arg(value_name = "EXERCISE")]
        exercise: usize,
    },

    /// Run a rest countdown, or stop the running one
    #[command(visible_alias = "r")]
    Rest {
        /// Countdown duration in seconds (defaults to the `rest_secs` config)
        secs: Option<u32>,

        /// Stop the running countdown instead
        #[arg(long)]
        stop: bool,
    },

    /// Show current session details
    #[command(visible_alias = "i")]
    Show,

    /// Cancel the current session
    #[command(visible_alias = "c")]
    Cancel,

    /// Finish the session and archive the summary
    #[command(visible_alias = "f")]
    Finish {
        /// Session rating, 1-5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,

        /// Free-form note attached to the summary
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PlanCmd {
    /// Import one or more plans from TOML files
    #[command(visible_alias = "i")]
    Import { files: Vec<String> },

    /// List plans
    #[command(visible_alias = "l")]
    List,

    /// Show a single plan in detail
    #[command(visible_alias = "s")]
    Show {
        /// Plan index (from `p list`) or exact name
        plan: String,
    },

    /// Delete a plan
    #[command(visible_alias = "d")]
    Delete {
        /// Plan index (from `p list`) or exact name
        plan: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
