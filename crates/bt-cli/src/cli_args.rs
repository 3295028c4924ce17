use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bt-cli")]
#[command(about = "Branching dialogue player and authoring tools")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Play(PlayArgs),
    Lint(LintArgs),
    Ids(IdsArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Choose(ChooseArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "file")]
    pub(crate) file: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "file")]
    pub(crate) file: String,
}

#[derive(Debug, Args)]
pub(crate) struct LintArgs {
    #[arg(long = "dir")]
    pub(crate) dir: String,
}

#[derive(Debug, Args)]
pub(crate) struct IdsArgs {
    #[arg(long = "file")]
    pub(crate) file: String,
}
