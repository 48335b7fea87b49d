use clap::{Parser, Subcommand};
use taxengine::cmd::assess::{ExciseCommand, GstCommand, IncomeCommand, PayrollCommand};
use taxengine::cmd::monitor::MonitorCommand;
use taxengine::cmd::penalty::PenaltyCommand;
use taxengine::cmd::score::ScoreCommand;

/// Tax and compliance calculation engine
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assess income tax from a JSON request
    Income(IncomeCommand),
    /// Assess GST from a JSON request
    Gst(GstCommand),
    /// Assess payroll taxes (PAYE and skills development levy)
    Payroll(PayrollCommand),
    /// Assess excise duty on product lines
    Excise(ExciseCommand),
    /// Price a single penalty or interest charge
    Penalty(PenaltyCommand),
    /// Compute a compliance score and issue list from a client history
    Score(ScoreCommand),
    /// Run the deadline monitor over a batch of monitoring items
    Monitor(MonitorCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    match &cli.command {
        Command::Income(cmd) => cmd.exec(),
        Command::Gst(cmd) => cmd.exec(),
        Command::Payroll(cmd) => cmd.exec(),
        Command::Excise(cmd) => cmd.exec(),
        Command::Penalty(cmd) => cmd.exec(),
        Command::Score(cmd) => cmd.exec(),
        Command::Monitor(cmd) => cmd.exec(),
    }
}
