use clap::Parser;
use miette::Result;
use tilex::cli::{Cli, Commands};
use tilex::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new().with_verbose(cli.verbose);

    match cli.command {
        Commands::Extract(args) => {
            tilex::cli::extract::run(args, &printer)?;
        }
        Commands::Check(args) => {
            tilex::cli::check::run(args, &printer)?;
        }
        Commands::Completions(args) => tilex::cli::completions::run(args)?,
    }

    Ok(())
}
