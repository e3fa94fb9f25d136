use clap::Parser;
use lookalike::Opts;
use lookalike::cli::SubCommandExtend;
use lookalike::config::SubCommand;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let opts = Opts::parse();

    match &opts.subcmd {
        SubCommand::Build(config) => config.run(&opts).await,
        SubCommand::Search(config) => config.run(&opts).await,
        SubCommand::Server(config) => config.run(&opts).await,
        SubCommand::Show(config) => config.run(&opts).await,
    }
}
