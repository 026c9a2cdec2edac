use bokja_ai::commands::llm::{self, LlmArgs};
use bokja_ai::{VERSION, dispatch, logging};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "bokja-llm",
    version = VERSION,
    about = "Run one chat-model operation and print its JSON result"
)]
struct Cli {
    #[command(flatten)]
    llm: LlmArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();
    let cli: Cli = dispatch::parse_cli();
    dispatch::exit_on_error(llm::run(cli.llm).await);
}
