use bokja_ai::commands::tts::{self, TtsArgs};
use bokja_ai::{VERSION, dispatch, logging};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "bokja-tts",
    version = VERSION,
    about = "Synthesize speech and print base64 audio as JSON"
)]
struct Cli {
    #[command(flatten)]
    tts: TtsArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();
    let cli: Cli = dispatch::parse_cli();
    dispatch::exit_on_error(tts::run(cli.tts).await);
}
