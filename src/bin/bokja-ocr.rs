use bokja_ai::commands::ocr::{self, OcrArgs};
use bokja_ai::{VERSION, dispatch, logging};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "bokja-ocr",
    version = VERSION,
    about = "Run OCR on an image file and print the vendor's JSON response"
)]
struct Cli {
    #[command(flatten)]
    ocr: OcrArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();
    let cli: Cli = dispatch::parse_cli();
    dispatch::exit_on_error(ocr::run(cli.ocr).await);
}
