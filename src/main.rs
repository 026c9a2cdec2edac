use std::io;

use bokja_ai::commands::config::{self, ConfigArgs};
use bokja_ai::commands::llm::{self, LlmArgs};
use bokja_ai::commands::ocr::{self, OcrArgs};
use bokja_ai::commands::tts::{self, TtsArgs};
use bokja_ai::{VERSION, dispatch, logging};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  bokja llm category '[\"해열제\",\"콧물약\"]'\n  bokja ocr ./prescription.jpg 1\n  bokja tts tts \"약 드실 시간이에요\"\n  bokja config check\n  bokja completion bash > ~/.local/share/bash-completion/completions/bokja";

#[derive(Debug, Parser)]
#[command(
    name = "bokja",
    version = VERSION,
    about = "AI service bridges for the bokja backend",
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run a chat-model operation")]
    Llm(LlmArgs),
    #[command(about = "Recognize a prescription or medication envelope image")]
    Ocr(OcrArgs),
    #[command(about = "Synthesize speech")]
    Tts(TtsArgs),
    #[command(about = "Inspect configuration")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "bokja", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "bokja", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "bokja", &mut io::stdout()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();
    let cli: Cli = dispatch::parse_cli();

    let result = match cli.command {
        Commands::Llm(args) => llm::run(args).await,
        Commands::Ocr(args) => ocr::run(args).await,
        Commands::Tts(args) => tts::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    dispatch::exit_on_error(result);
}
