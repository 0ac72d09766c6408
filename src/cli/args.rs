use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meetwatch")]
#[command(about = "Automatic meeting detection, recording and transcription", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// Transcribe an existing recording artifact
    Transcribe(TranscribeCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct TranscribeCliArgs {
    /// Path to a WAV recording
    pub file: PathBuf,

    /// Write the transcript to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the configured language code
    #[arg(long)]
    pub language: Option<String>,
}
