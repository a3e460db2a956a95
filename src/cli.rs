use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "embedzip")]
#[command(version)]
#[command(about = "Inspect and extract a ZIP archive appended to an executable", long_about = None)]
#[command(after_help = "Examples:\n  \
  embedzip -l ./app              list the archive appended to ./app\n  \
  embedzip -p ./app config.toml  print one embedded entry\n  \
  embedzip --locate ./app        show where the archive starts\n\n\
Without FILE, the archive appended to embedzip itself is used. An\n\
arguments.txt in that archive supplies default arguments.")]
pub struct Cli {
    /// Host file carrying the archive (default: this executable)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Entries to extract (default: all)
    #[arg(value_name = "ENTRIES")]
    pub entries: Vec<String>,

    /// List entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract entries to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract entries into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Exclude entries that follow
    #[arg(short = 'x', value_name = "ENTRY", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Print the offset and size of the embedded archive
    #[arg(long)]
    pub locate: bool,

    /// Print the command line after embedded arguments were applied
    #[arg(long = "args")]
    pub show_args: bool,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }
}
