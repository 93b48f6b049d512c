use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "nestzip")]
#[command(version)]
#[command(about = "Read entries of (nested) zip archives without extracting stored ones", long_about = None)]
#[command(after_help = "Examples:\n  \
  nestzip bundle.zip                         list entries of bundle.zip\n  \
  nestzip -v bundle.zip inner.zip            list inner.zip, stored inside bundle.zip\n  \
  nestzip bundle.zip inner.zip a.txt         print a.txt from inner.zip\n  \
  nestzip --offset=-22 bundle.zip inner.zip  print the last 22 bytes of inner.zip")]
pub struct Cli {
    /// Outer ZIP file
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Entry path: each component names an entry of the archive before it
    #[arg(value_name = "PATH")]
    pub path: Vec<String>,

    /// List entries of the innermost archive (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List entries verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Start of the range to print; negative counts from the end of the entry
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i64,

    /// Number of bytes to print (default: through the end of the entry)
    #[arg(long)]
    pub length: Option<u64>,

    /// Password for encrypted entries
    #[arg(short = 'P', value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Read the outer archive from disk on demand instead of loading it
    #[arg(long)]
    pub from_disk: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_listing(&self) -> bool {
        self.list || self.verbose || self.path.is_empty()
    }

    /// Default log filter, before `RUST_LOG` is applied.
    pub fn log_level(&self) -> &'static str {
        match self.quiet {
            0 => "info",
            1 => "warn",
            _ => "error",
        }
    }
}
