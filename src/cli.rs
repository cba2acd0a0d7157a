use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "memzip")]
#[command(version)]
#[command(about = "List, test, extract and create ZIP archives entirely in memory", long_about = None)]
#[command(after_help = "Examples:\n  \
  memzip data1.zip -x joe        extract all files except joe from data1.zip\n  \
  memzip -p foo.zip | more       send contents of foo.zip via pipe into more\n  \
  memzip -t foo.zip              check every entry's CRC-32\n  \
  memzip -c out.zip a.txt b.bin  store a.txt and b.bin in a new out.zip\n  \
  memzip -l https://example.com/archive.zip   list files from remote ZIP")]
pub struct Cli {
    /// Archive path or http(s):// URL; with -c, the archive to write
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Entry names or glob patterns to extract (default: all); with -c, files to store
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List entry names only
    #[arg(short = 'l')]
    pub list: bool,

    /// List entries with sizes, dates and CRC-32
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Test archive files (extract to memory and check CRC-32)
    #[arg(short = 't', conflicts_with_all = ["list", "verbose", "create"])]
    pub test: bool,

    /// Create FILE from FILES (stored, no compression)
    #[arg(short = 'c', conflicts_with_all = ["list", "verbose", "pipe"])]
    pub create: bool,

    /// Write entry contents to stdout, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract into DIR instead of the current directory
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Skip entries matching the patterns that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Keep existing files, never overwrite
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite existing files (or an existing archive with -c)
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Drop directory components from entry names
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Fewer messages (-qq for errors only)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

/// What a command line asks the tool to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    List { verbose: bool },
    Test,
    Extract,
    Create,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.create {
            Mode::Create
        } else if self.list || self.verbose {
            Mode::List {
                verbose: self.verbose,
            }
        } else if self.test {
            Mode::Test
        } else {
            Mode::Extract
        }
    }

    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_create_mode() {
        let cli = Cli::try_parse_from(["memzip", "-c", "out.zip", "a.txt", "b.bin"]).unwrap();
        assert_eq!(cli.mode(), Mode::Create);
        assert_eq!(cli.file, "out.zip");
        assert_eq!(cli.files, ["a.txt", "b.bin"]);
    }

    #[test]
    fn quiet_levels() {
        let cli = Cli::try_parse_from(["memzip", "-qq", "a.zip"]).unwrap();
        assert!(cli.is_quiet() && cli.is_very_quiet());

        let cli = Cli::try_parse_from(["memzip", "-p", "https://host/a.zip"]).unwrap();
        assert!(cli.is_quiet() && !cli.is_very_quiet());
        assert!(cli.is_http_url());
    }

    #[test]
    fn mode_selection() {
        let mode = |args: &[&str]| Cli::try_parse_from(args).unwrap().mode();
        assert_eq!(mode(&["memzip", "a.zip"]), Mode::Extract);
        assert_eq!(mode(&["memzip", "-l", "a.zip"]), Mode::List { verbose: false });
        assert_eq!(mode(&["memzip", "-lv", "a.zip"]), Mode::List { verbose: true });
        assert_eq!(mode(&["memzip", "-t", "a.zip", "*.txt"]), Mode::Test);
    }

    #[test]
    fn test_and_list_conflict() {
        assert!(Cli::try_parse_from(["memzip", "-t", "-l", "a.zip"]).is_err());
    }
}
