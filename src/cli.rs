use clap::Parser;
use std::path::Path;

use crate::io::DEFAULT_CHUNK_SIZE;

#[derive(Parser, Debug)]
#[command(name = "zipstream")]
#[command(version)]
#[command(about = "Walk a ZIP archive as it streams in, from a file or HTTP URL", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipstream data1.zip                        list entries as they arrive\n  \
  zipstream -v data1.zip                     verbose listing, including the central directory\n  \
  zipstream -p foo.zip '*.txt' | more        send text entries via pipe into more\n  \
  zipstream -l https://example.com/a.zip     list a remote ZIP without downloading past the entries")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to select (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format, the default; overrides -p)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely, reading through the central directory
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Read size for local files, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.is_piping()
    }

    /// Whether entry contents go to stdout. `-l` wins over `-p`.
    pub fn is_piping(&self) -> bool {
        self.pipe && !self.list
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Whether FILES is a single name without wildcards.
    pub fn selects_single_name(&self) -> bool {
        matches!(self.files.as_slice(), [name] if !has_glob_chars(name))
    }

    /// Whether an entry passes the FILES and `-x` filters.
    ///
    /// A FILES pattern without wildcards matches the full name or the
    /// basename; `-x` patterns match by substring or glob.
    pub fn selects(&self, name: &str) -> bool {
        if !self.files.is_empty() {
            let matches = self.files.iter().any(|f| {
                if has_glob_chars(f) {
                    glob_match(f, name)
                } else {
                    let basename = Path::new(name)
                        .file_name()
                        .map(|s| s.to_string_lossy())
                        .unwrap_or_default();
                    name == f || basename == f.as_str()
                }
            });
            if !matches {
                return false;
            }
        }

        !self
            .exclude
            .iter()
            .any(|x| name.contains(x.as_str()) || glob_match(x, name))
    }
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Either the star matches nothing, or it eats one character and stays
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("zipstream").chain(args.iter().copied()))
    }

    #[test]
    fn glob_wildcards() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(!glob_match("*.txt", "readme.md"));
        assert!(glob_match("docs/*", "docs/a/b.md"));
    }

    #[test]
    fn selects_by_name_basename_and_glob() {
        let cli = cli(&["a.zip", "notes.txt", "src/*.rs"]);
        assert!(cli.selects("notes.txt"));
        assert!(cli.selects("deep/dir/notes.txt"));
        assert!(cli.selects("src/main.rs"));
        assert!(!cli.selects("src/main.c"));
        assert!(!cli.selects_single_name());
    }

    #[test]
    fn exclusions_win() {
        let cli = cli(&["a.zip", "-x", "secret", "*.bak"]);
        assert!(cli.selects("public/readme"));
        assert!(!cli.selects("top_secret.txt"));
        assert!(!cli.selects("old.bak"));
    }

    #[test]
    fn chunk_size_defaults() {
        let cli = cli(&["https://example.com/a.zip"]);
        assert!(cli.is_http_url());
        assert_eq!(cli.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!cli.is_quiet());
    }

    #[test]
    fn list_flag_overrides_pipe() {
        let piping = cli(&["-p", "a.zip"]);
        assert!(piping.is_piping());
        assert!(piping.is_quiet());

        let listing = cli(&["-p", "-l", "a.zip"]);
        assert!(!listing.is_piping());
        assert!(!listing.is_quiet());
    }
}
