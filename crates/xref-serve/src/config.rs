//! Command-line options for the query server.

use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_INDEX_FILES: &[&str] = &[
    "NEWS",
    "README",
    "README.md",
    "00-INDEX",
    "CHANGES",
    "Changes",
    "ChangeLog",
    "changelog",
    "Kconfig",
];

#[derive(Parser, Debug)]
#[command(name = "xref-server", about = "Query server for compact binary symbol indexes")]
pub struct Opts {
    /// Directory with indexes to load; repeatable.
    #[arg(long = "index-dir", required = true)]
    pub index_dir: Vec<PathBuf>,

    /// Directory with rendered source pages to serve at /.
    #[arg(long = "web-root")]
    pub web_root: Option<PathBuf>,

    /// Address to listen on (env: XREF_BIND_ADDR).
    #[arg(long)]
    pub listen: Option<String>,

    /// Project name, shown on rendered pages.
    #[arg(long, default_value = "")]
    pub project: String,

    /// Where to keep logs; stdout when unset.
    #[arg(long)]
    pub logdir: Option<PathBuf>,

    /// Files to serve when a directory has no index page.
    #[arg(long = "web-index-files", value_delimiter = ',')]
    pub web_index_files: Vec<String>,
}

impl Opts {
    /// The configured directory-index candidates, or the stock list.
    pub fn index_files(&self) -> Vec<String> {
        if self.web_index_files.is_empty() {
            DEFAULT_INDEX_FILES.iter().map(|s| s.to_string()).collect()
        } else {
            self.web_index_files.clone()
        }
    }

    /// Bind address: flag, then env, then the local default.
    pub fn bind_addr(&self) -> String {
        self.listen
            .clone()
            .or_else(|| std::env::var("XREF_BIND_ADDR").ok())
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_files_default_and_override() {
        let opts = Opts::parse_from(["xref-server", "--index-dir", "/idx"]);
        assert!(opts.index_files().contains(&"README".to_string()));

        let opts = Opts::parse_from([
            "xref-server",
            "--index-dir",
            "/idx",
            "--web-index-files",
            "TOP,INDEX.txt",
        ]);
        assert_eq!(opts.index_files(), vec!["TOP", "INDEX.txt"]);
    }

    #[test]
    fn listen_flag_wins_over_default() {
        let opts = Opts::parse_from(["xref-server", "--index-dir", "/idx", "--listen", "0.0.0.0:9000"]);
        assert_eq!(opts.bind_addr(), "0.0.0.0:9000");
    }
}
