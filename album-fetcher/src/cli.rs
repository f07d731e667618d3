//! 命令行参数

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CollectionSpec;

/// album-fetcher - download product albums of a photo-hosting category
#[derive(Parser, Debug)]
#[command(name = "album-fetcher")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root folder of the download tree
    #[arg(short, long, global = true, env = "DOWNLOAD_ROOT", default_value = "downloads")]
    pub out: PathBuf,

    /// Write logs to a daily rolling file in this directory
    #[arg(long, global = true, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one category
    Fetch(FetchArgs),

    /// Fetch every category listed in a JSON file, one after another
    FetchMany {
        /// JSON array of {url, name?, start, end, password?}
        file: PathBuf,
    },

    /// Compare one category online with the local download tree
    Audit(FetchArgs),

    /// Audit every category listed in a JSON file
    AuditMany {
        /// Same format as fetch-many
        file: PathBuf,
    },

    /// Remove .jpg/.jpeg twins of the same image
    FixExtensions {
        /// Folder to scan (defaults to the download root)
        dir: Option<PathBuf>,

        /// Site owner used to query the image host
        #[arg(long)]
        owner: String,

        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Category URL
    #[arg(long)]
    pub url: String,

    /// Collection name (detected from the page when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// First page
    #[arg(long, default_value_t = 1)]
    pub start: u32,

    /// Last page (inclusive)
    #[arg(long, default_value_t = 1)]
    pub end: u32,

    /// Password for protected albums
    #[arg(long)]
    pub password: Option<String>,
}

impl From<FetchArgs> for CollectionSpec {
    fn from(args: FetchArgs) -> Self {
        Self {
            url: args.url,
            name: args.name,
            start: args.start,
            end: args.end,
            password: args.password,
        }
    }
}
