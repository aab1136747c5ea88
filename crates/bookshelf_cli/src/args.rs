//! Command-line argument definitions.

use bookshelf_core::Genre;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Bookshelf catalog of authors and books.
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file; overrides BOOKSHELF_DB_PATH
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage authors
    #[command(subcommand)]
    Author(AuthorCommand),

    /// Manage books
    #[command(subcommand)]
    Book(BookCommand),

    /// Print a freshly generated ISBN-13
    Isbn {
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthorCommand {
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        bio: Option<String>,
        /// YYYY-MM-DD or RFC 3339
        #[arg(long)]
        birth_date: Option<String>,
    },
    Get {
        id: Uuid,
    },
    List {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[command(flatten)]
        paging: PagingArgs,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        birth_date: Option<String>,
    },
    /// Fails while any book references the author
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub enum BookCommand {
    Add {
        #[arg(long)]
        title: String,
        /// Author id
        #[arg(long)]
        author: Uuid,
        /// Generated when omitted
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        published_date: Option<String>,
        #[arg(long)]
        genre: Option<Genre>,
    },
    Get {
        id: Uuid,
    },
    List {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        author: Option<Uuid>,
        /// Substring of the genre label
        #[arg(long)]
        genre: Option<String>,
        /// Books published on this UTC day, as YYYY-MM-DD
        #[arg(long)]
        published_on: Option<String>,
        #[command(flatten)]
        paging: PagingArgs,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<Uuid>,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        published_date: Option<String>,
        #[arg(long)]
        genre: Option<Genre>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PagingArgs {
    /// 1-based page number (default 1)
    #[arg(long)]
    pub page: Option<u32>,
    /// Page size (default 10, max 100)
    #[arg(long)]
    pub limit: Option<u32>,
}
