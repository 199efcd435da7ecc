//! Command-line interface definition for the Serena client
//!
//! This module defines the CLI structure using clap's derive API. Every
//! read command accepts `--json`; write-style commands take their content
//! as an argument or, given `-` (the default), from stdin.

use clap::{Parser, Subcommand};

/// Argument value meaning "read from stdin".
pub const STDIN_ARG: &str = "-";

/// Serena - semantic code navigation via LSP
///
/// Talks to a running Serena MCP server, reusing one session across
/// invocations.
#[derive(Parser, Debug, Clone)]
#[command(name = "serena")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "SERENA_CONFIG")]
    pub config: Option<String>,

    /// Serena MCP endpoint (overrides config and SERENA_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Find symbols by name pattern (supports wildcards like 'get*')
    Find {
        /// Symbol name or pattern
        pattern: String,

        /// Filter by kind: class, method, interface, function, ...
        #[arg(short, long)]
        kind: Option<String>,

        /// Restrict to a path (e.g. 'src/Meyer/')
        #[arg(short, long)]
        path: Option<String>,

        /// Include symbol bodies
        #[arg(short, long)]
        body: bool,

        /// Traversal depth (0 = symbol, 1 = children)
        #[arg(short, long, default_value_t = 0)]
        depth: u32,

        /// Exact match only
        #[arg(short, long)]
        exact: bool,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Find all references to a symbol
    Refs {
        /// Symbol path (e.g. 'Customer/getName')
        symbol: String,

        /// File where the symbol is defined
        file: String,

        /// Show references in every file
        #[arg(short, long)]
        all: bool,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Overview of the symbols in a file
    Overview {
        /// File to analyze
        file: String,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Search for a regex pattern in code
    Search {
        /// Regex pattern
        pattern: String,

        /// File glob filter (e.g. '*.php')
        #[arg(short, long)]
        glob: Option<String>,

        /// Restrict to a path
        #[arg(short, long)]
        path: Option<String>,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Check the Serena connection and configuration
    Status {
        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Activate a project (defaults to the current directory)
    Activate {
        /// Project path or name
        project: Option<String>,
    },

    /// Show version information
    Version,

    /// Run a pre-built query ('list' shows them all)
    Recipe {
        /// Recipe name
        #[arg(default_value = "list")]
        name: String,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List the tools the server exposes
    Tools {
        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Memory operations
    Memory {
        #[command(subcommand)]
        command: MemoryCommand,
    },

    /// Symbol-based code editing
    Edit {
        #[command(subcommand)]
        command: EditCommand,
    },

    /// Project onboarding
    Onboarding {
        #[command(subcommand)]
        command: OnboardingCommand,
    },

    /// Inspect or clear the stored MCP session
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Run the HTTP proxy
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Memory subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum MemoryCommand {
    /// List memories, optionally under a folder
    List {
        /// Folder (e.g. 'active/tasks')
        folder: Option<String>,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Read a memory
    Read {
        /// Memory name/path
        name: String,
    },

    /// Write a memory (folders are created as needed)
    Write {
        /// Memory name/path
        name: String,

        /// Content ('-' reads stdin)
        #[arg(default_value = STDIN_ARG)]
        content: String,
    },

    /// Delete a memory
    Delete {
        /// Memory name/path
        name: String,
    },

    /// Show the memory folder structure
    Tree {
        /// Start from this folder
        folder: Option<String>,
    },

    /// Search memory contents
    Search {
        /// Regex pattern
        pattern: String,

        /// Limit to folder
        #[arg(short, long)]
        folder: Option<String>,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Archive a memory under archive/YYYY-MM/
    Archive {
        /// Memory to archive
        name: String,

        /// Category subfolder
        #[arg(long)]
        category: Option<String>,
    },

    /// Move or rename a memory
    Move {
        /// Current name/path
        source: String,

        /// New name/path
        dest: String,
    },

    /// Memory statistics
    Stats {
        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Editing subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum EditCommand {
    /// Replace a symbol's body
    Replace {
        /// Symbol path (e.g. 'Customer/getName')
        symbol: String,

        /// File path
        file: String,

        /// New body ('-' reads stdin)
        #[arg(default_value = STDIN_ARG)]
        body: String,
    },

    /// Insert code after a symbol
    After {
        /// Symbol path
        symbol: String,

        /// File path
        file: String,

        /// Code to insert ('-' reads stdin)
        #[arg(default_value = STDIN_ARG)]
        code: String,
    },

    /// Insert code before a symbol
    Before {
        /// Symbol path
        symbol: String,

        /// File path
        file: String,

        /// Code to insert ('-' reads stdin)
        #[arg(default_value = STDIN_ARG)]
        code: String,
    },

    /// Rename a symbol across the project
    Rename {
        /// Symbol path
        symbol: String,

        /// File path
        file: String,

        /// New name
        new_name: String,
    },
}

/// Onboarding subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum OnboardingCommand {
    /// Check whether onboarding was performed
    Check,

    /// Show the onboarding instructions
    Show,

    /// Create the memory folder structure
    Init {
        /// Skip the template memories
        #[arg(long)]
        no_templates: bool,
    },
}

/// Session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Show stored sessions
    Show {
        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Forget the stored session(s)
    Clear {
        /// Clear sessions for every server, not just the configured one
        #[arg(short, long)]
        all: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_find_with_options() {
        let cli = Cli::try_parse_from([
            "serena", "find", "get*", "--kind", "method", "-p", "src/", "--body", "-d", "1",
            "--exact", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Find {
                pattern,
                kind,
                path,
                body,
                depth,
                exact,
                json,
            } => {
                assert_eq!(pattern, "get*");
                assert_eq!(kind.as_deref(), Some("method"));
                assert_eq!(path.as_deref(), Some("src/"));
                assert!(body && exact && json);
                assert_eq!(depth, 1);
            }
            other => panic!("Expected Find, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_refs() {
        let cli = Cli::try_parse_from([
            "serena",
            "refs",
            "Customer/getName",
            "src/Entity/Customer.php",
            "--all",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Refs { ref symbol, all: true, json: false, .. } if symbol == "Customer/getName"
        ));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "serena",
            "status",
            "--url",
            "http://host:1/mcp",
            "--timeout",
            "5",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://host:1/mcp"));
        assert_eq!(cli.timeout, Some(5));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_recipe_defaults_to_list() {
        let cli = Cli::try_parse_from(["serena", "recipe"]).unwrap();
        assert!(matches!(cli.command, Commands::Recipe { ref name, .. } if name == "list"));
    }

    #[test]
    fn test_cli_memory_write_defaults_to_stdin() {
        let cli = Cli::try_parse_from(["serena", "memory", "write", "notes/a"]).unwrap();
        match cli.command {
            Commands::Memory {
                command: MemoryCommand::Write { name, content },
            } => {
                assert_eq!(name, "notes/a");
                assert_eq!(content, STDIN_ARG);
            }
            other => panic!("Expected memory write, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_memory_move_and_search() {
        let cli = Cli::try_parse_from(["serena", "memory", "move", "a", "b"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Memory { command: MemoryCommand::Move { ref source, ref dest } }
                if source == "a" && dest == "b"
        ));

        let cli =
            Cli::try_parse_from(["serena", "memory", "search", "todo", "-f", "active"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Memory { command: MemoryCommand::Search { ref folder, .. } }
                if folder.as_deref() == Some("active")
        ));
    }

    #[test]
    fn test_cli_edit_rename_requires_new_name() {
        assert!(Cli::try_parse_from(["serena", "edit", "rename", "A/b", "a.php"]).is_err());
        let cli =
            Cli::try_parse_from(["serena", "edit", "rename", "A/b", "a.php", "c"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Edit { command: EditCommand::Rename { ref new_name, .. } } if new_name == "c"
        ));
    }

    #[test]
    fn test_cli_edit_replace_body_defaults_to_stdin() {
        let cli = Cli::try_parse_from(["serena", "edit", "replace", "A/b", "a.php"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Edit { command: EditCommand::Replace { ref body, .. } } if body == STDIN_ARG
        ));
    }

    #[test]
    fn test_cli_onboarding_and_session() {
        let cli = Cli::try_parse_from(["serena", "onboarding", "init", "--no-templates"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Onboarding { command: OnboardingCommand::Init { no_templates: true } }
        ));

        let cli = Cli::try_parse_from(["serena", "session", "clear", "--all"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Session { command: SessionCommand::Clear { all: true } }
        ));
    }

    #[test]
    fn test_cli_serve_overrides() {
        let cli = Cli::try_parse_from(["serena", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { host: None, port: Some(9000) }
        ));
    }

    #[test]
    fn test_cli_unknown_command_fails() {
        assert!(Cli::try_parse_from(["serena", "frobnicate"]).is_err());
        assert!(Cli::try_parse_from(["serena"]).is_err());
    }
}
