//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::page::Format;

/// Live preview for markdown, LaTeX, Typst and diagram pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: folio.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "folio.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print line diagnostics of a LaTeX page
    #[command(visible_alias = "l")]
    Lint {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Render a page once
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        page: PageArgs,

        /// Output file (default: <preview.output>/<page>.<ext>)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Watch a page and keep its preview up to date
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        page: PageArgs,

        /// Only compile on explicit request (Enter on stdin)
        #[arg(long)]
        no_auto_compile: bool,

        /// Compile service URL, overrides `compile.server`
        #[arg(short, long, value_hint = clap::ValueHint::Url)]
        server: Option<String>,
    },
}

/// The page a command works on.
#[derive(clap::Args, Debug, Clone)]
pub struct PageArgs {
    /// Page file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Page format (markdown, latex, typst, diagram); guessed from the extension
    #[arg(short, long)]
    pub format: Option<Format>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from([
            "folio", "-V", "watch", "notes.tex", "--no-auto-compile", "-s", "http://h:1/api",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Watch {
                page,
                no_auto_compile,
                server,
            } => {
                assert_eq!(page.file, PathBuf::from("notes.tex"));
                assert_eq!(page.format, None);
                assert!(no_auto_compile);
                assert_eq!(server.as_deref(), Some("http://h:1/api"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_render_with_format() {
        let cli = Cli::try_parse_from(["folio", "render", "flow.txt", "-f", "mermaid", "-o", "out.svg"]).unwrap();
        match cli.command {
            Commands::Render { page, output } => {
                assert_eq!(page.format, Some(Format::Diagram));
                assert_eq!(output, Some(PathBuf::from("out.svg")));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("folio.toml"));
    }

    #[test]
    fn test_parse_lint_with_format() {
        let cli = Cli::try_parse_from(["folio", "lint", "notes.txt", "-f", "latex"]).unwrap();
        match cli.command {
            Commands::Lint { page } => {
                assert_eq!(page.file, PathBuf::from("notes.txt"));
                assert_eq!(page.format, Some(Format::Latex));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["folio", "render", "a", "-f", "docx"]).is_err());
    }
}
