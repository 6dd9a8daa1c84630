//! `folio lint`: print line diagnostics of a LaTeX page.

use std::path::Path;

use anyhow::{Result, bail};

use super::PageArgs;
use crate::lint::{Diagnostic, error_count, lint};
use crate::log;
use crate::page::Page;
use crate::utils::plural_count;

pub fn lint_page(args: &PageArgs) -> Result<()> {
    let file = args.file.as_path();
    let page = Page::from_file(file, args.format)?;
    if !page.format.has_diagnostics() {
        log!("lint"; "{} is a {} page, nothing to check", file.display(), page.format);
        return Ok(());
    }

    let diagnostics = lint(&page.content);
    for diagnostic in &diagnostics {
        eprintln!("{}", located(file, diagnostic));
    }

    let errors = error_count(&diagnostics);
    if errors > 0 {
        bail!("{}: {}", file.display(), plural_count(errors, "error"));
    }

    log!("lint"; "{}: no problems", file.display());
    Ok(())
}

/// `notes.tex:3: error: unbalanced braces in this line`
fn located(file: &Path, diagnostic: &Diagnostic) -> String {
    format!(
        "{}:{}: {}: {}",
        file.display(),
        diagnostic.line_range.line,
        diagnostic.severity.label(),
        diagnostic.message
    )
}
