//! `folio render`: one-shot preview of a page.
//!
//! Markdown and diagram pages are rendered locally; LaTeX and Typst pages are
//! sent to the compile service once and the PDF is written out.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::PageArgs;
use crate::compile::{CompileResult, HttpCompiler, RemoteCompiler};
use crate::config::FolioConfig;
use crate::log;
use crate::page::Page;
use crate::render::{Renderers, render_guarded};

pub fn render_page(args: &PageArgs, output: Option<&Path>, config: &FolioConfig) -> Result<()> {
    let page = Page::from_file(&args.file, args.format)?;

    let renderers = Renderers::default();
    let (bytes, extension) = match renderers.for_format(page.format) {
        Some(renderer) => {
            let rendered = render_guarded(renderer, &page.content);
            if rendered.is_fallback() {
                log!("render"; "{} did not render, writing raw content", page.id);
            }
            (rendered.to_markup().into_owned().into_bytes(), rendered.extension())
        }
        None => (compile_once(&page, config)?, "pdf"),
    };

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(&config.preview.output, &page, extension));
    write_output(&path, &bytes)?;

    log!("render"; "{} -> {}", page.id, path.display());
    Ok(())
}

fn compile_once(page: &Page, config: &FolioConfig) -> Result<Vec<u8>> {
    let compiler = HttpCompiler::new(&config.compile.server, config.compile.timeout())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    log!("compile"; "{} ({}) via {}", page.id, page.format, compiler.base());
    match runtime.block_on(compiler.compile(page.format, page.content.clone())) {
        CompileResult::Success { artifact } => Ok(artifact),
        CompileResult::Failure { message } => bail!("failed to compile {}: {}", page.id, message),
    }
}

fn default_output(dir: &Path, page: &Page, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", page.id, extension))
}

pub(super) fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create `{}`", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write `{}`", path.display()))
}
