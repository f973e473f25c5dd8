use crate::dates::format_date;
use crate::types::DirEntry;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const RULE_WIDTH: usize = 50;

/// One numbered listing line, shared by the console and the report file.
#[must_use]
pub fn listing_line(index: usize, entry: &DirEntry) -> String {
    format!(
        "{:>3}. [{}] {}",
        index,
        format_date(entry.modified),
        entry.path.display()
    )
}

/// Listing lines for entries already sorted by date, numbered from 1.
#[must_use]
pub fn listing(entries: &[DirEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| listing_line(i + 1, e))
        .collect()
}

#[must_use]
pub fn file_name(now: DateTime<Local>) -> String {
    format!("carpetas_filtradas_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

#[must_use]
pub fn render(root: &Path, entries: &[DirEntry], generated_at: DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str("RESULTADOS DEL FILTRO DE CARPETAS POR FECHA\n");
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    let _ = writeln!(
        out,
        "Fecha de generación: {}",
        generated_at.format("%d/%m/%Y %H:%M:%S")
    );
    let _ = writeln!(out, "Ruta de búsqueda: {}", root.display());
    let _ = writeln!(out, "Total de carpetas: {}\n", entries.len());

    for line in listing(entries) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Writes the report into `dir` and returns the path of the new file.
pub fn write_report(
    dir: &Path,
    root: &Path,
    entries: &[DirEntry],
    now: DateTime<Local>,
) -> std::io::Result<PathBuf> {
    let path = dir.join(file_name(now));
    fs::write(&path, render(root, entries, now))?;
    log::info!("report with {} entries written to {}", entries.len(), path.display());
    Ok(path)
}
