use crate::clock::Clock;
use crate::console::{Console, is_affirmative, is_yes_by_default};
use crate::dates::parse_date;
use crate::error::Result;
use crate::filter::{self, DateFilter, FilterOption};
use crate::paths::resolve_root;
use crate::report::{self, RULE_WIDTH};
use crate::scanner::{self, ScanError, Traversal};
use crate::types::DirEntry;
use chrono::NaiveDate;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Interactive controller: one search root and the last filtered result at a time.
pub struct Session<R, W, C> {
    console: Console<R, W>,
    clock: C,
    cwd: PathBuf,
    clear_screen: bool,
    root: PathBuf,
    last_results: Vec<DirEntry>,
}

impl<R: BufRead, W: Write, C: Clock> Session<R, W, C> {
    /// `cwd` is both the default search root and where reports are written.
    pub fn new(console: Console<R, W>, clock: C, cwd: PathBuf, clear_screen: bool) -> Self {
        Self {
            console,
            clock,
            root: cwd.clone(),
            cwd,
            clear_screen,
            last_results: Vec::new(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            if self.clear_screen {
                self.console.clear_screen()?;
            }
            self.show_title()?;
            self.request_root()?;
            let traversal = self.ask_traversal()?;

            self.console.say(format!(
                "\n🔍 Buscando carpetas en: {}",
                self.root.display()
            ))?;
            self.console.say(match traversal {
                Traversal::Recursive => "   (incluyendo subcarpetas)",
                Traversal::Shallow => "   (solo en directorio actual)",
            })?;

            let dirs = self.search(traversal)?;
            if dirs.is_empty() {
                self.console.say(
                    "❌ No se encontraron carpetas en la ruta especificada."
                        .red()
                        .to_string(),
                )?;
                self.console.prompt("\nPresione Enter para continuar...")?;
                continue;
            }
            self.console
                .say(format!("✓ Se encontraron {} carpetas", dirs.len()).green())?;

            let option = self.choose_option()?;
            let filtered = self.apply_option(&dirs, option)?;
            self.show_results(filtered)?;
            self.offer_save()?;

            self.console.say(format!("\n{}", "-".repeat(RULE_WIDTH)))?;
            let again = self.console.prompt("¿Desea realizar otra búsqueda? (s/n): ")?;
            if !is_affirmative(&again) {
                break;
            }
        }

        self.console.say("\n¡Gracias por usar el filtro de carpetas!")?;
        Ok(())
    }

    fn show_title(&mut self) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        self.console.say(&rule)?;
        self.console
            .say("    FILTRO DE CARPETAS POR FECHA".cyan().bold())?;
        self.console.say(&rule)?;
        self.console.blank()
    }

    fn request_root(&mut self) -> Result<()> {
        loop {
            let input = self
                .console
                .prompt("Ingrese la ruta donde buscar (Enter para directorio actual): ")?;

            if let Some(root) = resolve_root(&input, &self.cwd) {
                self.console
                    .say(format!("✓ Ruta válida: {}", root.display()).green())?;
                self.root = root;
                return Ok(());
            }

            self.console.say(
                "❌ Error: La ruta especificada no existe o no es un directorio."
                    .red()
                    .to_string(),
            )?;
            self.console.blank()?;
        }
    }

    fn ask_traversal(&mut self) -> Result<Traversal> {
        self.console.blank()?;
        let answer = self
            .console
            .prompt("¿Incluir subcarpetas en la búsqueda? (s/n) [s]: ")?;
        Ok(if is_yes_by_default(&answer) {
            Traversal::Recursive
        } else {
            Traversal::Shallow
        })
    }

    /// Scan failures on the root are reported and yield no directories.
    fn search(&mut self, traversal: Traversal) -> Result<Vec<DirEntry>> {
        match scanner::scan_dirs(&self.root, traversal) {
            Ok(dirs) => Ok(dirs),
            Err(ScanError::PermissionDenied { path }) => {
                log::warn!("permission denied on search root {}", path.display());
                self.console.say(
                    format!("❌ Sin permisos para acceder a: {}", self.root.display()).red(),
                )?;
                Ok(Vec::new())
            }
            Err(e) => {
                log::warn!("scan failed: {e}");
                self.console
                    .say(format!("❌ Error al buscar carpetas: {e}").red())?;
                Ok(Vec::new())
            }
        }
    }

    fn choose_option(&mut self) -> Result<FilterOption> {
        self.console.say("\nOpciones de filtro:")?;
        for option in FilterOption::ALL {
            self.console
                .say(format!("{}. {}", option.number(), option.label()))?;
        }
        self.console.blank()?;

        loop {
            let input = self.console.prompt("Seleccione una opción (1-5): ")?;
            match input.parse::<i64>() {
                Ok(n) => match FilterOption::from_number(n) {
                    Some(option) => return Ok(option),
                    None => self.console.say(
                        "❌ Opción inválida. Seleccione un número del 1 al 5."
                            .red()
                            .to_string(),
                    )?,
                },
                Err(_) => self
                    .console
                    .say("❌ Por favor ingrese un número válido.".red().to_string())?,
            }
        }
    }

    fn request_date(&mut self, message: &str) -> Result<NaiveDate> {
        loop {
            let input = self.console.prompt(&format!("{message} [dd/mm/aaaa]: "))?;
            if let Some(date) = parse_date(&input) {
                return Ok(date);
            }
            self.console.say(
                "❌ Formato de fecha inválido. Use dd/mm/aaaa (ej: 15/03/2024)"
                    .red()
                    .to_string(),
            )?;
            self.console.blank()?;
        }
    }

    fn request_days(&mut self) -> Result<DateFilter> {
        let today = self.clock.today();
        loop {
            let input = self.console.prompt("Ingrese el número de días: ")?;
            let Ok(days) = input.parse::<i64>() else {
                self.console
                    .say("❌ Por favor ingrese un número válido.".red().to_string())?;
                continue;
            };
            match DateFilter::last_days(days, today) {
                Ok(filter) => return Ok(filter),
                Err(e) => self.console.say(format!("❌ {e}").red())?,
            }
        }
    }

    /// Gathers the parameters for `option` and filters `dirs`. An inverted range
    /// is reported and produces an empty result without evaluating any entry.
    fn apply_option(&mut self, dirs: &[DirEntry], option: FilterOption) -> Result<Vec<DirEntry>> {
        let criterion = match option {
            FilterOption::After => {
                DateFilter::After(self.request_date("Ingrese la fecha de referencia")?)
            }
            FilterOption::Before => {
                DateFilter::Before(self.request_date("Ingrese la fecha de referencia")?)
            }
            FilterOption::On => DateFilter::On(self.request_date("Ingrese la fecha específica")?),
            FilterOption::Range => {
                let start = self.request_date("Ingrese la fecha de inicio")?;
                let end = self.request_date("Ingrese la fecha de fin")?;
                match DateFilter::range(start, end) {
                    Ok(filter) => filter,
                    Err(e) => {
                        log::debug!("rejected range: {e:?}");
                        self.console.say(format!("❌ {e}").red())?;
                        return Ok(Vec::new());
                    }
                }
            }
            FilterOption::LastDays => self.request_days()?,
        };

        log::debug!("applying {criterion:?} to {} directories", dirs.len());
        Ok(filter::apply(&criterion, dirs))
    }

    /// `filtered` is expected in date order, as returned by `filter::apply`.
    fn show_results(&mut self, filtered: Vec<DirEntry>) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        self.console.say(format!("\n{rule}"))?;
        self.console.say("           RESULTADOS DEL FILTRO".cyan().bold())?;
        self.console.say(&rule)?;
        self.console.say(format!(
            "Total de carpetas encontradas: {}",
            filtered.len()
        ))?;
        self.console.blank()?;

        self.last_results = filtered;

        if self.last_results.is_empty() {
            return self.console.say(
                "❌ No se encontraron carpetas que cumplan el criterio especificado."
                    .red()
                    .to_string(),
            );
        }

        self.console.say("Carpetas que cumplen el criterio:")?;
        self.console.say("-".repeat(RULE_WIDTH))?;
        for line in report::listing(&self.last_results) {
            self.console.say(line)?;
        }
        Ok(())
    }

    fn offer_save(&mut self) -> Result<()> {
        if self.last_results.is_empty() {
            return Ok(());
        }

        self.console.say(format!("\n{}", "-".repeat(RULE_WIDTH)))?;
        let answer = self
            .console
            .prompt("¿Desea guardar estos resultados en un archivo? (s/n): ")?;
        if !is_affirmative(&answer) {
            return Ok(());
        }

        match report::write_report(&self.cwd, &self.root, &self.last_results, self.clock.now()) {
            Ok(path) => {
                let name = path.file_name().map_or_else(
                    || path.display().to_string(),
                    |n| n.to_string_lossy().to_string(),
                );
                self.console
                    .say(format!("✓ Resultados guardados en: {name}").green())
            }
            Err(e) => {
                log::warn!("report write failed: {e}");
                self.console
                    .say(format!("❌ Error al guardar el archivo: {e}").red())
            }
        }
    }
}

#[cfg(test)]
impl<R: BufRead, C: Clock> Session<R, Vec<u8>, C> {
    fn output_text(&self) -> String {
        String::from_utf8_lossy(self.console.output()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::AppError;
    use chrono::{DateTime, Local, TimeZone};
    use std::fs::{self, File};
    use std::io::Cursor;
    use std::path::Path;
    use std::time::SystemTime;
    use tempfile::TempDir;

    type TestSession = Session<Cursor<String>, Vec<u8>, FixedClock>;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap()
    }

    fn set_modified(path: &Path, y: i32, m: u32, d: u32) {
        let time: SystemTime = Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().into();
        File::open(path).unwrap().set_modified(time).unwrap();
    }

    /// `a` 01/01/2024, `b` 15/06/2024, `c` 01/01/2025 (its child `nested` 09/01/2025).
    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("c/nested")).unwrap();
        set_modified(&root.join("a"), 2024, 1, 1);
        set_modified(&root.join("b"), 2024, 6, 15);
        set_modified(&root.join("c/nested"), 2025, 1, 9);
        set_modified(&root.join("c"), 2025, 1, 1);
        tmp
    }

    fn session(tmp: &TempDir, script: &[&str]) -> TestSession {
        let input = script.iter().map(|l| format!("{l}\n")).collect::<String>();
        Session::new(
            Console::new(Cursor::new(input), Vec::new()),
            FixedClock(now()),
            tmp.path().to_path_buf(),
            false,
        )
    }

    fn reports(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect()
    }

    #[test]
    fn test_after_filter_sorted_and_saved() {
        let tmp = fixture();
        let root = tmp.path().join("root");
        let mut s = session(
            &tmp,
            &[root.to_str().unwrap(), "n", "1", "01/01/2024", "s", "n"],
        );
        s.run().unwrap();

        let out = s.output_text();
        assert!(out.contains("Se encontraron 3 carpetas"), "{out}");
        assert!(out.contains("Total de carpetas encontradas: 2"));
        let b = format!("  1. [15/06/2024] {}", root.join("b").display());
        let c = format!("  2. [01/01/2025] {}", root.join("c").display());
        assert!(out.contains(&b), "{out}");
        assert!(out.contains(&c), "{out}");
        assert!(out.find(&b) < out.find(&c));
        assert!(out.contains("carpetas_filtradas_20250110_093000.txt"));
        assert!(out.contains("¡Gracias por usar el filtro de carpetas!"));

        let files = reports(tmp.path());
        assert_eq!(files.len(), 1);
        let content = fs::read_to_string(&files[0]).unwrap();
        let numbered: Vec<&str> = content.lines().filter(|l| l.contains(". [")).collect();
        assert_eq!(numbered, vec![b.as_str(), c.as_str()]);
        assert!(content.contains("Fecha de generación: 10/01/2025 09:30:00"));
    }

    #[test]
    fn test_recursive_includes_nested() {
        let tmp = fixture();
        let root = tmp.path().join("root");
        let mut s = session(&tmp, &[root.to_str().unwrap(), "", "3", "09/01/2025", "n", "n"]);
        s.run().unwrap();

        let out = s.output_text();
        assert!(out.contains("Se encontraron 4 carpetas"), "{out}");
        assert!(out.contains("(incluyendo subcarpetas)"));
        assert_eq!(s.last_results.len(), 1);
        assert_eq!(s.last_results[0].name, "nested");
        assert!(reports(tmp.path()).is_empty());
    }

    #[test]
    fn test_invalid_inputs_reprompt() {
        let tmp = fixture();
        let root = tmp.path().join("root");
        let missing = tmp.path().join("missing");
        let mut s = session(
            &tmp,
            &[
                missing.to_str().unwrap(),
                root.to_str().unwrap(),
                "no",
                "abc",
                "9",
                "2",
                "31/02/2024",
                "1/1/2024",
                "01/06/2024",
                "n",
                "n",
            ],
        );
        s.run().unwrap();

        let out = s.output_text();
        assert!(out.contains("La ruta especificada no existe o no es un directorio."));
        assert!(out.contains("Por favor ingrese un número válido."));
        assert!(out.contains("Opción inválida. Seleccione un número del 1 al 5."));
        assert_eq!(out.matches("Formato de fecha inválido").count(), 2);
        assert_eq!(s.last_results.len(), 1);
        assert_eq!(s.last_results[0].name, "a");
    }

    #[test]
    fn test_inverted_range_gives_empty_result_without_save_prompt() {
        let tmp = fixture();
        let root = tmp.path().join("root");
        let mut s = session(
            &tmp,
            &[root.to_str().unwrap(), "n", "4", "01/01/2025", "01/01/2024", "n"],
        );
        s.run().unwrap();

        let out = s.output_text();
        assert!(out.contains("La fecha de inicio debe ser anterior a la fecha de fin."));
        assert!(out.contains("Total de carpetas encontradas: 0"));
        assert!(out.contains("No se encontraron carpetas que cumplan el criterio especificado."));
        assert!(!out.contains("¿Desea guardar"));
        assert!(s.last_results.is_empty());
    }

    #[test]
    fn test_last_days_uses_clock() {
        let tmp = fixture();
        let root = tmp.path().join("root");
        let mut s = session(
            &tmp,
            &[root.to_str().unwrap(), "s", "5", "0", "-2", "x", "10", "n", "n"],
        );
        s.run().unwrap();

        let out = s.output_text();
        assert_eq!(out.matches("El número de días debe ser positivo.").count(), 2);
        assert!(out.contains("Por favor ingrese un número válido."));
        let names: Vec<&str> = s.last_results.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["c", "nested"]);
    }

    #[test]
    fn test_empty_root_waits_then_restarts() {
        let tmp = fixture();
        let empty = tmp.path().join("empty");
        fs::create_dir(&empty).unwrap();
        let root = tmp.path().join("root");
        let mut s = session(
            &tmp,
            &[
                empty.to_str().unwrap(),
                "s",
                "",
                root.to_str().unwrap(),
                "n",
                "3",
                "15/06/2024",
                "n",
                "n",
            ],
        );
        s.run().unwrap();

        let out = s.output_text();
        assert!(out.contains("No se encontraron carpetas en la ruta especificada."));
        assert!(out.contains("Presione Enter para continuar..."));
        assert_eq!(out.matches("FILTRO DE CARPETAS POR FECHA").count(), 2);
        assert_eq!(s.last_results.len(), 1);
    }

    #[test]
    fn test_second_search_then_stop() {
        let tmp = fixture();
        let root = tmp.path().join("root");
        let r = root.to_str().unwrap();
        let mut s = session(
            &tmp,
            &[r, "n", "2", "01/01/2030", "n", "Sí", r, "n", "3", "01/01/2024", "n", "bye"],
        );
        s.run().unwrap();

        let out = s.output_text();
        assert!(out.contains("Total de carpetas encontradas: 3"));
        assert!(out.contains("Total de carpetas encontradas: 1"));
        assert_eq!(out.matches("¿Desea realizar otra búsqueda?").count(), 2);
    }

    #[test]
    fn test_empty_path_defaults_to_cwd() {
        let tmp = fixture();
        let mut s = session(&tmp, &["", "n", "1", "01/01/2000", "n", "n"]);
        s.run().unwrap();

        assert_eq!(s.root, tmp.path());
        let names: Vec<&str> = s.last_results.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["root"]);
    }

    #[test]
    fn test_end_of_input_is_error() {
        let tmp = fixture();
        let mut s = session(&tmp, &[]);
        assert!(matches!(s.run(), Err(AppError::InputClosed)));
    }

    #[test]
    fn test_report_write_failure_is_not_fatal() {
        let tmp = fixture();
        let root = tmp.path().join("root");
        let mut s = session(
            &tmp,
            &[root.to_str().unwrap(), "n", "1", "01/01/2024", "s", "n"],
        );
        s.cwd = tmp.path().join("does-not-exist");
        s.run().unwrap();

        let out = s.output_text();
        assert!(out.contains("Error al guardar el archivo"));
        assert!(out.contains("¡Gracias por usar el filtro de carpetas!"));
    }

    #[test]
    fn test_vanished_root_reports_scan_error() {
        let tmp = fixture();
        let mut s = session(&tmp, &[]);
        s.root = tmp.path().join("vanished");

        let dirs = s.search(Traversal::Recursive).unwrap();
        assert!(dirs.is_empty());
        let out = s.output_text();
        assert!(out.contains("❌ Error al buscar carpetas:"), "{out}");
        assert!(!out.contains("Sin permisos"));
    }

    #[cfg(unix)]
    #[test]
    fn test_locked_root_aborts_and_restarts() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = fixture();
        let locked = tmp.path().join("locked");
        fs::create_dir_all(locked.join("inside")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Permission bits are not enforced for this user (e.g. root).
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let root = tmp.path().join("root");
        let mut s = session(
            &tmp,
            &[
                locked.to_str().unwrap(),
                "s",
                "",
                root.to_str().unwrap(),
                "n",
                "3",
                "15/06/2024",
                "n",
                "n",
            ],
        );
        let result = s.run();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        result.unwrap();

        let out = s.output_text();
        let denied = format!("❌ Sin permisos para acceder a: {}", locked.display());
        let denied_at = out.find(&denied).expect("permission message shown");
        let empty_at = out
            .find("No se encontraron carpetas en la ruta especificada.")
            .expect("empty scan message shown");
        assert!(denied_at < empty_at);
        assert!(out.contains("Presione Enter para continuar..."));
        assert_eq!(out.matches("FILTRO DE CARPETAS POR FECHA").count(), 2);
        assert_eq!(s.last_results.len(), 1);
        assert_eq!(s.last_results[0].name, "b");
    }
}
