use crate::types::DirEntry;
use chrono::{Days, NaiveDate};
use thiserror::Error;

/// The five criteria offered by the menu, numbered 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOption {
    After,
    Before,
    On,
    Range,
    LastDays,
}

impl FilterOption {
    pub const ALL: [FilterOption; 5] = [
        FilterOption::After,
        FilterOption::Before,
        FilterOption::On,
        FilterOption::Range,
        FilterOption::LastDays,
    ];

    #[must_use]
    pub fn from_number(n: i64) -> Option<Self> {
        let idx = usize::try_from(n).ok()?.checked_sub(1)?;
        Self::ALL.get(idx).copied()
    }

    #[must_use]
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|o| *o == self).unwrap_or(0) + 1
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FilterOption::After => "Carpetas modificadas DESPUÉS de una fecha específica",
            FilterOption::Before => "Carpetas modificadas ANTES de una fecha específica",
            FilterOption::On => "Carpetas modificadas EN una fecha específica",
            FilterOption::Range => "Carpetas modificadas en un RANGO de fechas",
            FilterOption::LastDays => "Carpetas modificadas en los ÚLTIMOS N días",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("La fecha de inicio debe ser anterior a la fecha de fin.")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("El número de días debe ser positivo.")]
    NonPositiveDays(i64),
}

/// A validated date criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    After(NaiveDate),
    Before(NaiveDate),
    On(NaiveDate),
    /// Inclusive on both ends, `start <= end`.
    Between { start: NaiveDate, end: NaiveDate },
    /// Modified on or after this cutoff.
    Since(NaiveDate),
}

impl DateFilter {
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, FilterError> {
        if start > end {
            return Err(FilterError::InvertedRange { start, end });
        }
        Ok(DateFilter::Between { start, end })
    }

    /// Directories modified within the last `days` days counted back from
    /// `today`; `days = 1` covers today and yesterday.
    pub fn last_days(days: i64, today: NaiveDate) -> Result<Self, FilterError> {
        if days <= 0 {
            return Err(FilterError::NonPositiveDays(days));
        }
        let cutoff = u64::try_from(days)
            .ok()
            .and_then(|d| today.checked_sub_days(Days::new(d)))
            .unwrap_or(NaiveDate::MIN);
        Ok(DateFilter::Since(cutoff))
    }

    #[must_use]
    pub fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            DateFilter::After(reference) => date > reference,
            DateFilter::Before(reference) => date < reference,
            DateFilter::On(reference) => date == reference,
            DateFilter::Between { start, end } => start <= date && date <= end,
            DateFilter::Since(cutoff) => date >= cutoff,
        }
    }
}

/// Entries accepted by `filter`, ordered by modification date (oldest first).
#[must_use]
pub fn apply(filter: &DateFilter, dirs: &[DirEntry]) -> Vec<DirEntry> {
    let mut matched: Vec<DirEntry> = dirs
        .iter()
        .filter(|d| filter.matches(d.modified))
        .cloned()
        .collect();
    sort_by_date(&mut matched);
    matched
}

pub fn sort_by_date(dirs: &mut [DirEntry]) {
    dirs.sort_by_key(|d| d.modified);
}
