use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::costsheet::tools::config::{NORMALIZED_PREFIX, PipelineConfig};
use crate::costsheet::tools::error::{Result, ToolError};
use crate::costsheet::tools::io::{discover, excel_read, excel_write};
use crate::costsheet::tools::model::{
    CPF_COLUMN, Cell, FATURA_COLUMN, NAME_COLUMN, SALARY_COLUMN, Spreadsheet, TOTAL_COLUMN,
};
use crate::costsheet::tools::normalize;

/// Outcome of a merge run.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The merged report was written.
    Merged {
        path: PathBuf,
        row_count: usize,
        cost_columns: Vec<String>,
    },
    /// No candidate carried both `CPF` and `Fatura`; nothing was written.
    NothingToMerge,
}

impl MergeOutcome {
    /// Human-readable status line.
    pub fn describe(&self) -> String {
        match self {
            MergeOutcome::Merged { path, .. } => format!(
                "Success. Merge complete, spreadsheet saved to '{}'",
                path.display()
            ),
            MergeOutcome::NothingToMerge => {
                "Nothing to merge: no normalized spreadsheet with 'CPF' and 'Fatura' columns was found."
                    .to_string()
            }
        }
    }
}

/// Folds every normalized spreadsheet of the output directory onto the base
/// report and writes the merged report.
///
/// The base file must exist and carry `CPF` and `Nome`. Unreadable or
/// malformed candidates are skipped.
#[instrument(level = "info", skip_all, fields(output = %config.output_directory.display()))]
pub fn merge_normalized_spreadsheets(config: &PipelineConfig) -> Result<MergeOutcome> {
    let base_path = config.base_path();
    if !base_path.is_file() {
        return Err(ToolError::MissingInput(base_path));
    }
    let base = excel_read::read_spreadsheet(&base_path)?;

    let merged_path = config.merged_path();
    let candidates = discover::list_spreadsheets(&config.output_directory)
        .into_iter()
        .filter(|path| *path != base_path && *path != merged_path);

    let mut inputs = Vec::new();
    for path in candidates {
        match excel_read::read_spreadsheet(&path) {
            Ok(sheet) => inputs.push((contributed_column_name(&path), sheet)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable candidate")
            }
        }
    }

    let Some(report) = merge_reports(base, &inputs)? else {
        info!("no candidate spreadsheet qualified for merging");
        return Ok(MergeOutcome::NothingToMerge);
    };

    excel_write::write_spreadsheet(&merged_path, &report.sheet)?;
    info!(
        path = %merged_path.display(),
        row_count = report.sheet.rows.len(),
        "merged report written"
    );

    Ok(MergeOutcome::Merged {
        path: merged_path,
        row_count: report.sheet.rows.len(),
        cost_columns: report.cost_columns,
    })
}

/// Merged table together with the cost columns it received.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedReport {
    pub sheet: Spreadsheet,
    pub cost_columns: Vec<String>,
}

/// Pure merge over already loaded spreadsheets.
///
/// Each candidate is a `(column name, spreadsheet)` pair. Candidates lacking
/// `CPF` or `Fatura` are skipped. Returns `None` when no candidate
/// qualified.
pub fn merge_reports(
    base: Spreadsheet,
    candidates: &[(String, Spreadsheet)],
) -> Result<Option<MergedReport>> {
    base.require_columns(&[CPF_COLUMN, NAME_COLUMN])?;

    let mut report = base;
    let mut cost_columns = Vec::new();

    for (name, candidate) in candidates {
        if !candidate.has_column(CPF_COLUMN) || !candidate.has_column(FATURA_COLUMN) {
            warn!(
                candidate = %name,
                columns = ?candidate.columns,
                "skipping candidate without CPF and Fatura columns"
            );
            continue;
        }

        let projection = candidate.select(&[CPF_COLUMN, FATURA_COLUMN])?;
        let column = unique_column_name(&report, name);
        report = left_join(report, &projection, &column)?;
        debug!(column = %column, "cost column joined");
        cost_columns.push(column);
    }

    if cost_columns.is_empty() {
        return Ok(None);
    }

    let mut sheet = drop_duplicate_employees(report)?;
    let totals = total_costs(&sheet, &cost_columns)?;
    sheet.set_column(TOTAL_COLUMN, totals);

    Ok(Some(MergedReport {
        sheet,
        cost_columns,
    }))
}

/// Column name contributed by a candidate file: its stem without the
/// `normalized_` prefix.
pub fn contributed_column_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_prefix(NORMALIZED_PREFIX)
        .map(str::to_string)
        .unwrap_or(stem)
}

/// Joins the `Fatura` column of `projection` onto `base` by `CPF`. Every base
/// row is kept; rows without a match get an empty cell.
fn left_join(base: Spreadsheet, projection: &Spreadsheet, column: &str) -> Result<Spreadsheet> {
    let key_index = base.require_columns(&[CPF_COLUMN])?[0];

    let mut matches: HashMap<String, Vec<&Cell>> = HashMap::new();
    for row in &projection.rows {
        let key = row[0].as_text();
        if key.trim().is_empty() {
            continue;
        }
        matches.entry(key).or_default().push(&row[1]);
    }

    let mut columns = base.columns;
    columns.push(column.to_string());

    let mut rows = Vec::with_capacity(base.rows.len());
    for row in base.rows {
        match matches.get(&row[key_index].as_text()) {
            Some(values) => {
                for value in values {
                    let mut joined = row.clone();
                    joined.push((*value).clone());
                    rows.push(joined);
                }
            }
            None => {
                let mut joined = row;
                joined.push(Cell::Empty);
                rows.push(joined);
            }
        }
    }

    Ok(Spreadsheet { columns, rows })
}

/// Keeps the first row of every distinct `(CPF, Nome)` pair.
fn drop_duplicate_employees(sheet: Spreadsheet) -> Result<Spreadsheet> {
    let indices = sheet.require_columns(&[CPF_COLUMN, NAME_COLUMN])?;
    let (cpf, name) = (indices[0], indices[1]);

    let mut seen = HashSet::new();
    let Spreadsheet { columns, rows } = sheet;
    let before = rows.len();
    let rows: Vec<Vec<Cell>> = rows
        .into_iter()
        .filter(|row| seen.insert((row[cpf].as_text(), row[name].as_text())))
        .collect();
    debug!(removed = before - rows.len(), "duplicate employees dropped");

    Ok(Spreadsheet { columns, rows })
}

/// Row-wise `Salario` plus every cost column, missing values counting as 0.
fn total_costs(sheet: &Spreadsheet, cost_columns: &[String]) -> Result<Vec<Cell>> {
    let mut names = vec![SALARY_COLUMN.to_string()];
    names.extend(cost_columns.iter().cloned());

    let mut indices = Vec::with_capacity(names.len());
    for name in &names {
        let index = sheet
            .column_index(name)
            .ok_or_else(|| ToolError::MissingExpectedColumn {
                column: name.clone(),
                available: sheet.columns.clone(),
            })?;
        indices.push(index);
    }

    let totals = sheet
        .rows
        .iter()
        .map(|row| {
            let total: f64 = indices
                .iter()
                .map(|&index| match normalize::cell_amount(&row[index]) {
                    Ok(amount) => amount.unwrap_or(0.0),
                    Err(err) => {
                        let column = &sheet.columns[index];
                        warn!(column = %column, error = %err, "counting value as zero");
                        0.0
                    }
                })
                .sum();
            Cell::Number(total)
        })
        .collect();

    Ok(totals)
}

/// Picks a free column name for a candidate. `Custo Total` counts as taken
/// since the totals are written under it.
fn unique_column_name(sheet: &Spreadsheet, name: &str) -> String {
    let taken = |candidate: &str| candidate == TOTAL_COLUMN || sheet.has_column(candidate);
    if !taken(name) {
        return name.to_string();
    }
    (2..)
        .map(|counter| format!("{name} ({counter})"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(cpf: &str, amount: f64) -> Spreadsheet {
        Spreadsheet::new(
            vec![CPF_COLUMN.into(), FATURA_COLUMN.into()],
            vec![vec![Cell::text(cpf), Cell::Number(amount)]],
        )
    }

    #[test]
    fn candidate_named_like_the_totals_keeps_its_values() {
        let base = Spreadsheet::new(
            vec![CPF_COLUMN.into(), NAME_COLUMN.into(), SALARY_COLUMN.into()],
            vec![vec![Cell::text("1"), Cell::text("Ana"), Cell::Number(10.0)]],
        );
        let candidates = vec![(TOTAL_COLUMN.to_string(), invoice("1", 5.0))];

        let report = merge_reports(base, &candidates)
            .expect("merge succeeded")
            .expect("candidate qualified");

        assert_eq!(
            report.sheet.columns,
            vec!["CPF", "Nome", "Salario", "Custo Total (2)", "Custo Total"]
        );
        assert_eq!(report.cost_columns, vec!["Custo Total (2)".to_string()]);
        assert_eq!(
            report.sheet.rows,
            vec![vec![
                Cell::text("1"),
                Cell::text("Ana"),
                Cell::Number(10.0),
                Cell::Number(5.0),
                Cell::Number(15.0),
            ]]
        );
    }

    #[test]
    fn colliding_names_get_a_counter() {
        let base = Spreadsheet::new(
            vec![CPF_COLUMN.into(), NAME_COLUMN.into(), "VR".into()],
            Vec::new(),
        );
        assert_eq!(unique_column_name(&base, "VR"), "VR (2)");
        assert_eq!(unique_column_name(&base, "VA"), "VA");
    }
}
