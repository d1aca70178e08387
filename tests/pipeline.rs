use std::fs;
use std::path::Path;

use costsheet_tools::boundary::{self, ToolRequest};
use costsheet_tools::classify::{
    ClassificationRequest, ColumnClassifier, CostColumns, KeywordClassifier, MappingClassifier,
    RoleAssignment,
};
use costsheet_tools::config::PipelineConfig;
use costsheet_tools::io::{excel_read, excel_write};
use costsheet_tools::merge::MergeOutcome;
use costsheet_tools::model::{Cell, Spreadsheet};
use costsheet_tools::pipeline;
use costsheet_tools::{Result, ToolError};
use tempfile::tempdir;

fn config_in(root: &Path) -> PipelineConfig {
    PipelineConfig {
        input_directory: root.join("costs"),
        output_directory: root.join("output"),
        ..PipelineConfig::default()
    }
}

fn column<'a>(sheet: &'a Spreadsheet, name: &str) -> Vec<&'a Cell> {
    let index = sheet.column_index(name).expect("column present");
    sheet.column_values(index).collect()
}

fn seed_inputs(config: &PipelineConfig) {
    let input = &config.input_directory;
    excel_write::write_spreadsheet(
        &input.join("Dados Colaboradores.xlsx"),
        &Spreadsheet::new(
            vec!["Nome".into(), "CPF".into(), "Salario".into()],
            vec![
                vec![
                    Cell::text(" joão  DA silva "),
                    Cell::text("123.456.789-09"),
                    Cell::text("R$ 1.000,00"),
                ],
                vec![Cell::text("Maria"), Cell::text("987.654.321-00"), Cell::Number(2000.0)],
            ],
        ),
    )
    .expect("base written");
    excel_write::write_spreadsheet(
        &input.join("beneficios").join("Vale Refeicao.xlsx"),
        &Spreadsheet::new(
            vec!["Documento".into(), "Valor Mensal".into(), "Depto".into()],
            vec![vec![
                Cell::text("123.456.789-09"),
                Cell::text("R$ 50,00"),
                Cell::text("TI"),
            ]],
        ),
    )
    .expect("meal voucher written");
    excel_write::write_spreadsheet(
        &input.join("Plano Saude.xlsx"),
        &Spreadsheet::new(
            vec!["CPF Titular".into(), "Fatura Mensal".into()],
            vec![vec![Cell::text("12345678909"), Cell::Number(100.5)]],
        ),
    )
    .expect("health plan written");
    fs::write(input.join("quebrado.xlsx"), b"not a workbook").expect("broken file written");
}

#[test]
fn full_run_normalizes_and_merges_every_file() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    seed_inputs(&config);

    let report = pipeline::run(&config, &KeywordClassifier::new()).expect("pipeline ran");

    assert_eq!(report.files.len(), 4);
    let failed: Vec<_> = report
        .files
        .iter()
        .filter(|file| !boundary::is_success(&file.status))
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].file.ends_with("quebrado.xlsx"));

    let Ok(MergeOutcome::Merged { path, .. }) = &report.merge else {
        panic!("expected a merged report, got {:?}", report.merge);
    };
    let merged = excel_read::read_spreadsheet(path).expect("merged report read");
    assert_eq!(
        merged.columns,
        vec!["Nome", "CPF", "Salario", "Plano Saude", "Vale Refeicao", "Custo Total"]
    );
    assert_eq!(
        column(&merged, "Nome"),
        vec![&Cell::text("Joao Da Silva"), &Cell::text("Maria")]
    );
    assert_eq!(
        column(&merged, "CPF"),
        vec![&Cell::text("12345678909"), &Cell::text("98765432100")]
    );
    assert_eq!(
        column(&merged, "Salario"),
        vec![&Cell::text("1000,00"), &Cell::text("2000,00")]
    );
    assert_eq!(
        column(&merged, "Custo Total"),
        vec![&Cell::Number(1150.5), &Cell::Number(2000.0)]
    );

    let renamed = excel_read::read_spreadsheet(
        &config.output_directory.join("normalized_Vale Refeicao.xlsx"),
    )
    .expect("normalized file read");
    assert_eq!(renamed.columns, vec!["CPF", "Fatura", "Depto"]);
    assert_eq!(column(&renamed, "Fatura"), vec![&Cell::text("50,00")]);

    let original = excel_read::read_spreadsheet(
        &config.input_directory.join("beneficios").join("Vale Refeicao.xlsx"),
    )
    .expect("input read");
    assert_eq!(original.columns, vec!["Documento", "Valor Mensal", "Depto"]);
}

#[test]
fn normalizer_tools_rewrite_only_on_success() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    let path = config.output_directory.join("normalized_vr.xlsx");
    let sheet = Spreadsheet::new(
        vec!["CPF".into(), "Fatura".into(), "Nome".into()],
        vec![vec![
            Cell::text("123.456.789-09"),
            Cell::text("R$ 1.234,56"),
            Cell::text("ANA  paula"),
        ]],
    );
    excel_write::write_spreadsheet(&path, &sheet).expect("sheet written");

    let request = |columns: &[&str]| ToolRequest {
        file_name: "normalized_vr.xlsx".into(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
    };

    let status = boundary::normalize_cpf(&config, &request(&["CPF", "Matricula"]));
    assert!(status.contains("Matricula"));
    assert!(!boundary::is_success(&status));
    assert_eq!(excel_read::read_spreadsheet(&path).expect("sheet read"), sheet);

    assert!(boundary::is_success(&boundary::normalize_cpf(&config, &request(&["CPF"]))));
    assert!(boundary::is_success(&boundary::normalize_monetary_values(
        &config,
        &request(&["Fatura"])
    )));
    let status = boundary::normalize_text(&config, &request(&["Nome"]));
    assert_eq!(status, "Success. Columns normalized: [\"Nome\"]");

    let cleaned = excel_read::read_spreadsheet(&path).expect("sheet read");
    assert_eq!(
        cleaned.rows,
        vec![vec![
            Cell::text("12345678909"),
            Cell::text("1234,56"),
            Cell::text("Ana Paula"),
        ]]
    );
}

/// Keyword classifier that cannot assign roles for one staged file.
struct RolesFailFor(&'static str);

impl ColumnClassifier for RolesFailFor {
    fn cost_columns(&self, request: &ClassificationRequest) -> Result<CostColumns> {
        KeywordClassifier::new().cost_columns(request)
    }

    fn roles(&self, request: &ClassificationRequest) -> Result<RoleAssignment> {
        if request.file_name == self.0 {
            return Err(ToolError::Classification {
                file_name: request.file_name.clone(),
                reason: "classifier unavailable".into(),
            });
        }
        KeywordClassifier::new().roles(request)
    }
}

fn seed_base(config: &PipelineConfig) {
    excel_write::write_spreadsheet(
        &config.input_directory.join("Dados Colaboradores.xlsx"),
        &Spreadsheet::new(
            vec!["Nome".into(), "CPF".into(), "Salario".into()],
            vec![vec![Cell::text("ana"), Cell::text("12345678909"), Cell::Number(1000.0)]],
        ),
    )
    .expect("base written");
}

fn seed_meal_voucher(config: &PipelineConfig) {
    excel_write::write_spreadsheet(
        &config.input_directory.join("VR.xlsx"),
        &Spreadsheet::new(
            vec!["Documento".into(), "Valor".into()],
            vec![vec![Cell::text("123.456.789-09"), Cell::text("R$ 50,00")]],
        ),
    )
    .expect("meal voucher written");
}

#[test]
fn failed_cleaning_keeps_file_out_of_the_merge() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    seed_base(&config);
    seed_meal_voucher(&config);

    let stale = config.output_directory.join("normalized_VR.xlsx");
    excel_write::write_spreadsheet(
        &stale,
        &Spreadsheet::new(
            vec!["CPF".into(), "Fatura".into()],
            vec![vec![Cell::text("12345678909"), Cell::Number(999.0)]],
        ),
    )
    .expect("stale file written");

    let report =
        pipeline::run(&config, &RolesFailFor("normalized_VR.xlsx")).expect("pipeline ran");

    let voucher = report
        .files
        .iter()
        .find(|file| file.file.ends_with("VR.xlsx"))
        .expect("meal voucher reported");
    assert!(!boundary::is_success(&voucher.status), "{}", voucher.status);
    assert!(voucher.status.contains("classifier unavailable"));
    assert!(!stale.exists());
    assert_eq!(report.merge, Ok(MergeOutcome::NothingToMerge));
}

#[test]
fn merge_failure_keeps_per_file_statuses() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    seed_meal_voucher(&config);

    let report = pipeline::run(&config, &KeywordClassifier::new()).expect("pipeline ran");

    assert_eq!(report.files.len(), 1);
    assert!(boundary::is_success(&report.files[0].status), "{}", report.files[0].status);
    assert!(report.merge.is_err());
    assert!(report.merge_status().starts_with("Error: "));
    assert!(config.output_directory.join("normalized_VR.xlsx").exists());
}

#[test]
fn mapping_file_drives_the_whole_run() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    seed_base(&config);
    seed_meal_voucher(&config);

    let mapping_path = temp_dir.path().join("mapping.json");
    fs::write(
        &mapping_path,
        r#"{
            "Dados Colaboradores.xlsx": {
                "cpf_columns": ["CPF"],
                "name_columns": ["Nome"],
                "value_columns": ["Salario"]
            },
            "VR.xlsx": {"identifier_column": "Documento", "cost_column": "Valor"},
            "normalized_VR.xlsx": {"cpf_columns": ["CPF"], "value_columns": ["Fatura"]}
        }"#,
    )
    .expect("mapping written");

    let classifier = MappingClassifier::load(&mapping_path).expect("mapping loaded");
    let report = pipeline::run(&config, &classifier).expect("pipeline ran");
    assert!(report.files.iter().all(|file| boundary::is_success(&file.status)));

    let Ok(MergeOutcome::Merged { path, .. }) = &report.merge else {
        panic!("expected a merged report, got {:?}", report.merge);
    };
    let merged = excel_read::read_spreadsheet(path).expect("merged report read");
    assert_eq!(merged.columns, vec!["Nome", "CPF", "Salario", "VR", "Custo Total"]);
    assert_eq!(column(&merged, "Nome"), vec![&Cell::text("Ana")]);
    assert_eq!(column(&merged, "VR"), vec![&Cell::text("50,00")]);
    assert_eq!(column(&merged, "Custo Total"), vec![&Cell::Number(1050.0)]);

    let missing = temp_dir.path().join("absent.json");
    assert!(matches!(MappingClassifier::load(&missing), Err(ToolError::Io(_))));
}
