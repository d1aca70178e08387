use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ClassificationRequest, ColumnClassifier, CostColumns, RoleAssignment};
use crate::costsheet::tools::error::{Result, ToolError};

/// Assignments written by hand for one file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMapping {
    pub identifier_column: Option<String>,
    pub cost_column: Option<String>,
    #[serde(flatten)]
    pub roles: RoleAssignment,
}

/// Classifier backed by a JSON document keyed by file name:
///
/// ```json
/// {
///   "Vale Refeicao.xlsx": { "identifier_column": "Documento", "cost_column": "Valor" },
///   "normalized_Vale Refeicao.xlsx": { "cpf_columns": ["CPF"], "value_columns": ["Fatura"] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappingClassifier {
    files: HashMap<String, FileMapping>,
}

impl MappingClassifier {
    pub fn new(files: HashMap<String, FileMapping>) -> Self {
        Self { files }
    }

    /// Loads the mapping document from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&data)?))
    }

    fn mapping(&self, request: &ClassificationRequest) -> Result<&FileMapping> {
        self.files
            .get(&request.file_name)
            .ok_or_else(|| ToolError::Classification {
                file_name: request.file_name.clone(),
                reason: "no column mapping provided for this file".into(),
            })
    }
}

impl ColumnClassifier for MappingClassifier {
    fn cost_columns(&self, request: &ClassificationRequest) -> Result<CostColumns> {
        let mapping = self.mapping(request)?;
        match (&mapping.identifier_column, &mapping.cost_column) {
            (Some(identifier), Some(cost)) => Ok(CostColumns {
                identifier_column: identifier.clone(),
                cost_column: cost.clone(),
            }),
            _ => Err(ToolError::Classification {
                file_name: request.file_name.clone(),
                reason: "mapping lacks identifier_column or cost_column".into(),
            }),
        }
    }

    fn roles(&self, request: &ClassificationRequest) -> Result<RoleAssignment> {
        Ok(self.mapping(request)?.roles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_cost_and_role_entries() {
        let files: HashMap<String, FileMapping> = serde_json::from_str(
            r#"{
                "vr.xlsx": {"identifier_column": "Documento", "cost_column": "Valor"},
                "normalized_vr.xlsx": {"cpf_columns": ["CPF"], "value_columns": ["Fatura"]}
            }"#,
        )
        .expect("mapping parsed");
        let classifier = MappingClassifier::new(files);

        let request = |name: &str| ClassificationRequest {
            file_name: name.into(),
            columns: Vec::new(),
            samples: Vec::new(),
        };

        let columns = classifier.cost_columns(&request("vr.xlsx")).expect("cost columns");
        assert_eq!(columns.cost_column, "Valor");

        let roles = classifier.roles(&request("normalized_vr.xlsx")).expect("roles");
        assert_eq!(roles.identifier_columns, vec!["CPF".to_string()]);

        assert!(classifier.cost_columns(&request("normalized_vr.xlsx")).is_err());
        assert!(classifier.roles(&request("other.xlsx")).is_err());
    }
}
