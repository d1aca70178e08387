use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{ClassificationRequest, ColumnClassifier, CostColumns, RoleAssignment};
use crate::costsheet::tools::error::{Result, ToolError};
use crate::costsheet::tools::normalize::{parse_amount, strip_diacritics};

static CPF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}\.?\d{3}\.?\d{3}-?\d{2}$").expect("regex is valid"));

// Ordered by preference: the first keyword that matches any column wins.
const IDENTIFIER_KEYWORDS: &[&str] = &[
    "cpf",
    "documento",
    "matricula",
    "registro",
    "identificador",
    "document",
];
const COST_KEYWORDS: &[&str] = &[
    "fatura",
    "custo total",
    "valor total",
    "total",
    "custo",
    "valor",
    "mensalidade",
    "preco",
    "cost",
    "fee",
];
const VALUE_KEYWORDS: &[&str] = &[
    "salario",
    "fatura",
    "custo",
    "valor",
    "total",
    "mensalidade",
    "preco",
    "beneficio",
    "desconto",
    "encargo",
    "salary",
    "cost",
];
const NAME_KEYWORDS: &[&str] = &[
    "nome",
    "colaborador",
    "funcionario",
    "empregado",
    "departamento",
    "depto",
    "setor",
    "cargo",
    "name",
];

/// Rule-based classifier matching accent- and case-folded headings against
/// Portuguese and English keywords, with a look at the sample values when
/// headings are not conclusive.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl ColumnClassifier for KeywordClassifier {
    fn cost_columns(&self, request: &ClassificationRequest) -> Result<CostColumns> {
        let headers = folded_headers(request);

        let identifier = first_by_keyword(&headers, IDENTIFIER_KEYWORDS, None)
            .or_else(|| (0..headers.len()).find(|&index| looks_like_cpf(request, index)))
            .ok_or_else(|| unresolved(request, "no identifier column recognised"))?;

        let cost = first_by_keyword(&headers, COST_KEYWORDS, Some(identifier))
            .or_else(|| {
                (0..headers.len())
                    .filter(|&index| index != identifier)
                    .find(|&index| looks_numeric(request, index))
            })
            .ok_or_else(|| unresolved(request, "no cost column recognised"))?;

        debug!(
            identifier = %request.columns[identifier],
            cost = %request.columns[cost],
            "cost columns recognised"
        );
        Ok(CostColumns {
            identifier_column: request.columns[identifier].clone(),
            cost_column: request.columns[cost].clone(),
        })
    }

    fn roles(&self, request: &ClassificationRequest) -> Result<RoleAssignment> {
        let headers = folded_headers(request);
        let mut assignment = RoleAssignment::default();

        for (index, header) in headers.iter().enumerate() {
            let column = request.columns[index].clone();
            if matches_any(header, IDENTIFIER_KEYWORDS) || looks_like_cpf(request, index) {
                assignment.identifier_columns.push(column);
            } else if matches_any(header, VALUE_KEYWORDS) {
                assignment.value_columns.push(column);
            } else if matches_any(header, NAME_KEYWORDS) {
                assignment.name_columns.push(column);
            }
        }

        Ok(assignment)
    }
}

/// Accent- and case-folded words of every heading.
fn folded_headers(request: &ClassificationRequest) -> Vec<Vec<String>> {
    request
        .columns
        .iter()
        .map(|column| {
            strip_diacritics(column)
                .to_lowercase()
                .split(|ch: char| !ch.is_alphanumeric())
                .filter(|word| !word.is_empty())
                .map(str::to_string)
                .collect()
        })
        .collect()
}

fn matches_any(words: &[String], keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| matches_keyword(words, keyword))
}

/// Whole-word match; multi-word keywords must appear as consecutive words.
fn matches_keyword(words: &[String], keyword: &str) -> bool {
    let parts: Vec<&str> = keyword.split(' ').collect();
    words.windows(parts.len()).any(|window| {
        window
            .iter()
            .zip(&parts)
            .all(|(word, part)| word_matches(word, part))
    })
}

// Singular or plural ("beneficios", "valores").
fn word_matches(word: &str, keyword: &str) -> bool {
    word == keyword
        || word.strip_suffix('s') == Some(keyword)
        || word.strip_suffix("es") == Some(keyword)
}

fn first_by_keyword(
    headers: &[Vec<String>],
    keywords: &[&str],
    exclude: Option<usize>,
) -> Option<usize> {
    keywords.iter().find_map(|keyword| {
        headers
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != exclude)
            .find(|(_, words)| matches_keyword(words, keyword))
            .map(|(index, _)| index)
    })
}

fn looks_like_cpf(request: &ClassificationRequest, index: usize) -> bool {
    let mut samples = request
        .column_samples(index)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .peekable();
    samples.peek().is_some() && samples.all(|value| CPF_PATTERN.is_match(value))
}

fn looks_numeric(request: &ClassificationRequest, index: usize) -> bool {
    let mut samples = request
        .column_samples(index)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .peekable();
    samples.peek().is_some()
        && samples.all(|value| {
            value.chars().any(|ch| ch.is_ascii_digit()) && parse_amount(value).is_ok()
        })
}

fn unresolved(request: &ClassificationRequest, reason: &str) -> ToolError {
    ToolError::Classification {
        file_name: request.file_name.clone(),
        reason: format!("{reason}; available columns: {:?}", request.columns),
    }
}
