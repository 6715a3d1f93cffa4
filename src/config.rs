use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File looked up in the working directory at start-up.
pub const CONFIG_FILE: &str = "gps-painel.json";

// ---------------------------------------------------------------------------
// Column names of the Conclusos report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub tasks: String,
    pub subject: String,
    pub class: String,
    pub labels: String,
    pub days_pending: String,
    pub start_date: String,
    pub year: String,
    pub pending_goal: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            tasks: "TAREFAS PJE".into(),
            subject: "ASSUNTO".into(),
            class: "CLASSE".into(),
            labels: "ETIQUETAS PJE".into(),
            days_pending: "DIAS CONCLUSO".into(),
            start_date: "INÍCIO".into(),
            year: "ANO".into(),
            pending_goal: "PENDENTE DE META?".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule catalog
// ---------------------------------------------------------------------------

/// Rows whose `column` contains any of `patterns` are removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub column: String,
    pub patterns: Vec<String>,
}

/// A cleaning checkbox: one or more substring exclusions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningRule {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub enabled_by_default: bool,
    pub exclusions: Vec<Exclusion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "values")]
pub enum ThemeRule {
    /// Keep rows whose value is one of the listed codes.
    AllowList(Vec<String>),
    /// Keep rows where the column is filled in.
    NotMissing,
}

/// A thematic checkbox ("Apenas Saúde", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThematicGroup {
    pub key: String,
    pub label: String,
    pub column: String,
    pub rule: ThemeRule,
}

/// A select box offering the distinct values of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub column: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub columns: Columns,
    /// Columns removed during ingestion when present.
    pub dropped_columns: Vec<String>,
    pub cleaning: Vec<CleaningRule>,
    pub themes: Vec<ThematicGroup>,
    /// "Urgência" keeps rows strictly above this many days.
    pub urgency_threshold_days: f64,
    pub category_filters: Vec<CategoryFilter>,
    pub group_by_options: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::for_columns(Columns::default())
    }
}

impl DashboardConfig {
    /// The built-in catalog, addressing the report through `columns`.
    pub fn for_columns(columns: Columns) -> Self {
        let strings = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let cleaning = vec![
            CleaningRule {
                key: "minutados".into(),
                label: "Remover Minutados".into(),
                help: Some("Ocultar processos que já possuem minuta (Tarefa 'Assinar')".into()),
                enabled_by_default: true,
                exclusions: vec![Exclusion {
                    column: columns.tasks.clone(),
                    patterns: strings(&["Assinar "]),
                }],
            },
            CleaningRule {
                key: "embargos".into(),
                label: "Remover Emb. Declaração".into(),
                help: None,
                enabled_by_default: false,
                exclusions: vec![Exclusion {
                    column: columns.tasks.clone(),
                    patterns: strings(&["Emb. Declaração "]),
                }],
            },
            CleaningRule {
                key: "urv".into(),
                label: "Remover URV".into(),
                help: None,
                enabled_by_default: false,
                exclusions: vec![
                    Exclusion {
                        column: columns.subject.clone(),
                        patterns: strings(&["URV Lei 8.880/1994"]),
                    },
                    Exclusion {
                        column: columns.labels.clone(),
                        patterns: strings(&["URV"]),
                    },
                ],
            },
            CleaningRule {
                key: "sindicatos".into(),
                label: "Remover Sindicatos".into(),
                help: None,
                enabled_by_default: false,
                exclusions: vec![Exclusion {
                    column: columns.labels.clone(),
                    patterns: strings(&["3 - SINTE", "3 - SINAI", "3 - SINSENAT", "SINSENAT"]),
                }],
            },
        ];

        let themes = vec![
            ThematicGroup {
                key: "saude".into(),
                label: "⚕️ Apenas Saúde".into(),
                column: columns.subject.clone(),
                rule: ThemeRule::AllowList(strings(&[
                    "11884 - Fornecimento de Medicamentos",
                    "12506 - Unidade de terapia intensiva (UTI) / unidade de cuidados intensivos (UCI)",
                    "11885 - Unidade de terapia intensiva (UTI) ou unidade de cuidados intensivos (UCI)",
                    "12484 - Fornecimento de medicamentos",
                    "10356 - Assistência Médico-Hospitalar",
                    "10064 - Saúde",
                    "11854 - Saúde Mental",
                    "12501 - Cirurgia",
                    "12502 - Eletiva",
                    "12508 - Internação compulsória",
                    "12483 - Internação/Transferência Hospitalar",
                    "11856 - Hospitais e Outras Units de Saúde",
                    "11883 - Tratamento Médico-Hospitalar",
                    "12491 - Tratamento médico-hospitalar",
                    "11847 - ASSISTÊNCIA SOCIAL",
                ])),
            },
            ThematicGroup {
                key: "inss".into(),
                label: "👴 Apenas INSS".into(),
                column: columns.subject.clone(),
                rule: ThemeRule::AllowList(strings(&[
                    "10567 - Aposentadoria por Invalidez Acidentária",
                    "6095 - Aposentadoria por Invalidez",
                    "6101 - Auxílio-Doença Previdenciário",
                    "6107 - Auxílio-Acident (Art. 86)",
                    "7757 - Auxílio-Doença Acidentário",
                    "6111 - Movimentos Repetitivos/Tenossinovite/LER/DORT",
                    "6108 - Incapacidade Laborativa Parcial",
                    "6110 - Incapacidade Laborativa Temporária",
                    "6109 - Incapacidade Laborativa Permanente",
                ])),
            },
            ThematicGroup {
                key: "ms".into(),
                label: "📜 Mandado de Segurança".into(),
                column: columns.class.clone(),
                rule: ThemeRule::AllowList(strings(&[
                    "120 - MANDADO DE SEGURANÇA CÍVEL",
                    "1710 - MANDADO DE SEGURANÇA CRIMINAL",
                ])),
            },
            ThematicGroup {
                key: "acp".into(),
                label: "⚖️ ACP / Ação Popular".into(),
                column: columns.class.clone(),
                rule: ThemeRule::AllowList(strings(&[
                    "64 - AÇÃO CIVIL DE IMPROBIDADE ADMINISTRATIVA",
                    "1690 - (ECA) AÇÃO CIVIL PÚBLICA INFÂNCIA E JUVENTUDE",
                    "65 - AÇÃO CIVIL PÚBLICA",
                    "66 - AÇÃO POPULAR",
                ])),
            },
            ThematicGroup {
                key: "metas".into(),
                label: "🎯 Pendente de Meta".into(),
                column: columns.pending_goal.clone(),
                rule: ThemeRule::NotMissing,
            },
        ];

        let category = |column: &str, label: &str| CategoryFilter {
            column: column.into(),
            label: label.into(),
        };
        let category_filters = vec![
            category(&columns.class, "Classe"),
            category(&columns.subject, "Assunto"),
            category("TIPO CONCLUSÃO", "Tipo de Conclusão"),
            category(&columns.pending_goal, "Pendente de Meta"),
            category("PRIORIDADE(S)", "Prioridade"),
        ];
        let group_by_options = vec![
            columns.class.clone(),
            columns.subject.clone(),
            "TIPO CONCLUSÃO".to_string(),
        ];

        Self {
            columns,
            dropped_columns: strings(&["SISTEMA", "FÍSICO / ELETRÔNICO?"]),
            cleaning,
            themes,
            urgency_threshold_days: 80.0,
            category_filters,
            group_by_options,
        }
    }

    /// Parse a configuration document. Keys left out take the built-in
    /// catalog, which follows any renamed `columns`.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut document: Value = serde_json::from_str(text)?;
        let Some(overrides) = document.as_object_mut() else {
            bail!("expected a JSON object at the top level");
        };
        let columns: Columns = match overrides.get("columns") {
            Some(v) => serde_json::from_value(v.clone()).context("reading \"columns\"")?,
            None => Columns::default(),
        };

        let mut merged = serde_json::to_value(Self::for_columns(columns))?;
        if let Some(base) = merged.as_object_mut() {
            base.extend(std::mem::take(overrides));
        }
        Ok(serde_json::from_value(merged)?)
    }

    /// Parse a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load [`CONFIG_FILE`] from the working directory, falling back to the
    /// built-in catalog when absent or malformed.
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(cfg) => {
                log::info!("Loaded configuration from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("Ignoring configuration file: {e:#}");
                Self::default()
            }
        }
    }
}
