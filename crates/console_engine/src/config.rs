use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The product configuration document served by `GET /api/config`.
///
/// Every section and field is optional so a sparse document still loads;
/// [`ConsoleConfig::validate`] reports what a usable deployment is missing.
/// Top-level sections this schema does not model are kept verbatim so a
/// load/save round trip never drops backend-owned keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongodb: Option<MongoDbSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering: Option<ClusteringSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<EmbeddingsSection>,
    #[serde(
        rename = "issue-extractor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub issue_extractor: Option<IssueExtractorSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathsSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports: Option<ReportsSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_store: Option<VectorStoreSection>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MongoDbSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusteringSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_clusters: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmbeddingsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueExtractorSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub src: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_cluster_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_extraction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type_classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorStoreSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
}

/// One problem found while validating a loaded config document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path of the offending field, e.g. `mongodb.uri`.
    pub field: String,
    pub problem: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

impl ConsoleConfig {
    /// Check the fields the operator form requires plus basic value ranges.
    /// An empty result means the document is usable as-is.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let mongodb = self.mongodb.as_ref();
        require(
            &mut issues,
            "mongodb.uri",
            mongodb.and_then(|s| s.uri.as_deref()),
        );
        require(
            &mut issues,
            "mongodb.database",
            mongodb.and_then(|s| s.database.as_deref()),
        );
        require(
            &mut issues,
            "llm.model_name",
            self.llm.as_ref().and_then(|s| s.model_name.as_deref()),
        );

        if let Some(temperature) = self.llm.as_ref().and_then(|s| s.temperature) {
            if !(0.0..=2.0).contains(&temperature) {
                issues.push(ConfigIssue {
                    field: "llm.temperature".to_string(),
                    problem: format!("must be within 0..=2, got {temperature}"),
                });
            }
        }
        if let Some(threshold) = self.vector_store.as_ref().and_then(|s| s.similarity_threshold) {
            if !(0.0..=1.0).contains(&threshold) {
                issues.push(ConfigIssue {
                    field: "vector_store.similarity_threshold".to_string(),
                    problem: format!("must be within 0..=1, got {threshold}"),
                });
            }
        }

        issues
    }
}

fn require(issues: &mut Vec<ConfigIssue>, field: &str, value: Option<&str>) {
    match value {
        Some(text) if !text.trim().is_empty() => {}
        _ => issues.push(ConfigIssue {
            field: field.to_string(),
            problem: "required field is missing".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::ConsoleConfig;
    use serde_json::json;

    #[test]
    fn sparse_document_loads_and_reports_missing_fields() {
        let config: ConsoleConfig =
            serde_json::from_value(json!({ "clustering": { "algorithm": "kmeans" } })).unwrap();

        let fields: Vec<_> = config
            .validate()
            .into_iter()
            .map(|issue| issue.field)
            .collect();
        assert_eq!(
            fields,
            vec!["mongodb.uri", "mongodb.database", "llm.model_name"]
        );
    }

    #[test]
    fn full_document_validates_clean() {
        let config: ConsoleConfig = serde_json::from_value(json!({
            "mongodb": { "uri": "mongodb://localhost:27017", "database": "issues" },
            "llm": { "model_name": "gpt-4o-mini", "temperature": 0.2, "max_tokens": 2048 },
            "vector_store": { "persist_directory": "/var/lib/issues", "similarity_threshold": 0.8 }
        }))
        .unwrap();

        assert!(config.validate().is_empty());
    }

    #[test]
    fn out_of_range_values_are_flagged() {
        let config: ConsoleConfig = serde_json::from_value(json!({
            "mongodb": { "uri": "u", "database": "d" },
            "llm": { "model_name": "m", "temperature": 3.5 },
            "vector_store": { "similarity_threshold": 1.5 }
        }))
        .unwrap();

        let fields: Vec<_> = config
            .validate()
            .into_iter()
            .map(|issue| issue.field)
            .collect();
        assert_eq!(
            fields,
            vec!["llm.temperature", "vector_store.similarity_threshold"]
        );
    }

    #[test]
    fn unknown_sections_survive_a_round_trip() {
        let original = json!({
            "mongodb": { "uri": "u", "database": "d" },
            "issue-extractor": { "jira_source": "JIRA", "templates": ["a.j2"] },
            "experimental": { "flag": true }
        });

        let config: ConsoleConfig = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(
            config.issue_extractor.as_ref().unwrap().jira_source.as_deref(),
            Some("JIRA")
        );

        let saved = serde_json::to_value(&config).unwrap();
        assert_eq!(saved["experimental"], original["experimental"]);
        assert_eq!(saved["issue-extractor"], original["issue-extractor"]);
    }
}
