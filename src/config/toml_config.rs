use crate::core::mapping::{
    Coercion, CsvOptions, FieldMapping, MergeSchema, SourceFormat, SourceSchema,
};
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source_a: SourceFileConfig,
    pub source_b: SourceFileConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileConfig {
    pub path: String,
    pub format: String,
    pub delimiter: Option<String>,
    pub has_headers: Option<bool>,
    pub field_mapping: Option<Vec<FieldMappingConfig>>,
}

/// 一條映射規則：來源欄位 from 改名為 to，type 決定轉型（預設 text）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMappingConfig {
    pub from: String,
    pub to: String,
    pub r#type: Option<Coercion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OUTPUT_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;

        validation::validate_path("source_a.path", &self.source_a.path)?;
        validation::validate_path("source_b.path", &self.source_b.path)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;

        Self::validate_source("source_a", &self.source_a)?;
        Self::validate_source("source_b", &self.source_b)?;

        Ok(())
    }

    fn validate_source(field: &str, source: &SourceFileConfig) -> Result<()> {
        if SourceFormat::parse(&source.format).is_none() {
            return Err(EtlError::InvalidConfigValueError {
                field: format!("{}.format", field),
                value: source.format.clone(),
                reason: "Supported formats: json, csv".to_string(),
            });
        }

        if let Some(delimiter) = &source.delimiter {
            if delimiter.as_bytes().len() != 1 {
                return Err(EtlError::InvalidConfigValueError {
                    field: format!("{}.delimiter", field),
                    value: delimiter.clone(),
                    reason: "Delimiter must be a single character".to_string(),
                });
            }
        }

        if let Some(mappings) = &source.field_mapping {
            if mappings.is_empty() {
                return Err(EtlError::MissingConfigError {
                    field: format!("{}.field_mapping", field),
                });
            }
            for mapping in mappings {
                validation::validate_non_empty_string(
                    &format!("{}.field_mapping.from", field),
                    &mapping.from,
                )?;
                validation::validate_non_empty_string(
                    &format!("{}.field_mapping.to", field),
                    &mapping.to,
                )?;
            }
        }

        Ok(())
    }

    /// 把 TOML 的映射設定轉成管線用的 MergeSchema，沒設定的部分沿用預設
    pub fn merge_schema(&self) -> Result<MergeSchema> {
        let defaults = MergeSchema::default();
        Ok(MergeSchema {
            company_a: Self::source_schema("source_a", &self.source_a, defaults.company_a)?,
            company_b: Self::source_schema("source_b", &self.source_b, defaults.company_b)?,
        })
    }

    fn source_schema(
        field: &str,
        source: &SourceFileConfig,
        default: SourceSchema,
    ) -> Result<SourceSchema> {
        let format = SourceFormat::parse(&source.format).ok_or_else(|| {
            EtlError::InvalidConfigValueError {
                field: format!("{}.format", field),
                value: source.format.clone(),
                reason: "Supported formats: json, csv".to_string(),
            }
        })?;

        let mappings = match &source.field_mapping {
            Some(entries) => entries
                .iter()
                .map(|entry| {
                    FieldMapping::new(
                        &entry.from,
                        &entry.to,
                        entry.r#type.unwrap_or(Coercion::Text),
                    )
                })
                .collect(),
            None => default.mappings,
        };

        let mut schema = SourceSchema::new(&default.name, format, mappings);
        schema.csv = Self::csv_options(field, source)?;
        Ok(schema)
    }

    fn csv_options(field: &str, source: &SourceFileConfig) -> Result<CsvOptions> {
        let mut options = CsvOptions::default();

        if let Some(delimiter) = &source.delimiter {
            let bytes = delimiter.as_bytes();
            if bytes.len() != 1 {
                return Err(EtlError::InvalidConfigValueError {
                    field: format!("{}.delimiter", field),
                    value: delimiter.clone(),
                    reason: "Delimiter must be a single character".to_string(),
                });
            }
            options.delimiter = bytes[0];
        }

        if let Some(has_headers) = source.has_headers {
            options.has_headers = has_headers;
        }

        Ok(options)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn source_a_path(&self) -> &str {
        &self.source_a.path
    }

    fn source_b_path(&self) -> &str {
        &self.source_b.path
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC_CONFIG: &str = r#"
[pipeline]
name = "market-merge"
description = "Merge company A and B sales feeds"
version = "1.0.0"

[source_a]
path = "data/company_a_sales.json"
format = "json"

[source_b]
path = "data/company_b_sales.csv"
format = "csv"

[load]
output_path = "output/merged_sales.csv"
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC_CONFIG).unwrap();

        assert_eq!(config.pipeline.name, "market-merge");
        assert_eq!(config.source_a_path(), "data/company_a_sales.json");
        assert_eq!(config.source_b_path(), "data/company_b_sales.csv");
        assert_eq!(config.output_path(), "output/merged_sales.csv");
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_schema_when_no_mappings() {
        let config = TomlConfig::from_toml_str(BASIC_CONFIG).unwrap();
        let schema = config.merge_schema().unwrap();

        assert_eq!(
            schema.output_columns(),
            vec!["company", "sale_date", "product", "amount"]
        );
    }

    #[test]
    fn test_custom_field_mapping_and_csv_options() {
        let toml_content = r#"
[pipeline]
name = "custom"
description = "custom mappings"
version = "1.0"

[source_a]
path = "a.json"
format = "json"

[[source_a.field_mapping]]
from = "empresa"
to = "company"

[[source_a.field_mapping]]
from = "valor"
to = "amount"
type = "amount"

[source_b]
path = "b.csv"
format = "csv"
delimiter = ";"
has_headers = false

[[source_b.field_mapping]]
from = "_c0"
to = "company"

[[source_b.field_mapping]]
from = "_c1"
to = "amount"
type = "amount"

[load]
output_path = "out.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());

        let schema = config.merge_schema().unwrap();
        assert_eq!(schema.output_columns(), vec!["company", "amount"]);
        assert_eq!(schema.company_a.mappings[0].source_field, "empresa");
        assert_eq!(schema.company_a.mappings[1].coercion, Coercion::Amount);
        assert_eq!(schema.company_b.csv.delimiter, b';');
        assert!(!schema.company_b.csv.has_headers);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MERGE_OUTPUT_DIR", "custom-output");

        let toml_content = r#"
[pipeline]
name = "test"
description = "test"
version = "1.0"

[source_a]
path = "a.json"
format = "json"

[source_b]
path = "b.csv"
format = "csv"

[load]
output_path = "${MERGE_OUTPUT_DIR}/merged.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output_path(), "custom-output/merged.csv");

        std::env::remove_var("MERGE_OUTPUT_DIR");
    }

    #[test]
    fn test_unsupported_format_fails_validation() {
        let toml_content = r#"
[pipeline]
name = "test"
description = "test"
version = "1.0"

[source_a]
path = "a.parquet"
format = "parquet"

[source_b]
path = "b.csv"
format = "csv"

[load]
output_path = "out.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
        assert!(config.merge_schema().is_err());
    }

    #[test]
    fn test_multi_char_delimiter_fails_validation() {
        let toml_content = r#"
[pipeline]
name = "test"
description = "test"
version = "1.0"

[source_a]
path = "a.json"
format = "json"

[source_b]
path = "b.csv"
format = "csv"
delimiter = "||"

[load]
output_path = "out.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC_CONFIG.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "market-merge");
    }
}
