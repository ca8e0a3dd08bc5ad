use crate::core::mapping::{CsvOptions, MergeSchema, SourceFormat, SourceSchema};
use crate::core::{ConfigProvider, MergeResult, Pipeline, Record, SourceTables, Storage};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// 讀取兩個來源、正規化、依欄位名稱合併、輸出單一 CSV 的管線
pub struct MergePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    schema: MergeSchema,
}

impl<S: Storage, C: ConfigProvider> MergePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self::with_schema(storage, config, MergeSchema::default())
    }

    pub fn with_schema(storage: S, config: C, schema: MergeSchema) -> Self {
        Self {
            storage,
            config,
            schema,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MergePipeline<S, C> {
    async fn extract(&self) -> Result<SourceTables> {
        tracing::info!(
            "📥 Reading company A feed from: {}",
            self.config.source_a_path()
        );
        let raw_a = self.storage.read_file(self.config.source_a_path()).await?;
        let company_a = read_source(&raw_a, &self.schema.company_a)?;
        tracing::debug!("Company A: {} raw records", company_a.len());

        tracing::info!(
            "📥 Reading company B feed from: {}",
            self.config.source_b_path()
        );
        let raw_b = self.storage.read_file(self.config.source_b_path()).await?;
        let company_b = read_source(&raw_b, &self.schema.company_b)?;
        tracing::debug!("Company B: {} raw records", company_b.len());

        Ok(SourceTables {
            company_a,
            company_b,
        })
    }

    async fn transform(&self, tables: SourceTables) -> Result<MergeResult> {
        let company_a_rows = tables.company_a.len();
        let company_b_rows = tables.company_b.len();

        tracing::info!(
            "🔧 Normalizing {} company A records and {} company B records",
            company_a_rows,
            company_b_rows
        );

        let normalized_a: Vec<Record> = tables
            .company_a
            .iter()
            .map(|record| self.schema.company_a.normalize(record))
            .collect();
        let normalized_b: Vec<Record> = tables
            .company_b
            .iter()
            .map(|record| self.schema.company_b.normalize(record))
            .collect();

        let records = union_by_name(&self.schema, normalized_a, normalized_b)?;

        tracing::info!("✅ Merged dataset has {} rows", records.len());
        Ok(MergeResult {
            columns: self.schema.output_columns(),
            records,
            company_a_rows,
            company_b_rows,
        })
    }

    async fn load(&self, result: MergeResult) -> Result<String> {
        tracing::info!(
            "💾 Writing {} merged rows to: {}",
            result.records.len(),
            self.config.output_path()
        );

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&result.columns)?;

        for record in &result.records {
            let row: Vec<String> = result
                .columns
                .iter()
                .map(|column| cell_text(record.data.get(column)))
                .collect();
            writer.write_record(&row)?;
        }

        let data = writer.into_inner().map_err(|e| EtlError::ProcessingError {
            message: format!("CSV writer flush failed: {}", e),
        })?;
        self.storage
            .write_file(self.config.output_path(), &data)
            .await?;

        tracing::debug!("Output file written ({} bytes)", data.len());
        Ok(self.config.output_path().to_string())
    }
}

/// 依欄位名稱聯集兩個已正規化的資料表。
/// 欄位集合不一致時回報 schema 錯誤；一致時 A 的所有列在前、B 的所有列在後。
pub fn union_by_name(
    schema: &MergeSchema,
    company_a: Vec<Record>,
    company_b: Vec<Record>,
) -> Result<Vec<Record>> {
    let a_columns: BTreeSet<&str> = schema.company_a.columns().into_iter().collect();
    let b_columns: BTreeSet<&str> = schema.company_b.columns().into_iter().collect();

    if a_columns != b_columns {
        return Err(EtlError::SchemaMismatchError {
            company_a: a_columns.into_iter().collect::<Vec<_>>().join(", "),
            company_b: b_columns.into_iter().collect::<Vec<_>>().join(", "),
        });
    }

    let mut records = company_a;
    records.extend(company_b);
    Ok(records)
}

fn read_source(raw: &[u8], schema: &SourceSchema) -> Result<Vec<Record>> {
    match schema.format {
        SourceFormat::Json => read_json_records(raw),
        SourceFormat::Csv => read_csv_records(raw, &schema.csv),
    }
}

fn read_json_records(raw: &[u8]) -> Result<Vec<Record>> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(value) => json_value_records(value),
        // 整份解析失敗時視為 JSON Lines 逐行解析
        Err(_) => read_json_lines(raw),
    }
}

fn json_value_records(value: Value) -> Result<Vec<Record>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                object_record(item).ok_or_else(|| EtlError::ProcessingError {
                    message: format!("JSON record {} is not an object", index),
                })
            })
            .collect(),
        Value::Object(fields) => Ok(vec![Record::new(fields.into_iter().collect())]),
        other => Err(EtlError::ProcessingError {
            message: format!("JSON feed must contain objects, got: {}", other),
        }),
    }
}

fn read_json_lines(raw: &[u8]) -> Result<Vec<Record>> {
    let text = std::str::from_utf8(raw).map_err(|e| EtlError::ProcessingError {
        message: format!("JSON feed is not valid UTF-8: {}", e),
    })?;

    let mut records = Vec::new();
    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)?;
        let record = object_record(value).ok_or_else(|| EtlError::ProcessingError {
            message: format!("JSON line {} is not an object", line_number + 1),
        })?;
        records.push(record);
    }
    Ok(records)
}

fn object_record(value: Value) -> Option<Record> {
    match value {
        Value::Object(fields) => Some(Record::new(fields.into_iter().collect())),
        _ => None,
    }
}

fn read_csv_records(raw: &[u8], options: &CsvOptions) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.has_headers)
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(raw);

    let headers = if options.has_headers {
        Some(reader.headers()?.clone())
    } else {
        None
    };

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut data = HashMap::new();
        for (index, field) in row.iter().enumerate() {
            // 無標題列時採位置命名 _c0, _c1, ...
            let key = headers
                .as_ref()
                .and_then(|h| h.get(index))
                .map(|h| h.to_string())
                .unwrap_or_else(|| format!("_c{}", index));
            data.insert(key, Value::String(field.to_string()));
        }
        records.push(Record::new(data));
    }
    Ok(records)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
