use crate::domain::model::Record;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// 支援的來源檔案格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Json,
    Csv,
}

impl SourceFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "json" => Some(SourceFormat::Json),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }
}

/// 欄位轉型規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coercion {
    Text,
    Date,
    Amount,
}

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

/// 單一欄位的映射：原始欄位 → 正規化欄位 + 轉型
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub source_field: String,
    pub target_field: String,
    pub coercion: Coercion,
}

impl FieldMapping {
    pub fn new(source_field: &str, target_field: &str, coercion: Coercion) -> Self {
        Self {
            source_field: source_field.to_string(),
            target_field: target_field.to_string(),
            coercion,
        }
    }
}

/// 一個來源的宣告式映射表，normalize 是一個純函數：
/// 映射到的欄位改名並轉型，來源缺少的欄位補 null，未映射的欄位捨棄
#[derive(Debug, Clone)]
pub struct SourceSchema {
    pub name: String,
    pub format: SourceFormat,
    pub csv: CsvOptions,
    pub mappings: Vec<FieldMapping>,
}

impl SourceSchema {
    pub fn new(name: &str, format: SourceFormat, mappings: Vec<FieldMapping>) -> Self {
        Self {
            name: name.to_string(),
            format,
            csv: CsvOptions::default(),
            mappings,
        }
    }

    /// 公司 A 的 JSON 銷售資料預設映射
    pub fn company_a_default() -> Self {
        Self::new(
            "company_a",
            SourceFormat::Json,
            vec![
                FieldMapping::new("company_name", "company", Coercion::Text),
                FieldMapping::new("date_of_sale", "sale_date", Coercion::Date),
                FieldMapping::new("item_sold", "product", Coercion::Text),
                FieldMapping::new("sale_amount", "amount", Coercion::Amount),
            ],
        )
    }

    /// 公司 B 的 CSV 銷售資料預設映射
    pub fn company_b_default() -> Self {
        Self::new(
            "company_b",
            SourceFormat::Csv,
            vec![
                FieldMapping::new("firm", "company", Coercion::Text),
                FieldMapping::new("transaction_date", "sale_date", Coercion::Date),
                FieldMapping::new("product", "product", Coercion::Text),
                FieldMapping::new("price", "amount", Coercion::Amount),
            ],
        )
    }

    pub fn columns(&self) -> Vec<&str> {
        self.mappings
            .iter()
            .map(|m| m.target_field.as_str())
            .collect()
    }

    pub fn normalize(&self, record: &Record) -> Record {
        let mut data = HashMap::new();

        for mapping in &self.mappings {
            let value = match record.data.get(&mapping.source_field) {
                Some(raw) if !raw.is_null() => match coerce_value(raw, mapping.coercion) {
                    Some(value) => value,
                    None => {
                        tracing::warn!(
                            "⚠️ {}: cannot coerce '{}' value {} to {:?}, writing null",
                            self.name,
                            mapping.source_field,
                            raw,
                            mapping.coercion
                        );
                        Value::Null
                    }
                },
                _ => Value::Null,
            };
            data.insert(mapping.target_field.clone(), value);
        }

        Record { data }
    }
}

/// 兩個來源的映射加在一起就是整條管線的 schema；
/// 輸出欄位順序以公司 A 的映射順序為準
#[derive(Debug, Clone)]
pub struct MergeSchema {
    pub company_a: SourceSchema,
    pub company_b: SourceSchema,
}

impl Default for MergeSchema {
    fn default() -> Self {
        Self {
            company_a: SourceSchema::company_a_default(),
            company_b: SourceSchema::company_b_default(),
        }
    }
}

impl MergeSchema {
    pub fn output_columns(&self) -> Vec<String> {
        self.company_a
            .columns()
            .into_iter()
            .map(|c| c.to_string())
            .collect()
    }
}

fn coerce_value(value: &Value, coercion: Coercion) -> Option<Value> {
    match coercion {
        Coercion::Text => Some(Value::String(value_text(value))),
        Coercion::Date => match value {
            Value::String(raw) => {
                parse_date(raw).map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            }
            _ => None,
        },
        Coercion::Amount => parse_amount(&value_text(value)).map(|d| Value::String(d.to_string())),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

    let trimmed = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut cleaned = raw.trim().to_string();
    // 小數逗號（例如 "49,90"）視為小數點
    if cleaned.contains(',') && !cleaned.contains('.') {
        cleaned = cleaned.replace(',', ".");
    }
    Decimal::from_str(&cleaned).ok()
}
