use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 來源檔案讀進來的單筆紀錄（欄位名稱仍是來源自己的）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn new(data: HashMap<String, serde_json::Value>) -> Self {
        Self { data }
    }
}

/// 兩家公司各自的原始資料表
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub company_a: Vec<Record>,
    pub company_b: Vec<Record>,
}

/// 正規化並合併後的結果
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    pub company_a_rows: usize,
    pub company_b_rows: usize,
}
