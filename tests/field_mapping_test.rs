use market_merge::{EtlEngine, LocalStorage, MergePipeline, TomlConfig};
use tempfile::TempDir;

/// End-to-end run driven entirely by a TOML pipeline file with custom
/// mappings: company A uses Portuguese field names, company B ships a
/// headerless semicolon-separated CSV addressed by position.
#[tokio::test]
async fn test_custom_mappings_from_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();

    let source_a = base.join("vendas_a.json");
    let source_b = base.join("vendas_b.csv");
    let output = base.join("consolidado.csv");

    let rows = serde_json::json!([
        {"empresa": "Mercado Azul", "data": "01/02/2025", "produto": "Arroz", "valor": "19,90"}
    ]);
    std::fs::write(&source_a, rows.to_string()).unwrap();
    std::fs::write(&source_b, "Mercado Verde;02/02/2025;Feijao;9,50\n").unwrap();

    let toml_content = format!(
        r#"
[pipeline]
name = "fusao-mercados"
description = "Custom mapping run"
version = "1.0"

[source_a]
path = "{}"
format = "json"

[[source_a.field_mapping]]
from = "empresa"
to = "company"

[[source_a.field_mapping]]
from = "data"
to = "sale_date"
type = "date"

[[source_a.field_mapping]]
from = "produto"
to = "product"

[[source_a.field_mapping]]
from = "valor"
to = "amount"
type = "amount"

[source_b]
path = "{}"
format = "csv"
delimiter = ";"
has_headers = false

[[source_b.field_mapping]]
from = "_c0"
to = "company"

[[source_b.field_mapping]]
from = "_c1"
to = "sale_date"
type = "date"

[[source_b.field_mapping]]
from = "_c2"
to = "product"

[[source_b.field_mapping]]
from = "_c3"
to = "amount"
type = "amount"

[load]
output_path = "{}"
"#,
        source_a.display(),
        source_b.display(),
        output.display()
    );

    let config = TomlConfig::from_toml_str(&toml_content).unwrap();
    let schema = config.merge_schema().unwrap();

    let storage = LocalStorage::new();
    let pipeline = MergePipeline::with_schema(storage, config, schema);
    let engine = EtlEngine::new(pipeline);

    engine.run().await.unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines[0], "company,sale_date,product,amount");
    assert_eq!(lines[1], "Mercado Azul,2025-02-01,Arroz,19.90");
    assert_eq!(lines[2], "Mercado Verde,2025-02-02,Feijao,9.50");
}

/// Company A feeds sometimes arrive as JSON Lines rather than one array.
#[tokio::test]
async fn test_json_lines_feed_merges_like_an_array() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();

    let source_a = base.join("company_a_sales.json");
    let source_b = base.join("company_b_sales.csv");
    let output = base.join("merged_sales.csv");

    let json_lines = concat!(
        "{\"company_name\": \"Acme Ltda\", \"date_of_sale\": \"2025-02-01\", \"item_sold\": \"Widget\", \"sale_amount\": \"10.00\"}\n",
        "{\"company_name\": \"Acme Ltda\", \"date_of_sale\": \"2025-02-02\", \"item_sold\": \"Gadget\", \"sale_amount\": \"20.00\"}\n",
    );
    std::fs::write(&source_a, json_lines).unwrap();
    std::fs::write(
        &source_b,
        "firm,transaction_date,product,price\nBeta GmbH,2025-02-03,Doohickey,5.25\n",
    )
    .unwrap();

    let config = market_merge::CliConfig {
        source_a: source_a.to_str().unwrap().to_string(),
        source_b: source_b.to_str().unwrap().to_string(),
        output: output.to_str().unwrap().to_string(),
        config: None,
        verbose: false,
        monitor: false,
    };

    let storage = LocalStorage::new();
    let pipeline = MergePipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    engine.run().await.unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), 4);
    assert!(content.contains("Acme Ltda,2025-02-01,Widget,10.00"));
    assert!(content.contains("Beta GmbH,2025-02-03,Doohickey,5.25"));
}
