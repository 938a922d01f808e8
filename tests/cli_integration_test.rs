//! End-to-end tests for the schema-atlas binary.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn get_binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_schema-atlas")
        .unwrap_or_else(|_| "target/debug/schema-atlas".to_string())
}

fn create_schema(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("shop.json");
    fs::write(
        &path,
        r#"{
    "name": "shop",
    "tables": [
        {"name": "customers",
         "columns": [{"name": "id", "type": "int", "length": 4},
                     {"name": "email", "type": "varchar", "length": 255}],
         "primary_key": ["id"],
         "rows": 3},
        {"name": "orders",
         "columns": [
            {"name": "order_no", "type": "varchar", "length": 12},
            {"name": "customer_id", "type": "int", "length": 4},
            {"name": "warehouse_id", "type": "int", "length": 4}],
         "primary_key": ["order_no"],
         "foreign_keys": [{"columns": ["warehouse_id"], "references_table": "warehouses",
                           "references_container": "stock", "references_columns": ["id"]}]},
        {"name": "audit log",
         "columns": [{"name": "entry", "type": "text"}]}
    ]
}"#,
    )
    .unwrap();
    path
}

#[test]
fn test_implied_json_output() {
    let dir = TempDir::new().unwrap();
    let schema = create_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["implied", schema.to_str().unwrap(), "--json"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["schema"], "shop");
    assert_eq!(json["tables"], 4);
    assert_eq!(json["relationships"][0]["child"], "orders.customer_id");
    assert_eq!(json["relationships"][0]["parent"], "customers.id");
    assert!(json["relationships"][0]["description"]
        .as_str()
        .unwrap()
        .contains("name implies that it's a child of customers.id"));
}

#[test]
fn test_rails_naming_links_before_inference() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("blog.yaml");
    fs::write(
        &schema,
        "tables:
  - name: people
    columns:
      - {name: id, type: integer}
    primary_key: [id]
  - name: posts
    columns:
      - {name: slug, type: varchar}
      - {name: person_id, type: integer}
    primary_key: [slug]
",
    )
    .unwrap();

    let output = Command::new(get_binary_path())
        .args(["implied", schema.to_str().unwrap(), "--rails", "--json"])
        .output()
        .expect("Failed to execute");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["rails"], 1);
    assert!(json["relationships"].as_array().unwrap().is_empty());

    let out = dir.path().join("out");
    let output = Command::new(get_binary_path())
        .args([
            "diagrams",
            schema.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--no-render",
            "--rails",
            "--json",
        ])
        .output()
        .expect("Failed to execute");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["rails"], 1);
    assert_eq!(json["implied"], 0);

    let dot = fs::read_to_string(out.join("diagrams/tables/posts.1degree.dot")).unwrap();
    assert!(dot.contains("\"people\""));
    assert!(!dot.contains("style=dashed"));
}

#[test]
fn test_diagrams_without_rendering() {
    let dir = TempDir::new().unwrap();
    let schema = create_schema(&dir);
    let out = dir.path().join("out");

    let output = Command::new(get_binary_path())
        .args([
            "diagrams",
            schema.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--no-render",
            "-j",
            "2",
        ])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let diagrams = out.join("diagrams");
    assert!(diagrams.join("tables/orders.1degree.dot").exists());
    assert!(diagrams.join("tables/orders.implied1degrees.dot").exists());
    assert!(diagrams.join("tables/customers.1degree.dot").exists());
    assert!(diagrams.join("orphans/audit_log_b66657f.dot").exists());
    assert!(diagrams.join("summary/relationships.implied.large.dot").exists());

    let dot = fs::read_to_string(diagrams.join("tables/orders.1degree.dot")).unwrap();
    assert!(dot.starts_with("digraph \"oneDegreeRelationshipsDiagram\" {"));
    assert!(dot.contains("\"stock.warehouses\""));
    assert!(dot.contains("URL=\"../../stock/tables/warehouses.html\""));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(diagrams.join("manifest.json")).unwrap()).unwrap();
    assert!(manifest["renderer"].is_null());
    assert!(manifest["failures"].as_array().unwrap().is_empty());
}

#[test]
fn test_diagrams_json_summary_and_filters() {
    let dir = TempDir::new().unwrap();
    let schema = create_schema(&dir);
    let out = dir.path().join("out");
    let config = dir.path().join("atlas.yaml");
    fs::write(&config, "degrees: 1\ndiagram:\n  row_counts: false\n").unwrap();

    let output = Command::new(get_binary_path())
        .args([
            "diagrams",
            schema.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "--no-render",
            "--no-implied",
            "-t",
            "cust*",
            "--json",
        ])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["tables"], 1);
    assert_eq!(json["implied"], 0);

    let tables = out.join("diagrams/tables");
    assert!(tables.join("customers.1degree.dot").exists());
    assert!(!tables.join("orders.1degree.dot").exists());
    assert!(!tables.join("customers.implied1degrees.dot").exists());
    let dot = fs::read_to_string(tables.join("customers.1degree.dot")).unwrap();
    assert!(!dot.contains(" rows"));
}

#[test]
fn test_missing_schema_fails() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(get_binary_path())
        .args([
            "diagrams",
            dir.path().join("missing.json").to_str().unwrap(),
            "--no-render",
        ])
        .output()
        .expect("Failed to execute");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_invalid_degrees_fail() {
    let dir = TempDir::new().unwrap();
    let schema = create_schema(&dir);
    let output = Command::new(get_binary_path())
        .args(["diagrams", schema.to_str().unwrap(), "--no-render", "--degrees", "3"])
        .output()
        .expect("Failed to execute");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown degrees"));
}

#[test]
fn test_file_name_command() {
    let output = Command::new(get_binary_path())
        .args(["file-name", "file.name", "order details"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, ["file.name", "order_details_c1b2e770"]);
}

#[test]
fn test_completions() {
    let output = Command::new(get_binary_path())
        .args(["completions", "bash"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("schema-atlas"));
}
