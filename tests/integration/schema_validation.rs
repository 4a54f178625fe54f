use jsonschema::validator_for;

fn compile_schema(name: &str) -> jsonschema::Validator {
  let schema = test_support::read_schema(name);
  validator_for(&schema).expect("compile schema")
}

fn fixture(name: &str) -> String {
  test_support::fixture_path(name).to_string_lossy().to_string()
}

#[test]
fn enriched_json_conforms_to_schema() {
  let out = test_support::enrich_cmd()
    .args([
      "--input",
      &fixture("topicbox.json"),
      "--identities",
      &fixture("identities.json"),
      "--projects",
      &fixture("projects.json"),
    ])
    .output()
    .unwrap();

  assert!(out.status.success());
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

  let compiled = compile_schema("topicbox.enriched.schema.json");
  compiled.validate(&v).expect("schema validation failed for enriched JSON");
}

#[test]
fn plain_enrichment_conforms_to_schema() {
  let out = test_support::enrich_cmd()
    .args(["--input", &fixture("topicbox.json"), "--repo-labels", "mailing,topicbox"])
    .output()
    .unwrap();

  assert!(out.status.success());
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

  let compiled = compile_schema("topicbox.enriched.schema.json");
  compiled.validate(&v).expect("schema validation failed for enriched JSON without identities");
}

#[test]
fn run_summary_conforms_to_schema() {
  let td = test_support::tempdir();
  let out_path = td.path().join("enriched.json");
  let raw_path = td.path().join("raw.ndjson");

  let out = test_support::enrich_cmd()
    .args([
      "--input",
      &fixture("topicbox.json"),
      "--out",
      out_path.to_str().unwrap(),
      "--raw-out",
      raw_path.to_str().unwrap(),
    ])
    .output()
    .unwrap();

  assert!(out.status.success());
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

  let compiled = compile_schema("topicbox.summary.schema.json");
  compiled.validate(&v).expect("schema validation failed for run summary");
}

#[test]
fn schema_rejects_items_without_thread() {
  let compiled = compile_schema("topicbox.enriched.schema.json");
  let bad = serde_json::json!([{ "origin": "x", "Subject": "s" }]);
  assert!(!compiled.is_valid(&bad));
}
