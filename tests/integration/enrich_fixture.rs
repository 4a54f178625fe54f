use chrono::{TimeZone, Utc};
use serde_json::Value;

use topicbox_enrich::enrichment::identity::{CachedIdentityService, FileIdentityService};
use topicbox_enrich::enrichment::projects::Projects;
use topicbox_enrich::pipeline::raw_to_enrich;
use topicbox_enrich::raw::items_to_raw;
use topicbox_enrich::{RawFieldsCopy, TopicboxEnrich, RAW_FIELDS_COPY, REPO_LABELS};

const ORIGIN: &str = "https://example.com/groups/test_group";

fn enricher() -> TopicboxEnrich {
  TopicboxEnrich::new(Utc.with_ymd_and_hms(2025, 8, 15, 12, 0, 0).unwrap())
}

fn raw_docs() -> Vec<Value> {
  let items: Vec<Value> = test_support::read_fixture_json("topicbox.json");
  let stage = items_to_raw(items);
  assert_eq!(stage.dropped, 0);
  stage.docs
}

fn identities() -> Box<CachedIdentityService> {
  let svc = FileIdentityService::load(&test_support::fixture_path("identities.json")).unwrap();
  Box::new(CachedIdentityService::new(Box::new(svc)))
}

fn enrich_to_values(enricher: &TopicboxEnrich) -> Vec<Value> {
  let outcome = raw_to_enrich(enricher, &raw_docs(), false).unwrap();
  assert_eq!(outcome.skipped, 0);
  outcome
    .items
    .iter()
    .map(|i| serde_json::to_value(i).unwrap())
    .collect()
}

#[test]
fn has_identities() {
  assert!(enricher().has_identities());
}

#[test]
fn items_to_raw_keeps_every_item() {
  test_support::init_tracing();
  let items: Vec<Value> = test_support::read_fixture_json("topicbox.json");
  assert_eq!(items.len(), 5);

  let stage = items_to_raw(items);
  assert_eq!(stage.docs.len(), 5);
  assert_eq!(stage.docs[0]["metadata__updated_on"], "2024-03-04T08:15:00+00:00");
  assert_eq!(stage.docs[0]["metadata__timestamp"], "2024-03-09T16:00:00+00:00");
}

#[test]
fn raw_to_enrich_maps_fixture_items() {
  test_support::init_tracing();
  let eitems = enrich_to_values(&enricher());
  assert_eq!(eitems.len(), 5);

  let expected = [
    ("Subject 1", "item1@topicbox.com", false, "thread1"),
    ("Subject 2", "item2@topicbox.com", false, "Thread2"),
    ("Subject 3", "item3@topicbox.com", false, "Thread3"),
    ("Subject 4", "item4@topicbox.com", true, "Thread3"),
    ("Subject 5", "item5@topicbox.com", true, "Thread3"),
  ];

  for (eitem, (subject, message_id, root, thread)) in eitems.iter().zip(expected) {
    assert_eq!(eitem["origin"], ORIGIN);
    assert_eq!(eitem["Subject"], subject);
    assert_eq!(eitem["Subject_analyzed"], subject);
    assert_eq!(eitem["Message-ID"], message_id);
    assert_eq!(eitem["root"], root);
    assert_eq!(eitem["thread"], thread);
    assert_eq!(eitem["is_topicbox_message"], 1);
    assert_eq!(eitem["email_date"], eitem["metadata__updated_on"]);
    assert_eq!(eitem["grimoire_creation_date"], eitem["email_date"]);
    assert_eq!(eitem["metadata__gelk_backend_name"], "TopicboxEnrich");
    assert_eq!(eitem["metadata__enriched_on"], "2025-08-15T12:00:00+00:00");
  }
}

#[test]
fn repository_labels_present_on_every_item() {
  let eitems = enrich_to_values(&enricher());
  for eitem in &eitems {
    assert!(eitem.as_object().unwrap().contains_key(REPO_LABELS));
    assert!(eitem[REPO_LABELS].is_null());
  }

  let labelled = enricher().with_repo_labels(vec!["mailing".into()]);
  for eitem in enrich_to_values(&labelled) {
    assert_eq!(eitem[REPO_LABELS], serde_json::json!(["mailing"]));
  }
}

#[test]
fn raw_to_enrich_with_identities() {
  test_support::init_tracing();
  let eitems = enrich_to_values(&enricher().with_identities(identities()));

  let author_keys = [
    "author_name",
    "author_user_name",
    "author_domain",
    "author_gender",
    "author_gender_acc",
    "author_org_name",
    "author_bot",
    "author_multi_org_names",
  ];

  for eitem in &eitems {
    let obj = eitem.as_object().unwrap();
    assert!(obj.contains_key("author_uuid"));
    if !eitem["author_uuid"].is_null() {
      for key in author_keys {
        assert!(obj.contains_key(key), "{} missing", key);
      }
    }
  }

  // jsmith: single enrollment
  assert_eq!(eitems[0]["author_uuid"], "5b1e6a0c9f3d4c2b8a7e6d5c4b3a2918f7e6d5c4");
  assert_eq!(eitems[0]["author_org_name"], "Example Corp");
  assert_eq!(eitems[0]["author_gender"], "male");
  assert_eq!(eitems[0]["author_domain"], "example.com");

  // null author: nothing to resolve
  assert!(eitems[1]["author_uuid"].is_null());
  assert!(eitems[1]["author_name"].is_null());

  // jdoe: email matched case-insensitively, two enrollments active on the message date
  assert_eq!(eitems[2]["author_uuid"], "8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d");
  assert_eq!(eitems[2]["author_org_name"], "Example Corp");
  assert_eq!(
    eitems[2]["author_multi_org_names"],
    serde_json::json!(["Example Corp", "Standards Group"])
  );

  // bot without enrollments
  assert_eq!(eitems[3]["author_bot"], true);
  assert_eq!(eitems[3]["author_org_name"], "Unknown");
  assert_eq!(eitems[3]["author_gender"], "Unknown");

  // unmatched author keeps the tuple-derived fields
  assert!(eitems[4]["author_uuid"].is_null());
  assert_eq!(eitems[4]["author_name"], "Someone Else");
  assert_eq!(eitems[4]["author_domain"], "other.org");
  assert!(eitems[4]["author_org_name"].is_null());
}

#[test]
fn raw_to_enrich_with_projects() {
  let projects = Projects::load(&test_support::fixture_path("projects.json")).unwrap();
  let eitems = enrich_to_values(&enricher().with_projects(projects));

  for eitem in &eitems {
    assert_eq!(eitem["project"], "Community.Lists");
    assert_eq!(eitem["project_1"], "Community");
    assert_eq!(eitem["project_2"], "Community.Lists");
    assert_eq!(eitem[REPO_LABELS], serde_json::json!(["mailing-list", "test"]));
  }
}

#[test]
fn unknown_origin_falls_back_to_main_project() {
  let projects = Projects::load(&test_support::fixture_path("projects.json")).unwrap();
  let mut docs = raw_docs();
  docs[0]["origin"] = Value::String("https://example.com/groups/other".into());

  let enricher = enricher()
    .with_projects(projects)
    .with_repo_labels(vec!["fallback".into()]);
  let outcome = raw_to_enrich(&enricher, &docs, false).unwrap();
  let first = serde_json::to_value(&outcome.items[0]).unwrap();

  assert_eq!(first["project"], "Main");
  assert_eq!(first["project_1"], "Main");
  assert_eq!(first[REPO_LABELS], serde_json::json!(["fallback"]));
}

#[test]
fn empty_identity() {
  let enricher = enricher();
  let identity = enricher.get_sh_identity(&serde_json::json!({ "data": { "author": null } }), "author");
  assert_eq!(identity.email, None);
  assert_eq!(identity.name, None);
  assert_eq!(identity.username, None);

  let docs = raw_docs();
  assert!(enricher.get_sh_identity(&docs[1], "author").is_empty());
  assert_eq!(
    enricher.get_sh_identity(&docs[0], "author").username.as_deref(),
    Some("jsmith")
  );
}

#[test]
fn copy_raw_fields() {
  let enricher = enricher();
  let docs = raw_docs();
  let outcome = raw_to_enrich(&enricher, &docs, false).unwrap();

  for (doc, item) in docs.iter().zip(&outcome.items) {
    let eitem = serde_json::to_value(item).unwrap();
    for field in RAW_FIELDS_COPY {
      match doc.get(field) {
        Some(v) => assert_eq!(&eitem[field], v, "{}", field),
        None => assert!(eitem[field].is_null(), "{}", field),
      }
    }
  }

  let narrow = enricher.with_raw_fields_copy(RawFieldsCopy::new(["uuid"]));
  let outcome = raw_to_enrich(&narrow, &docs, false).unwrap();
  let eitem = serde_json::to_value(&outcome.items[0]).unwrap();
  assert_eq!(eitem["uuid"], docs[0]["uuid"]);
  assert_eq!(eitem["origin"], ORIGIN);
  assert!(eitem.get("tag").is_none());
}

#[test]
fn enrichment_is_deterministic() {
  let enricher = enricher().with_identities(identities());
  let docs = raw_docs();
  let first = raw_to_enrich(&enricher, &docs, false).unwrap();
  let second = raw_to_enrich(&enricher, &docs, false).unwrap();
  assert_eq!(first.items, second.items);
}
