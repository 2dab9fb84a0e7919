//! Integration tests executing compiled plans against the in-memory engine.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{text, Fixture};
use navql_core::proto::{
    ComposedQuery, FilterExpr, FlatRow, OrderSpec, Pagination, QueryResult, Value,
};
use navql_core::{Error, ExecutionOptions, MemoryEngine, MemoryStore, QueryEngine, Row};

fn flatten(fx: &Fixture, root: &str, fields: &[&str]) -> Vec<FlatRow> {
    let query = fx
        .compiler
        .build_flattened_query(root, fields)
        .unwrap()
        .to_query();
    fx.engine
        .execute(&query, &ExecutionOptions::new())
        .unwrap()
        .rows()
        .to_vec()
}

fn column(rows: &[FlatRow], slot: &str) -> Vec<String> {
    rows.iter().map(|r| text(r.get(slot))).collect()
}

#[test]
fn test_nested_collections_flatten_to_one_row_per_leaf() {
    let fx = Fixture::new();
    let rows = flatten(
        &fx,
        "Organisation",
        &["Id", "Name", "Departments.Name", "Departments.Employees.FirstName"],
    );

    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.get("Id") == Some(&Value::Int32(1))));
    assert!(rows.iter().all(|r| text(r.get("Name")) == "Acme"));
    assert_eq!(
        column(&rows, "Departments.Name"),
        vec!["Finance", "Finance", "Research", "Research", "Research"]
    );
    assert_eq!(
        column(&rows, "Departments.Employees.FirstName"),
        vec!["Eve", "Dan", "Adam", "Cara", "Zoe"]
    );
}

#[test]
fn test_independent_collections_multiply() {
    let fx = Fixture::new();

    let rows = flatten(&fx, "Organisation", &["Name", "Departments.Name", "Projects.Name"]);
    assert_eq!(rows.len(), 2 * 3);
    let pairs: Vec<(String, String)> = rows
        .iter()
        .map(|r| (text(r.get("Departments.Name")), text(r.get("Projects.Name"))))
        .collect();
    assert_eq!(pairs[0], ("Finance".to_string(), "Apollo".to_string()));
    assert_eq!(pairs[2], ("Finance".to_string(), "Zephyr".to_string()));
    assert_eq!(pairs[3], ("Research".to_string(), "Apollo".to_string()));

    let rows = flatten(
        &fx,
        "Organisation",
        &["Departments.Employees.FirstName", "Projects.Name"],
    );
    assert_eq!(rows.len(), 5 * 3);
}

#[test]
fn test_empty_collection_drops_root() {
    let fx = Fixture::new();

    // Globex has a project but no departments.
    let rows = flatten(&fx, "Organisation", &["Name", "Projects.Name"]);
    assert_eq!(column(&rows, "Name"), vec!["Acme", "Acme", "Acme", "Globex"]);
    assert_eq!(
        column(&rows, "Projects.Name"),
        vec!["Apollo", "Mercury", "Zephyr", "Orion"]
    );

    let rows = flatten(&fx, "Organisation", &["Name", "Departments.Name"]);
    assert!(rows.iter().all(|r| text(r.get("Name")) == "Acme"));

    let rows = flatten(&fx, "Employee", &["FirstName", "Skills.Name"]);
    let pairs: Vec<(String, String)> = rows
        .iter()
        .map(|r| (text(r.get("FirstName")), text(r.get("Skills.Name"))))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Zoe".to_string(), "SQL".to_string()),
            ("Zoe".to_string(), "Rust".to_string()),
            ("Dan".to_string(), "Excel".to_string()),
        ]
    );
}

#[test]
fn test_to_one_chain_keeps_one_row_per_root() {
    let fx = Fixture::new();
    let rows = flatten(
        &fx,
        "Employee",
        &["FirstName", "Department.Organisation.Name", "Role.Title"],
    );

    assert_eq!(
        column(&rows, "FirstName"),
        vec!["Zoe", "Adam", "Cara", "Dan", "Eve", "Old"]
    );
    assert!(rows
        .iter()
        .all(|r| text(r.get("Department.Organisation.Name")) == "Acme"));
    // Old has no role.
    assert_eq!(rows[5].get("Role.Title"), Some(&Value::Null));
    assert_eq!(text(rows[4].get("Role.Title")), "Manager");
}

#[test]
fn test_declared_filter_excludes_children() {
    let fx = Fixture::new();
    let rows = flatten(&fx, "Department", &["Name", "Employees.FirstName"]);

    assert_eq!(
        column(&rows, "Employees.FirstName"),
        vec!["Adam", "Cara", "Zoe", "Eve", "Dan"]
    );
    assert!(!column(&rows, "Employees.FirstName").contains(&"Old".to_string()));
}

#[test]
fn test_unknown_branches_are_skipped() {
    let fx = Fixture::new();

    let rows = flatten(
        &fx,
        "Organisation",
        &["Name", "Bogus.Name", "Departments.Nope", "Departments.Name"],
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].values.len(), 2);

    // Without any collection join every root survives.
    let rows = flatten(&fx, "Organisation", &["Name", "Bogus.Name"]);
    assert_eq!(column(&rows, "Name"), vec!["Acme", "Globex"]);
}

#[test]
fn test_slot_names_use_declared_casing() {
    let fx = Fixture::new();
    let rows = flatten(&fx, "organisation", &["departments.NAME"]);
    assert_eq!(rows[0].values[0].0, "Departments.Name");
}

#[test]
fn test_unknown_root_fails_at_execution() {
    let fx = Fixture::new();
    let plan = fx
        .compiler
        .build_flattened_query("Invoice", &["Number"])
        .unwrap();
    assert!(plan.slots.is_empty());

    let result = fx.engine.execute(&plan.to_query(), &ExecutionOptions::new());
    assert!(matches!(result, Err(Error::UnknownEntity(name)) if name == "Invoice"));
}

#[test]
fn test_caller_composition_over_flattened_rows() {
    let fx = Fixture::new();
    let options = ExecutionOptions::new();
    let base = fx
        .compiler
        .build_flattened_query("Organisation", &["Departments.Employees.RoleId"])
        .unwrap()
        .to_query();

    assert_eq!(fx.engine.count(&base, &options).unwrap(), 5);
    assert_eq!(fx.engine.count(&base.clone().distinct(), &options).unwrap(), 3);

    let page = base
        .clone()
        .distinct()
        .with_order(OrderSpec::asc("Departments.Employees.RoleId"))
        .with_pagination(Pagination::new(2, 1));
    let result = fx.engine.execute(&page, &options).unwrap();
    let roles: Vec<&Value> = result
        .rows()
        .iter()
        .filter_map(|r| r.get("Departments.Employees.RoleId"))
        .collect();
    assert_eq!(roles, vec![&Value::Int32(2), &Value::Int32(3)]);
    assert_eq!(fx.engine.count(&page, &options).unwrap(), 2);

    let engineers = base.with_filter(FilterExpr::eq("Departments.Employees.RoleId", 1));
    assert_eq!(fx.engine.count(&engineers, &options).unwrap(), 2);
}

#[test]
fn test_include_documents() {
    let fx = Fixture::new();
    let plan = fx
        .compiler
        .build_query("Organisation", &["Departments.Employees", "Projects"]);
    let result = fx
        .engine
        .execute(&plan.to_query(), &ExecutionOptions::new())
        .unwrap();

    let documents = result.documents();
    assert_eq!(documents.len(), 2);
    let acme = &documents[0];
    let departments = acme.many("Departments");
    assert_eq!(departments.len(), 2);
    assert_eq!(text(departments[0].get("Name")), "Finance");
    assert_eq!(departments[0].many("Employees").len(), 2);
    assert_eq!(acme.many("Projects").len(), 3);

    let globex = &documents[1];
    assert!(globex.many("Departments").is_empty());
    assert_eq!(text(globex.many("Projects")[0].get("Name")), "Orion");
}

#[test]
fn test_caller_composition_over_documents() {
    let fx = Fixture::new();
    let query = fx
        .compiler
        .build_query("Employee", &["Role"])
        .to_query()
        .with_filter(FilterExpr::eq("IsActive", true))
        .with_order(OrderSpec::desc("LastName"))
        .with_pagination(Pagination::limit(3));
    let result = fx.engine.execute(&query, &ExecutionOptions::new()).unwrap();

    let names: Vec<String> = result
        .documents()
        .iter()
        .map(|d| text(d.get("FirstName")))
        .collect();
    assert_eq!(names, vec!["Zoe", "Dan", "Eve"]);
    let titles: Vec<String> = result
        .documents()
        .iter()
        .map(|d| d.one("Role").map(|r| text(r.get("Title"))).unwrap_or_default())
        .collect();
    assert_eq!(titles, vec!["Engineer", "Engineer", "Manager"]);
}

#[test]
fn test_projection_fills_unrequested_scalars_with_defaults() {
    let fx = Fixture::new();
    let plan = fx
        .compiler
        .build_projection_query("Employee", &["FirstName", "Department.Name"])
        .unwrap();
    let result = fx
        .engine
        .execute(&plan.to_query(), &ExecutionOptions::new())
        .unwrap();

    let zoe = &result.documents()[0];
    assert_eq!(text(zoe.get("FirstName")), "Zoe");
    assert_eq!(text(zoe.get("LastName")), "");
    assert_eq!(zoe.get("IsActive"), Some(&Value::Bool(false)));
    let department = zoe.one("Department").unwrap();
    assert_eq!(text(department.get("Name")), "Research");
    assert_eq!(text(department.get("Code")), "");
    assert!(zoe.one("Role").is_none());
}

#[test]
fn test_execution_options_are_honoured() {
    let fx = Fixture::new();
    let query = fx
        .compiler
        .build_flattened_query("Organisation", &["Departments.Name"])
        .unwrap()
        .to_query();

    let flag = Arc::new(AtomicBool::new(true));
    let cancelled = ExecutionOptions::new().with_cancel_flag(Arc::clone(&flag));
    assert!(matches!(
        fx.engine.execute(&query, &cancelled),
        Err(Error::Cancelled)
    ));
    assert!(matches!(
        fx.engine.count(&query, &cancelled),
        Err(Error::Cancelled)
    ));

    flag.store(false, Ordering::Relaxed);
    assert_eq!(fx.engine.count(&query, &cancelled).unwrap(), 2);

    let expired = ExecutionOptions::new().with_timeout(Duration::ZERO);
    assert!(matches!(
        fx.engine.execute(&query, &expired),
        Err(Error::Timeout)
    ));
}

fn employee(id: i32, first: &str, last: &str, department: i32) -> Row {
    vec![
        ("Id".to_string(), id.into()),
        ("FirstName".to_string(), first.into()),
        ("LastName".to_string(), last.into()),
        ("IsActive".to_string(), true.into()),
        ("DepartmentId".to_string(), department.into()),
        ("RoleId".to_string(), 2.into()),
    ]
}

/// The fixture store plus rows whose declared sort keys tie: a second
/// Research department, two more Adam Browns and a second level-5 skill.
fn tied_store() -> MemoryStore {
    let mut store = common::store();
    store.insert(
        "Department",
        vec![
            ("Id".to_string(), 12.into()),
            ("Name".to_string(), "Research".into()),
            ("Code".to_string(), "RN2".into()),
            ("Budget".to_string(), Value::Float64(500.0)),
            ("OrganisationId".to_string(), 1.into()),
        ],
    );
    store.insert("Employee", employee(107, "Adam", "Brown", 10));
    store.insert("Employee", employee(106, "Adam", "Brown", 10));
    store.insert("Employee", employee(108, "Ann", "Lee", 12));
    store.insert(
        "Skill",
        vec![
            ("Id".to_string(), 303.into()),
            ("Name".to_string(), "Go".into()),
            ("Level".to_string(), 5.into()),
            ("EmployeeId".to_string(), 100.into()),
        ],
    );
    store
}

fn run(engine: &MemoryEngine, query: &ComposedQuery) -> QueryResult {
    engine.execute(query, &ExecutionOptions::new()).unwrap()
}

/// Copy of `store` with every table in reverse insertion order.
fn reversed(store: &MemoryStore) -> MemoryStore {
    let mut copy = MemoryStore::new();
    for entity in ["Organisation", "Department", "Employee", "Role", "Skill", "Project"] {
        for row in store.rows(entity).iter().rev() {
            copy.insert(entity, row.clone());
        }
    }
    copy
}

#[test]
fn test_ordering_does_not_depend_on_storage_order() {
    let fx = Fixture::new();
    let catalog = Arc::new(common::catalog());
    let forward = MemoryEngine::new(Arc::clone(&catalog), tied_store());
    let backward = MemoryEngine::new(catalog, reversed(&tied_store()));
    let include = fx
        .compiler
        .build_query("Organisation", &["Departments.Employees.Skills", "Projects"])
        .to_query();
    let documents = run(&forward, &include);
    assert_eq!(documents, run(&backward, &include));

    let departments = documents.documents()[0].many("Departments");
    let ids: Vec<Option<i32>> = departments
        .iter()
        .map(|d| d.get("Id").and_then(Value::as_i32))
        .collect();
    assert_eq!(ids, vec![Some(11), Some(10), Some(12)]);
    let research: Vec<Option<i32>> = departments[1]
        .many("Employees")
        .iter()
        .map(|e| e.get("Id").and_then(Value::as_i32))
        .collect();
    assert_eq!(
        research,
        vec![Some(101), Some(106), Some(107), Some(102), Some(100)]
    );
    let zoe = &departments[1].many("Employees")[4];
    let skills: Vec<String> = zoe
        .many("Skills")
        .iter()
        .map(|s| text(s.get("Name")))
        .collect();
    assert_eq!(skills, vec!["SQL", "Go", "Rust"]);

    let flattened = fx
        .compiler
        .build_flattened_query(
            "Organisation",
            &["Name", "Departments.Id", "Departments.Employees.Id"],
        )
        .unwrap()
        .to_query();
    let rows = run(&forward, &flattened);
    assert_eq!(rows, run(&backward, &flattened));

    let pairs: Vec<(Option<i32>, Option<i32>)> = rows
        .rows()
        .iter()
        .map(|r| {
            (
                r.get("Departments.Id").and_then(Value::as_i32),
                r.get("Departments.Employees.Id").and_then(Value::as_i32),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            (Some(11), Some(104)),
            (Some(11), Some(103)),
            (Some(10), Some(101)),
            (Some(10), Some(106)),
            (Some(10), Some(107)),
            (Some(10), Some(102)),
            (Some(10), Some(100)),
            (Some(12), Some(108)),
        ]
    );
}
