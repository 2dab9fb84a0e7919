//! Shared fixture for integration tests.
//!
//! An organisation chart with two independent collections on the root
//! (`Departments` and `Projects`), back-references that form a cycle, and a
//! store whose rows are inserted out of identity order.

#![allow(dead_code)]

use std::sync::Arc;

use navql_core::proto::{FilterExpr, OrderSpec, Value};
use navql_core::{
    Catalog, CompilerConfig, EntityDef, MemoryEngine, MemoryStore, NavigationDecoration,
    NavigationDef, PathCompiler, Row, ScalarType,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn catalog() -> Catalog {
    Catalog::builder()
        .entity(
            EntityDef::new("Organisation", "Id")
                .with_field("Id", ScalarType::Int32)
                .with_field("Name", ScalarType::String)
                .with_field("FoundYear", ScalarType::Int32)
                .with_field("Country", ScalarType::String)
                .with_navigation(NavigationDef::collection(
                    "Departments",
                    "Department",
                    "Id",
                    "OrganisationId",
                ))
                .with_navigation(NavigationDef::collection(
                    "Projects",
                    "Project",
                    "Id",
                    "OrganisationId",
                )),
        )
        .entity(
            EntityDef::new("Department", "Id")
                .with_field("Id", ScalarType::Int32)
                .with_field("Name", ScalarType::String)
                .with_field("Code", ScalarType::String)
                .with_field("Budget", ScalarType::Float64)
                .with_field("OrganisationId", ScalarType::Int32)
                .with_navigation(NavigationDef::singular(
                    "Organisation",
                    "Organisation",
                    "OrganisationId",
                    "Id",
                ))
                .with_navigation(NavigationDef::collection(
                    "Employees",
                    "Employee",
                    "Id",
                    "DepartmentId",
                )),
        )
        .entity(
            EntityDef::new("Employee", "Id")
                .with_field("Id", ScalarType::Int32)
                .with_field("FirstName", ScalarType::String)
                .with_field("LastName", ScalarType::String)
                .with_field("IsActive", ScalarType::Bool)
                .with_field("DepartmentId", ScalarType::Int32)
                .with_field("RoleId", ScalarType::Int32)
                .with_navigation(NavigationDef::singular(
                    "Department",
                    "Department",
                    "DepartmentId",
                    "Id",
                ))
                .with_navigation(NavigationDef::singular("Role", "Role", "RoleId", "Id"))
                .with_navigation(NavigationDef::collection(
                    "Skills",
                    "Skill",
                    "Id",
                    "EmployeeId",
                )),
        )
        .entity(
            EntityDef::new("Role", "Id")
                .with_field("Id", ScalarType::Int32)
                .with_field("Title", ScalarType::String),
        )
        .entity(
            EntityDef::new("Skill", "Id")
                .with_field("Id", ScalarType::Int32)
                .with_field("Name", ScalarType::String)
                .with_field("Level", ScalarType::Int32)
                .with_field("EmployeeId", ScalarType::Int32),
        )
        .entity(
            EntityDef::new("Project", "Id")
                .with_field("Id", ScalarType::Int32)
                .with_field("Name", ScalarType::String)
                .with_field("OrganisationId", ScalarType::Int32),
        )
        .decorate(
            "Organisation",
            "Departments",
            NavigationDecoration::new().order_by(OrderSpec::asc("Name")),
        )
        .decorate(
            "Organisation",
            "Projects",
            NavigationDecoration::new().order_by(OrderSpec::asc("Name")),
        )
        .decorate(
            "Department",
            "Employees",
            NavigationDecoration::new()
                .order_by(OrderSpec::asc("LastName"))
                .order_by(OrderSpec::asc("FirstName"))
                .filter(FilterExpr::eq("IsActive", true))
                .max_depth(1),
        )
        .decorate(
            "Employee",
            "Skills",
            NavigationDecoration::new().order_by(OrderSpec::desc("Level")),
        )
        .build()
        .expect("fixture catalog is valid")
}

fn row(fields: &[(&str, Value)]) -> Row {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Acme (1) has departments Research (10) and Finance (11) and three
/// projects; Globex (2) has one project and no departments. Employee 105 is
/// inactive and has no role.
pub fn store() -> MemoryStore {
    let mut store = MemoryStore::new();

    for (id, name, year, country) in [(2, "Globex", 1990, "US"), (1, "Acme", 1987, "NZ")] {
        store.insert(
            "Organisation",
            row(&[
                ("Id", id.into()),
                ("Name", name.into()),
                ("FoundYear", year.into()),
                ("Country", country.into()),
            ]),
        );
    }
    for (id, name, code) in [(11, "Finance", "FIN"), (10, "Research", "RND")] {
        store.insert(
            "Department",
            row(&[
                ("Id", id.into()),
                ("Name", name.into()),
                ("Code", code.into()),
                ("Budget", Value::Float64(1000.0)),
                ("OrganisationId", 1.into()),
            ]),
        );
    }

    let employees: [(i32, &str, &str, bool, i32, Option<i32>); 6] = [
        (104, "Eve", "Jones", true, 11, Some(3)),
        (102, "Cara", "Brown", true, 10, Some(2)),
        (105, "Old", "Timer", false, 11, None),
        (100, "Zoe", "Young", true, 10, Some(1)),
        (103, "Dan", "Smith", true, 11, Some(1)),
        (101, "Adam", "Brown", true, 10, Some(2)),
    ];
    for (id, first, last, active, dept, role) in employees {
        store.insert(
            "Employee",
            row(&[
                ("Id", id.into()),
                ("FirstName", first.into()),
                ("LastName", last.into()),
                ("IsActive", active.into()),
                ("DepartmentId", dept.into()),
                ("RoleId", role.into()),
            ]),
        );
    }

    for (id, title) in [(3, "Manager"), (1, "Engineer"), (2, "Analyst")] {
        store.insert("Role", row(&[("Id", id.into()), ("Title", title.into())]));
    }
    for (id, name, level, employee) in [
        (301, "Rust", 3, 100),
        (300, "Excel", 2, 103),
        (302, "SQL", 5, 100),
    ] {
        store.insert(
            "Skill",
            row(&[
                ("Id", id.into()),
                ("Name", name.into()),
                ("Level", level.into()),
                ("EmployeeId", employee.into()),
            ]),
        );
    }
    for (id, name, org) in [
        (202, "Zephyr", 1),
        (203, "Orion", 2),
        (200, "Apollo", 1),
        (201, "Mercury", 1),
    ] {
        store.insert(
            "Project",
            row(&[
                ("Id", id.into()),
                ("Name", name.into()),
                ("OrganisationId", org.into()),
            ]),
        );
    }
    store
}

pub struct Fixture {
    pub compiler: PathCompiler,
    pub engine: MemoryEngine,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        init_tracing();
        let catalog = Arc::new(catalog());
        Self {
            compiler: PathCompiler::new(Arc::clone(&catalog), config),
            engine: MemoryEngine::new(catalog, store()),
        }
    }
}

/// String content of a value, empty for anything else.
pub fn text(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
