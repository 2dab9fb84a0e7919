//! Shared fixtures for unit tests.
//!
//! Organisation -> Departments -> Employees -> Skills, with back-references
//! Employee -> Department -> Organisation forming a cycle.

use navql_proto::{FilterExpr, OrderSpec, Value};

use crate::catalog::{Catalog, EntityDef, NavigationDecoration, NavigationDef, ScalarType};
use crate::engine::MemoryStore;

pub(crate) fn org_catalog() -> Catalog {
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
        .decorate(
            "Organisation",
            "Departments",
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

fn row(fields: &[(&str, Value)]) -> Vec<(String, Value)> {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// One organisation with two departments (3 and 2 active employees) plus an
/// inactive employee that the Employees filter hides.
pub(crate) fn org_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert(
        "Organisation",
        row(&[
            ("Id", 1.into()),
            ("Name", "Acme".into()),
            ("FoundYear", 1987.into()),
            ("Country", "NZ".into()),
        ]),
    );
    for (id, name, code) in [(10, "Research", "RND"), (11, "Finance", "FIN")] {
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
    let employees = [
        (100, "Zoe", "Young", true, 10, 1),
        (101, "Adam", "Brown", true, 10, 2),
        (102, "Cara", "Brown", true, 10, 2),
        (103, "Dan", "Smith", true, 11, 1),
        (104, "Eve", "Jones", true, 11, 3),
        (105, "Old", "Timer", false, 11, 3),
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
    for (id, title) in [(1, "Engineer"), (2, "Analyst"), (3, "Manager")] {
        store.insert("Role", row(&[("Id", id.into()), ("Title", title.into())]));
    }
    store
}
