//! Catalog and data generation for benchmarks.
//!
//! Data is generated from a fixed seed so runs are comparable.

use navql_core::{
    Catalog, EntityDef, MemoryStore, NavigationDecoration, NavigationDef, Row, ScalarType,
};
use navql_proto::{FilterExpr, OrderSpec, Value};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug)]
pub enum Scale {
    /// 2 organisations, quick iteration.
    Tiny,
    /// 10 organisations.
    Small,
    /// 50 organisations.
    Medium,
}

impl Scale {
    /// Number of organisations.
    pub fn organisations(&self) -> usize {
        match self {
            Scale::Tiny => 2,
            Scale::Small => 10,
            Scale::Medium => 50,
        }
    }

    /// Departments per organisation.
    pub fn departments_per_org(&self) -> usize {
        match self {
            Scale::Tiny => 2,
            Scale::Small => 4,
            Scale::Medium => 5,
        }
    }

    /// Employees per department.
    pub fn employees_per_department(&self) -> usize {
        match self {
            Scale::Tiny => 3,
            Scale::Small => 8,
            Scale::Medium => 10,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Small
    }
}

/// Organisation chart catalog with a Department/Organisation cycle.
pub fn org_catalog() -> Catalog {
    let result = Catalog::builder()
        .entity(
            EntityDef::new("Organisation", "Id")
                .with_field("Id", ScalarType::Int32)
                .with_field("Name", ScalarType::String)
                .with_field("FoundYear", ScalarType::Int32)
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
                .with_navigation(NavigationDef::singular("Role", "Role", "RoleId", "Id")),
        )
        .entity(
            EntityDef::new("Role", "Id")
                .with_field("Id", ScalarType::Int32)
                .with_field("Title", ScalarType::String),
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
                .filter(FilterExpr::eq("IsActive", true)),
        )
        .build();

    match result {
        Ok(catalog) => catalog,
        Err(e) => panic!("benchmark catalog is invalid: {}", e),
    }
}

fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

fn row(fields: Vec<(&str, Value)>) -> Row {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Generate a store for `org_catalog` at the given scale.
pub fn org_store(scale: Scale) -> MemoryStore {
    const SEED: u64 = 12345;
    const ROLES: [&str; 4] = ["Engineer", "Analyst", "Manager", "Director"];
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut store = MemoryStore::new();

    for (id, title) in ROLES.iter().enumerate() {
        store.insert(
            "Role",
            row(vec![("Id", (id as i32 + 1).into()), ("Title", (*title).into())]),
        );
    }

    let mut department_id = 0i32;
    let mut employee_id = 0i32;
    for org in 1..=scale.organisations() as i32 {
        store.insert(
            "Organisation",
            row(vec![
                ("Id", org.into()),
                ("Name", format!("Org {}", random_string(&mut rng, 8)).into()),
                ("FoundYear", rng.gen_range(1900..2020i32).into()),
            ]),
        );
        for _ in 0..scale.departments_per_org() {
            department_id += 1;
            store.insert(
                "Department",
                row(vec![
                    ("Id", department_id.into()),
                    ("Name", random_string(&mut rng, 10).into()),
                    ("Budget", Value::Float64(rng.gen_range(1_000.0..100_000.0))),
                    ("OrganisationId", org.into()),
                ]),
            );
            for _ in 0..scale.employees_per_department() {
                employee_id += 1;
                store.insert(
                    "Employee",
                    row(vec![
                        ("Id", employee_id.into()),
                        ("FirstName", random_string(&mut rng, 6).into()),
                        ("LastName", random_string(&mut rng, 8).into()),
                        ("IsActive", rng.gen_bool(0.9).into()),
                        ("DepartmentId", department_id.into()),
                        ("RoleId", rng.gen_range(1..=ROLES.len() as i32).into()),
                    ]),
                );
            }
        }
    }

    info!(scale = ?scale, rows = store.len(), "generated benchmark store");
    store
}
