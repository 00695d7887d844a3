use graphql_fetcher::{Arguments, Fetcher, TypeDef, TypeRegistry, VariableRef};

fn registry() -> TypeRegistry {
    TypeRegistry::builder()
        .register(TypeDef::new("Department").field("id").field("name"))
        .register(
            TypeDef::new("Employee")
                .field("id")
                .field("name")
                .field("department")
                .field_with_args("subordinates", [("depth", "Int")]),
        )
        .register(TypeDef::new("Query").field_with_args("node", [("id", "ID!")]))
        .build()
        .unwrap()
}

#[test]
fn snapshot_carries_type_and_field_map() {
    let registry = registry();
    let fetcher = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .field("name")
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&fetcher.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "fetchableType": "Employee",
            "fieldMap": {
                "id": {},
                "name": {},
            },
        })
    );
}

#[test]
fn round_trips_nested_selections() {
    let registry = registry();
    let department = registry
        .fetcher("Department")
        .unwrap()
        .field("id")
        .unwrap()
        .field("name")
        .unwrap();

    let mut args = Arguments::new();
    args.insert("depth".to_string(), VariableRef::Implicit);
    let fetcher = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .add_field("department", Arguments::new(), Some(&department))
        .unwrap()
        .add_field("subordinates", args, None)
        .unwrap();

    let restored = Fetcher::from_json(&registry, &fetcher.to_json().unwrap()).unwrap();

    assert_eq!(restored.field_map(), fetcher.field_map());
    assert_eq!(restored, fetcher);
    assert_eq!(restored.to_string(), fetcher.to_string());
    assert_eq!(
        restored.implicit_variable_map(),
        fetcher.implicit_variable_map()
    );
}

#[test]
fn round_trips_merged_concrete_type_children() {
    let registry = registry();
    let employee = registry.fetcher("Employee").unwrap().field("id").unwrap();
    let department = registry
        .fetcher("Department")
        .unwrap()
        .field("name")
        .unwrap();

    let mut args = Arguments::new();
    args.insert("id".to_string(), VariableRef::Named("nodeId".to_string()));
    let query = registry
        .fetcher("Query")
        .unwrap()
        .add_field("node", args.clone(), Some(&employee))
        .unwrap()
        .add_field("node", args, Some(&department))
        .unwrap();

    let restored = Fetcher::from_json(&registry, &query.to_json().unwrap()).unwrap();

    assert_eq!(restored, query);
    assert_eq!(restored.to_string(), query.to_string());
    let explicit: Vec<_> = restored.explicit_variable_names().iter().collect();
    assert_eq!(explicit, ["nodeId"]);
}

#[test]
fn snapshots_from_a_different_schema_fail_loudly() {
    let registry = registry();
    let foreign = r#"{"fetchableType":"Employee","fieldMap":{"badge":{}}}"#;

    assert!(Fetcher::from_json(&registry, foreign).is_err());

    let unknown_type = r#"{"fetchableType":"Contractor","fieldMap":{}}"#;
    assert!(Fetcher::from_json(&registry, unknown_type).is_err());
}
