use graphql_fetcher::{Arguments, FetcherError, TypeDef, TypeRegistry, VariableRef};

fn registry() -> TypeRegistry {
    TypeRegistry::builder()
        .register(TypeDef::new("Named").field("name"))
        .register(TypeDef::new("Department").field("id").field("name"))
        .register(
            TypeDef::new("Employee")
                .implements("Named")
                .field("id")
                .field("salary")
                .field("department")
                .field_with_args("subordinates", [("depth", "Int")]),
        )
        .build()
        .unwrap()
}

#[test]
fn composition_is_persistent() {
    let registry = registry();
    let base = registry.fetcher("Employee").unwrap().field("id").unwrap();

    let with_name = base.field("name").unwrap();
    let with_salary = base.field("salary").unwrap();

    // Both variants share the base chain; neither sees the other's field.
    let base_fields: Vec<_> = base.field_map().keys().collect();
    assert_eq!(base_fields, ["id"]);
    let name_fields: Vec<_> = with_name.field_map().keys().collect();
    assert_eq!(name_fields, ["id", "name"]);
    let salary_fields: Vec<_> = with_salary.field_map().keys().collect();
    assert_eq!(salary_fields, ["id", "salary"]);
}

#[test]
fn negation_is_idempotent_and_structural() {
    let registry = registry();
    let fetcher = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .field("name")
        .unwrap();

    let without_name = fetcher.remove_field("name").unwrap();
    assert!(!without_name.field_map().contains_key("name"));
    assert_eq!(without_name.chain_length(), fetcher.chain_length() + 1);

    // Removing again appends one node and still resolves to the same map.
    let twice = without_name.remove_field("name").unwrap();
    assert_eq!(twice.chain_length(), without_name.chain_length() + 1);
    assert_eq!(twice.field_map(), without_name.field_map());
}

#[test]
fn removing_an_unselected_declared_field_is_a_no_op() {
    let registry = registry();
    let fetcher = registry.fetcher("Employee").unwrap().field("id").unwrap();

    let removed = fetcher.remove_field("salary").unwrap();
    let fields: Vec<_> = removed.field_map().keys().collect();
    assert_eq!(fields, ["id"]);
}

#[test]
fn re_adding_a_removed_field_moves_it_to_the_end() {
    let registry = registry();
    let fetcher = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .field("name")
        .unwrap()
        .remove_field("id")
        .unwrap()
        .field("id")
        .unwrap();

    let fields: Vec<_> = fetcher.field_map().keys().collect();
    assert_eq!(fields, ["name", "id"]);
}

#[test]
fn unknown_field_is_rejected_at_composition_time() {
    let registry = registry();
    let fetcher = registry.fetcher("Employee").unwrap();

    assert!(matches!(
        fetcher.field("departmentId"),
        Err(FetcherError::UnknownField { type_name, field })
            if type_name == "Employee" && field == "departmentId"
    ));
    assert!(matches!(
        fetcher.remove_field("departmentId"),
        Err(FetcherError::UnknownField { .. })
    ));
}

#[test]
fn mismatched_argument_names_are_rejected() {
    let registry = registry();
    let fetcher = registry.fetcher("Employee").unwrap();

    let mut args = Arguments::new();
    args.insert("levels".to_string(), VariableRef::Implicit);
    assert!(matches!(
        fetcher.add_field("subordinates", args, None),
        Err(FetcherError::UnknownArgument { argument, .. }) if argument == "levels"
    ));
}

#[test]
fn inherited_fields_are_addressable() {
    let registry = registry();
    let fetcher = registry.fetcher("Employee").unwrap().field("name").unwrap();

    assert!(fetcher.field_map().contains_key("name"));
}

#[test]
fn supertype_fragment_merges_fully() {
    let registry = registry();
    let named = registry.fetcher("Named").unwrap().field("name").unwrap();
    let employee = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .add_embeddable(&named, None)
        .unwrap();

    let fields: Vec<_> = employee.field_map().keys().collect();
    assert_eq!(fields, ["id", "name"]);
}

#[test]
fn subtype_fragment_merges_shared_fields_only() {
    let registry = registry();
    let employee = registry
        .fetcher("Employee")
        .unwrap()
        .field("name")
        .unwrap()
        .field("salary")
        .unwrap();
    let named = registry
        .fetcher("Named")
        .unwrap()
        .add_embeddable(&employee, None)
        .unwrap();

    let fields: Vec<_> = named.field_map().keys().collect();
    assert_eq!(fields, ["name"]);
}

#[test]
fn unrelated_fragment_types_are_rejected() {
    let registry = registry();
    let department = registry.fetcher("Department").unwrap().field("id").unwrap();
    let employee = registry.fetcher("Employee").unwrap();

    assert!(matches!(
        employee.add_embeddable(&department, None),
        Err(FetcherError::TypeMismatch { fragment_type, target_type })
            if fragment_type == "Department" && target_type == "Employee"
    ));
}

#[test]
fn equality_is_resolved_content_not_chain_shape() {
    let registry = registry();
    let direct = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .field("name")
        .unwrap();
    let detoured = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .field("salary")
        .unwrap()
        .remove_field("salary")
        .unwrap()
        .field("name")
        .unwrap();

    assert_eq!(direct, detoured);
    assert_ne!(direct.chain_length(), detoured.chain_length());

    // Different field order is different query text.
    let reordered = registry
        .fetcher("Employee")
        .unwrap()
        .field("name")
        .unwrap()
        .field("id")
        .unwrap();
    assert_ne!(direct, reordered);
}

#[test]
fn concurrent_first_reads_share_one_resolved_map() {
    let registry = registry();
    let department = registry
        .fetcher("Department")
        .unwrap()
        .field("id")
        .unwrap()
        .field("name")
        .unwrap();
    let fetcher = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .add_field("department", Arguments::new(), Some(&department))
        .unwrap();

    let barrier = std::sync::Barrier::new(8);
    let observed: Vec<(usize, String)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    let map = fetcher.field_map();
                    (map as *const _ as usize, fetcher.to_string())
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    // The per-node cache fills once: every thread gets a reference to the
    // same map and renders the same text.
    let (address, text) = &observed[0];
    assert!(observed
        .iter()
        .all(|(other_address, other_text)| other_address == address && other_text == text));
    assert_eq!(text, "{id department {id name}}");
}

#[test]
fn fragment_fields_behave_as_individually_added() {
    let registry = registry();
    let core = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .field("name")
        .unwrap();
    let embedded = registry
        .fetcher("Employee")
        .unwrap()
        .add_embeddable(&core, None)
        .unwrap();
    let direct = registry
        .fetcher("Employee")
        .unwrap()
        .field("id")
        .unwrap()
        .field("name")
        .unwrap();

    assert_eq!(embedded, direct);
    assert!(embedded.field_map().contains_key("id"));

    // Fields that arrived through the fragment can be removed like any
    // other field.
    let trimmed = embedded.remove_field("id").unwrap();
    let fields: Vec<_> = trimmed.field_map().keys().collect();
    assert_eq!(fields, ["name"]);
}
