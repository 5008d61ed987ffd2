use ferrule_render::{canonical_name, invoke, HelperContext, HelperRegistry};
use minijinja::Value;
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,10}"
}

proptest! {
    #[test]
    fn derived_name_is_last_segment_without_suffix(
        namespace in prop::collection::vec(segment(), 0..4),
        name in segment(),
        separator in prop_oneof![Just("::"), Just("\\")],
    ) {
        // A base ending in "function" would lose that too.
        prop_assume!(!name.to_lowercase().ends_with("function"));

        let mut identity = namespace.join(separator);
        if !identity.is_empty() {
            identity.push_str(separator);
        }
        identity.push_str(&name);
        identity.push_str("Function");

        prop_assert_eq!(canonical_name(&identity), name.to_lowercase());
    }

    #[test]
    fn explicit_names_are_case_insensitive_at_registration(name in "[a-zA-Z][a-zA-Z_]{0,12}") {
        let mut registry = HelperRegistry::new();
        registry.register_fn(name.to_uppercase(), |_| Ok(Value::from("f"))).unwrap();
        registry.register_fn(name.to_lowercase(), |_| Ok(Value::from("g"))).unwrap();

        prop_assert_eq!(registry.len(), 1);

        let vars = Value::from(());
        let out = invoke(&registry, &HelperContext::new(&vars), &name.to_lowercase(), &[]).unwrap();
        prop_assert_eq!(out.value().as_str(), Some("g"));
    }

    #[test]
    fn unknown_names_render_empty(name in "[a-z]{1,12}") {
        let registry = HelperRegistry::new();
        let vars = Value::from(());
        let out = invoke(&registry, &HelperContext::new(&vars), &name, &[Value::from(1)]).unwrap();
        prop_assert_eq!(out.value().as_str(), Some(""));
    }
}
