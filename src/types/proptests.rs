//! Property-based tests for the lattice laws.

use proptest::prelude::*;

use super::*;

fn primitive_strategy() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::number()),
        Just(Type::string()),
        Just(Type::boolean()),
        Just(Type::null()),
        Just(Type::undefined()),
    ]
}

fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "key", "value"]).prop_map(str::to_string)
}

// Recursive type strategy
fn type_strategy() -> impl Strategy<Value = Type> {
    let leaf = prop_oneof![
        Just(Type::Bottom),
        Just(Type::Unknown),
        primitive_strategy(),
        primitive_strategy(),
    ];

    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (prop::collection::vec(inner.clone(), 0..3), inner.clone())
                .prop_map(|(params, ret)| Type::func(params, ret)),
            prop::collection::btree_map(field_name_strategy(), inner.clone(), 0..3)
                .prop_map(|fields| Type::object(fields)),
            prop::collection::vec(inner, 2..4).prop_map(Type::union_of),
            (0u32..3).prop_map(|id| Type::object_ref(ObjectId(id))),
            (0u32..3).prop_map(|id| Type::closure(ClosureId(id), 1)),
        ]
    })
}

proptest! {
    #[test]
    fn join_is_commutative(a in type_strategy(), b in type_strategy()) {
        prop_assert_eq!(join(&a, &b), join(&b, &a));
    }

    #[test]
    fn join_is_associative(a in type_strategy(), b in type_strategy(), c in type_strategy()) {
        prop_assert_eq!(join(&a, &join(&b, &c)), join(&join(&a, &b), &c));
    }

    #[test]
    fn join_is_idempotent(a in type_strategy(), b in type_strategy()) {
        let ab = join(&a, &b);
        prop_assert_eq!(join(&a, &a), a.clone());
        prop_assert_eq!(join(&a, &ab), ab);
    }

    #[test]
    fn bottom_and_unknown(a in type_strategy()) {
        prop_assert_eq!(join(&Type::Bottom, &a), a.clone());
        prop_assert_eq!(join(&a, &Type::Unknown), Type::Unknown);
    }

    #[test]
    fn join_is_an_upper_bound(a in type_strategy(), b in type_strategy()) {
        let ab = join(&a, &b);
        prop_assert!(is_subtype(&a, &ab));
        prop_assert!(is_subtype(&b, &ab));
    }

    #[test]
    fn unions_stay_flat(a in type_strategy(), b in type_strategy()) {
        if let Type::Union(u) = join(&a, &b) {
            prop_assert!(u.len() >= 2);
            prop_assert!(u.members().all(|m| !m.is_union()));
            prop_assert!(u.members().filter(|m| m.is_object()).count() <= 1);
            prop_assert!(u.members().filter(|m| m.is_func()).count() <= 1);
        }
    }
}
