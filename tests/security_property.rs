//! Property tests for the security credential lattice.

use proptest::prelude::*;
use rampart::security::Security;

fn module_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,4}").unwrap()
}

fn atom() -> impl Strategy<Value = Security> {
    prop_oneof![
        Just(Security::None),
        Just(Security::Inaccessible),
        module_name().prop_map(Security::Module),
    ]
}

/// Arbitrary credential trees, including shapes the smart constructors
/// would have collapsed.
fn credential() -> impl Strategy<Value = Security> {
    atom().prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Security::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| Security::Or(Box::new(a), Box::new(b))),
        ]
    })
}

proptest! {
    #[test]
    fn order_is_reflexive(a in credential()) {
        prop_assert!(a.weaker_than(&a));
    }

    #[test]
    fn none_is_the_bottom(a in credential()) {
        prop_assert!(Security::None.weaker_than(&a));
    }

    #[test]
    fn inaccessible_is_the_top(a in credential()) {
        prop_assert!(a.weaker_than(&Security::Inaccessible));
    }

    #[test]
    fn join_is_a_lower_bound(a in credential(), b in credential()) {
        let j = Security::join(a.clone(), b.clone());
        prop_assert!(j.weaker_than(&a), "join({a}, {b}) = {j} not weaker than {a}");
        prop_assert!(j.weaker_than(&b), "join({a}, {b}) = {j} not weaker than {b}");
    }

    // Scoped to atoms: the syntactic order under-approximates once `Or`
    // shapes sit on the left of a fresh conjunction, so the bound law is
    // only guaranteed for the atomic fragment.
    #[test]
    fn meet_is_an_upper_bound(a in atom(), b in atom()) {
        let m = Security::meet(a.clone(), b.clone());
        prop_assert!(a.weaker_than(&m), "{a} not weaker than meet({a}, {b}) = {m}");
        prop_assert!(b.weaker_than(&m), "{b} not weaker than meet({a}, {b}) = {m}");
    }

    #[test]
    fn comparable_operands_collapse(a in credential(), b in credential()) {
        if a.weaker_than(&b) {
            prop_assert_eq!(Security::join(a.clone(), b.clone()), a.clone());
            prop_assert_eq!(Security::meet(a, b.clone()), b);
        }
    }

    #[test]
    fn join_of_atoms_is_the_greatest_lower_bound(
        a in atom(),
        b in atom(),
        c in atom(),
    ) {
        if c.weaker_than(&a) && c.weaker_than(&b) {
            let j = Security::join(a.clone(), b.clone());
            prop_assert!(c.weaker_than(&j), "{c} <= {a} and {c} <= {b} but not <= {j}");
        }
    }

    #[test]
    fn meet_of_atoms_is_the_least_upper_bound(
        a in atom(),
        b in atom(),
        c in atom(),
    ) {
        if a.weaker_than(&c) && b.weaker_than(&c) {
            let m = Security::meet(a.clone(), b.clone());
            prop_assert!(m.weaker_than(&c), "{a} <= {c} and {b} <= {c} but {m} is not");
        }
    }

    #[test]
    fn join_and_meet_never_panic_and_are_deterministic(
        a in credential(),
        b in credential(),
    ) {
        let j1 = Security::join(a.clone(), b.clone());
        let j2 = Security::join(a.clone(), b.clone());
        prop_assert_eq!(j1, j2);
        let m1 = Security::meet(a.clone(), b.clone());
        let m2 = Security::meet(a, b);
        prop_assert_eq!(m1, m2);
    }
}
