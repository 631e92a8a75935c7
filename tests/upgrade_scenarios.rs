//! End-to-end upgrade analyses over small template pairs.

mod common;
use common::*;

use rampart::check::{self, FindingKind};
use rampart::graph::Found;
use rampart::node::Origin;
use rampart::security::Security;
use rampart::upgrade;
use serde_json::json;

#[test]
fn identical_states_are_safe() {
    let doc = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": lambda_with_role("R"),
            "R": role(),
        }
    });
    let findings = check::analyze(&initial(doc.clone()), &target(doc)).unwrap();
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
}

#[test]
fn dropping_a_guard_exposes_the_protected_resource() {
    let before = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": lambda("h"),
            "Perm": permission("Fn"),
        }
    });
    let after = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": lambda("h"),
        }
    });
    let findings = check::analyze(&initial(before), &target(after)).unwrap();
    assert_eq!(findings.len(), 1, "findings: {findings:?}");
    assert_eq!(findings[0].node, "Fn");
    match &findings[0].kind {
        FindingKind::Weakened { required, actual } => {
            assert_eq!(*required, Security::module("Perm"));
            assert_eq!(*actual, Security::None);
        }
        other => panic!("expected a weakening finding, got {other:?}"),
    }
    assert!(
        findings[0]
            .to_string()
            .contains("Fn is not sufficiently protected during upgrade")
    );
}

#[test]
fn newly_guarding_a_legal_state_is_safe() {
    // Both end states are legal on their own; the bucket stays reachable
    // through its original direct edge while the policy rolls out, which
    // is exactly what the initial state already allowed.
    let before = json!({
        "Resources": {
            "B": bucket(),
        }
    });
    let after = json!({
        "Resources": {
            "B": bucket(),
            "P": bucket_policy("B"),
        }
    });
    let findings = check::analyze(&initial(before), &target(after)).unwrap();
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
}

/// Without ordering, the rewritten function can go live before the
/// permission that guards it exists.
#[test]
fn guard_arriving_after_its_protectee_is_flagged() {
    let before = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": lambda("one"),
        }
    });
    let after = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": lambda("two"),
            "Perm": permission("Fn"),
        }
    });
    let findings = check::analyze(&initial(before), &target(after)).unwrap();
    assert_eq!(findings.len(), 1, "findings: {findings:?}");
    assert_eq!(findings[0].node, "Fn");
    assert!(matches!(findings[0].kind, FindingKind::Weakened { .. }));
}

/// Same rollout as above, but DependsOn orders the permission first; the
/// split drops the unsafe mixture and nothing is flagged.
#[test]
fn depends_on_ordering_eliminates_the_unsafe_mixture() {
    let before = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": lambda("one"),
        }
    });
    let after = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": {
                "Type": "AWS::Lambda::Function",
                "DependsOn": ["Perm"],
                "Properties": { "Handler": "two" },
            },
            "Perm": permission("Fn"),
        }
    });
    let findings = check::analyze(&initial(before), &target(after)).unwrap();
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
}

#[test]
fn splits_cover_exactly_the_three_allowed_mixtures() {
    let before = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": lambda("one"),
        }
    });
    let after = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": {
                "Type": "AWS::Lambda::Function",
                "DependsOn": ["Perm"],
                "Properties": { "Handler": "two" },
            },
            "Perm": permission("Fn"),
        }
    });
    let transient = upgrade::transient_graph(&initial(before), &target(after)).unwrap();
    let splits = upgrade::split_dependencies(transient);
    assert_eq!(splits.len(), 3);

    let mut mixtures = Vec::new();
    for split in &splits {
        // The split collapsed every choice it was about: one live node
        // per id.
        let f = match split.find_by_id("Fn") {
            Some(Found::One(n)) => n,
            other => panic!("Fn not collapsed: {other:?}"),
        };
        let p = match split.find_by_id("Perm") {
            Some(Found::One(n)) => n,
            other => panic!("Perm not collapsed: {other:?}"),
        };
        mixtures.push((
            split.node(f).origin.unwrap(),
            split.node(p).origin.unwrap(),
        ));
    }
    mixtures.sort();
    let mut expected = vec![
        (Origin::Initial, Origin::Initial),
        (Origin::Initial, Origin::Target),
        (Origin::Target, Origin::Target),
    ];
    expected.sort();
    assert_eq!(mixtures, expected);
}

#[test]
fn moving_a_subnet_between_equally_protected_vpcs_is_safe() {
    let before = json!({
        "Resources": {
            "E": {
                "Type": "AWS::EC2::Instance",
                "Properties": { "SubnetId": { "Ref": "S" } },
            },
            "S": {
                "Type": "AWS::EC2::Subnet",
                "Properties": { "VpcId": { "Ref": "V1" } },
            },
            "V1": { "Type": "AWS::EC2::VPC", "Properties": {} },
            "V2": { "Type": "AWS::EC2::VPC", "Properties": {} },
        }
    });
    let after = json!({
        "Resources": {
            "E": {
                "Type": "AWS::EC2::Instance",
                "Properties": { "SubnetId": { "Ref": "S" } },
            },
            "S": {
                "Type": "AWS::EC2::Subnet",
                "Properties": { "VpcId": { "Ref": "V2" } },
            },
            "V1": { "Type": "AWS::EC2::VPC", "Properties": {} },
            "V2": { "Type": "AWS::EC2::VPC", "Properties": {} },
        }
    });
    let findings = check::analyze(&initial(before), &target(after)).unwrap();
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
}

#[test]
fn removing_a_still_referenced_resource_is_flagged() {
    // The method keeps routing requests at B while B is already gone on
    // the target side of the rollout.
    let before = json!({
        "Resources": {
            "Api": method("B"),
            "B": bucket(),
        }
    });
    let after = json!({
        "Resources": {
            "Api": method("B"),
        }
    });
    let findings = check::analyze(&initial(before), &target(after)).unwrap();
    assert_eq!(findings.len(), 1, "findings: {findings:?}");
    assert_eq!(findings[0].node, "B");
    assert!(matches!(findings[0].kind, FindingKind::Vanished));
    assert_eq!(
        findings[0].to_string(),
        "B is reachable at a time it does not exist"
    );
}

#[test]
fn removing_an_unreferenced_resource_is_safe() {
    let before = json!({
        "Resources": {
            "B": bucket(),
        }
    });
    let after = json!({ "Resources": {} });
    let findings = check::analyze(&initial(before), &target(after)).unwrap();
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
}

#[test]
fn findings_deduplicate_by_resource_across_splits() {
    // An unrelated ordered pair of bucket changes forces a three-way
    // split; the dropped-guard exposure shows up in every split but
    // reports once.
    let before = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": lambda("h"),
            "Perm": permission("Fn"),
            "X": { "Type": "AWS::S3::Bucket", "Properties": { "Tag": "x-old" } },
            "Y": { "Type": "AWS::S3::Bucket", "Properties": { "Tag": "y-old" } },
        }
    });
    let after = json!({
        "Resources": {
            "Api": method("Fn"),
            "Fn": lambda("h"),
            "X": {
                "Type": "AWS::S3::Bucket",
                "DependsOn": "Y",
                "Properties": { "Tag": "x-new" },
            },
            "Y": { "Type": "AWS::S3::Bucket", "Properties": { "Tag": "y-new" } },
        }
    });
    let transient =
        upgrade::transient_graph(&initial(before.clone()), &target(after.clone())).unwrap();
    let splits = upgrade::split_dependencies(transient);
    assert_eq!(splits.len(), 3);

    let findings = check::analyze(&initial(before), &target(after)).unwrap();
    let fn_findings: Vec<_> = findings.iter().filter(|f| f.node == "Fn").collect();
    assert_eq!(fn_findings.len(), 1, "findings: {findings:?}");
}
