#![allow(dead_code)]

//! Shared template fixtures for the integration tests.

use rampart::node::Origin;
use rampart::template::Template;
use serde_json::{Value, json};

pub fn initial(doc: Value) -> Template {
    Template::from_value(doc, Origin::Initial)
}

pub fn target(doc: Value) -> Template {
    Template::from_value(doc, Origin::Target)
}

/// An API Gateway method whose integration invokes `backend`.
pub fn method(backend: &str) -> Value {
    json!({
        "Type": "AWS::ApiGateway::Method",
        "Properties": { "Integration": { "Ref": backend } },
    })
}

/// A Lambda function with no role.
pub fn lambda(handler: &str) -> Value {
    json!({
        "Type": "AWS::Lambda::Function",
        "Properties": { "Handler": handler },
    })
}

/// A Lambda function assuming `role`.
pub fn lambda_with_role(role: &str) -> Value {
    json!({
        "Type": "AWS::Lambda::Function",
        "Properties": { "Role": { "Ref": role } },
    })
}

/// A Lambda permission for the function named `function`.
pub fn permission(function: &str) -> Value {
    json!({
        "Type": "AWS::Lambda::Permission",
        "Properties": { "FunctionName": { "Ref": function } },
    })
}

pub fn role() -> Value {
    json!({ "Type": "AWS::IAM::Role", "Properties": {} })
}

pub fn bucket() -> Value {
    json!({ "Type": "AWS::S3::Bucket", "Properties": {} })
}

pub fn bucket_policy(bucket: &str) -> Value {
    json!({
        "Type": "AWS::S3::BucketPolicy",
        "Properties": { "Bucket": { "Ref": bucket } },
    })
}
