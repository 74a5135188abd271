// Template elaboration: rewrite a compiled CloudFormation template so it
// can be launched from outside the deploying account.
//
// Three edits, nothing else:
// 1. Drop the deployment-bucket resource (the shared stack must not
//    depend on the deploying account's private bucket).
// 2. Apply the configured parameter rules (strip or clear defaults).
// 3. Repoint Lambda code locations at the public destination bucket.

use crate::error::ShareError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Resource type whose code location gets repointed
pub const LAMBDA_FUNCTION_TYPE: &str = "AWS::Lambda::Function";

/// Policy for a template parameter in the shared template
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterRule {
    /// Strip the default; the consumer must supply a value
    Required,
    /// Clear the default to an empty string
    Optional,
}

impl std::fmt::Display for ParameterRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterRule::Required => write!(f, "required"),
            ParameterRule::Optional => write!(f, "optional"),
        }
    }
}

impl std::str::FromStr for ParameterRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "required" => Ok(ParameterRule::Required),
            "optional" => Ok(ParameterRule::Optional),
            _ => Err(format!(
                "Unsupported parameter rule: {}. Supported: required, optional",
                s
            )),
        }
    }
}

/// Inputs for a single elaboration pass
#[derive(Debug, Clone)]
pub struct ElaborateOptions {
    /// Parameter-name -> rule mapping, applied in name order
    pub rules: BTreeMap<String, ParameterRule>,
    /// Logical id of the deployment bucket resource to remove
    pub deployment_bucket_resource: String,
    /// Public bucket the code archive is republished to
    pub destination_bucket: String,
    /// Object key of the republished code archive
    pub destination_code_key: String,
}

/// Result of elaborating a template
///
/// Carries the rewritten document plus a summary of what changed, so
/// callers can log or assert on the outcome without diffing documents.
#[derive(Debug)]
pub struct Elaborated {
    /// The rewritten template; the input document is never mutated
    pub template: Value,
    /// Whether the deployment-bucket resource was present and removed
    pub removed_deployment_bucket: bool,
    /// Configured parameters that were absent from the template
    pub missing_parameters: Vec<String>,
    /// Number of function resources whose code location was repointed
    pub functions_rewritten: usize,
}

/// Elaborate a compiled template for public sharing
///
/// Works on a copy of `document`. The only fatal condition is a missing
/// `Resources` section; a rule referencing an absent parameter is a
/// tolerated misconfiguration (warned and recorded, never an error).
pub fn elaborate(document: &Value, opts: &ElaborateOptions) -> Result<Elaborated, ShareError> {
    let mut template = document.clone();

    let removed_deployment_bucket = {
        let resources = template
            .get_mut("Resources")
            .and_then(Value::as_object_mut)
            .ok_or(ShareError::MissingResources)?;
        resources.remove(&opts.deployment_bucket_resource).is_some()
    };

    let mut missing_parameters = Vec::new();
    for (name, rule) in &opts.rules {
        let parameter = template
            .get_mut("Parameters")
            .and_then(Value::as_object_mut)
            .and_then(|parameters| parameters.get_mut(name))
            .and_then(Value::as_object_mut);

        match parameter {
            None => {
                warn!(
                    "Parameter '{}' not found in template; skipping {} rule",
                    name, rule
                );
                missing_parameters.push(name.clone());
            }
            Some(parameter) => match rule {
                ParameterRule::Required => {
                    parameter.remove("Default");
                }
                ParameterRule::Optional => {
                    parameter.insert("Default".to_string(), Value::String(String::new()));
                }
            },
        }
    }

    let mut functions_rewritten = 0;
    if let Some(resources) = template.get_mut("Resources").and_then(Value::as_object_mut) {
        for resource in resources.values_mut() {
            if resource.get("Type").and_then(Value::as_str) != Some(LAMBDA_FUNCTION_TYPE) {
                continue;
            }
            let code = resource
                .get_mut("Properties")
                .and_then(|properties| properties.get_mut("Code"))
                .and_then(Value::as_object_mut);
            if let Some(code) = code {
                if !refers_to_bucket(code, &opts.deployment_bucket_resource) {
                    continue;
                }
                code.insert(
                    "S3Bucket".to_string(),
                    Value::String(opts.destination_bucket.clone()),
                );
                code.insert(
                    "S3Key".to_string(),
                    Value::String(opts.destination_code_key.clone()),
                );
                functions_rewritten += 1;
            }
        }
    }

    Ok(Elaborated {
        template,
        removed_deployment_bucket,
        missing_parameters,
        functions_rewritten,
    })
}

/// True if the code block's S3Bucket is a Ref to the given logical id
fn refers_to_bucket(code: &Map<String, Value>, logical_id: &str) -> bool {
    code.get("S3Bucket")
        .and_then(|bucket| bucket.get("Ref"))
        .and_then(Value::as_str)
        == Some(logical_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(rules: &[(&str, ParameterRule)]) -> ElaborateOptions {
        ElaborateOptions {
            rules: rules
                .iter()
                .map(|(name, rule)| (name.to_string(), *rule))
                .collect(),
            deployment_bucket_resource: "ServerlessDeploymentBucket".to_string(),
            destination_bucket: "pub".to_string(),
            destination_code_key: "v1/code.zip".to_string(),
        }
    }

    fn sample_template() -> Value {
        json!({
            "Resources": {
                "ServerlessDeploymentBucket": {
                    "Type": "AWS::S3::Bucket"
                },
                "HelloLambdaFunction": {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "Handler": "handler.hello",
                        "Code": {
                            "S3Bucket": { "Ref": "ServerlessDeploymentBucket" },
                            "S3Key": "serverless/app/dev/1700000000000/app.zip"
                        }
                    }
                },
                "AssetsBucket": {
                    "Type": "AWS::S3::Bucket",
                    "Properties": { "BucketName": "app-assets" }
                }
            },
            "Parameters": {
                "ApiKey": { "Type": "String", "Default": "x" },
                "Greeting": { "Type": "String", "Default": "hello" }
            }
        })
    }

    #[test]
    fn removes_only_the_deployment_bucket_resource() {
        let out = elaborate(&sample_template(), &options(&[])).unwrap();

        let resources = out.template["Resources"].as_object().unwrap();
        assert!(!resources.contains_key("ServerlessDeploymentBucket"));
        assert!(resources.contains_key("HelloLambdaFunction"));
        assert!(resources.contains_key("AssetsBucket"));
        assert!(out.removed_deployment_bucket);
    }

    #[test]
    fn required_rule_strips_the_default() {
        let out = elaborate(
            &sample_template(),
            &options(&[("ApiKey", ParameterRule::Required)]),
        )
        .unwrap();

        let api_key = out.template["Parameters"]["ApiKey"].as_object().unwrap();
        assert!(!api_key.contains_key("Default"));
        assert_eq!(api_key["Type"], "String");
        // Untouched sibling keeps its default
        assert_eq!(out.template["Parameters"]["Greeting"]["Default"], "hello");
    }

    #[test]
    fn optional_rule_clears_the_default() {
        let out = elaborate(
            &sample_template(),
            &options(&[("Greeting", ParameterRule::Optional)]),
        )
        .unwrap();

        assert_eq!(out.template["Parameters"]["Greeting"]["Default"], "");
    }

    #[test]
    fn missing_parameter_is_recorded_and_skipped() {
        let doc = sample_template();
        let out = elaborate(&doc, &options(&[("NoSuchParameter", ParameterRule::Required)])).unwrap();

        assert_eq!(out.missing_parameters, vec!["NoSuchParameter".to_string()]);
        // Document unchanged apart from the bucket-resource removal
        assert_eq!(out.template["Parameters"], doc["Parameters"]);
    }

    #[test]
    fn repoints_matching_function_code() {
        let out = elaborate(&sample_template(), &options(&[])).unwrap();

        let code = &out.template["Resources"]["HelloLambdaFunction"]["Properties"]["Code"];
        assert_eq!(code["S3Bucket"], "pub");
        assert_eq!(code["S3Key"], "v1/code.zip");
        assert_eq!(out.functions_rewritten, 1);
    }

    #[test]
    fn leaves_non_matching_functions_untouched() {
        let mut doc = sample_template();
        doc["Resources"]["ExternalLambdaFunction"] = json!({
            "Type": "AWS::Lambda::Function",
            "Properties": {
                "Code": { "S3Bucket": "some-other-bucket", "S3Key": "external.zip" }
            }
        });

        let out = elaborate(&doc, &options(&[])).unwrap();

        assert_eq!(
            out.template["Resources"]["ExternalLambdaFunction"],
            doc["Resources"]["ExternalLambdaFunction"]
        );
        assert_eq!(out.functions_rewritten, 1);
    }

    #[test]
    fn input_document_is_not_mutated() {
        let doc = sample_template();
        let before = doc.clone();
        let _ = elaborate(&doc, &options(&[("ApiKey", ParameterRule::Required)])).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn second_elaboration_is_a_no_op() {
        let opts = options(&[("ApiKey", ParameterRule::Required)]);
        let first = elaborate(&sample_template(), &opts).unwrap();
        let second = elaborate(&first.template, &opts).unwrap();

        assert!(!second.removed_deployment_bucket);
        assert_eq!(second.functions_rewritten, 0);
        assert_eq!(second.template, first.template);
    }

    #[test]
    fn missing_resources_section_is_fatal() {
        let err = elaborate(&json!({ "Parameters": {} }), &options(&[])).unwrap_err();
        assert!(matches!(err, ShareError::MissingResources));
    }

    #[test]
    fn full_share_scenario() {
        let out = elaborate(
            &sample_template(),
            &options(&[("ApiKey", ParameterRule::Required)]),
        )
        .unwrap();

        let resources = out.template["Resources"].as_object().unwrap();
        assert!(!resources.contains_key("ServerlessDeploymentBucket"));

        let code = &out.template["Resources"]["HelloLambdaFunction"]["Properties"]["Code"];
        assert_eq!(code["S3Bucket"], "pub");
        assert_eq!(code["S3Key"], "v1/code.zip");

        let api_key = out.template["Parameters"]["ApiKey"].as_object().unwrap();
        assert!(!api_key.contains_key("Default"));
        assert!(out.missing_parameters.is_empty());
    }
}
