// Share-link construction
//
// The console link carries its own query string inside the URL fragment;
// the console parses stackName and templateURL out of it. Values are
// percent-encoded and `&`-separated via the url crate rather than glued
// together by hand.

use url::form_urlencoded;

const CONSOLE_HOME: &str = "https://console.aws.amazon.com/cloudformation/home";

/// Public URL of the republished template object
pub fn template_object_url(region: &str, bucket: &str, key: &str) -> String {
    format!("https://s3.{}.amazonaws.com/{}/{}", region, bucket, key)
}

/// CloudFormation console quick-create link for the shared stack
pub fn console_url(stack_name: &str, template_url: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("stackName", stack_name)
        .append_pair("templateURL", template_url)
        .finish();
    format!("{}#/stacks/new?{}", CONSOLE_HOME, query)
}
