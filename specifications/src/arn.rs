//! Resource-identifier construction: builds fully-qualified ARNs from a
//! fixed region/account pair and a resource name.

/// Builds fully-qualified resource identifiers for a fixed region/account
/// pair. Kept separate from the WIR builder so a future deployment tool
/// could reuse the exact same naming scheme.
#[derive(Clone, Debug)]
pub struct ResourceNamer {
    region: String,
    account_id: String,
}

impl ResourceNamer {
    pub fn new(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self { region: region.into(), account_id: account_id.into() }
    }

    /// Returns `name` unchanged if it already looks like an ARN (`arn:...`),
    /// otherwise replaces underscores with dashes.
    fn normalize(name: &str) -> String {
        if name.starts_with("arn:") { name.to_string() } else { name.replace('_', "-") }
    }

    /// `arn:aws:lambda:<region>:<account>:function:<name>`
    pub fn lambda_arn(&self, name: &str) -> String {
        if name.starts_with("arn:") {
            return name.to_string();
        }
        format!("arn:aws:lambda:{}:{}:function:{}", self.region, self.account_id, Self::normalize(name))
    }

    /// `arn:aws:states:<region>:<account>:activity:<name>`
    pub fn activity_arn(&self, name: &str) -> String {
        if name.starts_with("arn:") {
            return name.to_string();
        }
        format!("arn:aws:states:{}:{}:activity:{}", self.region, self.account_id, Self::normalize(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lambda_underscore_to_dash() {
        let arn = ResourceNamer::new("us-east-1", "1234");
        assert_eq!(arn.lambda_arn("get_data"), "arn:aws:lambda:us-east-1:1234:function:get-data");
    }

    #[test]
    fn activity_passthrough() {
        let arn = ResourceNamer::new("us-east-1", "1234");
        assert_eq!(arn.activity_arn("arn:aws:states:eu-west-1:9:activity:foo"), "arn:aws:states:eu-west-1:9:activity:foo");
    }
}
