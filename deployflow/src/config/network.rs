//! Network (VPC) topology descriptions.

use crate::errors::{codes, ConfigurationError, PipelineValidationError};
use crate::pipeline::error_info;
use crate::utils::is_valid_name;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

/// CIDR masks the provider accepts for subnets.
pub const SUBNET_CIDR_MASKS: RangeInclusive<u8> = 16..=28;

/// Subnet reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetType {
    /// Routed through an internet gateway.
    Public,
    /// Private with outbound access through a NAT.
    PrivateWithEgress,
    /// No route outside the VPC.
    PrivateIsolated,
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::PrivateWithEgress => write!(f, "private_with_egress"),
            Self::PrivateIsolated => write!(f, "private_isolated"),
        }
    }
}

/// A subnet group, replicated in every availability zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetConfig {
    /// Group name.
    pub name: String,
    /// Reachability.
    pub subnet_type: SubnetType,
    /// Prefix length of each subnet.
    pub cidr_mask: u8,
}

impl SubnetConfig {
    /// Creates a subnet group.
    #[must_use]
    pub fn new(name: impl Into<String>, subnet_type: SubnetType, cidr_mask: u8) -> Self {
        Self {
            name: name.into(),
            subnet_type,
            cidr_mask,
        }
    }
}

/// An unvalidated network description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Stack holding the network.
    pub stack_name: String,
    /// Logical id of the VPC.
    pub vpc_id: String,
    /// Number of availability zones to spread over.
    pub max_azs: u8,
    /// Subnet groups.
    #[serde(default)]
    pub subnets: Vec<SubnetConfig>,
}

impl NetworkConfig {
    /// Creates a description with no subnets.
    #[must_use]
    pub fn new(stack_name: impl Into<String>, vpc_id: impl Into<String>, max_azs: u8) -> Self {
        Self {
            stack_name: stack_name.into(),
            vpc_id: vpc_id.into(),
            max_azs,
            subnets: Vec::new(),
        }
    }

    /// Adds a subnet group.
    #[must_use]
    pub fn with_subnet(mut self, subnet: SubnetConfig) -> Self {
        self.subnets.push(subnet);
        self
    }

    /// Validates the description.
    ///
    /// # Errors
    ///
    /// Returns every problem found: invalid names, no availability zones,
    /// no subnets, repeated subnet names or masks outside [`SUBNET_CIDR_MASKS`].
    pub fn validate(self) -> Result<NetworkStack, ConfigurationError> {
        let mut errors = Vec::new();

        if !is_valid_name(&self.stack_name) {
            errors.push(invalid(format!("Invalid stack name '{}'", self.stack_name)));
        }
        if !is_valid_name(&self.vpc_id) {
            errors.push(invalid(format!("Invalid VPC id '{}'", self.vpc_id)));
        }
        if self.max_azs == 0 {
            errors.push(invalid(format!(
                "Network '{}' must span at least one availability zone",
                self.vpc_id
            )));
        }
        if self.subnets.is_empty() {
            errors.push(invalid(format!("Network '{}' declares no subnets", self.vpc_id)));
        }

        let mut seen = HashSet::new();
        for subnet in &self.subnets {
            if !is_valid_name(&subnet.name) {
                errors.push(invalid(format!("Invalid subnet group name '{}'", subnet.name)));
            }
            if !seen.insert(subnet.name.as_str()) {
                errors.push(invalid(format!(
                    "Subnet group '{}' is declared more than once",
                    subnet.name
                )));
            }
            if !SUBNET_CIDR_MASKS.contains(&subnet.cidr_mask) {
                errors.push(invalid(format!(
                    "Subnet group '{}' uses mask /{}; allowed masks are /{} to /{}",
                    subnet.name,
                    subnet.cidr_mask,
                    SUBNET_CIDR_MASKS.start(),
                    SUBNET_CIDR_MASKS.end()
                )));
            }
        }

        if !errors.is_empty() {
            return Err(ConfigurationError::new(self.stack_name, errors));
        }

        tracing::debug!(
            stack = %self.stack_name,
            max_azs = self.max_azs,
            subnet_groups = self.subnets.len(),
            "Validated network description"
        );
        Ok(NetworkStack { config: self })
    }
}

fn invalid(message: String) -> PipelineValidationError {
    let summary = message.clone();
    PipelineValidationError::new(message)
        .with_error_info(error_info(codes::INVALID_NETWORK, summary))
}

/// A validated network description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NetworkStack {
    config: NetworkConfig,
}

impl NetworkStack {
    /// Returns the stack name.
    #[must_use]
    pub fn stack_name(&self) -> &str {
        &self.config.stack_name
    }

    /// Returns the VPC id.
    #[must_use]
    pub fn vpc_id(&self) -> &str {
        &self.config.vpc_id
    }

    /// Returns the number of availability zones.
    #[must_use]
    pub fn max_azs(&self) -> u8 {
        self.config.max_azs
    }

    /// Returns the subnet groups.
    #[must_use]
    pub fn subnets(&self) -> &[SubnetConfig] {
        &self.config.subnets
    }

    /// Number of subnets created: one per group per availability zone.
    #[must_use]
    pub fn subnet_count(&self) -> usize {
        self.config.subnets.len() * usize::from(self.config.max_azs)
    }

    /// Whether any subnet is publicly routed.
    #[must_use]
    pub fn has_public_subnets(&self) -> bool {
        self.config
            .subnets
            .iter()
            .any(|s| s.subnet_type == SubnetType::Public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_public() -> NetworkConfig {
        NetworkConfig::new("NetworkStack", "MyPipelineVpc", 1)
            .with_subnet(SubnetConfig::new("PublicSubnet", SubnetType::Public, 24))
    }

    #[test]
    fn test_valid_network() {
        let stack = single_public().validate().unwrap();

        assert_eq!(stack.stack_name(), "NetworkStack");
        assert_eq!(stack.vpc_id(), "MyPipelineVpc");
        assert_eq!(stack.subnet_count(), 1);
        assert!(stack.has_public_subnets());
    }

    #[test]
    fn test_zero_azs_and_no_subnets() {
        let err = NetworkConfig::new("NetworkStack", "Vpc", 0).validate().unwrap_err();

        assert_eq!(err.errors.len(), 2);
        assert!(err.codes().iter().all(|c| *c == codes::INVALID_NETWORK));
    }

    #[test]
    fn test_mask_out_of_range() {
        let err = single_public()
            .with_subnet(SubnetConfig::new("Wide", SubnetType::PrivateIsolated, 8))
            .validate()
            .unwrap_err();

        assert_eq!(err.errors.len(), 1);
        assert!(err.errors[0].message.contains("/8"));
    }

    #[test]
    fn test_duplicate_subnet_names() {
        let err = single_public()
            .with_subnet(SubnetConfig::new("PublicSubnet", SubnetType::Public, 26))
            .validate()
            .unwrap_err();

        assert!(err.errors[0].message.contains("more than once"));
    }

    #[test]
    fn test_names_use_provider_charset() {
        let err = NetworkConfig::new("NetworkStack", "My Vpc", 1)
            .with_subnet(SubnetConfig::new("public/a", SubnetType::Public, 24))
            .validate()
            .unwrap_err();

        let messages: Vec<_> = err.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Invalid VPC id 'My Vpc'", "Invalid subnet group name 'public/a'"]
        );
    }

    #[test]
    fn test_serializes_transparently() {
        let stack = single_public().validate().unwrap();
        let value = serde_json::to_value(&stack).unwrap();

        assert_eq!(value["max_azs"], serde_json::json!(1));
        assert_eq!(value["subnets"][0]["subnet_type"], serde_json::json!("public"));
    }

    #[test]
    fn test_subnet_type_display() {
        assert_eq!(SubnetType::PrivateWithEgress.to_string(), "private_with_egress");
    }
}
