//! Capability catalog: what each resource type contributes to the graph.
//!
//! A [`Capability`] is a template-independent descriptor shared by every
//! instance of a resource type. It carries three role flags and ten
//! reference-extraction rule families. Each rule is a key path into the
//! resource's `Properties`; the references harvested at the end of the path
//! become edge, protection, or containment endpoints.
//!
//! The table itself is curated data. Types on the ignore list are
//! recognized but contribute nothing; anything else is reported and
//! dropped by the loader.

/// A key path into a resource configuration, followed one key at a time.
pub type KeyPath = &'static [&'static str];

/// A pair of key paths whose reference sets are related pairwise.
pub type KeyPathPair = (KeyPath, KeyPath);

/// Per-resource-type capability descriptor.
#[derive(Debug)]
pub struct Capability {
    /// This type is a security filter.
    pub security: bool,
    /// This type answers external traffic (it owns a URL or equivalent).
    pub accessible: bool,
    /// This type groups other resources and dissolves before analysis.
    pub container: bool,
    /// Requests flow from this resource to the referenced ones.
    pub flow_to: &'static [KeyPath],
    /// Requests flow from the referenced resources to this one.
    pub flow_from: &'static [KeyPath],
    /// Requests flow from the first reference set to the second.
    pub flow_pairs: &'static [KeyPathPair],
    /// This resource guards entrance to the referenced ones.
    pub protects: &'static [KeyPath],
    /// The referenced resources guard entrance to this one.
    pub protected_by: &'static [KeyPath],
    /// The first reference set guards entrance to the second.
    pub protect_pairs: &'static [KeyPathPair],
    /// The referenced resources guard traffic leaving this one.
    pub egress_protected_by: &'static [KeyPath],
    /// This resource guards traffic leaving the referenced ones.
    pub protects_egress_of: &'static [KeyPath],
    /// The referenced resources live inside this one.
    pub contains: &'static [KeyPath],
    /// This resource lives inside the referenced ones.
    pub contained_in: &'static [KeyPath],
}

impl Capability {
    /// Whether instances of this type are wired to the web root.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible && !self.security
    }
}

const DEFAULT: Capability = Capability {
    security: false,
    accessible: true,
    container: false,
    flow_to: &[],
    flow_from: &[],
    flow_pairs: &[],
    protects: &[],
    protected_by: &[],
    protect_pairs: &[],
    egress_protected_by: &[],
    protects_egress_of: &[],
    contains: &[],
    contained_in: &[],
};

/// Known resource types and their capabilities.
static KNOWN_TYPES: &[(&str, Capability)] = &[
    (
        "AWS::ApiGateway::Authorizer",
        Capability {
            security: true,
            protects: &[&["RestApiId"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::ApiGateway::Method",
        Capability {
            protected_by: &[&["AuthorizerId"]],
            flow_to: &[&["Integration"]],
            contained_in: &[&["RestApiId"]],
            ..DEFAULT
        },
    ),
    ("AWS::ApiGateway::RestApi", Capability { container: true, ..DEFAULT }),
    // Tables hold data, not endpoints; requests target items through other
    // resources, so they act as containers here.
    ("AWS::DynamoDB::GlobalTable", Capability { container: true, ..DEFAULT }),
    ("AWS::DynamoDB::Table", Capability { container: true, ..DEFAULT }),
    ("AWS::EC2::Host", Capability { container: true, ..DEFAULT }),
    (
        "AWS::EC2::Instance",
        Capability {
            contained_in: &[&["HostId"], &["HostResourceGroupArn"], &["SubnetId"]],
            protected_by: &[
                &["IamInstanceProfile"],
                &["SecurityGroupIds"],
                &["SecurityGroups"],
            ],
            flow_to: &[&["Volumes"]],
            ..DEFAULT
        },
    ),
    ("AWS::EC2::InternetGateway", DEFAULT),
    (
        "AWS::EC2::NetworkAcl",
        Capability {
            security: true,
            protects: &[&["VpcId"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::EC2::NetworkAclEntry",
        Capability {
            security: true,
            protects: &[&["NetworkAclId"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::EC2::SecurityGroup",
        Capability {
            security: true,
            protects: &[&["SecurityGroupEgress"]],
            protects_egress_of: &[&["SecurityGroupIngress"]],
            ..DEFAULT
        },
    ),
    ("AWS::EC2::SecurityGroupEgress", Capability { security: true, ..DEFAULT }),
    ("AWS::EC2::SecurityGroupIngress", Capability { security: true, ..DEFAULT }),
    (
        "AWS::EC2::Subnet",
        Capability {
            container: true,
            accessible: false,
            contained_in: &[&["VpcId"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::EC2::SubnetNetworkAclAssociation",
        Capability {
            accessible: false,
            protect_pairs: &[(&["NetworkAclId"], &["SubnetId"])],
            ..DEFAULT
        },
    ),
    ("AWS::EC2::Volume", Capability { accessible: false, ..DEFAULT }),
    (
        "AWS::EC2::VPC",
        Capability {
            accessible: false,
            container: true,
            ..DEFAULT
        },
    ),
    (
        "AWS::EC2::VPCGatewayAttachment",
        Capability {
            accessible: false,
            flow_pairs: &[
                (&["InternetGatewayId"], &["VpcId"]),
                (&["VpnGatewayId"], &["VpcId"]),
            ],
            ..DEFAULT
        },
    ),
    ("AWS::ECS::MountGroup", DEFAULT),
    ("AWS::ECS::Cluster", DEFAULT),
    ("AWS::EFS::MountGroup", DEFAULT),
    ("AWS::EFS::MountTarget", DEFAULT),
    ("AWS::EFS::FileSystem", DEFAULT),
    ("AWS::Glue::Classifier", DEFAULT),
    ("AWS::Glue::Connection", DEFAULT),
    ("AWS::Glue::Database", Capability { container: true, ..DEFAULT }),
    (
        "AWS::Glue::DataCatalogEncryptionSettings",
        Capability { security: true, ..DEFAULT },
    ),
    (
        "AWS::IAM::InstanceProfile",
        Capability {
            container: true,
            security: true,
            contains: &[&["Roles"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::IAM::Policy",
        Capability {
            security: true,
            protected_by: &[&["Roles"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::IAM::Role",
        Capability {
            security: true,
            protected_by: &[
                &["ManagedPolicyArns"],
                &["PermissionsBoundary"],
                &["Policies"],
            ],
            accessible: false,
            ..DEFAULT
        },
    ),
    (
        "AWS::Lambda::Function",
        Capability {
            protected_by: &[&["Role"]],
            accessible: false,
            ..DEFAULT
        },
    ),
    (
        "AWS::Lambda::Permission",
        Capability {
            security: true,
            protects: &[&["FunctionName"]],
            protects_egress_of: &[&["SourceArn"]],
            accessible: false,
            ..DEFAULT
        },
    ),
    (
        "AWS::RDS::DBInstance",
        Capability {
            protected_by: &[&["AccessControl"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::RDS::DBCluster",
        Capability {
            protected_by: &[&["AccessControl"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::RDS::DBSubnetGroup",
        Capability {
            protected_by: &[&["AccessControl"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::S3::Bucket",
        Capability {
            protected_by: &[&["AccessControl"]],
            ..DEFAULT
        },
    ),
    (
        "AWS::S3::BucketPolicy",
        Capability {
            security: true,
            protects: &[&["Bucket"]],
            ..DEFAULT
        },
    ),
];

/// Types that are recognized but contribute nothing to the graph.
static IGNORED_TYPES: &[&str] = &[
    "Custom::MaxThroughputCalculator",
    "AWS::ApiGateway::Account",
    "AWS::ApiGateway::Deployment",
    "AWS::ApiGateway::Resource",
    "AWS::ApiGateway::Stage",
    "AWS::AutoScaling::AutoScalingGroup",
    "AWS::AutoScaling::LaunchConfiguration",
    "AWS::AutoScaling::ScalingPolicy",
    "AWS::AutoScaling::LifecycleHook",
    "AWS::ApplicationAutoScaling::LifecycleHook",
    "AWS::Backup::BackupSelection",
    "AWS::Backup::BackupPlan",
    "AWS::Backup::BackupVault",
    "AWS::CloudWatch::Alarm",
    "AWS::CloudFront::Distribution",
    "AWS::DirectoryService::SimpleAD",
    "AWS::EC2::EIP",
    "AWS::EC2::EIPAssociation",
    "AWS::EC2::NatGateway",
    "AWS::EC2::NetworkInterface",
    "AWS::EC2::PlacementGroup",
    "AWS::EC2::Route",
    "AWS::EC2::RouteTable",
    "AWS::EC2::SubnetRouteTableAssociation",
    "AWS::ElasticLoadBalancingV2::Listener",
    "AWS::ElasticLoadBalancingV2::TargetGroup",
    "AWS::ElasticLoadBalancingV2::LoadBalancer",
    "AWS::Events::Rule",
    "AWS::Logs::LogGroup",
    "AWS::Route53::RecordSet",
    "AWS::SSM::Association",
    "AWS::SSM::Document",
    "AWS::SSM::MaintenanceWindow",
    "AWS::SSM::MaintenanceWindowTarget",
    "AWS::SSM::MaintenanceWindowTask",
    "AWS::SQS::Queue",
    "AWS::SNS::Subscription",
    "AWS::SNS::Topic",
];

/// Look a resource type name up in the catalog.
#[must_use]
pub fn lookup(type_name: &str) -> Option<&'static Capability> {
    KNOWN_TYPES
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, cap)| cap)
}

/// Whether a type is on the ignore list.
#[must_use]
pub fn is_ignored(type_name: &str) -> bool {
    IGNORED_TYPES.contains(&type_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_resolve() {
        let lambda = lookup("AWS::Lambda::Function").unwrap();
        assert!(!lambda.security);
        assert!(!lambda.is_accessible());
        assert_eq!(lambda.protected_by, &[&["Role"] as KeyPath]);

        let policy = lookup("AWS::S3::BucketPolicy").unwrap();
        assert!(policy.security);
        assert!(!policy.is_accessible());
    }

    #[test]
    fn accessibility_excludes_guards() {
        let bucket = lookup("AWS::S3::Bucket").unwrap();
        assert!(bucket.is_accessible());
        let role = lookup("AWS::IAM::Role").unwrap();
        assert!(!role.is_accessible());
    }

    #[test]
    fn ignored_and_unknown_are_distinct() {
        assert!(is_ignored("AWS::SQS::Queue"));
        assert!(!is_ignored("AWS::Lambda::Function"));
        assert!(lookup("AWS::SQS::Queue").is_none());
        assert!(lookup("AWS::Totally::Unknown").is_none());
    }
}
