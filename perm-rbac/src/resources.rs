//! # Resource Types
//!
//! Defines the fixed set of resource types that carry a permission bitmask.
//! Every resource belongs to an account; the tier bits of a permission decide
//! whether the caller may touch resources it owns, resources owned by other
//! agents of the account, or account-wide resources.

use serde::{Deserialize, Serialize};

/// Resource types that can have permissions assigned.
///
/// The declaration order is the storage order of a [`Method`](crate::Method):
/// `ResourceType::ALL[i].index() == i`. New variants must be appended to
/// both the enum and [`ResourceType::ALL`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    // Account and agents
    /// The account itself.
    Account,
    /// Agents (members) of an account.
    Agent,
    /// Agent passwords.
    AgentPassword,
    /// Permission grants.
    Permission,
    /// Agent groups.
    AgentGroup,
    /// Customer segmentations.
    Segmentation,
    /// API clients.
    Client,
    /// Routing rules.
    Rule,

    // Messaging
    /// Conversations.
    Conversation,
    /// Third-party integrations.
    Integration,
    /// Canned responses.
    CannedResponse,
    /// Tags.
    Tag,
    /// Whitelisted IP addresses.
    WhitelistIp,
    /// Whitelisted users.
    WhitelistUser,
    /// Whitelisted domains.
    WhitelistDomain,
    /// Website widget.
    Widget,

    // Billing
    /// Plan subscription.
    Subscription,
    /// Invoices.
    Invoice,
    /// Payment methods.
    PaymentMethod,
    /// Bills.
    Bill,
    /// Payment logs.
    PaymentLog,
    /// Comments on payments.
    PaymentComment,

    // Customers and automation
    /// End users (customers) of the account.
    User,
    /// Automations.
    Automation,
    /// Presence pings.
    Ping,
    /// Custom attributes.
    Attribute,
    /// Notifications addressed to agents.
    AgentNotification,
    /// Conversation exports.
    ConversationExport,
    /// Conversation reports.
    ConversationReport,
    /// Content items.
    Content,
    /// Sales pipelines.
    Pipeline,
    /// Currencies.
    Currency,
    /// Service level agreements.
    ServiceLevelAgreement,
    /// Message templates.
    MessageTemplate,
}

impl ResourceType {
    /// Number of resource types.
    pub const COUNT: usize = 34;

    /// Every resource type, in storage order.
    pub const ALL: [ResourceType; Self::COUNT] = [
        ResourceType::Account,
        ResourceType::Agent,
        ResourceType::AgentPassword,
        ResourceType::Permission,
        ResourceType::AgentGroup,
        ResourceType::Segmentation,
        ResourceType::Client,
        ResourceType::Rule,
        ResourceType::Conversation,
        ResourceType::Integration,
        ResourceType::CannedResponse,
        ResourceType::Tag,
        ResourceType::WhitelistIp,
        ResourceType::WhitelistUser,
        ResourceType::WhitelistDomain,
        ResourceType::Widget,
        ResourceType::Subscription,
        ResourceType::Invoice,
        ResourceType::PaymentMethod,
        ResourceType::Bill,
        ResourceType::PaymentLog,
        ResourceType::PaymentComment,
        ResourceType::User,
        ResourceType::Automation,
        ResourceType::Ping,
        ResourceType::Attribute,
        ResourceType::AgentNotification,
        ResourceType::ConversationExport,
        ResourceType::ConversationReport,
        ResourceType::Content,
        ResourceType::Pipeline,
        ResourceType::Currency,
        ResourceType::ServiceLevelAgreement,
        ResourceType::MessageTemplate,
    ];

    /// Position of this resource type inside a [`Method`](crate::Method).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Get the string representation of the resource type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Account => "account",
            ResourceType::Agent => "agent",
            ResourceType::AgentPassword => "agent_password",
            ResourceType::Permission => "permission",
            ResourceType::AgentGroup => "agent_group",
            ResourceType::Segmentation => "segmentation",
            ResourceType::Client => "client",
            ResourceType::Rule => "rule",
            ResourceType::Conversation => "conversation",
            ResourceType::Integration => "integration",
            ResourceType::CannedResponse => "canned_response",
            ResourceType::Tag => "tag",
            ResourceType::WhitelistIp => "whitelist_ip",
            ResourceType::WhitelistUser => "whitelist_user",
            ResourceType::WhitelistDomain => "whitelist_domain",
            ResourceType::Widget => "widget",
            ResourceType::Subscription => "subscription",
            ResourceType::Invoice => "invoice",
            ResourceType::PaymentMethod => "payment_method",
            ResourceType::Bill => "bill",
            ResourceType::PaymentLog => "payment_log",
            ResourceType::PaymentComment => "payment_comment",
            ResourceType::User => "user",
            ResourceType::Automation => "automation",
            ResourceType::Ping => "ping",
            ResourceType::Attribute => "attribute",
            ResourceType::AgentNotification => "agent_notification",
            ResourceType::ConversationExport => "conversation_export",
            ResourceType::ConversationReport => "conversation_report",
            ResourceType::Content => "content",
            ResourceType::Pipeline => "pipeline",
            ResourceType::Currency => "currency",
            ResourceType::ServiceLevelAgreement => "service_level_agreement",
            ResourceType::MessageTemplate => "message_template",
        }
    }

    /// Parse resource type from string representation.
    ///
    /// Matching is case-insensitive and accepts the snake_case name as well
    /// as the name with underscores removed.
    ///
    /// # Example
    ///
    /// ```
    /// use perm_rbac::resources::ResourceType;
    ///
    /// assert_eq!(ResourceType::parse("agent_group"), Some(ResourceType::AgentGroup));
    /// assert_eq!(ResourceType::parse("AgentGroup"), Some(ResourceType::AgentGroup));
    /// assert_eq!(ResourceType::parse("sla"), Some(ResourceType::ServiceLevelAgreement));
    /// assert_eq!(ResourceType::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        if wanted == "sla" {
            return Some(ResourceType::ServiceLevelAgreement);
        }
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().replace('_', "") == wanted)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
