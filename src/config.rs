//! Provider configuration
//!
//! Each connection value is taken from the manifest's `[provider]` block if
//! set there, otherwise from its environment variable, otherwise it is
//! empty. An empty value after resolution is an error naming the field.

use crate::model::Attr;
use declarative::{Diagnostic, Diagnostics};
use edc_client::{Addresses, Config};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// The `[provider]` block of a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderBlock {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub token: Attr<String>,

    #[serde(default)]
    pub addresses: AddressesBlock,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressesBlock {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub default: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub management: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub protocol: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub public: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub control: Attr<String>,
}

/// One resolvable connection value
struct Setting<'a> {
    attribute: &'static str,
    env: &'static str,
    label: &'static str,
    value: &'a Attr<String>,
}

impl Setting<'_> {
    fn summary(&self, prefix: &str) -> String {
        format!("{prefix} EDC {}", self.label)
    }
}

/// Resolve the client configuration
///
/// `env` looks up an environment variable; pass `|name| std::env::var(name).ok()`
/// outside of tests.
pub fn resolve<F>(block: &ProviderBlock, env: F) -> Result<Config, Diagnostics>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = [
        Setting {
            attribute: "token",
            env: "EDC_TOKEN",
            label: "Token",
            value: &block.token,
        },
        Setting {
            attribute: "addresses.control",
            env: "EDC_CONTROL",
            label: "Control Address",
            value: &block.addresses.control,
        },
        Setting {
            attribute: "addresses.management",
            env: "EDC_MANAGEMENT",
            label: "Management Address",
            value: &block.addresses.management,
        },
        Setting {
            attribute: "addresses.protocol",
            env: "EDC_PROTOCOL",
            label: "Protocol Address",
            value: &block.addresses.protocol,
        },
        Setting {
            attribute: "addresses.public",
            env: "EDC_PUBLIC",
            label: "Public Address",
            value: &block.addresses.public,
        },
        Setting {
            attribute: "addresses.default",
            env: "EDC_DEFAULT",
            label: "Default Address",
            value: &block.addresses.default,
        },
    ];

    let mut diagnostics = Diagnostics::new();

    // Values that are not known yet cannot be resolved at all.
    for setting in settings.iter().filter(|s| s.value.is_unknown()) {
        diagnostics.push(
            Diagnostic::error(
                setting.summary("Unknown"),
                format!(
                    "The provider cannot create the EDC client as there is an unknown \
                     configuration value for the EDC {}. Either set the value statically \
                     in the configuration, or use the {} environment variable.",
                    setting.label.to_lowercase(),
                    setting.env
                ),
            )
            .at(setting.attribute),
        );
    }
    if diagnostics.has_error() {
        return Err(diagnostics);
    }

    let resolved: [String; 6] = settings.each_ref().map(|setting| match setting.value {
        Attr::Value(v) => v.clone(),
        _ => env(setting.env).unwrap_or_default(),
    });

    for (setting, value) in settings.iter().zip(&resolved) {
        if value.is_empty() {
            log::debug!("provider value {} is empty", setting.attribute);
            diagnostics.push(
                Diagnostic::error(
                    setting.summary("Missing"),
                    format!(
                        "The provider cannot create the EDC client as there is a missing or \
                         empty value for the EDC {}. Set the value in the configuration or use \
                         the {} environment variable. If either is already set, ensure the \
                         value is not empty.",
                        setting.label.to_lowercase(),
                        setting.env
                    ),
                )
                .at(setting.attribute),
            );
        }
    }

    let timeout_secs = block
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        diagnostics.push(
            Diagnostic::error(
                "Invalid Request Timeout",
                "request_timeout_secs must be at least 1.",
            )
            .at("request_timeout_secs"),
        );
    }

    if diagnostics.has_error() {
        return Err(diagnostics);
    }

    let [token, control, management, protocol, public, default] = resolved;

    Ok(Config::new(
        token,
        Addresses {
            default,
            management,
            protocol,
            public,
            control,
        },
    )
    .timeout(Duration::from_secs(timeout_secs)))
}
