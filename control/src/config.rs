//! Deployment configuration with TOML file support.

use serde::{Deserialize, Serialize};

use jointer_governance::{GovernanceConfig, Threshold, ThresholdVector};
use jointer_types::{Address, Amount, TokenClass};
use jointer_utils::LogFormat;

use crate::error::ControlError;
use crate::instance::InstanceKind;

/// Everything needed to bring up a control plane.
///
/// Can be loaded from a TOML file via [`DeploymentConfig::from_toml_file`] or
/// built programmatically with [`DeploymentConfig::new`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Deploying key: owns the bootstrap window and derives contract addresses.
    #[serde(with = "hex_address")]
    pub authority: Address,

    /// Initial CEO wallet of both governance instances.
    #[serde(with = "hex_address")]
    pub ceo: Address,

    /// Receives the pre-allocated supply; excluded and blocked in both instances.
    #[serde(with = "hex_address")]
    pub company: Address,

    /// Operator allowed to route transfers through the gateway.
    #[serde(with = "hex_address")]
    pub gateway_admin: Address,

    /// Supply credited to the company when the escrow is initialized. A
    /// decimal string, or an integer when it fits TOML's range.
    #[serde(default, with = "decimal_amount")]
    pub escrow_preallocated: Amount,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Gateway channels created at deployment, in id order.
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,

    #[serde(default)]
    pub wallets: Vec<WalletConfig>,

    #[serde(default)]
    pub global: InstanceConfig,

    #[serde(default)]
    pub escrowed: InstanceConfig,

    /// Rules added on top of the default sets.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Per-instance settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    #[serde(default)]
    pub governance: GovernanceConfig,

    /// Addresses removed from a class's circulating supply.
    #[serde(default)]
    pub excluded: Vec<ExclusionConfig>,

    /// Wallets barred from voting.
    #[serde(default, with = "hex_addresses")]
    pub blocked: Vec<Address>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExclusionConfig {
    pub class: TokenClass,
    #[serde(with = "hex_addresses")]
    pub addresses: Vec<Address>,
}

/// A gateway destination wallet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub channel: u64,
    pub label: String,
    #[serde(with = "hex_address")]
    pub address: Address,
}

/// An extra rule for one instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub instance: InstanceKind,
    /// `"global"`, `"escrowed"`, `"escrow"`, `"gateway"` or a `0x` address.
    pub target: String,
    pub selector: String,
    pub majority: [MajoritySlot; TokenClass::COUNT],
}

/// One threshold slot as written in TOML: a literal percentage or a tier name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MajoritySlot {
    Percent(u8),
    Tier(Tier),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Absolute,
    Expedited,
}

impl From<MajoritySlot> for Threshold {
    fn from(slot: MajoritySlot) -> Self {
        match slot {
            MajoritySlot::Percent(p) => Threshold::Percent(p),
            MajoritySlot::Tier(Tier::Absolute) => Threshold::Absolute,
            MajoritySlot::Tier(Tier::Expedited) => Threshold::Expedited,
        }
    }
}

impl RuleConfig {
    pub fn thresholds(&self) -> ThresholdVector {
        ThresholdVector::new(self.majority.map(Threshold::from))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_channels() -> Vec<String> {
    vec![
        "Gateway supply".to_string(),
        "Crypto exchanges".to_string(),
        "SmartSwap P2C".to_string(),
    ]
}

impl DeploymentConfig {
    pub fn new(authority: Address, ceo: Address, company: Address, gateway_admin: Address) -> Self {
        Self {
            authority,
            ceo,
            company,
            gateway_admin,
            escrow_preallocated: Amount::ZERO,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            channels: default_channels(),
            wallets: Vec::new(),
            global: InstanceConfig::default(),
            escrowed: InstanceConfig::default(),
            rules: Vec::new(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ControlError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ControlError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ControlError> {
        let config: Self = toml::from_str(s).map_err(|e| ControlError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("DeploymentConfig is always serializable to TOML")
    }

    /// Checks that need no deployment: tier bounds and wallet channels.
    pub fn validate(&self) -> Result<(), ControlError> {
        for instance in [&self.global, &self.escrowed] {
            instance.governance.levels()?;
        }
        for wallet in &self.wallets {
            if wallet.channel >= self.channels.len() as u64 {
                return Err(ControlError::Config(format!(
                    "wallet {:?} references channel {} but only {} are configured",
                    wallet.label,
                    wallet.channel,
                    self.channels.len()
                )));
            }
        }
        Ok(())
    }

    pub fn instance(&self, kind: InstanceKind) -> &InstanceConfig {
        match kind {
            InstanceKind::Global => &self.global,
            InstanceKind::Escrowed => &self.escrowed,
        }
    }
}

/// Addresses as `0x` hex strings.
mod hex_address {
    use jointer_types::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(address)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Amounts beyond TOML's signed 64-bit integers travel as strings.
mod decimal_amount {
    use jointer_types::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(amount: &Amount, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&amount.raw())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Int(raw) => Ok(Amount::new(u128::from(raw))),
            Raw::Text(raw) => raw
                .trim()
                .parse::<u128>()
                .map(Amount::new)
                .map_err(serde::de::Error::custom),
        }
    }
}

mod hex_addresses {
    use jointer_types::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addresses: &[Address], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(addresses.iter().map(|a| a.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Address>, D::Error> {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|raw| raw.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> DeploymentConfig {
        DeploymentConfig::new(
            Address::from_label("authority"),
            Address::from_label("ceo"),
            Address::from_label("company"),
            Address::from_label("admin"),
        )
    }

    fn minimal_toml() -> String {
        format!(
            "authority = \"{}\"\nceo = \"{}\"\ncompany = \"{}\"\ngateway_admin = \"{}\"\n",
            Address::from_label("authority"),
            Address::from_label("ceo"),
            Address::from_label("company"),
            Address::from_label("admin"),
        )
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = sample();
        config.escrow_preallocated = Amount::new(u128::from(u64::MAX) * 1_000);
        config.global.blocked.push(Address::from_label("x"));
        config.global.excluded.push(ExclusionConfig {
            class: TokenClass::Primary,
            addresses: vec![Address::from_label("vault")],
        });
        config.rules.push(RuleConfig {
            instance: InstanceKind::Global,
            target: "escrowed".into(),
            selector: "updateCloseTime()".into(),
            majority: [
                MajoritySlot::Tier(Tier::Absolute),
                MajoritySlot::Percent(60),
                MajoritySlot::Percent(0),
                MajoritySlot::Tier(Tier::Expedited),
            ],
        });
        let parsed = DeploymentConfig::from_toml_str(&config.to_toml_string()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = DeploymentConfig::from_toml_str(&minimal_toml()).unwrap();
        assert_eq!(config.channels.len(), 3);
        assert_eq!(config.global.governance.absolute_level, 90);
        assert_eq!(config.escrowed.governance.voting_period_secs, 7 * 24 * 3600);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn preallocated_supply_beyond_u64() {
        let big = format!("{}escrow_preallocated = \"{}\"\n", minimal_toml(), u128::MAX);
        let config = DeploymentConfig::from_toml_str(&big).unwrap();
        assert_eq!(config.escrow_preallocated, Amount::new(u128::MAX));

        let small = format!("{}escrow_preallocated = 900\n", minimal_toml());
        let config = DeploymentConfig::from_toml_str(&small).unwrap();
        assert_eq!(config.escrow_preallocated, Amount::new(900));

        let bad = format!("{}escrow_preallocated = \"-5\"\n", minimal_toml());
        assert!(matches!(
            DeploymentConfig::from_toml_str(&bad),
            Err(ControlError::Config(_))
        ));
    }

    #[test]
    fn symbolic_and_literal_slots() {
        let toml = format!(
            "{}\n[[rules]]\ninstance = \"escrowed\"\ntarget = \"gateway\"\nselector = \"blockChannel(uint256,bool)\"\nmajority = [\"expedited\", 0, 0, 75]\n",
            minimal_toml()
        );
        let config = DeploymentConfig::from_toml_str(&toml).unwrap();
        let v = config.rules[0].thresholds();
        assert_eq!(v.get(TokenClass::Primary), Threshold::Expedited);
        assert_eq!(v.get(TokenClass::CrossCommunity), Threshold::Percent(75));
    }

    #[test]
    fn bad_address_is_config_error() {
        let toml = minimal_toml().replace(&Address::from_label("ceo").to_string(), "0x1234");
        assert!(matches!(
            DeploymentConfig::from_toml_str(&toml),
            Err(ControlError::Config(_))
        ));
    }

    #[test]
    fn invalid_levels_rejected() {
        let toml = format!("{}\n[global.governance]\nabsolute_level = 70\n", minimal_toml());
        assert!(matches!(
            DeploymentConfig::from_toml_str(&toml),
            Err(ControlError::Governance(_))
        ));
    }

    #[test]
    fn wallet_channel_checked() {
        let toml = format!(
            "{}\n[[wallets]]\nchannel = 7\nlabel = \"Bancor\"\naddress = \"{}\"\n",
            minimal_toml(),
            Address::from_label("bancor")
        );
        assert!(matches!(
            DeploymentConfig::from_toml_str(&toml),
            Err(ControlError::Config(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(minimal_toml().as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let config = DeploymentConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.company, Address::from_label("company"));
    }

    #[test]
    fn missing_file_returns_config_error() {
        assert!(matches!(
            DeploymentConfig::from_toml_file("/nonexistent/jointer.toml"),
            Err(ControlError::Config(_))
        ));
    }
}
