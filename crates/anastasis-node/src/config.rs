//! TOML configuration (spec.md §6's recognized keys). Loading the file is
//! a thin `toml::from_str` layer; the shape of each section mirrors the
//! original GNUnet-style `.conf` sections without attempting to parse
//! that format itself (out of scope).

use std::path::Path;

use anastasis_core::AnastasisError;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub anastasis: AnastasisSection,
    #[serde(default, rename = "authorization-iban")]
    pub authorization_iban: Option<AuthorizationIban>,
    #[serde(default, rename = "authorization-email")]
    pub authorization_email: Option<HelperCommand>,
    #[serde(default, rename = "authorization-sms")]
    pub authorization_sms: Option<HelperCommand>,
    #[serde(default, rename = "authorization-post")]
    pub authorization_post: Option<HelperCommand>,
    #[serde(default)]
    pub taler: Option<TalerSection>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnastasisSection {
    /// Path to the sled database directory.
    pub db: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthorizationIban {
    #[serde(rename = "CREDIT_IBAN")]
    pub credit_iban: String,
    #[serde(rename = "BUSINESS_NAME")]
    pub business_name: String,
    /// TALER amount string, e.g. `"EUR:1"`.
    #[serde(rename = "COST")]
    pub cost: String,
    /// Bank-access fields, passed through to the `BankClient`
    /// implementation (spec.md §6: "bank-access fields passed through to
    /// the bank client").
    pub bank_base_url: String,
    #[serde(default)]
    pub bank_username: Option<String>,
    #[serde(default)]
    pub bank_password: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HelperCommand {
    #[serde(rename = "COMMAND")]
    pub command: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TalerSection {
    #[serde(rename = "CURRENCY")]
    pub currency: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, AnastasisError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnastasisError::Config(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&text).map_err(|e| AnastasisError::Config(format!("parsing {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_config() {
        let toml = r#"
            [anastasis]
            db = "/var/lib/anastasis/db"

            [authorization-iban]
            CREDIT_IBAN = "DE1234"
            BUSINESS_NAME = "Anastasis GmbH"
            COST = "EUR:1"
            bank_base_url = "https://bank.example/"
        "#;
        let cfg: Config = toml::from_str(toml).unwrap();
        assert_eq!(cfg.anastasis.db, "/var/lib/anastasis/db");
        let iban = cfg.authorization_iban.unwrap();
        assert_eq!(iban.credit_iban, "DE1234");
        assert_eq!(iban.cost, "EUR:1");
    }
}
