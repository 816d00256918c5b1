//! Sender/recipient disambiguation rules.
//!
//! Flattened DANFE text loses the column layout, so the extractor cannot tell
//! which CNPJ belongs to which party from position on the page. Instead an
//! ordered list of rules is consulted; the first rule that resolves wins.
//! The default list only holds [`DocumentOrder`]: the first CNPJ in the text
//! is the sender (emitente) and the second is the recipient. That holds for
//! the supported layouts and nothing more.

use serde::{Deserialize, Serialize};

use super::cnpj::cnpj_root;

/// CNPJs assigned to each party.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyCnpjs {
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

/// A strategy that maps the document's CNPJs onto the two parties.
pub trait PartyRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Assign CNPJs, or `None` when the rule does not apply to this document.
    fn assign(&self, cnpjs: &[String]) -> Option<PartyCnpjs>;
}

/// First CNPJ is the sender, second the recipient.
pub struct DocumentOrder;

impl PartyRule for DocumentOrder {
    fn name(&self) -> &'static str {
        "document_order"
    }

    fn assign(&self, cnpjs: &[String]) -> Option<PartyCnpjs> {
        Some(PartyCnpjs {
            sender: cnpjs.first().cloned(),
            recipient: cnpjs.get(1).cloned(),
        })
    }
}

/// A CNPJ whose root is a known sender root marks the sender; the first
/// other CNPJ is the recipient.
pub struct KnownSenderRoot {
    roots: Vec<String>,
}

impl KnownSenderRoot {
    pub fn new(roots: Vec<String>) -> Self {
        let roots = roots.iter().map(|r| cnpj_root(r)).collect();
        Self { roots }
    }
}

impl PartyRule for KnownSenderRoot {
    fn name(&self) -> &'static str {
        "known_sender_root"
    }

    fn assign(&self, cnpjs: &[String]) -> Option<PartyCnpjs> {
        let sender_idx = cnpjs
            .iter()
            .position(|c| self.roots.contains(&cnpj_root(c)))?;

        let recipient = cnpjs
            .iter()
            .enumerate()
            .find(|(i, c)| *i != sender_idx && cnpj_root(c) != cnpj_root(&cnpjs[sender_idx]))
            .map(|(_, c)| c.clone());

        Some(PartyCnpjs {
            sender: Some(cnpjs[sender_idx].clone()),
            recipient,
        })
    }
}

/// Serializable description of a rule, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PartyRuleConfig {
    DocumentOrder,
    KnownSenderRoot { roots: Vec<String> },
}

impl PartyRuleConfig {
    pub fn build(&self) -> Box<dyn PartyRule> {
        match self {
            PartyRuleConfig::DocumentOrder => Box::new(DocumentOrder),
            PartyRuleConfig::KnownSenderRoot { roots } => {
                Box::new(KnownSenderRoot::new(roots.clone()))
            }
        }
    }
}

/// Run the rules in order and return the first assignment.
pub fn resolve_parties(rules: &[Box<dyn PartyRule>], cnpjs: &[String]) -> PartyCnpjs {
    for rule in rules {
        if let Some(assignment) = rule.assign(cnpjs) {
            tracing::trace!("Party rule {} resolved {} CNPJs", rule.name(), cnpjs.len());
            return assignment;
        }
    }
    PartyCnpjs::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cnpjs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_document_order() {
        let found = cnpjs(&["06.626.253/0001-51", "004.899.316/0042-10"]);
        let parties = DocumentOrder.assign(&found).unwrap();
        assert_eq!(parties.sender.as_deref(), Some("06.626.253/0001-51"));
        assert_eq!(parties.recipient.as_deref(), Some("004.899.316/0042-10"));
    }

    #[test]
    fn test_document_order_single_cnpj() {
        let parties = DocumentOrder.assign(&cnpjs(&["06.626.253/0001-51"])).unwrap();
        assert!(parties.sender.is_some());
        assert!(parties.recipient.is_none());
    }

    #[test]
    fn test_known_sender_root_overrides_order() {
        let found = cnpjs(&["004.899.316/0042-10", "06.626.253/0001-51"]);
        let rule = KnownSenderRoot::new(vec!["06.626.253".to_string()]);
        let parties = rule.assign(&found).unwrap();
        assert_eq!(parties.sender.as_deref(), Some("06.626.253/0001-51"));
        assert_eq!(parties.recipient.as_deref(), Some("004.899.316/0042-10"));
    }

    #[test]
    fn test_rules_fall_through_in_order() {
        let rules: Vec<Box<dyn PartyRule>> = vec![
            Box::new(KnownSenderRoot::new(vec!["11.111.111".to_string()])),
            Box::new(DocumentOrder),
        ];
        let found = cnpjs(&["06.626.253/0001-51", "004.899.316/0042-10"]);
        let parties = resolve_parties(&rules, &found);
        assert_eq!(parties.sender.as_deref(), Some("06.626.253/0001-51"));
    }

    #[test]
    fn test_rule_config_from_json() {
        let json = r#"[{"rule": "known_sender_root", "roots": ["06626253"]}, {"rule": "document_order"}]"#;
        let rules: Vec<PartyRuleConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1], PartyRuleConfig::DocumentOrder);
        assert_eq!(rules[0].build().name(), "known_sender_root");
    }
}
