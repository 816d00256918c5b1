//! Extracted DANFE record and its parts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Value stored in any field that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Return `value` when it holds text, the sentinel otherwise.
pub fn or_sentinel(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => not_available(),
    }
}

/// Retail brand of the recipient store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    /// Extrafarma stores (identified by their CNPJ root).
    Extrafarma,
    /// Pague Menos stores (any other recipient).
    PagueMenos,
}

impl Brand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Brand::Extrafarma => "extrafarma",
            Brand::PagueMenos => "paguemenos",
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of the shipment (sender or recipient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub nome: String,
    pub cnpj: String,
    pub endereco: String,
    pub bairro: String,
    pub municipio: String,
    pub uf: String,
    pub cep: String,
    /// Inscrição Estadual.
    pub ie: String,
}

impl Default for Party {
    fn default() -> Self {
        Self {
            nome: not_available(),
            cnpj: not_available(),
            endereco: not_available(),
            bairro: not_available(),
            municipio: not_available(),
            uf: not_available(),
            cep: not_available(),
            ie: not_available(),
        }
    }
}

/// A product row recovered from the DANFE items table.
///
/// Extraction is best-effort: any column that could not be identified holds
/// [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub codigo: String,
    pub descricao: String,
    /// NCM classification code.
    pub ncm: String,
    pub unidade: String,
    pub quantidade: String,
    pub valor_unitario: String,
    pub valor_total: String,
}

/// Generates the [`Field`] enum and the keyed accessors on [`ExtractedRecord`].
macro_rules! record_fields {
    ($($variant:ident => $field:ident),+ $(,)?) => {
        /// Scalar field of an [`ExtractedRecord`], addressable by its key.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Field {
            $($variant),+
        }

        impl Field {
            /// Every scalar field, in record order.
            pub const ALL: &'static [Field] = &[$(Field::$variant),+];

            /// Canonical key of the field.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Field::$variant => stringify!($field)),+
                }
            }
        }

        impl FromStr for Field {
            type Err = ExtractionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $(stringify!($field) => Ok(Field::$variant),)+
                    other => Err(ExtractionError::UnknownField(other.to_string())),
                }
            }
        }

        impl ExtractedRecord {
            /// Read a scalar field.
            pub fn get(&self, field: Field) -> &str {
                match field {
                    $(Field::$variant => &self.$field),+
                }
            }

            fn slot_mut(&mut self, field: Field) -> &mut String {
                match field {
                    $(Field::$variant => &mut self.$field),+
                }
            }
        }
    };
}

record_fields! {
    NumeroNfe => numero_nfe,
    Serie => serie,
    ChaveAcesso => chave_acesso,
    DataEmissao => data_emissao,
    ValorTotal => valor_total,
    NaturezaOperacao => natureza_operacao,
    DestinatarioNome => destinatario_nome,
    DestinatarioCnpj => destinatario_cnpj,
    DestinatarioEndereco => destinatario_endereco,
    DestinatarioBairro => destinatario_bairro,
    DestinatarioMunicipio => destinatario_municipio,
    DestinatarioUf => destinatario_uf,
    DestinatarioCep => destinatario_cep,
    DestinatarioIe => destinatario_ie,
    RemetenteNome => remetente_nome,
    RemetenteCnpj => remetente_cnpj,
    RemetenteEndereco => remetente_endereco,
    RemetenteBairro => remetente_bairro,
    RemetenteMunicipio => remetente_municipio,
    RemetenteUf => remetente_uf,
    RemetenteCep => remetente_cep,
    RemetenteIe => remetente_ie,
    Brand => brand,
    Loja => loja,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat record of everything pulled out of one DANFE.
///
/// Every scalar field always holds text: either the extracted value or
/// [`NOT_AVAILABLE`]. `informacoes_complementares` is the one exception and
/// is left out entirely when the document has no complementary notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    #[serde(default = "not_available")]
    pub numero_nfe: String,
    #[serde(default = "not_available")]
    pub serie: String,
    /// 44-digit access key without whitespace.
    #[serde(default = "not_available")]
    pub chave_acesso: String,
    /// Emission date as DD/MM/YYYY.
    #[serde(default = "not_available")]
    pub data_emissao: String,
    /// Total in Brazilian notation (`2.374,30`).
    #[serde(default = "not_available")]
    pub valor_total: String,
    #[serde(default = "not_available")]
    pub natureza_operacao: String,

    #[serde(default = "not_available")]
    pub destinatario_nome: String,
    #[serde(default = "not_available")]
    pub destinatario_cnpj: String,
    #[serde(default = "not_available")]
    pub destinatario_endereco: String,
    #[serde(default = "not_available")]
    pub destinatario_bairro: String,
    #[serde(default = "not_available")]
    pub destinatario_municipio: String,
    #[serde(default = "not_available")]
    pub destinatario_uf: String,
    #[serde(default = "not_available")]
    pub destinatario_cep: String,
    #[serde(default = "not_available")]
    pub destinatario_ie: String,

    #[serde(default = "not_available")]
    pub remetente_nome: String,
    #[serde(default = "not_available")]
    pub remetente_cnpj: String,
    #[serde(default = "not_available")]
    pub remetente_endereco: String,
    #[serde(default = "not_available")]
    pub remetente_bairro: String,
    #[serde(default = "not_available")]
    pub remetente_municipio: String,
    #[serde(default = "not_available")]
    pub remetente_uf: String,
    #[serde(default = "not_available")]
    pub remetente_cep: String,
    #[serde(default = "not_available")]
    pub remetente_ie: String,

    /// Recipient brand (`extrafarma`, `paguemenos`) or the sentinel.
    #[serde(default = "not_available")]
    pub brand: String,
    /// Store number derived from the recipient CNPJ branch.
    #[serde(default = "not_available")]
    pub loja: String,

    #[serde(default)]
    pub produtos: Vec<LineItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub informacoes_complementares: Option<String>,
}

impl ExtractedRecord {
    /// A record with every field unresolved.
    pub fn new() -> Self {
        Self {
            numero_nfe: not_available(),
            serie: not_available(),
            chave_acesso: not_available(),
            data_emissao: not_available(),
            valor_total: not_available(),
            natureza_operacao: not_available(),
            destinatario_nome: not_available(),
            destinatario_cnpj: not_available(),
            destinatario_endereco: not_available(),
            destinatario_bairro: not_available(),
            destinatario_municipio: not_available(),
            destinatario_uf: not_available(),
            destinatario_cep: not_available(),
            destinatario_ie: not_available(),
            remetente_nome: not_available(),
            remetente_cnpj: not_available(),
            remetente_endereco: not_available(),
            remetente_bairro: not_available(),
            remetente_municipio: not_available(),
            remetente_uf: not_available(),
            remetente_cep: not_available(),
            remetente_ie: not_available(),
            brand: not_available(),
            loja: not_available(),
            produtos: Vec::new(),
            informacoes_complementares: None,
        }
    }

    /// Override a field, e.g. after human review.
    ///
    /// Blank values become [`NOT_AVAILABLE`].
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        *self.slot_mut(field) = or_sentinel(Some(value.trim().to_string()));
    }

    /// Apply a `key=value` override.
    pub fn apply_override(&mut self, assignment: &str) -> Result<Field, ExtractionError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| ExtractionError::UnknownField(assignment.to_string()))?;
        let field: Field = key.parse()?;
        self.set(field, value);
        Ok(field)
    }

    /// Replace blank scalar fields with the sentinel.
    ///
    /// Records deserialized from hand-edited JSON may contain empty strings.
    pub fn fill_sentinels(&mut self) {
        for field in Field::ALL {
            let slot = self.slot_mut(*field);
            if slot.trim().is_empty() {
                *slot = not_available();
            }
        }
        if self
            .informacoes_complementares
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            self.informacoes_complementares = None;
        }
    }

    /// Fields still holding the sentinel.
    pub fn unresolved_fields(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| self.get(*f) == NOT_AVAILABLE)
            .collect()
    }

    /// Recipient (destinatário) block.
    pub fn recipient(&self) -> Party {
        Party {
            nome: self.destinatario_nome.clone(),
            cnpj: self.destinatario_cnpj.clone(),
            endereco: self.destinatario_endereco.clone(),
            bairro: self.destinatario_bairro.clone(),
            municipio: self.destinatario_municipio.clone(),
            uf: self.destinatario_uf.clone(),
            cep: self.destinatario_cep.clone(),
            ie: self.destinatario_ie.clone(),
        }
    }

    /// Sender (remetente) block.
    pub fn sender(&self) -> Party {
        Party {
            nome: self.remetente_nome.clone(),
            cnpj: self.remetente_cnpj.clone(),
            endereco: self.remetente_endereco.clone(),
            bairro: self.remetente_bairro.clone(),
            municipio: self.remetente_municipio.clone(),
            uf: self.remetente_uf.clone(),
            cep: self.remetente_cep.clone(),
            ie: self.remetente_ie.clone(),
        }
    }

    pub fn set_recipient(&mut self, party: Party) {
        self.destinatario_nome = party.nome;
        self.destinatario_cnpj = party.cnpj;
        self.destinatario_endereco = party.endereco;
        self.destinatario_bairro = party.bairro;
        self.destinatario_municipio = party.municipio;
        self.destinatario_uf = party.uf;
        self.destinatario_cep = party.cep;
        self.destinatario_ie = party.ie;
    }

    pub fn set_sender(&mut self, party: Party) {
        self.remetente_nome = party.nome;
        self.remetente_cnpj = party.cnpj;
        self.remetente_endereco = party.endereco;
        self.remetente_bairro = party.bairro;
        self.remetente_municipio = party.municipio;
        self.remetente_uf = party.uf;
        self.remetente_cep = party.cep;
        self.remetente_ie = party.ie;
    }
}

impl Default for ExtractedRecord {
    fn default() -> Self {
        Self::new()
    }
}
