//! Pure field derivers.
//!
//! Each deriver maps a typed view of one document (plus, for joins, a
//! related document) to the new field value. Field extraction happens
//! once at the boundary so the derivation itself never touches raw
//! JSON.

use appwrite::Document;

/// Shown when a client has neither a full name nor name parts.
pub const NO_NAME_SENTINEL: &str = "Sin nombre";

/// The client fields the derivers read. Missing, null and non-string
/// attributes all default to `None`.
#[derive(Debug, Default, Clone)]
pub struct ClienteFields {
    pub nombre_completo: Option<String>,
    pub nomcli: Option<String>,
    pub ape1cli: Option<String>,
    pub tel1cli: Option<String>,
    pub tel2cli: Option<String>,
    pub email: Option<String>,
    pub dnicli: Option<String>,
    pub codcli: Option<String>,
}

impl ClienteFields {
    pub fn from_document(doc: &Document) -> Self {
        let field = |key: &str| doc.get_str(key).map(String::from);
        Self {
            nombre_completo: field("nombre_completo"),
            nomcli: field("nomcli"),
            ape1cli: field("ape1cli"),
            tel1cli: field("tel1cli"),
            tel2cli: field("tel2cli"),
            email: field("email"),
            dnicli: field("dnicli"),
            codcli: field("codcli"),
        }
    }
}

/// The appointment fields the derivers read.
#[derive(Debug, Default, Clone)]
pub struct CitaFields {
    pub cliente_id: Option<String>,
}

impl CitaFields {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            cliente_id: doc.get_str("cliente_id").map(String::from),
        }
    }
}

/// Unified search text for a client: textual fields in fixed priority
/// order, empties dropped, joined with single spaces, lowercased and
/// trimmed. Stable byte-for-byte so re-runs rewrite identical values.
pub fn unified_search_text(cliente: &ClienteFields) -> String {
    let parts = [
        &cliente.nombre_completo,
        &cliente.nomcli,
        &cliente.ape1cli,
        &cliente.tel1cli,
        &cliente.tel2cli,
        &cliente.email,
        &cliente.dnicli,
        &cliente.codcli,
    ];

    parts
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .trim()
        .to_string()
}

/// Display name for a client: full name when present, otherwise first
/// and last name parts, otherwise a fixed sentinel. Never empty.
pub fn cliente_display_name(cliente: &ClienteFields) -> String {
    if let Some(nombre) = cliente.nombre_completo.as_deref() {
        if !nombre.is_empty() {
            return nombre.to_string();
        }
    }

    let partes = format!(
        "{} {}",
        cliente.nomcli.as_deref().unwrap_or(""),
        cliente.ape1cli.as_deref().unwrap_or("")
    );
    let partes = partes.trim();
    if !partes.is_empty() {
        return partes.to_string();
    }

    NO_NAME_SENTINEL.to_string()
}
