//! The two registered backfills.

use appwrite::Document;

use super::derive::{cliente_display_name, unified_search_text, CitaFields, ClienteFields};
use super::{FieldBackfill, Lookup};
use crate::config::Collections;

/// Populate `search_unified` on every client so the front end can
/// substring-match one indexed attribute instead of eight.
pub struct SearchUnifiedBackfill;

impl FieldBackfill for SearchUnifiedBackfill {
    fn name(&self) -> &'static str {
        "search_unified"
    }

    fn description(&self) -> &'static str {
        "Concatenate client name/phone/email/DNI fields into search_unified"
    }

    fn collection<'a>(&self, collections: &'a Collections) -> &'a str {
        &collections.clientes
    }

    fn write_field(&self) -> &'static str {
        "search_unified"
    }

    fn derive(&self, doc: &Document, _lookup: Option<&Lookup>) -> Option<String> {
        let cliente = ClienteFields::from_document(doc);
        Some(unified_search_text(&cliente))
    }
}

/// Denormalize the client's display name onto every appointment so the
/// agenda can render without a per-row client fetch.
pub struct ClienteNombreBackfill;

impl FieldBackfill for ClienteNombreBackfill {
    fn name(&self) -> &'static str {
        "cliente_nombre"
    }

    fn description(&self) -> &'static str {
        "Copy each appointment's client display name into cliente_nombre"
    }

    fn collection<'a>(&self, collections: &'a Collections) -> &'a str {
        &collections.citas
    }

    fn lookup_collection<'a>(&self, collections: &'a Collections) -> Option<&'a str> {
        Some(&collections.clientes)
    }

    fn write_field(&self) -> &'static str {
        "cliente_nombre"
    }

    fn derive(&self, doc: &Document, lookup: Option<&Lookup>) -> Option<String> {
        let cita = CitaFields::from_document(doc);
        let cliente = lookup?.get(cita.cliente_id.as_deref()?)?;
        let cliente = ClienteFields::from_document(cliente);
        Some(cliente_display_name(&cliente))
    }
}
