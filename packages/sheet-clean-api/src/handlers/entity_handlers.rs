//! Read-only entity metadata: canonical schema and quick-filter presets.

use hyper::{body::Bytes, Response};
use serde::Serialize;

use sheet_clean_core::filter::{presets, QuickFilter};
use sheet_clean_core::row::EntityType;
use sheet_clean_core::schema::{fields, id_field, FieldSpec};

use crate::router::RouterError;

use super::request_utils::json_ok;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    pub entity: EntityType,
    pub id_field: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Returns the canonical fields of an entity type.
///
/// # Endpoint
/// `GET /entities/{entity}/schema`
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "entity": "task",
///     "idField": "TaskID",
///     "fields": [{"name": "TaskID", "kind": "identifier", "required": true}]
///   }
/// }
/// ```
pub fn get_schema(entity: EntityType) -> Result<Response<Bytes>, RouterError> {
    json_ok(SchemaResponse {
        entity,
        id_field: id_field(entity),
        fields: fields(entity),
    })
}

/// Returns the quick-filter presets of an entity type.
///
/// # Endpoint
/// `GET /entities/{entity}/presets`
pub fn get_presets(entity: EntityType) -> Result<Response<Bytes>, RouterError> {
    let presets: &'static [QuickFilter] = presets(entity);
    json_ok(presets)
}
