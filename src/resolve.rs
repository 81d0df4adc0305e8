//! Read-time projection of an entity into a requested language.

use crate::entity::{FieldSpec, Translatable};
use crate::language::Language;
use crate::shape::is_blank;
use crate::store::{FieldMap, TranslationStore};
use serde_json::{Map, Value};
use tracing::debug;

/// The view of `entity` to render for `lang`.
///
/// Source-language requests use live values and never touch the store. For
/// other languages a field whose live value is empty stays empty; otherwise
/// the cached translation is used when present, non-empty and of the right
/// shape, and the live value is used when it is not. Store failures and
/// unknown language codes degrade to live values. Never fails.
pub async fn resolve(
    entity: &dyn Translatable,
    lang: &str,
    store: &TranslationStore,
) -> Map<String, Value> {
    let mut view = Map::new();
    view.insert("id".to_string(), Value::from(entity.id()));

    let target = match lang.parse::<Language>() {
        Ok(target) if !target.is_source() => Some(target),
        Ok(_) => None,
        Err(_) => {
            debug!("No translations for unsupported language {:?}", lang);
            None
        }
    };

    let needs_lookup = target.is_some()
        && entity
            .schema()
            .iter()
            .any(|spec| !is_blank(&entity.field_value(spec.name)));

    let cached = match target {
        Some(_) if needs_lookup => {
            store
                .get_all_fields(entity.source_type(), entity.id())
                .await
        }
        _ => None,
    };

    for spec in entity.schema() {
        let live = entity.field_value(spec.name);
        let value = match target {
            Some(target) => resolve_field(spec, live, target, cached.as_ref()),
            None => live,
        };
        view.insert(spec.name.to_string(), value);
    }

    view
}

fn resolve_field(
    spec: &FieldSpec,
    live: Value,
    target: Language,
    cached: Option<&FieldMap>,
) -> Value {
    if is_blank(&live) {
        return live;
    }

    cached
        .and_then(|fields| fields.get(spec.name))
        .and_then(|field| field.translations.get(&target))
        .filter(|translated| !is_blank(translated) && spec.shape.accepts(translated))
        .cloned()
        .unwrap_or(live)
}
