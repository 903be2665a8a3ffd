//! Schema registry
//!
//! The content schema is plain data: each entity is an `EntityDescriptor`
//! listing `FieldDescriptor`s, an ownership rule, and a tracking flag. The
//! composition root validates the registry once at startup and then shares
//! it read-only; nothing registers itself through side effects.
//!
//! The registry serves three consumers:
//! - startup validation (`validate`), which aborts the process on an
//!   incoherent declaration,
//! - payload checking (`check_create` / `check_update`), which rejects bad
//!   input before any persistence,
//! - HTTP introspection, which serializes the descriptors as JSON.

mod entities;

pub use entities::cms_registry;

use crate::models::Locale;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Field shape. Serialized with a `kind` tag for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    /// Single-language text
    Text,
    /// Boolean flag
    Checkbox,
    /// Write-only secret, stored as a hash, never serialized back
    Password,
    /// One of a fixed set of options
    Select {
        options: Vec<&'static str>,
        default: &'static str,
    },
    /// Text carried in every supported locale
    Localized { rich: bool },
    /// URL slug derived from the English variant of another field
    Slug { from: &'static str },
    /// Reference to another entity by ID
    Relationship { entity: &'static str, many: bool },
    /// Stored file reference (filename)
    File,
}

/// One field of an entity.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub unique: bool,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            unique: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// How "does this identity own this record" is answered for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    /// The record is the identity itself (User)
    SelfRecord,
    /// The named relationship field holds the owning user
    Field(&'static str),
    /// Records have no owner; the ownership arm never grants
    None,
}

/// One entity of the content schema.
#[derive(Debug, Clone, Serialize)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
    pub ownership: Ownership,
    /// Whether created_at/updated_at are maintained by storage
    pub tracked: bool,
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Structural problems found when validating a registry declaration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Entity name must not be empty")]
    EmptyEntityName,
    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),
    #[error("Entity '{entity}' has a field with an empty name")]
    EmptyFieldName { entity: String },
    #[error("Entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },
    #[error("Slug field '{field}' of '{entity}' derives from unknown field '{from}'")]
    UnknownSlugSource {
        entity: String,
        field: String,
        from: String,
    },
    #[error("Slug field '{field}' of '{entity}' must derive from a localized field")]
    NonLocalizedSlugSource { entity: String, field: String },
    #[error("Relationship '{field}' of '{entity}' targets unknown entity '{target}'")]
    UnknownRelationshipTarget {
        entity: String,
        field: String,
        target: String,
    },
    #[error("Select field '{field}' of '{entity}' has no options")]
    EmptySelectOptions { entity: String, field: String },
    #[error("Select field '{field}' of '{entity}' defaults to '{default}', not an option")]
    InvalidSelectDefault {
        entity: String,
        field: String,
        default: String,
    },
    #[error("Ownership of '{entity}' names unknown field '{field}'")]
    UnknownOwnershipField { entity: String, field: String },
    #[error("Ownership of '{entity}' names field '{field}', which is not a single user relationship")]
    InvalidOwnershipField { entity: String, field: String },
}

/// A payload rejected by the registry. Carries per-field messages that the
/// API layer exposes as error details.
#[derive(Debug, Error)]
#[error("Validation failed for '{entity}': {}", summary(.errors))]
pub struct ValidationError {
    pub entity: String,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Field errors as a JSON array for the API error envelope.
    pub fn details(&self) -> Value {
        serde_json::to_value(&self.errors).unwrap_or(Value::Null)
    }
}

/// The validated set of entity declarations.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaRegistry {
    entities: Vec<EntityDescriptor>,
}

impl SchemaRegistry {
    pub fn new(entities: Vec<EntityDescriptor>) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Check the declaration for structural coherence.
    ///
    /// Called once by the composition root before anything consumes the
    /// registry; a failure aborts startup.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = Vec::new();
        for entity in &self.entities {
            if entity.name.is_empty() {
                return Err(SchemaError::EmptyEntityName);
            }
            if seen.contains(&entity.name) {
                return Err(SchemaError::DuplicateEntity(entity.name.to_string()));
            }
            seen.push(entity.name);

            let mut field_names = Vec::new();
            for field in &entity.fields {
                if field.name.is_empty() {
                    return Err(SchemaError::EmptyFieldName {
                        entity: entity.name.to_string(),
                    });
                }
                if field_names.contains(&field.name) {
                    return Err(SchemaError::DuplicateField {
                        entity: entity.name.to_string(),
                        field: field.name.to_string(),
                    });
                }
                field_names.push(field.name);

                match &field.field_type {
                    FieldType::Slug { from } => match entity.field(from) {
                        None => {
                            return Err(SchemaError::UnknownSlugSource {
                                entity: entity.name.to_string(),
                                field: field.name.to_string(),
                                from: from.to_string(),
                            })
                        }
                        Some(source)
                            if !matches!(source.field_type, FieldType::Localized { .. }) =>
                        {
                            return Err(SchemaError::NonLocalizedSlugSource {
                                entity: entity.name.to_string(),
                                field: field.name.to_string(),
                            })
                        }
                        Some(_) => {}
                    },
                    FieldType::Relationship { entity: target, .. } => {
                        if !self.entities.iter().any(|e| e.name == *target) {
                            return Err(SchemaError::UnknownRelationshipTarget {
                                entity: entity.name.to_string(),
                                field: field.name.to_string(),
                                target: target.to_string(),
                            });
                        }
                    }
                    FieldType::Select { options, default } => {
                        if options.is_empty() {
                            return Err(SchemaError::EmptySelectOptions {
                                entity: entity.name.to_string(),
                                field: field.name.to_string(),
                            });
                        }
                        if !options.contains(default) {
                            return Err(SchemaError::InvalidSelectDefault {
                                entity: entity.name.to_string(),
                                field: field.name.to_string(),
                                default: default.to_string(),
                            });
                        }
                    }
                    _ => {}
                }
            }

            if let Ownership::Field(owner_field) = entity.ownership {
                match entity.field(owner_field) {
                    None => {
                        return Err(SchemaError::UnknownOwnershipField {
                            entity: entity.name.to_string(),
                            field: owner_field.to_string(),
                        })
                    }
                    Some(f)
                        if !matches!(
                            f.field_type,
                            FieldType::Relationship {
                                entity: "user",
                                many: false
                            }
                        ) =>
                    {
                        return Err(SchemaError::InvalidOwnershipField {
                            entity: entity.name.to_string(),
                            field: owner_field.to_string(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Check a create payload: unknown fields are rejected, required fields
    /// must be present and non-blank, present fields must have the right
    /// shape. Runs before any persistence.
    pub fn check_create(&self, entity_name: &str, payload: &Value) -> Result<(), ValidationError> {
        self.check(entity_name, payload, true)
    }

    /// Check an update payload: absent fields mean "unchanged", present
    /// fields must have the right shape and still satisfy required-ness.
    pub fn check_update(&self, entity_name: &str, payload: &Value) -> Result<(), ValidationError> {
        self.check(entity_name, payload, false)
    }

    fn check(
        &self,
        entity_name: &str,
        payload: &Value,
        require_missing: bool,
    ) -> Result<(), ValidationError> {
        let entity = match self.entity(entity_name) {
            Some(e) => e,
            None => {
                return Err(ValidationError {
                    entity: entity_name.to_string(),
                    errors: vec![FieldError {
                        field: entity_name.to_string(),
                        message: "unknown entity".to_string(),
                    }],
                })
            }
        };

        let mut errors = Vec::new();

        let object = match payload.as_object() {
            Some(o) => o,
            None => {
                return Err(ValidationError {
                    entity: entity_name.to_string(),
                    errors: vec![FieldError {
                        field: String::new(),
                        message: "payload must be a JSON object".to_string(),
                    }],
                })
            }
        };

        for key in object.keys() {
            if entity.field(key).is_none() {
                errors.push(FieldError {
                    field: key.clone(),
                    message: "unknown field".to_string(),
                });
            }
        }

        for field in &entity.fields {
            let value = object.get(field.name);
            match value {
                None | Some(Value::Null) => {
                    // Slugs are derived server-side when omitted.
                    let derived = matches!(field.field_type, FieldType::Slug { .. });
                    if require_missing && field.required && !derived {
                        errors.push(FieldError {
                            field: field.name.to_string(),
                            message: "is required".to_string(),
                        });
                    }
                }
                Some(v) => check_field(field, v, &mut errors),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                entity: entity_name.to_string(),
                errors,
            })
        }
    }
}

fn check_field(field: &FieldDescriptor, value: &Value, errors: &mut Vec<FieldError>) {
    let push = |errors: &mut Vec<FieldError>, field_name: String, message: &str| {
        errors.push(FieldError {
            field: field_name,
            message: message.to_string(),
        });
    };

    match &field.field_type {
        FieldType::Text | FieldType::Password | FieldType::Slug { .. } | FieldType::File => {
            match value.as_str() {
                None => push(errors, field.name.to_string(), "must be a string"),
                Some(s) if s.trim().is_empty() && field.required => {
                    push(errors, field.name.to_string(), "must not be blank")
                }
                Some(s)
                    if s.trim().is_empty()
                        && matches!(field.field_type, FieldType::Slug { .. } | FieldType::File) =>
                {
                    push(errors, field.name.to_string(), "must not be blank")
                }
                Some(_) => {}
            }
        }
        FieldType::Checkbox => {
            if !value.is_boolean() {
                push(errors, field.name.to_string(), "must be a boolean");
            }
        }
        FieldType::Select { options, .. } => match value.as_str() {
            Some(s) if options.contains(&s) => {}
            Some(s) => push(
                errors,
                field.name.to_string(),
                &format!("must be one of {:?}, got '{}'", options, s),
            ),
            None => push(errors, field.name.to_string(), "must be a string"),
        },
        FieldType::Localized { .. } => match value.as_object() {
            None => push(
                errors,
                field.name.to_string(),
                "must be an object with en/vi/fr variants",
            ),
            Some(map) => {
                for key in map.keys() {
                    if key.parse::<Locale>().is_err() {
                        push(
                            errors,
                            format!("{}.{}", field.name, key),
                            "unknown locale",
                        );
                    }
                }
                for locale in Locale::ALL {
                    let variant = map.get(locale.as_str());
                    let blank = match variant {
                        None | Some(Value::Null) => true,
                        Some(Value::String(s)) => s.trim().is_empty(),
                        Some(_) => {
                            push(
                                errors,
                                format!("{}.{}", field.name, locale),
                                "must be a string",
                            );
                            continue;
                        }
                    };
                    if blank && field.required {
                        push(
                            errors,
                            format!("{}.{}", field.name, locale),
                            "must not be blank",
                        );
                    }
                }
            }
        },
        FieldType::Relationship { many: false, .. } => {
            if !value.is_i64() && !value.is_u64() {
                push(errors, field.name.to_string(), "must be an ID");
            }
        }
        FieldType::Relationship { many: true, .. } => match value.as_array() {
            None => push(errors, field.name.to_string(), "must be an array of IDs"),
            Some(items) => {
                if items.is_empty() && field.required {
                    push(errors, field.name.to_string(), "must not be empty");
                }
                if items.iter().any(|v| !v.is_i64() && !v.is_u64()) {
                    push(errors, field.name.to_string(), "must be an array of IDs");
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        cms_registry()
    }

    #[test]
    fn test_cms_registry_validates() {
        registry().validate().expect("declared schema must be coherent");
    }

    #[test]
    fn test_cms_registry_entities() {
        let reg = registry();
        for name in ["user", "post", "category", "page", "menu"] {
            assert!(reg.entity(name).is_some(), "missing entity {}", name);
        }
        assert!(reg.entity("comment").is_none());
        assert_eq!(reg.entities().len(), 5);
    }

    #[test]
    fn test_ownership_declarations() {
        let reg = registry();
        assert_eq!(reg.entity("user").unwrap().ownership, Ownership::SelfRecord);
        assert_eq!(reg.entity("post").unwrap().ownership, Ownership::Field("author"));
        assert_eq!(reg.entity("page").unwrap().ownership, Ownership::Field("author"));
        assert_eq!(reg.entity("category").unwrap().ownership, Ownership::None);
        assert_eq!(reg.entity("menu").unwrap().ownership, Ownership::None);
    }

    #[test]
    fn test_tracking_declarations() {
        let reg = registry();
        assert!(!reg.entity("user").unwrap().tracked);
        for name in ["post", "category", "page", "menu"] {
            assert!(reg.entity(name).unwrap().tracked, "{} should be tracked", name);
        }
    }

    #[test]
    fn test_validate_rejects_unknown_slug_source() {
        let reg = SchemaRegistry::new(vec![EntityDescriptor {
            name: "thing",
            fields: vec![FieldDescriptor::new("slug", FieldType::Slug { from: "title" })],
            ownership: Ownership::None,
            tracked: false,
        }]);
        assert_eq!(
            reg.validate(),
            Err(SchemaError::UnknownSlugSource {
                entity: "thing".to_string(),
                field: "slug".to_string(),
                from: "title".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_rejects_unknown_relationship_target() {
        let reg = SchemaRegistry::new(vec![EntityDescriptor {
            name: "thing",
            fields: vec![FieldDescriptor::new(
                "owner",
                FieldType::Relationship {
                    entity: "ghost",
                    many: false,
                },
            )],
            ownership: Ownership::None,
            tracked: false,
        }]);
        assert!(matches!(
            reg.validate(),
            Err(SchemaError::UnknownRelationshipTarget { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_select_default() {
        let reg = SchemaRegistry::new(vec![EntityDescriptor {
            name: "thing",
            fields: vec![FieldDescriptor::new(
                "state",
                FieldType::Select {
                    options: vec!["a", "b"],
                    default: "c",
                },
            )],
            ownership: Ownership::None,
            tracked: false,
        }]);
        assert!(matches!(
            reg.validate(),
            Err(SchemaError::InvalidSelectDefault { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_field() {
        let reg = SchemaRegistry::new(vec![EntityDescriptor {
            name: "thing",
            fields: vec![
                FieldDescriptor::new("name", FieldType::Text),
                FieldDescriptor::new("name", FieldType::Text),
            ],
            ownership: Ownership::None,
            tracked: false,
        }]);
        assert!(matches!(reg.validate(), Err(SchemaError::DuplicateField { .. })));
    }

    fn valid_post_payload() -> Value {
        json!({
            "title": {"en": "Hello", "vi": "Xin chào", "fr": "Bonjour"},
            "excerpt": {"en": "intro", "vi": "giới thiệu", "fr": "intro"},
            "author": 1,
            "categories": [1],
        })
    }

    #[test]
    fn test_check_create_accepts_valid_post() {
        registry()
            .check_create("post", &valid_post_payload())
            .expect("valid payload");
    }

    #[test]
    fn test_check_create_rejects_missing_excerpt_locale() {
        let mut payload = valid_post_payload();
        payload["excerpt"] = json!({"en": "intro", "vi": "giới thiệu"});
        let err = registry().check_create("post", &payload).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "excerpt.fr"));
    }

    #[test]
    fn test_check_create_rejects_whitespace_locale() {
        let mut payload = valid_post_payload();
        payload["title"] = json!({"en": "Hello", "vi": "   ", "fr": "Bonjour"});
        let err = registry().check_create("post", &payload).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "title.vi"));
    }

    #[test]
    fn test_check_create_rejects_unknown_field() {
        let mut payload = valid_post_payload();
        payload["color"] = json!("red");
        let err = registry().check_create("post", &payload).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "color" && e.message == "unknown field"));
    }

    #[test]
    fn test_check_create_rejects_empty_categories() {
        let mut payload = valid_post_payload();
        payload["categories"] = json!([]);
        let err = registry().check_create("post", &payload).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "categories"));
    }

    #[test]
    fn test_check_create_rejects_bad_select_option() {
        let mut payload = valid_post_payload();
        payload["state"] = json!("retracted");
        let err = registry().check_create("post", &payload).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "state"));
    }

    #[test]
    fn test_check_create_accepts_archived_state() {
        let mut payload = valid_post_payload();
        payload["state"] = json!("archived");
        assert!(registry().check_create("post", &payload).is_ok());
    }

    #[test]
    fn test_check_create_missing_slug_is_fine() {
        // Slugs are derived server-side; the payload never has to carry one.
        let payload = valid_post_payload();
        assert!(payload.get("slug").is_none());
        assert!(registry().check_create("post", &payload).is_ok());
    }

    #[test]
    fn test_check_create_user_requires_email_and_password() {
        let err = registry()
            .check_create("user", &json!({"name": "Alice"}))
            .unwrap_err();
        let fields: Vec<_> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
    }

    #[test]
    fn test_check_update_allows_partial_payload() {
        registry()
            .check_update("post", &json!({"state": "published"}))
            .expect("partial update");
    }

    #[test]
    fn test_check_update_rejects_blank_required_locale() {
        let err = registry()
            .check_update("post", &json!({"title": {"en": "", "vi": "a", "fr": "b"}}))
            .unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "title.en"));
    }

    #[test]
    fn test_check_update_rejects_unknown_field() {
        let err = registry()
            .check_update("menu", &json!({"label": "nav"}))
            .unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "label"));
    }

    #[test]
    fn test_check_rejects_unknown_locale_key() {
        let mut payload = valid_post_payload();
        payload["title"] = json!({"en": "a", "vi": "b", "fr": "c", "de": "d"});
        let err = registry().check_create("post", &payload).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "title.de"));
    }

    #[test]
    fn test_validation_error_details_shape() {
        let err = registry().check_create("user", &json!({})).unwrap_err();
        let details = err.details();
        assert!(details.is_array());
        assert!(details.as_array().unwrap().iter().all(|e| e.get("field").is_some()));
    }

    #[test]
    fn test_introspection_serializes() {
        let reg = registry();
        let json = serde_json::to_value(&reg).unwrap();
        let entities = json.get("entities").unwrap().as_array().unwrap();
        assert_eq!(entities.len(), 5);
        let post = entities.iter().find(|e| e["name"] == "post").unwrap();
        let slug = post["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "slug")
            .unwrap();
        assert_eq!(slug["type"]["kind"], "slug");
        assert_eq!(slug["type"]["from"], "title");
    }
}
