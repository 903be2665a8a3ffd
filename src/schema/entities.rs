//! Entity declarations
//!
//! The five content entities, declared as data. `cms_registry()` is the
//! single authority on field names, required-ness, ownership and tracking;
//! migrations, payload checks and the introspection endpoint all follow it.

use super::{EntityDescriptor, FieldDescriptor, FieldType, Ownership, SchemaRegistry};

/// Build the content schema.
pub fn cms_registry() -> SchemaRegistry {
    SchemaRegistry::new(vec![user(), post(), category(), page(), menu()])
}

fn user() -> EntityDescriptor {
    EntityDescriptor {
        name: "user",
        fields: vec![
            FieldDescriptor::new("name", FieldType::Text),
            FieldDescriptor::new("email", FieldType::Text).required().unique(),
            FieldDescriptor::new("password", FieldType::Password).required(),
            FieldDescriptor::new("is_admin", FieldType::Checkbox),
        ],
        ownership: Ownership::SelfRecord,
        tracked: false,
    }
}

fn post() -> EntityDescriptor {
    EntityDescriptor {
        name: "post",
        fields: vec![
            FieldDescriptor::new("title", FieldType::Localized { rich: false }).required(),
            FieldDescriptor::new("slug", FieldType::Slug { from: "title" }).unique(),
            FieldDescriptor::new(
                "state",
                FieldType::Select {
                    options: vec!["draft", "published", "archived"],
                    default: "draft",
                },
            ),
            FieldDescriptor::new(
                "author",
                FieldType::Relationship {
                    entity: "user",
                    many: false,
                },
            )
            .required(),
            FieldDescriptor::new(
                "categories",
                FieldType::Relationship {
                    entity: "category",
                    many: true,
                },
            )
            .required(),
            FieldDescriptor::new("excerpt", FieldType::Localized { rich: false }).required(),
            FieldDescriptor::new("content", FieldType::Localized { rich: true }),
            FieldDescriptor::new("thumbnail", FieldType::File),
        ],
        ownership: Ownership::Field("author"),
        tracked: true,
    }
}

fn category() -> EntityDescriptor {
    EntityDescriptor {
        name: "category",
        fields: vec![
            FieldDescriptor::new("name", FieldType::Localized { rich: false }).required(),
            FieldDescriptor::new("slug", FieldType::Slug { from: "name" }).unique(),
        ],
        ownership: Ownership::None,
        tracked: true,
    }
}

fn page() -> EntityDescriptor {
    EntityDescriptor {
        name: "page",
        fields: vec![
            FieldDescriptor::new("title", FieldType::Localized { rich: false }).required(),
            FieldDescriptor::new("slug", FieldType::Slug { from: "title" }).unique(),
            FieldDescriptor::new(
                "state",
                FieldType::Select {
                    options: vec!["draft", "published", "archived"],
                    default: "draft",
                },
            ),
            FieldDescriptor::new(
                "author",
                FieldType::Relationship {
                    entity: "user",
                    many: false,
                },
            )
            .required(),
            FieldDescriptor::new("content", FieldType::Localized { rich: true }),
        ],
        ownership: Ownership::Field("author"),
        tracked: true,
    }
}

fn menu() -> EntityDescriptor {
    EntityDescriptor {
        name: "menu",
        fields: vec![
            FieldDescriptor::new("body", FieldType::Localized { rich: true }).required(),
        ],
        ownership: Ownership::None,
        tracked: true,
    }
}
