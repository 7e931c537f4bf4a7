//! Schema used by the datastore tests.

use vtyang_schema::{SchemaEntry, SchemaIndex, SchemaModule, TypeDescriptor, TypeKind};

fn string() -> TypeDescriptor {
    TypeDescriptor::new(TypeKind::String)
}

pub fn schema() -> SchemaIndex {
    let main = SchemaModule::new(
        "main",
        vec![
            SchemaEntry::container(
                "users",
                vec![SchemaEntry::list(
                    "user",
                    &["name"],
                    vec![
                        SchemaEntry::leaf("name", string()),
                        SchemaEntry::leaf("age", TypeDescriptor::new(TypeKind::Uint8)),
                    ],
                )],
            ),
            SchemaEntry::container(
                "values",
                vec![
                    SchemaEntry::leaf("u08", TypeDescriptor::new(TypeKind::Uint8)),
                    SchemaEntry::leaf_list("tags", string()),
                ],
            ),
        ],
    );
    let isis = SchemaModule::new(
        "frr-isisd",
        vec![SchemaEntry::container(
            "isis",
            vec![SchemaEntry::list(
                "instance",
                &["area-tag", "vrf"],
                vec![
                    SchemaEntry::leaf("area-tag", string()),
                    SchemaEntry::leaf("vrf", string()),
                    SchemaEntry::leaf("description", string()),
                ],
            )],
        )],
    );
    let isis_ext = SchemaModule::new(
        "frr-isisd-ext",
        vec![SchemaEntry::container(
            "isis",
            vec![SchemaEntry::leaf("debug", TypeDescriptor::new(TypeKind::Boolean))],
        )],
    );
    SchemaIndex::new(vec![main, isis, isis_ext]).unwrap()
}
