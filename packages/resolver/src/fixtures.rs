//! Schemas shared by the resolver tests.

use vtyang_schema::{SchemaCase, SchemaEntry, SchemaIndex, SchemaModule, TypeDescriptor, TypeKind};

fn string() -> TypeDescriptor {
    TypeDescriptor::new(TypeKind::String)
}

fn identity(base: &str) -> TypeDescriptor {
    let mut ty = TypeDescriptor::new(TypeKind::Identityref);
    ty.identity_base = Some(base.to_string());
    ty
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
                    SchemaEntry::leaf(
                        "u08",
                        TypeDescriptor::new(TypeKind::Uint8).with_range("1..100"),
                    ),
                    SchemaEntry::leaf(
                        "crypto",
                        TypeDescriptor::new(TypeKind::Enumeration).with_enums(&["aes", "des3"]),
                    ),
                    SchemaEntry::leaf("cipher", identity("crypto-alg")),
                    SchemaEntry::leaf("enabled", TypeDescriptor::new(TypeKind::Boolean)),
                    SchemaEntry::leaf(
                        "mixed",
                        TypeDescriptor::new(TypeKind::Union).with_members(vec![
                            TypeDescriptor::new(TypeKind::Uint8),
                            TypeDescriptor::new(TypeKind::Enumeration).with_enums(&["auto"]),
                            TypeDescriptor::new(TypeKind::String),
                        ]),
                    ),
                    SchemaEntry::leaf_list("tags", string()),
                    SchemaEntry::choice(
                        "mode",
                        vec![
                            SchemaCase::new("a", vec![SchemaEntry::leaf("alpha", string())]),
                            SchemaCase::new(
                                "b",
                                vec![SchemaEntry::leaf("beta", TypeDescriptor::new(TypeKind::Uint8))],
                            ),
                        ],
                    ),
                ],
            ),
            SchemaEntry::container(
                "state",
                vec![SchemaEntry::leaf("uptime", TypeDescriptor::new(TypeKind::Uint32))],
            )
            .read_only(),
        ],
    )
    .with_identity("crypto-alg", None)
    .with_identity("aes", Some("crypto-alg"))
    .with_identity("des3", Some("crypto-alg"));

    let isis = SchemaModule::new(
        "frr-isisd",
        vec![SchemaEntry::container(
            "isis",
            vec![SchemaEntry::list(
                "instance",
                &["area-tag", "vrf"],
                vec![
                    SchemaEntry::leaf("area-tag", string()),
                    SchemaEntry::leaf(
                        "vrf",
                        TypeDescriptor::new(TypeKind::Enumeration).with_enums(&["default", "red"]),
                    ),
                    SchemaEntry::leaf("description", string()),
                    SchemaEntry::leaf_list("area-address", string()),
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
