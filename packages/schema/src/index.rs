//! Loading compiled modules and answering lookups over them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entry::{AddressableChildren, EntryNode, SchemaEntry};
use crate::error::SchemaError;
use crate::types::{Identity, TypeDescriptor, TypeKind};

const MAX_TYPEDEF_DEPTH: usize = 16;

/// One compiled module as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaModule {
    #[serde(rename = "module")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<IdentityDef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub typedefs: BTreeMap<String, TypeDescriptor>,
    #[serde(default)]
    pub entries: Vec<SchemaEntry>,
}

/// An identity declaration; `base` may be module-qualified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

impl SchemaModule {
    pub fn new(name: &str, entries: Vec<SchemaEntry>) -> Self {
        Self {
            name: name.to_string(),
            entries,
            ..Self::default()
        }
    }

    pub fn with_identity(mut self, name: &str, base: Option<&str>) -> Self {
        self.identities.push(IdentityDef {
            name: name.to_string(),
            base: base.map(str::to_string),
        });
        self
    }

    pub fn with_typedef(mut self, name: &str, ty: TypeDescriptor) -> Self {
        self.typedefs.insert(name.to_string(), ty);
        self
    }
}

/// Read-only index over every loaded module.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    modules: Vec<SchemaModule>,
}

impl SchemaIndex {
    /// Build an index, resolving typedefs and identities and checking keys.
    pub fn new(mut modules: Vec<SchemaModule>) -> Result<Self, SchemaError> {
        let mut seen = BTreeSet::new();
        for module in &modules {
            if !seen.insert(module.name.clone()) {
                return Err(SchemaError::DuplicateModule(module.name.clone()));
            }
        }

        let ctx = Context::new(&modules);
        for module in &mut modules {
            let owner = module.name.clone();
            for entry in &mut module.entries {
                finalize_entry(entry, &owner, true, &ctx)?;
            }
        }

        let index = Self { modules };
        tracing::info!(
            modules = index.modules.len(),
            entries = index.top_entries().count(),
            "schema loaded"
        );
        Ok(index)
    }

    /// Load every `*.json` module found in the given directories.
    pub fn load<P: AsRef<Path>>(dirs: &[P]) -> Result<Self, SchemaError> {
        let mut modules = Vec::new();
        for dir in dirs {
            modules.extend(read_dir(dir.as_ref())?);
        }
        if modules.is_empty() {
            let names: Vec<String> = dirs
                .iter()
                .map(|d| d.as_ref().display().to_string())
                .collect();
            return Err(SchemaError::Empty(names.join(", ")));
        }
        Self::new(modules)
    }

    pub fn modules(&self) -> &[SchemaModule] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&SchemaModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Top-level entries of all modules in load order, choices flattened.
    pub fn top_entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.modules
            .iter()
            .flat_map(|m| AddressableChildren::new(&m.entries))
    }

    /// First top-level data entry named `name`.
    pub fn find_top(&self, name: &str) -> Option<&SchemaEntry> {
        self.top_entries()
            .find(|e| e.name == name && e.node_kind().is_some())
    }

    /// Every top-level data entry named `name`, in load order. Several
    /// modules may augment the same top-level container.
    pub fn find_tops(&self, name: &str) -> Vec<&SchemaEntry> {
        self.top_entries()
            .filter(|e| e.name == name && e.node_kind().is_some())
            .collect()
    }

    pub fn rpcs(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.top_entries().filter(|e| e.is_rpc())
    }

    pub fn find_rpc(&self, name: &str) -> Option<&SchemaEntry> {
        self.rpcs().find(|e| e.name == name)
    }
}

fn read_dir(dir: &Path) -> Result<Vec<SchemaModule>, SchemaError> {
    let io_error = |source| SchemaError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut modules = Vec::new();
    for path in paths {
        tracing::debug!(path = %path.display(), "reading schema module");
        let text = std::fs::read_to_string(&path).map_err(|source| SchemaError::Io {
            path: path.clone(),
            source,
        })?;
        let module: SchemaModule =
            serde_json::from_str(&text).map_err(|source| SchemaError::Parse {
                path: path.clone(),
                source,
            })?;
        modules.push(module);
    }
    Ok(modules)
}

struct IdentityDecl {
    id: Identity,
    base: Option<Identity>,
}

/// Lookup tables needed while finalizing, built before any entry is touched.
struct Context {
    prefixes: BTreeMap<String, String>,
    typedefs: BTreeMap<(String, String), TypeDescriptor>,
    identities: Vec<IdentityDecl>,
}

impl Context {
    fn new(modules: &[SchemaModule]) -> Self {
        let mut prefixes = BTreeMap::new();
        for module in modules {
            prefixes.insert(module.name.clone(), module.name.clone());
            if let Some(prefix) = &module.prefix {
                prefixes.insert(prefix.clone(), module.name.clone());
            }
        }

        let mut ctx = Self {
            prefixes,
            typedefs: BTreeMap::new(),
            identities: Vec::new(),
        };
        for module in modules {
            for (name, ty) in &module.typedefs {
                ctx.typedefs
                    .insert((module.name.clone(), name.clone()), ty.clone());
            }
        }
        for module in modules {
            for def in &module.identities {
                let base = def.base.as_deref().map(|b| ctx.qualify(b, &module.name));
                ctx.identities.push(IdentityDecl {
                    id: Identity {
                        module: module.name.clone(),
                        name: def.name.clone(),
                    },
                    base,
                });
            }
        }
        ctx
    }

    /// Turn `name` or `prefix:name` into a module-qualified identity.
    fn qualify(&self, reference: &str, module: &str) -> Identity {
        match reference.split_once(':') {
            Some((prefix, name)) => Identity {
                module: self
                    .prefixes
                    .get(prefix)
                    .cloned()
                    .unwrap_or_else(|| prefix.to_string()),
                name: name.to_string(),
            },
            None => Identity {
                module: module.to_string(),
                name: reference.to_string(),
            },
        }
    }

    fn typedef(&self, reference: &str, module: &str) -> Option<(String, &TypeDescriptor)> {
        let qualified = self.qualify(reference, module);
        if let Some(ty) = self
            .typedefs
            .get(&(qualified.module.clone(), qualified.name.clone()))
        {
            return Some((qualified.module, ty));
        }
        self.typedefs
            .iter()
            .find(|((_, name), _)| *name == qualified.name)
            .map(|((owner, _), ty)| (owner.clone(), ty))
    }

    /// Every identity transitively derived from `base`, sorted.
    fn derived(&self, base: &Identity) -> Vec<Identity> {
        let mut out: Vec<Identity> = self
            .identities
            .iter()
            .filter(|decl| {
                let mut current = decl.base.as_ref();
                let mut steps = 0;
                while let Some(b) = current {
                    if b == base {
                        return true;
                    }
                    steps += 1;
                    if steps > self.identities.len() {
                        break;
                    }
                    current = self
                        .identities
                        .iter()
                        .find(|d| d.id == *b)
                        .and_then(|d| d.base.as_ref());
                }
                false
            })
            .map(|decl| decl.id.clone())
            .collect();
        out.sort();
        out
    }

    fn is_declared(&self, id: &Identity) -> bool {
        self.identities.iter().any(|decl| decl.id == *id)
    }
}

fn finalize_entry(
    entry: &mut SchemaEntry,
    module: &str,
    parent_config: bool,
    ctx: &Context,
) -> Result<(), SchemaError> {
    if entry.module.is_empty() {
        entry.module = module.to_string();
    }
    let owner = entry.module.clone();
    entry.config = entry.config && parent_config;
    let config = entry.config;

    if let EntryNode::List { .. } = entry.node {
        for key in entry.keys() {
            let has_leaf = entry
                .find_child(key)
                .is_some_and(|child| matches!(child.node, EntryNode::Leaf { .. }));
            if !has_leaf {
                return Err(SchemaError::MissingKeyLeaf {
                    list: entry.name.clone(),
                    key: key.clone(),
                });
            }
        }
    }

    match &mut entry.node {
        EntryNode::Container { children } | EntryNode::List { children, .. } => {
            for child in children {
                finalize_entry(child, &owner, config, ctx)?;
            }
        }
        EntryNode::Choice { cases } => {
            for case in cases {
                for child in &mut case.children {
                    finalize_entry(child, &owner, config, ctx)?;
                }
            }
        }
        EntryNode::Rpc { input, output } => {
            for child in input.iter_mut().chain(output.iter_mut()) {
                finalize_entry(child, &owner, true, ctx)?;
            }
        }
        EntryNode::Leaf { ty } | EntryNode::LeafList { ty } => {
            finalize_type(ty, &owner, ctx, 0)?;
        }
    }
    Ok(())
}

fn finalize_type(
    ty: &mut TypeDescriptor,
    module: &str,
    ctx: &Context,
    depth: usize,
) -> Result<(), SchemaError> {
    if let Some(name) = ty.typedef.clone() {
        let unknown = || SchemaError::UnknownTypedef {
            name: name.clone(),
            module: module.to_string(),
        };
        if depth >= MAX_TYPEDEF_DEPTH {
            return Err(unknown());
        }
        let (owner, base) = ctx.typedef(&name, module).ok_or_else(unknown)?;
        let mut resolved = base.clone();
        finalize_type(&mut resolved, &owner, ctx, depth + 1)?;
        overlay(&mut resolved, std::mem::take(ty));
        resolved.typedef = Some(name);
        *ty = resolved;
    }

    for member in &mut ty.members {
        finalize_type(member, module, ctx, depth)?;
    }

    if ty.base == TypeKind::Identityref && ty.identities.is_empty() {
        if let Some(reference) = &ty.identity_base {
            let base = ctx.qualify(reference, module);
            if !ctx.is_declared(&base) {
                return Err(SchemaError::UnknownIdentity {
                    name: reference.clone(),
                    module: module.to_string(),
                });
            }
            ty.identities = ctx.derived(&base);
        }
    }

    ty.finalize()
}

/// Apply use-site restrictions on top of a resolved typedef.
fn overlay(resolved: &mut TypeDescriptor, site: TypeDescriptor) {
    if !site.enums.is_empty() {
        resolved.enums = site.enums;
    }
    if !site.range.is_empty() {
        resolved.range = site.range;
    }
    resolved.pattern.extend(site.pattern);
    if site.identity_base.is_some() {
        resolved.identity_base = site.identity_base;
        resolved.identities.clear();
    }
    if site.path.is_some() {
        resolved.path = site.path;
    }
}
