//! Turns bracketed strings and CLI tokens into schema-resolved paths.

use vtyang_config::{ConfigValue, Path, PathSegment};
use vtyang_schema::{resolve_member, validate, NodeKind, SchemaEntry, SchemaIndex, TypeKind};

use crate::error::ResolveError;
use crate::tokenize::{tokenize, RawSegment};

/// How CLI tokens after a leaf are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// A leaf consumes one value token and a leaf-list consumes the rest.
    /// Read-only nodes are rejected.
    Set,
    /// Nothing consumes value tokens; paths may name read-only state.
    Show,
}

/// A resolved CLI command path plus the raw value that followed it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub path: Path,
    /// Leaf value, or whitespace-joined leaf-list values, in `Set` mode.
    pub value: Option<String>,
}

/// Longest resolvable prefix of a token list.
#[derive(Debug, Clone)]
pub struct Backtracked {
    pub resolved: Resolved,
    /// Tokens that could not be resolved, in their original order.
    pub tail: Vec<String>,
}

/// Resolves paths against a loaded schema. Cheap to construct per command.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    schema: &'a SchemaIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(schema: &'a SchemaIndex) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'a SchemaIndex {
        self.schema
    }

    /// Resolve a bracketed string such as `/users/user[name='hiroki']/age`.
    ///
    /// Predicates may appear in any order; they are reordered into schema key
    /// order. A list without predicates is accepted only as the last segment.
    pub fn resolve_str(&self, input: &str) -> Result<Path, ResolveError> {
        let raw = tokenize(input)?;
        let Some(first) = raw.first() else {
            return Ok(Path::new());
        };
        self.first_resolving(first.module.as_deref(), &first.name, |top| {
            self.resolve_raw(&raw, top)
        })
    }

    fn resolve_raw(
        &self,
        raw: &[RawSegment],
        top: Option<&'a SchemaEntry>,
    ) -> Result<Path, ResolveError> {
        let mut path = Path::new();
        let mut parent: Option<&'a SchemaEntry> = None;

        for (i, segment) in raw.iter().enumerate() {
            let is_last = i + 1 == raw.len();
            let entry = match (parent, top) {
                (None, Some(top)) => top,
                _ => self.lookup(parent, segment.module.as_deref(), &segment.name, &path)?,
            };
            let kind = data_kind(entry, &segment.name, &path)?;
            let mut seg = PathSegment::new(&entry.module, &entry.name, kind);

            match kind {
                NodeKind::List => {
                    self.bind_predicates(entry, segment, &mut seg, &path, is_last)?;
                }
                NodeKind::Leaf | NodeKind::LeafList => {
                    seg.value_type = entry.ty().cloned();
                    if let Some(next) = raw.get(i + 1) {
                        return Err(ResolveError::UnexpectedToken {
                            path: child_path(&path, &seg),
                            token: next.name.clone(),
                        });
                    }
                }
                NodeKind::Container => {}
            }
            if kind != NodeKind::List && !segment.predicates.is_empty() {
                return Err(ResolveError::UnknownKey {
                    path: child_path(&path, &seg),
                    key: segment.predicates[0].0.clone(),
                });
            }

            path.push(seg);
            parent = Some(entry);
        }
        Ok(path)
    }

    fn bind_predicates(
        &self,
        entry: &SchemaEntry,
        raw: &RawSegment,
        seg: &mut PathSegment,
        path: &Path,
        is_last: bool,
    ) -> Result<(), ResolveError> {
        seg.key_names = entry.keys().to_vec();
        for (key, _) in &raw.predicates {
            if !entry.is_key(key) {
                return Err(ResolveError::UnknownKey {
                    path: child_path(path, seg),
                    key: key.clone(),
                });
            }
        }
        if raw.predicates.is_empty() && is_last {
            return Ok(());
        }
        for key in entry.keys() {
            let Some((_, literal)) = raw.predicates.iter().find(|(k, _)| k == key) else {
                return Err(ResolveError::MissingKey {
                    path: child_path(path, seg),
                    key: key.clone(),
                });
            };
            let value = self.key_value(entry, key, literal, path, seg)?;
            seg.keys.push((key.clone(), value));
        }
        Ok(())
    }

    /// Resolve CLI tokens such as `users user hiroki age 22`.
    ///
    /// A list consumes up to one token per key, in schema key order; running
    /// out of tokens leaves the list partially keyed as the last segment.
    pub fn resolve_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
        mode: ResolveMode,
    ) -> Result<Resolved, ResolveError> {
        let Some(first) = tokens.first() else {
            return self.resolve_tokens_from(tokens, mode, None);
        };
        let (module, name) = split_qualified(first.as_ref());
        self.first_resolving(module, name, |top| self.resolve_tokens_from(tokens, mode, top))
    }

    fn resolve_tokens_from<S: AsRef<str>>(
        &self,
        tokens: &[S],
        mode: ResolveMode,
        top: Option<&'a SchemaEntry>,
    ) -> Result<Resolved, ResolveError> {
        let mut path = Path::new();
        let mut value = None;
        let mut parent: Option<&'a SchemaEntry> = None;
        let mut i = 0;

        while i < tokens.len() {
            let (module, name) = split_qualified(tokens[i].as_ref());
            let entry = match (parent, top) {
                (None, Some(top)) => top,
                _ => self.lookup(parent, module, name, &path)?,
            };
            let kind = data_kind(entry, name, &path)?;
            let mut seg = PathSegment::new(&entry.module, &entry.name, kind);
            if mode == ResolveMode::Set && entry.is_read_only() {
                return Err(ResolveError::ReadOnly {
                    path: path.to_string(),
                    name: entry.name.clone(),
                });
            }
            i += 1;

            match kind {
                NodeKind::Container => {}
                NodeKind::List => {
                    seg.key_names = entry.keys().to_vec();
                    for key in entry.keys() {
                        let Some(literal) = tokens.get(i) else {
                            break;
                        };
                        let value = self.key_value(entry, key, literal.as_ref(), &path, &seg)?;
                        seg.keys.push((key.clone(), value));
                        i += 1;
                    }
                    if mode == ResolveMode::Set && !seg.keys.is_empty() && !seg.has_all_keys() {
                        return Err(ResolveError::MissingKey {
                            path: child_path(&path, &seg),
                            key: seg.key_names[seg.keys.len()].clone(),
                        });
                    }
                }
                NodeKind::Leaf => {
                    seg.value_type = entry.ty().cloned();
                    if mode == ResolveMode::Set && parent.is_some_and(|p| is_list_key(p, name)) {
                        return Err(ResolveError::KeyLeaf {
                            path: child_path(&path, &seg),
                        });
                    }
                    if mode == ResolveMode::Set {
                        let Some(literal) = tokens.get(i) else {
                            return Err(ResolveError::MissingValue {
                                path: child_path(&path, &seg),
                            });
                        };
                        let literal = literal.as_ref();
                        if let Some(ty) = &seg.value_type {
                            let member = resolve_member(ty, literal).map_err(|source| {
                                ResolveError::Validation {
                                    path: child_path(&path, &seg),
                                    source,
                                }
                            })?;
                            if ty.base == TypeKind::Union {
                                seg.resolved_member = Some(member.clone());
                            }
                        }
                        value = Some(literal.to_string());
                        i += 1;
                    }
                }
                NodeKind::LeafList => {
                    seg.value_type = entry.ty().cloned();
                    if mode == ResolveMode::Set {
                        let rest: Vec<&str> = tokens[i..].iter().map(|t| t.as_ref()).collect();
                        if rest.is_empty() {
                            return Err(ResolveError::MissingValue {
                                path: child_path(&path, &seg),
                            });
                        }
                        if let Some(ty) = &seg.value_type {
                            for literal in &rest {
                                validate(ty, literal).map_err(|source| {
                                    ResolveError::Validation {
                                        path: child_path(&path, &seg),
                                        source,
                                    }
                                })?;
                            }
                        }
                        value = Some(rest.join(" "));
                        i = tokens.len();
                    }
                }
            }

            if matches!(kind, NodeKind::Leaf | NodeKind::LeafList) {
                if let Some(extra) = tokens.get(i) {
                    return Err(ResolveError::UnexpectedToken {
                        path: child_path(&path, &seg),
                        token: extra.as_ref().to_string(),
                    });
                }
            }
            path.push(seg);
            parent = Some(entry);
        }

        Ok(Resolved { path, value })
    }

    /// Resolve as many leading tokens as possible.
    ///
    /// On failure the last token moves into the tail and resolution is
    /// retried, until it succeeds. The empty prefix always resolves.
    pub fn resolve_backtracking<S: AsRef<str>>(
        &self,
        tokens: &[S],
        mode: ResolveMode,
    ) -> Backtracked {
        for split in (0..=tokens.len()).rev() {
            match self.resolve_tokens(&tokens[..split], mode) {
                Ok(resolved) => {
                    return Backtracked {
                        resolved,
                        tail: tokens[split..]
                            .iter()
                            .map(|t| t.as_ref().to_string())
                            .collect(),
                    };
                }
                Err(err) => tracing::trace!(split, error = %err, "backtracking"),
            }
        }
        Backtracked {
            resolved: Resolved {
                path: Path::new(),
                value: None,
            },
            tail: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }

    /// Schema entry addressed by an already resolved path.
    pub fn entry_for(&self, path: &Path) -> Option<&'a SchemaEntry> {
        let mut current: Option<&'a SchemaEntry> = None;
        for seg in path.iter() {
            let next = match current {
                None => self
                    .schema
                    .top_entries()
                    .find(|e| e.name == seg.name && e.module == seg.module)?,
                Some(entry) => entry.find_child(&seg.name)?,
            };
            current = Some(next);
        }
        current
    }

    /// Run `attempt` once per top-level entry named `name`, returning the
    /// first success or else the error from the first module. `None` is
    /// passed when at most one module declares the name.
    fn first_resolving<T>(
        &self,
        module: Option<&str>,
        name: &str,
        attempt: impl Fn(Option<&'a SchemaEntry>) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        let tops: Vec<&'a SchemaEntry> = self
            .schema
            .find_tops(name)
            .into_iter()
            .filter(|e| module.map_or(true, |m| e.module == m))
            .collect();
        if tops.len() < 2 {
            return attempt(None);
        }
        let first = attempt(Some(tops[0]));
        if first.is_ok() {
            return first;
        }
        tops[1..]
            .iter()
            .find_map(|top| attempt(Some(*top)).ok())
            .map_or(first, Ok)
    }

    fn lookup(
        &self,
        parent: Option<&'a SchemaEntry>,
        module: Option<&str>,
        name: &str,
        path: &Path,
    ) -> Result<&'a SchemaEntry, ResolveError> {
        let in_module = |e: &&SchemaEntry| module.map_or(true, |m| e.module == m);
        let found = match parent {
            None => self
                .schema
                .top_entries()
                .filter(|e| e.node_kind().is_some())
                .find(|e| e.name == name && in_module(e)),
            Some(entry) => entry
                .addressable_children()
                .find(|e| e.name == name && in_module(e)),
        };
        found.ok_or_else(|| ResolveError::NotFound {
            path: path.to_string(),
            name: name.to_string(),
        })
    }

    fn key_value(
        &self,
        list: &SchemaEntry,
        key: &str,
        literal: &str,
        path: &Path,
        seg: &PathSegment,
    ) -> Result<ConfigValue, ResolveError> {
        let key_leaf = list.find_child(key).ok_or_else(|| ResolveError::NotFound {
            path: child_path(path, seg),
            name: key.to_string(),
        })?;
        let Some(ty) = key_leaf.ty() else {
            return Ok(ConfigValue::String(literal.to_string()));
        };
        ConfigValue::parse(ty, literal).map_err(|source| ResolveError::Validation {
            path: child_path(path, seg),
            source,
        })
    }
}

fn split_qualified(token: &str) -> (Option<&str>, &str) {
    match token.split_once(':') {
        Some((module, name)) => (Some(module), name),
        None => (None, token),
    }
}

fn is_list_key(parent: &SchemaEntry, name: &str) -> bool {
    parent.node_kind() == Some(NodeKind::List) && parent.is_key(name)
}

fn data_kind(entry: &SchemaEntry, name: &str, path: &Path) -> Result<NodeKind, ResolveError> {
    entry.node_kind().ok_or_else(|| ResolveError::NotFound {
        path: path.to_string(),
        name: name.to_string(),
    })
}

fn child_path(path: &Path, seg: &PathSegment) -> String {
    if path.is_empty() {
        format!("/{}", seg)
    } else {
        format!("{}/{}", path, seg)
    }
}
