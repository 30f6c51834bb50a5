//! Declarative REST resource tree.
//!
//! Endpoints are described once as a typed tree of [`ResourceSpec`]s,
//! validated when the tree is built, and resolved into [`Endpoint`] URL
//! builders so call sites never hand-assemble path strings. A node nested
//! under N parents needs N parent ids to form a concrete URL:
//! `symbols/{sid}/cells` has depth 1 and yields `.../symbols/<sid>/cells/`.

use crate::transport::Method;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("invalid base url `{base}`: {reason}")]
    InvalidBase { base: String, reason: String },

    #[error("invalid resource name `{0}`")]
    InvalidName(String),

    #[error("duplicate resource `{0}` under the same parent")]
    DuplicateName(String),

    #[error("unknown resource path `{0}`")]
    UnknownPath(String),

    #[error("`{path}` is nested {expected} deep but {given} parent ids were given")]
    ParentArity {
        path: String,
        expected: usize,
        given: usize,
    },
}

/// The five operations a resource understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Read,
    Update,
    Patch,
    Delete,
}

/// Verb-to-method mapping for one resource. The default covers the usual
/// REST conventions; individual nodes may override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbMap {
    pub create: Method,
    pub read: Method,
    pub update: Method,
    pub patch: Method,
    pub delete: Method,
}

impl Default for VerbMap {
    fn default() -> Self {
        Self {
            create: Method::Post,
            read: Method::Get,
            update: Method::Put,
            patch: Method::Patch,
            delete: Method::Delete,
        }
    }
}

impl VerbMap {
    pub fn method(&self, verb: Verb) -> Method {
        match verb {
            Verb::Create => self.create,
            Verb::Read => self.read,
            Verb::Update => self.update,
            Verb::Patch => self.patch,
            Verb::Delete => self.delete,
        }
    }
}

/// One node of the declarative tree. Children nest arbitrarily.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    name: String,
    verbs: VerbMap,
    trailing_slash: bool,
    children: Vec<ResourceSpec>,
}

impl ResourceSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            verbs: VerbMap::default(),
            trailing_slash: true,
            children: Vec::new(),
        }
    }

    pub fn verbs(mut self, verbs: VerbMap) -> Self {
        self.verbs = verbs;
        self
    }

    /// Route without the trailing separator. Used for leaf resources whose
    /// name is itself an operation noun (`split_align`) and whose server
    /// route carries no slash.
    pub fn no_trailing_slash(mut self) -> Self {
        self.trailing_slash = false;
        self
    }

    pub fn child(mut self, child: ResourceSpec) -> Self {
        self.children.push(child);
        self
    }

    fn validate(&self) -> Result<(), EndpointError> {
        if self.name.is_empty() || self.name.contains('/') {
            return Err(EndpointError::InvalidName(self.name.clone()));
        }
        for (i, child) in self.children.iter().enumerate() {
            if self.children[..i].iter().any(|c| c.name == child.name) {
                return Err(EndpointError::DuplicateName(child.name.clone()));
            }
            child.validate()?;
        }
        Ok(())
    }
}

/// Validated resource tree rooted at a base URL.
#[derive(Debug, Clone)]
pub struct ResourceTree {
    base: String,
    roots: Vec<ResourceSpec>,
}

impl ResourceTree {
    pub fn new(base: &str, roots: Vec<ResourceSpec>) -> Result<Self, EndpointError> {
        let parsed = Url::parse(base).map_err(|e| EndpointError::InvalidBase {
            base: base.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(EndpointError::InvalidBase {
                base: base.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        for (i, root) in roots.iter().enumerate() {
            if roots[..i].iter().any(|r| r.name == root.name) {
                return Err(EndpointError::DuplicateName(root.name.clone()));
            }
            root.validate()?;
        }
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            roots,
        })
    }

    /// Resolve a node by its name path, e.g. `["symbols", "cells"]`.
    pub fn endpoint(&self, path: &[&str]) -> Result<Endpoint, EndpointError> {
        let mut nodes = &self.roots;
        let mut found: Option<&ResourceSpec> = None;
        for name in path {
            let node = nodes
                .iter()
                .find(|n| n.name == *name)
                .ok_or_else(|| EndpointError::UnknownPath(path.join("/")))?;
            nodes = &node.children;
            found = Some(node);
        }
        let node = found.ok_or_else(|| EndpointError::UnknownPath(String::new()))?;
        Ok(Endpoint {
            base: self.base.clone(),
            segments: path.iter().map(|s| s.to_string()).collect(),
            verbs: node.verbs,
            trailing_slash: node.trailing_slash,
        })
    }
}

/// URL builder for one resolved resource node.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: String,
    segments: Vec<String>,
    verbs: VerbMap,
    trailing_slash: bool,
}

impl Endpoint {
    /// Number of parent ids a concrete URL needs.
    pub fn depth(&self) -> usize {
        self.segments.len() - 1
    }

    pub fn method(&self, verb: Verb) -> Method {
        self.verbs.method(verb)
    }

    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// URL of the collection under the given parent ids.
    pub fn collection(&self, parents: &[&str]) -> Result<String, EndpointError> {
        self.build(parents, None)
    }

    /// URL of a single item under the given parent ids.
    pub fn item(&self, parents: &[&str], id: &str) -> Result<String, EndpointError> {
        self.build(parents, Some(id))
    }

    fn build(&self, parents: &[&str], id: Option<&str>) -> Result<String, EndpointError> {
        if parents.len() != self.depth() {
            return Err(EndpointError::ParentArity {
                path: self.path(),
                expected: self.depth(),
                given: parents.len(),
            });
        }
        let mut url = self.base.clone();
        for (i, segment) in self.segments.iter().enumerate() {
            url.push('/');
            url.push_str(segment);
            if let Some(parent) = parents.get(i) {
                url.push('/');
                url.push_str(&urlencoding::encode(parent));
            }
        }
        if let Some(id) = id {
            url.push('/');
            url.push_str(&urlencoding::encode(id));
        }
        if self.trailing_slash {
            url.push('/');
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ResourceTree {
        ResourceTree::new(
            "http://api.test/v1",
            vec![
                ResourceSpec::new("captures"),
                ResourceSpec::new("symbols")
                    .child(ResourceSpec::new("messages"))
                    .child(ResourceSpec::new("split_align").no_trailing_slash()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn collection_and_item_urls_carry_trailing_slash() {
        let captures = tree().endpoint(&["captures"]).unwrap();
        assert_eq!(captures.collection(&[]).unwrap(), "http://api.test/v1/captures/");
        assert_eq!(
            captures.item(&[], "c1").unwrap(),
            "http://api.test/v1/captures/c1/"
        );
    }

    #[test]
    fn nested_urls_compose_parent_ids() {
        let messages = tree().endpoint(&["symbols", "messages"]).unwrap();
        assert_eq!(messages.depth(), 1);
        assert_eq!(
            messages.collection(&["s1"]).unwrap(),
            "http://api.test/v1/symbols/s1/messages/"
        );
        assert_eq!(
            messages.item(&["s1"], "m9").unwrap(),
            "http://api.test/v1/symbols/s1/messages/m9/"
        );
    }

    #[test]
    fn verb_like_leaf_omits_trailing_slash() {
        let align = tree().endpoint(&["symbols", "split_align"]).unwrap();
        assert_eq!(
            align.collection(&["s1"]).unwrap(),
            "http://api.test/v1/symbols/s1/split_align"
        );
    }

    #[test]
    fn parent_ids_are_percent_encoded() {
        let messages = tree().endpoint(&["symbols", "messages"]).unwrap();
        assert_eq!(
            messages.collection(&["a b/c"]).unwrap(),
            "http://api.test/v1/symbols/a%20b%2Fc/messages/"
        );
    }

    #[test]
    fn wrong_parent_arity_is_rejected() {
        let messages = tree().endpoint(&["symbols", "messages"]).unwrap();
        let err = messages.collection(&[]).unwrap_err();
        assert_eq!(
            err,
            EndpointError::ParentArity {
                path: "symbols/messages".to_string(),
                expected: 1,
                given: 0,
            }
        );
    }

    #[test]
    fn unknown_path_is_rejected_at_resolution() {
        let err = tree().endpoint(&["fields"]).unwrap_err();
        assert_eq!(err, EndpointError::UnknownPath("fields".to_string()));
    }

    #[test]
    fn construction_rejects_bad_trees() {
        assert!(matches!(
            ResourceTree::new("ftp://api.test", vec![]),
            Err(EndpointError::InvalidBase { .. })
        ));
        assert!(matches!(
            ResourceTree::new("not a url", vec![]),
            Err(EndpointError::InvalidBase { .. })
        ));
        assert_eq!(
            ResourceTree::new(
                "http://api.test",
                vec![ResourceSpec::new("symbols"), ResourceSpec::new("symbols")],
            )
            .unwrap_err(),
            EndpointError::DuplicateName("symbols".to_string())
        );
        assert_eq!(
            ResourceTree::new("http://api.test", vec![ResourceSpec::new("")]).unwrap_err(),
            EndpointError::InvalidName(String::new())
        );
        assert_eq!(
            ResourceTree::new(
                "http://api.test",
                vec![ResourceSpec::new("symbols").child(ResourceSpec::new("a/b"))],
            )
            .unwrap_err(),
            EndpointError::InvalidName("a/b".to_string())
        );
    }

    #[test]
    fn verb_overrides_apply_per_node() {
        let tree = ResourceTree::new(
            "http://api.test",
            vec![ResourceSpec::new("jobs").verbs(VerbMap {
                create: Method::Put,
                ..VerbMap::default()
            })],
        )
        .unwrap();
        let jobs = tree.endpoint(&["jobs"]).unwrap();
        assert_eq!(jobs.method(Verb::Create), Method::Put);
        assert_eq!(jobs.method(Verb::Read), Method::Get);
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let tree =
            ResourceTree::new("http://api.test/v1/", vec![ResourceSpec::new("captures")]).unwrap();
        let captures = tree.endpoint(&["captures"]).unwrap();
        assert_eq!(captures.collection(&[]).unwrap(), "http://api.test/v1/captures/");
    }
}
