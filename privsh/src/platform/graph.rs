//! Validated privilege level tree.
//!
//! Levels are declared as a flat list with string parent references. The
//! graph resolves those references once, rejects anything that is not a
//! single rooted tree, and then answers path queries by walking both ends up
//! to their lowest common ancestor.

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::bytes::Regex;

use super::privilege_level::PrivilegeLevel;
use crate::channel::union_pattern;
use crate::error::ConfigError;

/// Direction of a single hop between adjacent levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Parent to child, using the child's escalate command.
    Escalate,
    /// Child to parent, using the child's de-escalate command.
    Deescalate,
}

/// One transition between adjacent privilege levels.
#[derive(Debug, Clone, Copy)]
pub struct Hop<'g> {
    pub from: &'g PrivilegeLevel,
    pub to: &'g PrivilegeLevel,
    pub direction: Direction,
}

impl<'g> Hop<'g> {
    /// The command that performs this hop, if one is defined.
    pub fn command(&self) -> Option<&'g str> {
        match self.direction {
            Direction::Escalate => self.to.escalate_command.as_deref(),
            Direction::Deescalate => self.from.deescalate_command.as_deref(),
        }
    }

    /// Whether the device asks for a secret during this hop.
    pub fn requires_auth(&self) -> bool {
        self.direction == Direction::Escalate && self.to.escalate_auth
    }
}

/// Immutable privilege tree for one platform.
#[derive(Debug, Clone)]
pub struct PrivilegeGraph {
    levels: IndexMap<String, PrivilegeLevel>,

    /// Parent index per level; the root points at itself.
    parents: Vec<usize>,

    /// Distance from the root per level.
    depth: Vec<usize>,

    root: usize,

    /// Matches the prompt of any level.
    any_prompt: Regex,

    /// Auth prompt or any level prompt, for levels with escalate_auth.
    auth_prompts: HashMap<usize, Regex>,
}

impl PrivilegeGraph {
    /// Build and validate the tree.
    pub fn new(levels: impl IntoIterator<Item = PrivilegeLevel>) -> Result<Self, ConfigError> {
        let mut map = IndexMap::new();
        for level in levels {
            if map.contains_key(&level.name) {
                return Err(ConfigError::DuplicatePrivilege { name: level.name });
            }
            map.insert(level.name.clone(), level);
        }

        if map.is_empty() {
            return Err(ConfigError::InvalidDefinition {
                message: "at least one privilege level is required".to_string(),
            });
        }

        // Resolve parent references
        let mut parent_refs = Vec::with_capacity(map.len());
        for (index, level) in map.values().enumerate() {
            let parent = match &level.previous_priv {
                Some(parent) => Some(map.get_index_of(parent).ok_or_else(|| {
                    ConfigError::MissingParent {
                        level: level.name.clone(),
                        parent: parent.clone(),
                    }
                })?),
                None => None,
            };
            if parent == Some(index) {
                return Err(ConfigError::Cycle {
                    level: level.name.clone(),
                });
            }
            parent_refs.push(parent);
        }

        // Every chain must end at a root within len() steps
        let mut depth = vec![0; map.len()];
        for (index, slot) in depth.iter_mut().enumerate() {
            let mut node = index;
            let mut steps = 0;
            while let Some(parent) = parent_refs[node] {
                steps += 1;
                if steps > parent_refs.len() {
                    return Err(ConfigError::Cycle {
                        level: map[index].name.clone(),
                    });
                }
                node = parent;
            }
            *slot = steps;
        }

        let roots: Vec<usize> = (0..map.len())
            .filter(|&i| parent_refs[i].is_none())
            .collect();
        let &[root] = roots.as_slice() else {
            return Err(ConfigError::Disconnected {
                roots: roots.iter().map(|&i| map[i].name.clone()).collect(),
            });
        };

        Self::check_ambiguity(&map)?;

        let any_prompt = union_pattern(map.values().map(|l| &l.pattern))?;

        let mut auth_prompts = HashMap::new();
        for (index, level) in map.values().enumerate() {
            if !level.escalate_auth {
                continue;
            }
            let auth = level
                .escalate_prompt
                .as_ref()
                .ok_or_else(|| ConfigError::InvalidDefinition {
                    message: format!(
                        "privilege level '{}' requires auth but has no auth prompt",
                        level.name
                    ),
                })?;
            auth_prompts.insert(index, union_pattern([auth, &any_prompt])?);
        }

        let parents = parent_refs
            .iter()
            .map(|parent| parent.unwrap_or(root))
            .collect();

        Ok(Self {
            levels: map,
            parents,
            depth,
            root,
            any_prompt,
            auth_prompts,
        })
    }

    /// Two levels with the same pattern and the same exclusions can never be
    /// told apart. Overlapping but distinct patterns are not detected here.
    fn check_ambiguity(levels: &IndexMap<String, PrivilegeLevel>) -> Result<(), ConfigError> {
        for (i, first) in levels.values().enumerate() {
            for second in levels.values().skip(i + 1) {
                if first.pattern.as_str() == second.pattern.as_str()
                    && first.not_contains == second.not_contains
                {
                    return Err(ConfigError::AmbiguousPattern {
                        first: first.name.clone(),
                        second: second.name.clone(),
                        pattern: first.pattern.as_str().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Get a privilege level by name.
    pub fn get(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.levels.get(name)
    }

    /// Get a privilege level by name, or a configuration error.
    pub fn level(&self, name: &str) -> Result<&PrivilegeLevel, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownPrivilege {
            name: name.to_string(),
        })
    }

    /// Parent of a level; None for the root or an unknown name.
    pub fn parent(&self, name: &str) -> Option<&PrivilegeLevel> {
        let index = self.levels.get_index_of(name)?;
        (index != self.root).then(|| &self.levels[self.parents[index]])
    }

    /// The lowest level of the tree.
    pub fn root(&self) -> &PrivilegeLevel {
        &self.levels[self.root]
    }

    /// Number of hops between a level and the root.
    pub fn depth(&self, name: &str) -> Option<usize> {
        self.levels.get_index_of(name).map(|i| self.depth[i])
    }

    /// All levels in declaration order.
    pub fn levels(&self) -> impl Iterator<Item = &PrivilegeLevel> {
        self.levels.values()
    }

    /// Get all privilege level names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.levels.keys()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.levels.contains_key(name)
    }

    /// Pattern matching the prompt of any level.
    pub fn any_prompt(&self) -> &Regex {
        &self.any_prompt
    }

    /// Pattern matching either the auth prompt of `name` or any level prompt.
    pub fn auth_or_any(&self, name: &str) -> Option<&Regex> {
        let index = self.levels.get_index_of(name)?;
        self.auth_prompts.get(&index)
    }

    /// Determine the current privilege level from the tail of some output.
    pub fn determine(&self, output: &[u8]) -> Option<&PrivilegeLevel> {
        self.levels.values().find(|level| level.matches(output))
    }

    /// Ordered single-level hops leading from `from` to `to`.
    ///
    /// De-escalates from `from` up to the lowest common ancestor, then
    /// escalates down to `to`. Empty when `from == to`.
    pub fn path_between(&self, from: &str, to: &str) -> Result<Vec<Hop<'_>>, ConfigError> {
        let mut a = self.index_of(from)?;
        let mut b = self.index_of(to)?;

        let mut up = Vec::new();
        let mut down = Vec::new();

        while self.depth[a] > self.depth[b] {
            up.push(a);
            a = self.parents[a];
        }
        while self.depth[b] > self.depth[a] {
            down.push(b);
            b = self.parents[b];
        }
        while a != b {
            up.push(a);
            a = self.parents[a];
            down.push(b);
            b = self.parents[b];
        }

        let deescalate = up.into_iter().map(|i| Hop {
            from: &self.levels[i],
            to: &self.levels[self.parents[i]],
            direction: Direction::Deescalate,
        });
        let escalate = down.into_iter().rev().map(|i| Hop {
            from: &self.levels[self.parents[i]],
            to: &self.levels[i],
            direction: Direction::Escalate,
        });

        Ok(deescalate.chain(escalate).collect())
    }

    fn index_of(&self, name: &str) -> Result<usize, ConfigError> {
        self.levels
            .get_index_of(name)
            .ok_or_else(|| ConfigError::UnknownPrivilege {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> PrivilegeGraph {
        PrivilegeGraph::new([
            PrivilegeLevel::new("root", r"(?m)^\S+@\S+:\S+\$").unwrap(),
            PrivilegeLevel::new("exec", r"(?m)^[\w.-]+>")
                .unwrap()
                .with_parent("root")
                .with_escalate("cli")
                .with_deescalate("logout"),
            PrivilegeLevel::new("privilege_exec", r"(?m)^[\w.-]+#")
                .unwrap()
                .with_parent("exec")
                .with_escalate("enable")
                .with_deescalate("disable"),
            PrivilegeLevel::new("configuration", r"(?m)^[\w.-]+\(config[\w-]*\)#")
                .unwrap()
                .with_parent("privilege_exec")
                .with_escalate("configure terminal")
                .with_deescalate("end"),
        ])
        .unwrap()
    }

    fn branching() -> PrivilegeGraph {
        PrivilegeGraph::new([
            PrivilegeLevel::new("exec", r">").unwrap(),
            PrivilegeLevel::new("configuration", r"#")
                .unwrap()
                .with_parent("exec")
                .with_escalate("configure")
                .with_deescalate("exit configuration-mode"),
            PrivilegeLevel::new("private", r"\[private\]#")
                .unwrap()
                .with_parent("configuration")
                .with_escalate("edit private")
                .with_deescalate("exit"),
            PrivilegeLevel::new("shell", r"%")
                .unwrap()
                .with_parent("exec")
                .with_escalate("start shell")
                .with_deescalate("exit"),
            PrivilegeLevel::new("root_shell", r"root@\S*%")
                .unwrap()
                .with_parent("shell")
                .with_escalate("su -")
                .with_deescalate("exit")
                .with_auth(r"password:")
                .unwrap(),
        ])
        .unwrap()
    }

    fn names(path: &[Hop<'_>]) -> Vec<(String, String, Direction)> {
        path.iter()
            .map(|h| (h.from.name.clone(), h.to.name.clone(), h.direction))
            .collect()
    }

    #[test]
    fn test_escalate_from_root() {
        let graph = chain();
        let path = graph.path_between("root", "configuration").unwrap();

        let commands: Vec<_> = path.iter().map(|h| h.command().unwrap()).collect();
        assert_eq!(commands, vec!["cli", "enable", "configure terminal"]);
        assert!(path.iter().all(|h| h.direction == Direction::Escalate));
    }

    #[test]
    fn test_deescalate_to_root() {
        let graph = chain();
        let path = graph.path_between("configuration", "root").unwrap();

        let commands: Vec<_> = path.iter().map(|h| h.command().unwrap()).collect();
        assert_eq!(commands, vec!["end", "disable", "logout"]);
        assert!(path.iter().all(|h| h.direction == Direction::Deescalate));
    }

    #[test]
    fn test_same_level_is_empty() {
        let graph = chain();
        assert!(graph.path_between("exec", "exec").unwrap().is_empty());
    }

    #[test]
    fn test_path_through_common_ancestor() {
        let graph = branching();
        let path = graph.path_between("private", "root_shell").unwrap();

        assert_eq!(
            names(&path),
            vec![
                ("private".into(), "configuration".into(), Direction::Deescalate),
                ("configuration".into(), "exec".into(), Direction::Deescalate),
                ("exec".into(), "shell".into(), Direction::Escalate),
                ("shell".into(), "root_shell".into(), Direction::Escalate),
            ]
        );
        assert!(path[3].requires_auth());
        assert!(!path[0].requires_auth());
    }

    #[test]
    fn test_paths_are_symmetric() {
        let graph = branching();
        for a in graph.names() {
            for b in graph.names() {
                let forward = names(&graph.path_between(a, b).unwrap());
                let backward = names(&graph.path_between(b, a).unwrap());

                let mut inverted: Vec<_> = backward
                    .into_iter()
                    .map(|(from, to, dir)| {
                        let dir = match dir {
                            Direction::Escalate => Direction::Deescalate,
                            Direction::Deescalate => Direction::Escalate,
                        };
                        (to, from, dir)
                    })
                    .collect();
                inverted.reverse();

                assert_eq!(forward, inverted, "{a} -> {b}");
                if let Some(last) = forward.last() {
                    assert_eq!(&last.1, b);
                }
            }
        }
    }

    #[test]
    fn test_parent_and_depth() {
        let graph = chain();
        assert_eq!(graph.root().name, "root");
        assert!(graph.parent("root").is_none());
        assert_eq!(graph.parent("configuration").unwrap().name, "privilege_exec");
        assert_eq!(graph.depth("configuration"), Some(3));
    }

    #[test]
    fn test_determine() {
        let graph = chain();
        assert_eq!(graph.determine(b"admin@box:~$ ").unwrap().name, "root");
        assert_eq!(graph.determine(b"banner\nrouter>").unwrap().name, "exec");
        assert_eq!(graph.determine(b"router#").unwrap().name, "privilege_exec");
        assert_eq!(
            graph.determine(b"router(config-if)#").unwrap().name,
            "configuration"
        );
        assert!(graph.determine(b"router%").is_none());
    }

    #[test]
    fn test_unknown_level() {
        let graph = chain();
        let err = graph.path_between("exec", "nope").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPrivilege { name } if name == "nope"));
    }

    #[test]
    fn test_missing_parent() {
        let err = PrivilegeGraph::new([
            PrivilegeLevel::new("exec", r">").unwrap(),
            PrivilegeLevel::new("configuration", r"#")
                .unwrap()
                .with_parent("privilege_exec"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingParent { .. }));
    }

    #[test]
    fn test_cycle() {
        let err = PrivilegeGraph::new([
            PrivilegeLevel::new("exec", r">").unwrap(),
            PrivilegeLevel::new("a", r"a#").unwrap().with_parent("b"),
            PrivilegeLevel::new("b", r"b#").unwrap().with_parent("a"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Cycle { .. }));
    }

    #[test]
    fn test_multiple_roots() {
        let err = PrivilegeGraph::new([
            PrivilegeLevel::new("exec", r">").unwrap(),
            PrivilegeLevel::new("shell", r"%").unwrap(),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Disconnected { roots } if roots.len() == 2));
    }

    #[test]
    fn test_ambiguous_patterns() {
        let err = PrivilegeGraph::new([
            PrivilegeLevel::new("exec", r">").unwrap(),
            PrivilegeLevel::new("other", r">").unwrap().with_parent("exec"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousPattern { .. }));
    }

    #[test]
    fn test_duplicate_level() {
        let err = PrivilegeGraph::new([
            PrivilegeLevel::new("exec", r">").unwrap(),
            PrivilegeLevel::new("exec", r"#").unwrap(),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePrivilege { .. }));
    }

    #[test]
    fn test_auth_or_any() {
        let graph = branching();
        let pattern = graph.auth_or_any("root_shell").unwrap();
        assert!(crate::channel::PromptMatcher::is_match(pattern, b"su -\nPassword: "));
        assert!(graph.auth_or_any("shell").is_none());
    }
}
