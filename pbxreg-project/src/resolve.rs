//! Resolution of user-facing group and target names to object ids.

use crate::{Document, Error, ObjectId, Result, object::Group, record::Record};

/// A target and the sources build phase new files are compiled by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub name: String,
    pub phase: ObjectId,
}

impl Document {
    /// Resolve a group by id, name or slash-separated path (`App/Views`).
    ///
    /// A bare name is matched against each group's `name`, then its `path`,
    /// then its comment; the first tier with any match wins and must be
    /// unambiguous.
    pub fn resolve_group(&self, query: &str) -> Result<ObjectId> {
        if let Some(group) = self.group(query) {
            return Ok(group.id().clone());
        }

        let matches = self.groups_named(query);
        if !matches.is_empty() {
            return unique(query, matches);
        }

        if query.contains('/') {
            let matches = self.groups_at_path(query);
            if !matches.is_empty() {
                return unique(query, matches);
            }
        }

        Err(Box::new(Error::GroupNotFound {
            name: query.to_string(),
        }))
    }

    fn groups_named(&self, name: &str) -> Vec<Group<'_>> {
        let tiers: [fn(&Record) -> Option<&str>; 3] = [
            |r| r.get_str("name"),
            |r| r.get_str("path"),
            Record::comment,
        ];
        for tier in tiers {
            let found: Vec<_> = self
                .groups()
                .filter(|g| tier(g.record()) == Some(name))
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Groups reached by walking `Parent/Child/…` from every group named `Parent`.
    fn groups_at_path(&self, path: &str) -> Vec<Group<'_>> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let Some(first) = segments.next() else {
            return Vec::new();
        };
        let mut current = self.groups_named(first);
        for segment in segments {
            current = current
                .iter()
                .flat_map(|parent| parent.children())
                .filter_map(|child| self.group(child))
                .filter(|child| child.name() == Some(segment))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// Resolve a target name to its sources build phase.
    ///
    /// The id of a `PBXSourcesBuildPhase` is accepted as well, for projects
    /// whose phases are not owned by a named target.
    pub fn resolve_target(&self, name: &str) -> Result<ResolvedTarget> {
        if let Some(target) = self.targets().find(|t| t.name() == name) {
            let phase = target
                .build_phases()
                .filter_map(|id| self.build_phase(id))
                .find(|phase| phase.is_sources())
                .ok_or_else(|| {
                    Box::new(Error::NoSourcesPhase {
                        name: name.to_string(),
                    })
                })?;
            return Ok(ResolvedTarget {
                name: name.to_string(),
                phase: phase.id().clone(),
            });
        }

        match self.build_phase(name) {
            Some(phase) if phase.is_sources() => Ok(ResolvedTarget {
                name: name.to_string(),
                phase: phase.id().clone(),
            }),
            _ => Err(Box::new(Error::TargetNotFound {
                names: vec![name.to_string()],
            })),
        }
    }
}

fn unique(query: &str, matches: Vec<Group<'_>>) -> Result<ObjectId> {
    match matches.as_slice() {
        [group] => Ok(group.id().clone()),
        _ => Err(Box::new(Error::AmbiguousGroup {
            name: query.to_string(),
            ids: matches.iter().map(|g| g.id().clone()).collect(),
        })),
    }
}
